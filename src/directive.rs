//! The `clidoc` directive: resolves a command reference and turns it into
//! registered nodes.

use crate::env::{BuildEnv, MarkupParser, Node, Target};
use crate::error::DirectiveError;
use crate::loader::{Attribute, LoadError, ModuleLoader};
use crate::model::CommandNode;
use crate::render::{filter_commands, format_command, NestedMode, RenderContext};

pub const SHOW_NESTED_DEPRECATION: &str = "':show-nested:' is deprecated; use ':nested: full'";

/// Validated directive options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveOptions {
    pub prog: Option<String>,
    pub nested: Option<NestedMode>,
    pub commands: Option<String>,
    pub show_nested: bool,
}

impl DirectiveOptions {
    /// Convert raw `:name: value` pairs, rejecting unknown names and bad values.
    pub fn parse<'a, I>(raw: I) -> Result<Self, DirectiveError>
    where
        I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
    {
        let mut options = DirectiveOptions::default();
        for (name, value) in raw {
            let value = value.map(str::trim).filter(|value| !value.is_empty());
            match name {
                "prog" => {
                    let prog = value.ok_or_else(|| DirectiveError::InvalidOptionValue {
                        option: name.to_string(),
                        message: "argument required but none supplied".to_string(),
                    })?;
                    options.prog = Some(prog.to_string());
                }
                "nested" => options.nested = value.map(str::parse::<NestedMode>).transpose()?,
                "commands" => options.commands = Some(value.unwrap_or_default().to_string()),
                "show-nested" => {
                    if let Some(value) = value {
                        return Err(DirectiveError::InvalidOptionValue {
                            option: name.to_string(),
                            message: format!("no argument is permitted; \"{value}\" supplied"),
                        });
                    }
                    options.show_nested = true;
                }
                other => {
                    return Err(DirectiveError::UnknownOption {
                        option: other.to_string(),
                    })
                }
            }
        }
        Ok(options)
    }
}

/// Builds target/fragment node pairs for commands and registers them.
pub struct NodeGenerator<'a> {
    pub parser: &'a dyn MarkupParser,
    /// Line of the directive in its document.
    pub lineno: usize,
    pub content_offset: usize,
}

impl NodeGenerator<'_> {
    /// Nodes for one command; hidden commands produce none.
    ///
    /// Sub-commands are not visited here: under [`NestedMode::Full`] the
    /// caller invokes this once per listed sub-command.
    pub fn generate_nodes(
        &self,
        env: &mut BuildEnv,
        name: &str,
        command: &CommandNode,
        parent: Option<&RenderContext<'_>>,
        nested: NestedMode,
        commands: Option<&str>,
    ) -> Result<Vec<Node>, DirectiveError> {
        if command.hidden {
            return Ok(Vec::new());
        }

        let prefix = env.config.target_prefix.clone();
        let target = Target {
            id: format!("{}-{}", prefix, env.new_serialno(&prefix)),
        };
        let ctx = RenderContext::new(command, name, parent);
        let lines = format_command(&ctx, nested, commands);
        let fragment = self.parser.nested_parse(env, &lines, self.content_offset)?;

        let docname = env.docname().to_string();
        env.registry
            .add_node(&docname, self.lineno, target.clone(), fragment.clone());
        tracing::debug!(
            docname = %docname,
            target = %target.id,
            command = %ctx.command_path(),
            lines = lines.len(),
            "generated command nodes"
        );

        Ok(vec![Node::Target(target), Node::Fragment(fragment)])
    }

    /// Detail sections for every visible sub-command below `parent`, depth first.
    fn generate_subtree(
        &self,
        env: &mut BuildEnv,
        parent: &RenderContext<'_>,
        commands: Option<&str>,
    ) -> Result<Vec<Node>, DirectiveError> {
        let mut nodes = Vec::new();
        for child in filter_commands(parent, commands) {
            if child.hidden {
                continue;
            }
            nodes.extend(self.generate_nodes(
                env,
                &child.name,
                &child,
                Some(parent),
                NestedMode::None,
                None,
            )?);
            let ctx = RenderContext::new(&child, &child.name, Some(parent));
            nodes.extend(self.generate_subtree(env, &ctx, None)?);
        }
        Ok(nodes)
    }
}

/// One occurrence of the directive in a document.
#[derive(Debug, Clone)]
pub struct CliDirective {
    /// `module:attribute` reference to the command.
    pub argument: String,
    pub options: DirectiveOptions,
    pub lineno: usize,
    pub content_offset: usize,
}

impl CliDirective {
    pub fn run(
        &self,
        env: &mut BuildEnv,
        loader: &dyn ModuleLoader,
        parser: &dyn MarkupParser,
    ) -> Result<Vec<Node>, DirectiveError> {
        let command = load_command(loader, &self.argument)?;
        let prog = self
            .options
            .prog
            .as_deref()
            .ok_or(DirectiveError::MissingProg)?;
        let nested = self.resolve_nested(env)?;
        let commands = self.options.commands.as_deref();

        let generator = NodeGenerator {
            parser,
            lineno: self.lineno,
            content_offset: self.content_offset,
        };
        // a failed directive leaves nothing registered, even in full mode
        let checkpoint = env.checkpoint();
        let result = generate_tree(&generator, env, prog, &command, nested, commands);
        if result.is_err() {
            env.rollback(checkpoint);
        }
        result
    }

    fn resolve_nested(&self, env: &mut BuildEnv) -> Result<NestedMode, DirectiveError> {
        match (self.options.show_nested, self.options.nested) {
            (true, Some(_)) => Err(DirectiveError::ConflictingNested),
            (true, None) => {
                env.warn(SHOW_NESTED_DEPRECATION);
                Ok(NestedMode::Full)
            }
            (false, nested) => Ok(nested.unwrap_or_default()),
        }
    }
}

fn generate_tree(
    generator: &NodeGenerator<'_>,
    env: &mut BuildEnv,
    prog: &str,
    command: &CommandNode,
    nested: NestedMode,
    commands: Option<&str>,
) -> Result<Vec<Node>, DirectiveError> {
    let mut nodes = generator.generate_nodes(env, prog, command, None, nested, commands)?;
    if nested == NestedMode::Full && !command.hidden {
        let root = RenderContext::new(command, prog, None);
        nodes.extend(generator.generate_subtree(env, &root, commands)?);
    }
    Ok(nodes)
}

/// Resolve `module:attribute` to a command.
pub fn load_command(
    loader: &dyn ModuleLoader,
    reference: &str,
) -> Result<CommandNode, DirectiveError> {
    let Some((module_name, attr_name)) = reference.split_once(':') else {
        return Err(DirectiveError::MalformedReference {
            reference: reference.to_string(),
        });
    };

    let module = loader
        .load(module_name)
        .map_err(|err| DirectiveError::ImportFailed {
            module: module_name.to_string(),
            attribute: attr_name.to_string(),
            detail: import_failure_detail(err),
        })?;

    match module.get(attr_name) {
        None => Err(DirectiveError::MissingAttribute {
            module: module_name.to_string(),
            attribute: attr_name.to_string(),
        }),
        Some(Attribute::Other(type_name)) => Err(DirectiveError::NotACommand {
            reference: reference.to_string(),
            type_name: type_name.clone(),
        }),
        Some(Attribute::Command(command)) => Ok(command.clone()),
    }
}

fn import_failure_detail(err: LoadError) -> String {
    match err {
        LoadError::Aborted(message) => {
            format!("The module appeared to abort while loading: {message}")
        }
        // Debug output of the error keeps the whole cause chain.
        LoadError::Failed(err) => format!("The following error was raised:\n{err:?}"),
        LoadError::NotFound(_) => format!("The following error was raised:\n{err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::RstParser;
    use crate::loader::RegistryLoader;
    use crate::model::OptionParam;

    fn remote() -> CommandNode {
        let mut x = OptionParam::new("x", &["-x"]);
        x.envvar = Some("X".to_string());
        CommandNode::new("remote")
            .with_param(x)
            .with_subcommand(CommandNode::new("add"))
    }

    fn loader() -> RegistryLoader {
        let mut registry = RegistryLoader::new();
        registry.register_command("app", "cli", || {
            let mut param = OptionParam::new("param", &["--param"]);
            param.envvar = Some("PARAM".to_string());
            CommandNode::new("cli")
                .with_help("A sample command group.")
                .with_param(param)
                .with_subcommand(CommandNode::new("hello").with_help("A sample command."))
                .with_subcommand(remote())
                .with_subcommand(CommandNode::new("secret").hidden())
        });
        registry.register_command("app", "remote", remote);
        registry.register_command("app", "hidden", || CommandNode::new("hidden").hidden());
        registry.register_other("app", "version", "string");
        registry
    }

    fn directive(argument: &str, options: &[(&str, Option<&str>)]) -> CliDirective {
        CliDirective {
            argument: argument.to_string(),
            options: DirectiveOptions::parse(options.iter().copied()).expect("options"),
            lineno: 4,
            content_offset: 5,
        }
    }

    fn run(directive: &CliDirective) -> (BuildEnv, Result<Vec<Node>, DirectiveError>) {
        let mut env = BuildEnv::default();
        env.begin_document("index");
        let result = directive.run(&mut env, &loader(), &RstParser);
        (env, result)
    }

    fn fragments(nodes: &[Node]) -> Vec<&Vec<String>> {
        nodes
            .iter()
            .filter_map(|node| match node {
                Node::Fragment(fragment) => Some(&fragment.lines),
                Node::Target(_) => None,
            })
            .collect()
    }

    #[test]
    fn parses_options() {
        let options = DirectiveOptions::parse([
            ("prog", Some("cli")),
            ("nested", Some("none")),
            ("commands", Some("a, b")),
        ])
        .expect("parse");
        assert_eq!(options.prog.as_deref(), Some("cli"));
        assert_eq!(options.nested, Some(NestedMode::None));
        assert_eq!(options.commands.as_deref(), Some("a, b"));
        assert!(!options.show_nested);
    }

    #[test]
    fn option_errors() {
        assert!(matches!(
            DirectiveOptions::parse([("nested", Some("deep"))]),
            Err(DirectiveError::InvalidOptionValue { .. })
        ));
        assert!(matches!(
            DirectiveOptions::parse([("prog", None)]),
            Err(DirectiveError::InvalidOptionValue { .. })
        ));
        assert!(matches!(
            DirectiveOptions::parse([("show-nested", Some("yes"))]),
            Err(DirectiveError::InvalidOptionValue { .. })
        ));
        assert!(matches!(
            DirectiveOptions::parse([("colour", Some("x"))]),
            Err(DirectiveError::UnknownOption { .. })
        ));
    }

    #[test]
    fn empty_values_mean_unset_nested_and_empty_filter() {
        let options =
            DirectiveOptions::parse([("nested", Some("")), ("commands", None)]).expect("parse");
        assert_eq!(options.nested, None);
        assert_eq!(options.commands.as_deref(), Some(""));
    }

    #[test]
    fn generates_and_registers_target_and_fragment() {
        let (env, result) = run(&directive("app:cli", &[("prog", Some("cli"))]));
        let nodes = result.expect("run");
        assert_eq!(nodes.len(), 2);
        assert_eq!(
            nodes[0],
            Node::Target(Target {
                id: "cli-0".to_string()
            })
        );
        let registered: Vec<_> = env.registry.nodes_for("index").collect();
        assert_eq!(registered.len(), 1);
        assert_eq!(registered[0].lineno, 4);
        assert_eq!(registered[0].fragment.offset, 5);
        assert_eq!(registered[0].fragment.labels, vec!["cli-param-PARAM"]);
    }

    #[test]
    fn full_mode_generates_sections_for_visible_subcommands() {
        let (_, result) = run(&directive(
            "app:cli",
            &[("prog", Some("cli")), ("nested", Some("full"))],
        ));
        let nodes = result.expect("run");
        let programs: Vec<&String> = fragments(&nodes)
            .into_iter()
            .flat_map(|lines| lines.iter().filter(|line| line.starts_with(".. program::")))
            .collect();
        assert_eq!(
            programs,
            vec![
                ".. program:: cli",
                ".. program:: cli hello",
                ".. program:: cli remote",
                ".. program:: cli remote add",
            ]
        );
        assert!(fragments(&nodes)
            .iter()
            .all(|lines| !lines.iter().any(|line| line == ".. rubric:: Commands")));
    }

    #[test]
    fn full_mode_respects_top_level_filter() {
        let (_, result) = run(&directive(
            "app:cli",
            &[
                ("prog", Some("cli")),
                ("nested", Some("full")),
                ("commands", Some("remote")),
            ],
        ));
        let nodes = result.expect("run");
        assert_eq!(fragments(&nodes).len(), 3);
    }

    #[test]
    fn show_nested_maps_to_full_with_warning() {
        let (env, result) = run(&directive(
            "app:cli",
            &[("prog", Some("cli")), ("show-nested", None)],
        ));
        assert_eq!(fragments(&result.expect("run")).len(), 4);
        assert_eq!(env.warnings(), [SHOW_NESTED_DEPRECATION.to_string()]);
    }

    #[test]
    fn show_nested_conflicts_with_nested() {
        let (_, result) = run(&directive(
            "app:cli",
            &[
                ("prog", Some("cli")),
                ("nested", Some("short")),
                ("show-nested", None),
            ],
        ));
        assert!(matches!(result, Err(DirectiveError::ConflictingNested)));
    }

    #[test]
    fn hidden_root_generates_nothing() {
        let (env, result) = run(&directive("app:hidden", &[("prog", Some("hidden"))]));
        assert!(result.expect("run").is_empty());
        assert!(env.registry.is_empty());
    }

    #[test]
    fn reference_errors() {
        let (_, result) = run(&directive("app", &[("prog", Some("cli"))]));
        assert!(matches!(result, Err(DirectiveError::MalformedReference { .. })));

        let (_, result) = run(&directive("nope:cli", &[("prog", Some("cli"))]));
        assert!(matches!(result, Err(DirectiveError::ImportFailed { .. })));

        let (_, result) = run(&directive("app:missing", &[("prog", Some("cli"))]));
        assert!(matches!(result, Err(DirectiveError::MissingAttribute { .. })));

        let (_, result) = run(&directive("app:version", &[("prog", Some("cli"))]));
        let err = result.unwrap_err();
        assert_eq!(
            err.to_string(),
            "\"string\" of type \"app:version\" is not a command"
        );

        let (_, result) = run(&directive("app:cli", &[]));
        assert!(matches!(result, Err(DirectiveError::MissingProg)));
    }

    #[test]
    fn aborting_module_is_reported() {
        let mut registry = RegistryLoader::new();
        registry.register_command("boom", "cli", || panic!("sys exit"));
        let err = load_command(&registry, "boom:cli").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to import \"cli\" from \"boom\". The module appeared to abort while loading: sys exit"
        );
    }

    #[test]
    fn repeated_directive_in_same_document_hits_duplicate_label() {
        let mut env = BuildEnv::default();
        env.begin_document("index");
        let directive = directive("app:cli", &[("prog", Some("cli"))]);
        directive
            .run(&mut env, &loader(), &RstParser)
            .expect("first run");
        let err = directive
            .run(&mut env, &loader(), &RstParser)
            .unwrap_err();
        assert!(matches!(err, DirectiveError::DuplicateTarget { .. }));
        assert_eq!(env.registry.nodes_for("index").count(), 1);
    }

    #[test]
    fn failed_full_mode_directive_leaves_nothing_registered() {
        let mut env = BuildEnv::default();
        env.begin_document("a");
        directive("app:remote", &[("prog", Some("cli remote"))])
            .run(&mut env, &loader(), &RstParser)
            .expect("render remote alone");

        env.begin_document("b");
        let err = directive(
            "app:cli",
            &[("prog", Some("cli")), ("nested", Some("full"))],
        )
        .run(&mut env, &loader(), &RstParser)
        .unwrap_err();
        assert!(
            matches!(err, DirectiveError::DuplicateTarget { ref label, .. } if label == "cli-remote-x-X")
        );
        assert_eq!(env.registry.nodes_for("b").count(), 0);
        assert_eq!(env.registry.len(), 1);
        // labels claimed by the root section before the failure are released
        assert!(env.claim_label("cli-param-PARAM").is_ok());
    }
}
