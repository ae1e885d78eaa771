//! Expansion of directive blocks inside a reStructuredText document.

use crate::directive::{CliDirective, DirectiveOptions};
use crate::env::{BuildEnv, MarkupParser, Node};
use crate::error::DirectiveError;
use crate::loader::ModuleLoader;
use regex::Regex;

/// Rebuild `docname` from `source`, replacing every directive block with the
/// markup it generates.
///
/// Nodes and labels from a previous build of the same document are purged
/// first. A failing directive becomes an `.. error::` admonition and a build
/// warning; the rest of the page is still expanded.
pub fn expand_document(
    env: &mut BuildEnv,
    loader: &dyn ModuleLoader,
    parser: &dyn MarkupParser,
    docname: &str,
    source: &str,
) -> String {
    env.begin_document(docname);
    env.purge_document(docname);

    let directive_re = Regex::new(&format!(
        r"^(\s*)\.\. {}::(?:[ \t]+(.*?))?[ \t]*$",
        regex::escape(&env.config.directive)
    ))
    .expect("regex for directive blocks");
    let option_re = Regex::new(r"^\s+:([\w-]+):(?:[ \t]+(.*?))?[ \t]*$")
        .expect("regex for directive options");

    let lines: Vec<&str> = source.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut directives = 0usize;
    let mut failures = 0usize;
    let mut idx = 0;
    while idx < lines.len() {
        let Some(caps) = directive_re.captures(lines[idx]) else {
            out.push(lines[idx].to_string());
            idx += 1;
            continue;
        };
        let indent = caps.get(1).map_or("", |m| m.as_str()).to_string();
        let argument = caps.get(2).map_or("", |m| m.as_str()).to_string();
        let lineno = idx + 1;
        idx += 1;

        let mut raw_options: Vec<(String, Option<String>)> = Vec::new();
        while let Some(line) = lines.get(idx) {
            if leading_whitespace(line) <= indent.len() {
                break;
            }
            let Some(opt) = option_re.captures(line) else {
                break;
            };
            raw_options.push((
                opt[1].to_string(),
                opt.get(2).map(|m| m.as_str().to_string()),
            ));
            idx += 1;
        }

        directives += 1;
        let result = DirectiveOptions::parse(
            raw_options
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_deref())),
        )
        .and_then(|options| {
            CliDirective {
                argument,
                options,
                lineno,
                content_offset: idx,
            }
            .run(env, loader, parser)
        });

        match result {
            Ok(nodes) => out.extend(render_nodes(&nodes, &indent)),
            Err(err) => {
                failures += 1;
                env.warn(format!("{docname}:{lineno}: {err}"));
                out.extend(error_admonition(&err, &indent));
            }
        }
    }

    tracing::info!(docname, directives, failures, "expanded document");

    let mut expanded = out.join("\n");
    if source.ends_with('\n') {
        expanded.push('\n');
    }
    expanded
}

fn leading_whitespace(line: &str) -> usize {
    if line.trim().is_empty() {
        return 0;
    }
    line.len() - line.trim_start().len()
}

/// Serialize generated nodes as markup lines, indented by `indent`.
pub fn render_nodes(nodes: &[Node], indent: &str) -> Vec<String> {
    let mut lines = Vec::new();
    for node in nodes {
        match node {
            Node::Target(target) => {
                lines.push(format!("{indent}.. _{}:", target.id));
                lines.push(String::new());
            }
            Node::Fragment(fragment) => {
                lines.extend(fragment.lines.iter().map(|line| indent_line(indent, line)));
                if lines.last().is_some_and(|line| !line.is_empty()) {
                    lines.push(String::new());
                }
            }
        }
    }
    lines
}

fn error_admonition(err: &DirectiveError, indent: &str) -> Vec<String> {
    let body_indent = format!("{indent}   ");
    let mut lines = vec![format!("{indent}.. error::"), String::new()];
    lines.extend(
        err.to_string()
            .lines()
            .map(|line| indent_line(&body_indent, line)),
    );
    lines.push(String::new());
    lines
}

fn indent_line(indent: &str, line: &str) -> String {
    if line.is_empty() {
        String::new()
    } else {
        format!("{indent}{line}")
    }
}
