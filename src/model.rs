//! Read-only command tree consumed by the renderer.
//!
//! Readers (manifests, clap, in-process factories) all produce these types so
//! the formatters never probe the source model directly.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Usage piece emitted when a command has at least one visible option.
pub const OPTIONS_METAVAR: &str = "[OPTIONS]";
/// Usage piece emitted for groups.
pub const SUBCOMMAND_METAVAR: &str = "<COMMAND>";

/// One command or sub-command.
#[derive(Debug, Clone, Default)]
pub struct CommandNode {
    pub name: String,
    pub help: Option<String>,
    pub short_help: Option<String>,
    pub epilog: Option<String>,
    pub hidden: bool,
    pub params: Vec<Parameter>,
    /// Usage pieces supplied by the reader; derived from `params` when unset.
    pub usage_pieces: Option<Vec<String>>,
    pub subcommands: SubCommands,
}

/// Sub-command capability of a command.
#[derive(Clone, Default)]
pub enum SubCommands {
    #[default]
    None,
    Eager(Vec<CommandNode>),
    Lazy(Arc<dyn LazyGroup>),
}

impl fmt::Debug for SubCommands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubCommands::None => f.write_str("None"),
            SubCommands::Eager(commands) => f.debug_tuple("Eager").field(commands).finish(),
            SubCommands::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

/// A group whose sub-commands are only known by listing and fetching them.
pub trait LazyGroup: Send + Sync {
    fn list_commands(&self) -> Vec<String>;
    fn get_command(&self, name: &str) -> Option<CommandNode>;
}

impl SubCommands {
    /// Resolve every sub-command into a name-ordered lookup.
    pub fn resolve(&self) -> BTreeMap<String, CommandNode> {
        match self {
            SubCommands::None => BTreeMap::new(),
            SubCommands::Eager(commands) => commands
                .iter()
                .map(|command| (command.name.clone(), command.clone()))
                .collect(),
            SubCommands::Lazy(group) => group
                .list_commands()
                .into_iter()
                .filter_map(|name| {
                    let command = group.get_command(&name)?;
                    Some((name, command))
                })
                .collect(),
        }
    }

    pub fn is_group(&self) -> bool {
        !matches!(self, SubCommands::None)
    }
}

impl CommandNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_param(mut self, param: impl Into<Parameter>) -> Self {
        self.params.push(param.into());
        self
    }

    pub fn with_subcommand(mut self, command: CommandNode) -> Self {
        match &mut self.subcommands {
            SubCommands::Eager(commands) => commands.push(command),
            _ => self.subcommands = SubCommands::Eager(vec![command]),
        }
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn is_group(&self) -> bool {
        self.subcommands.is_group()
    }

    /// Long help, falling back to the short help.
    pub fn description(&self) -> Option<&str> {
        self.help
            .as_deref()
            .filter(|text| !text.is_empty())
            .or(self.short_help.as_deref())
    }

    pub fn visible_options(&self) -> impl Iterator<Item = &OptionParam> {
        self.params.iter().filter_map(|param| match param {
            Parameter::Option(opt) if !opt.hidden => Some(opt),
            _ => None,
        })
    }

    pub fn arguments(&self) -> impl Iterator<Item = &ArgumentParam> {
        self.params.iter().filter_map(|param| match param {
            Parameter::Argument(arg) => Some(arg),
            Parameter::Option(_) => None,
        })
    }

    /// Ordered usage pieces following the command path.
    pub fn usage_pieces(&self) -> Vec<String> {
        if let Some(pieces) = &self.usage_pieces {
            return pieces.clone();
        }
        let mut pieces = Vec::new();
        if self.visible_options().next().is_some() {
            pieces.push(OPTIONS_METAVAR.to_string());
        }
        for arg in self.arguments() {
            pieces.push(arg.usage_piece());
        }
        if self.is_group() {
            pieces.push(SUBCOMMAND_METAVAR.to_string());
        }
        pieces
    }
}

/// A declared parameter of a command.
#[derive(Debug, Clone)]
pub enum Parameter {
    Option(OptionParam),
    Argument(ArgumentParam),
}

impl Parameter {
    pub fn name(&self) -> &str {
        match self {
            Parameter::Option(opt) => &opt.name,
            Parameter::Argument(arg) => &arg.name,
        }
    }

    pub fn envvar(&self) -> Option<&str> {
        let envvar = match self {
            Parameter::Option(opt) => opt.envvar.as_deref(),
            Parameter::Argument(arg) => arg.envvar.as_deref(),
        };
        envvar.filter(|name| !name.is_empty())
    }

    pub fn is_hidden(&self) -> bool {
        match self {
            Parameter::Option(opt) => opt.hidden,
            Parameter::Argument(_) => false,
        }
    }

    pub fn human_readable_name(&self) -> String {
        match self {
            Parameter::Option(opt) => opt.name.clone(),
            Parameter::Argument(arg) => arg.human_readable_name(),
        }
    }
}

impl From<OptionParam> for Parameter {
    fn from(opt: OptionParam) -> Self {
        Parameter::Option(opt)
    }
}

impl From<ArgumentParam> for Parameter {
    fn from(arg: ArgumentParam) -> Self {
        Parameter::Argument(arg)
    }
}

/// A flag-style parameter such as `--verbose`.
#[derive(Debug, Clone, Default)]
pub struct OptionParam {
    pub name: String,
    pub opts: Vec<String>,
    pub secondary_opts: Vec<String>,
    pub required: bool,
    pub default: Option<DefaultValue>,
    pub help: Option<String>,
    pub envvar: Option<String>,
    pub is_flag: bool,
    pub count: bool,
    pub metavar: Option<String>,
    pub choices: Option<Vec<String>>,
    pub show_default: ShowDefault,
    pub hidden: bool,
}

impl OptionParam {
    pub fn new(name: impl Into<String>, opts: &[&str]) -> Self {
        Self {
            name: name.into(),
            opts: opts.iter().map(|opt| opt.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn takes_value(&self) -> bool {
        !self.is_flag && !self.count
    }
}

/// A positional parameter.
#[derive(Debug, Clone)]
pub struct ArgumentParam {
    pub name: String,
    pub required: bool,
    pub default: Option<DefaultValue>,
    pub help: Option<String>,
    pub envvar: Option<String>,
    pub metavar: Option<String>,
    /// 1 for a single value; anything else (e.g. -1 for unbounded) is plural.
    pub nargs: i32,
}

impl ArgumentParam {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            default: None,
            help: None,
            envvar: None,
            metavar: None,
            nargs: 1,
        }
    }

    pub fn human_readable_name(&self) -> String {
        match &self.metavar {
            Some(metavar) => metavar.clone(),
            None => self.name.to_uppercase(),
        }
    }

    fn usage_piece(&self) -> String {
        let name = self.human_readable_name();
        let mut piece = if self.required {
            format!("<{name}>")
        } else {
            format!("[{name}]")
        };
        if self.nargs != 1 {
            piece.push_str("...");
        }
        piece
    }
}

/// Whether and how an option's default is displayed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ShowDefault {
    #[default]
    Hide,
    Show,
    Override(String),
}

impl ShowDefault {
    pub fn is_enabled(&self) -> bool {
        match self {
            ShowDefault::Hide => false,
            ShowDefault::Show => true,
            ShowDefault::Override(text) => !text.is_empty(),
        }
    }
}

/// A parameter default of arbitrary shape.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<DefaultValue>),
}

impl DefaultValue {
    /// Generic representation: text quoted, lists bracketed.
    pub fn repr(&self) -> String {
        match self {
            DefaultValue::Text(text) => format!("{text:?}"),
            DefaultValue::List(items) => {
                let inner: Vec<String> = items.iter().map(DefaultValue::repr).collect();
                format!("[{}]", inner.join(", "))
            }
            other => other.to_string(),
        }
    }
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Text(text) => f.write_str(text),
            DefaultValue::Int(value) => write!(f, "{value}"),
            DefaultValue::Float(value) => write!(f, "{value}"),
            DefaultValue::Bool(value) => write!(f, "{value}"),
            DefaultValue::List(items) => {
                let inner: Vec<String> = items.iter().map(ToString::to_string).collect();
                f.write_str(&inner.join(", "))
            }
        }
    }
}

impl From<&str> for DefaultValue {
    fn from(text: &str) -> Self {
        DefaultValue::Text(text.to_string())
    }
}

impl From<i64> for DefaultValue {
    fn from(value: i64) -> Self {
        DefaultValue::Int(value)
    }
}
