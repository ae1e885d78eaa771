//! JSON manifest format describing a command tree.

use crate::model::{
    ArgumentParam, CommandNode, DefaultValue, OptionParam, Parameter, ShowDefault, SubCommands,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandManifest {
    pub name: String,
    #[serde(default)]
    pub help: Option<String>,
    #[serde(default)]
    pub short_help: Option<String>,
    #[serde(default)]
    pub epilog: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    /// Explicit usage pieces; derived from `params` when omitted.
    #[serde(default)]
    pub usage: Option<Vec<String>>,
    #[serde(default)]
    pub params: Vec<ParamManifest>,
    /// Present (even empty) for groups.
    #[serde(default)]
    pub commands: Option<Vec<CommandManifest>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParamManifest {
    Option(OptionManifest),
    Argument(ArgumentManifest),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionManifest {
    pub name: String,
    pub opts: Vec<String>,
    #[serde(default)]
    pub secondary_opts: Vec<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<DefaultManifest>,
    #[serde(default)]
    pub help: Option<String>,
    #[serde(default)]
    pub envvar: Option<String>,
    #[serde(default)]
    pub is_flag: bool,
    #[serde(default)]
    pub count: bool,
    #[serde(default)]
    pub metavar: Option<String>,
    #[serde(default)]
    pub choices: Option<Vec<String>>,
    #[serde(default)]
    pub show_default: ShowDefaultManifest,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgumentManifest {
    pub name: String,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default)]
    pub default: Option<DefaultManifest>,
    #[serde(default)]
    pub help: Option<String>,
    #[serde(default)]
    pub envvar: Option<String>,
    #[serde(default)]
    pub metavar: Option<String>,
    #[serde(default = "default_nargs")]
    pub nargs: i32,
}

fn default_true() -> bool {
    true
}

fn default_nargs() -> i32 {
    1
}

/// `true`/`false`, or a string shown verbatim in place of the default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShowDefaultManifest {
    Flag(bool),
    Text(String),
}

impl Default for ShowDefaultManifest {
    fn default() -> Self {
        ShowDefaultManifest::Flag(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultManifest {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<DefaultManifest>),
}

impl CommandManifest {
    pub fn into_command(self) -> CommandNode {
        let subcommands = match self.commands {
            Some(commands) => SubCommands::Eager(
                commands
                    .into_iter()
                    .map(CommandManifest::into_command)
                    .collect(),
            ),
            None => SubCommands::None,
        };
        CommandNode {
            name: self.name,
            help: self.help,
            short_help: self.short_help,
            epilog: self.epilog,
            hidden: self.hidden,
            params: self.params.into_iter().map(ParamManifest::into_param).collect(),
            usage_pieces: self.usage,
            subcommands,
        }
    }
}

impl ParamManifest {
    fn into_param(self) -> Parameter {
        match self {
            ParamManifest::Option(opt) => Parameter::Option(OptionParam {
                name: opt.name,
                opts: opt.opts,
                secondary_opts: opt.secondary_opts,
                required: opt.required,
                default: opt.default.map(DefaultManifest::into_value),
                help: opt.help,
                envvar: opt.envvar,
                is_flag: opt.is_flag,
                count: opt.count,
                metavar: opt.metavar,
                choices: opt.choices,
                show_default: match opt.show_default {
                    ShowDefaultManifest::Flag(true) => ShowDefault::Show,
                    ShowDefaultManifest::Flag(false) => ShowDefault::Hide,
                    ShowDefaultManifest::Text(text) => ShowDefault::Override(text),
                },
                hidden: opt.hidden,
            }),
            ParamManifest::Argument(arg) => Parameter::Argument(ArgumentParam {
                name: arg.name,
                required: arg.required,
                default: arg.default.map(DefaultManifest::into_value),
                help: arg.help,
                envvar: arg.envvar,
                metavar: arg.metavar,
                nargs: arg.nargs,
            }),
        }
    }
}

impl DefaultManifest {
    fn into_value(self) -> DefaultValue {
        match self {
            DefaultManifest::Bool(value) => DefaultValue::Bool(value),
            DefaultManifest::Int(value) => DefaultValue::Int(value),
            DefaultManifest::Float(value) => DefaultValue::Float(value),
            DefaultManifest::Text(value) => DefaultValue::Text(value),
            DefaultManifest::List(items) => {
                DefaultValue::List(items.into_iter().map(DefaultManifest::into_value).collect())
            }
        }
    }
}
