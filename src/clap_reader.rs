//! Reads a `clap::Command` tree into the renderer's model.
//!
//! Commands are read unbuilt, so only declared arguments appear; the implicit
//! `--help`/`--version` flags and `help` sub-command clap adds on build do not.
use crate::model::{
    ArgumentParam, CommandNode, DefaultValue, OptionParam, Parameter, ShowDefault, SubCommands,
};
use clap::{Arg, ArgAction, Command};

pub fn read_command(cmd: &Command) -> CommandNode {
    let about = cmd.get_about().map(ToString::to_string);
    let help = cmd
        .get_long_about()
        .map(ToString::to_string)
        .or_else(|| about.clone());
    let epilog = cmd
        .get_after_long_help()
        .or_else(|| cmd.get_after_help())
        .map(ToString::to_string);
    let subcommands: Vec<CommandNode> = cmd.get_subcommands().map(read_command).collect();

    CommandNode {
        name: cmd.get_name().to_string(),
        help,
        short_help: about,
        epilog,
        hidden: cmd.is_hide_set(),
        params: cmd.get_arguments().map(read_arg).collect(),
        usage_pieces: None,
        subcommands: if subcommands.is_empty() {
            SubCommands::None
        } else {
            SubCommands::Eager(subcommands)
        },
    }
}

fn read_arg(arg: &Arg) -> Parameter {
    let name = arg.get_id().as_str().to_string();
    let help = arg
        .get_long_help()
        .or_else(|| arg.get_help())
        .map(ToString::to_string);
    let envvar = arg
        .get_env()
        .map(|value| value.to_string_lossy().into_owned());
    let metavar = arg
        .get_value_names()
        .and_then(|names| names.first())
        .map(ToString::to_string);
    let default = read_default(arg);

    if arg.is_positional() {
        let multiple = matches!(arg.get_action(), ArgAction::Append)
            || arg
                .get_num_args()
                .is_some_and(|range| range.max_values() > 1);
        return Parameter::Argument(ArgumentParam {
            name,
            required: arg.is_required_set(),
            default,
            help,
            envvar,
            metavar,
            nargs: if multiple { -1 } else { 1 },
        });
    }

    let mut opts = Vec::new();
    if let Some(long) = arg.get_long() {
        opts.push(format!("--{long}"));
    }
    if let Some(short) = arg.get_short() {
        opts.push(format!("-{short}"));
    }
    for alias in arg.get_visible_aliases().unwrap_or_default() {
        opts.push(format!("--{alias}"));
    }
    for alias in arg.get_visible_short_aliases().unwrap_or_default() {
        opts.push(format!("-{alias}"));
    }

    let count = matches!(arg.get_action(), ArgAction::Count);
    let is_flag = !count && !arg.get_action().takes_values();
    let choices: Vec<String> = if is_flag || count {
        Vec::new()
    } else {
        // read from the parser: the arg's own accessor is empty until the command is built
        arg.get_value_parser()
            .possible_values()
            .map(|values| {
                values
                    .filter(|value| !value.is_hide_set())
                    .map(|value| value.get_name().to_string())
                    .collect()
            })
            .unwrap_or_default()
    };
    let show_default = if default.is_some() && !arg.is_hide_default_value_set() {
        ShowDefault::Show
    } else {
        ShowDefault::Hide
    };

    Parameter::Option(OptionParam {
        name,
        opts,
        secondary_opts: Vec::new(),
        required: arg.is_required_set(),
        default,
        help,
        envvar,
        is_flag,
        count,
        metavar,
        choices: if choices.is_empty() {
            None
        } else {
            Some(choices)
        },
        show_default,
        hidden: arg.is_hide_set(),
    })
}

fn read_default(arg: &Arg) -> Option<DefaultValue> {
    let mut values: Vec<DefaultValue> = arg
        .get_default_values()
        .iter()
        .map(|value| DefaultValue::Text(value.to_string_lossy().into_owned()))
        .collect();
    match values.len() {
        0 => None,
        1 => values.pop(),
        _ => Some(DefaultValue::List(values)),
    }
}
