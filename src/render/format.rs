use super::context::RenderContext;
use super::text::{indent, mark_verbatim_blocks, string2lines};
use crate::model::{ArgumentParam, CommandNode, OptionParam, Parameter, ShowDefault};

/// Help text of a command, rendered as markup so it can carry rich content.
pub(super) fn format_description(ctx: &RenderContext<'_>) -> Vec<String> {
    let Some(help) = ctx.command.description().filter(|text| !text.is_empty()) else {
        return Vec::new();
    };
    let mut lines = mark_verbatim_blocks(string2lines(help));
    lines.push(String::new());
    lines
}

pub(super) fn format_usage(ctx: &RenderContext<'_>) -> Vec<String> {
    let path = ctx.command_path();
    let pieces = ctx.command.usage_pieces();
    let usage = if pieces.is_empty() {
        path
    } else {
        format!("{} {}", path, pieces.join(" "))
    };

    let mut lines = vec![".. code-block:: shell".to_string(), String::new()];
    lines.extend(usage.lines().map(|line| indent(line, 1)));
    lines.push(String::new());
    lines
}

pub(super) fn format_option(opt: &OptionParam) -> Vec<String> {
    let (label, body) = option_help_record(opt);
    let mut lines = vec![format!(".. option:: {label}")];
    if !body.is_empty() {
        lines.push(String::new());
        lines.extend(string2lines(&body).iter().map(|line| indent(line, 1)));
    }
    lines
}

pub(super) fn format_options(ctx: &RenderContext<'_>) -> Vec<String> {
    let mut lines = Vec::new();
    for opt in ctx.command.visible_options() {
        lines.extend(format_option(opt));
        lines.push(String::new());
    }
    lines
}

/// Label and body of an `option` entry.
///
/// Spellings are comma separated and value placeholders are wrapped in angle
/// brackets, which is what the `option` directive expects.
fn option_help_record(opt: &OptionParam) -> (String, String) {
    let mut labels = vec![write_opts(opt, &opt.opts)];
    if !opt.secondary_opts.is_empty() {
        labels.push(write_opts(opt, &opt.secondary_opts));
    }

    let help = opt.help.as_deref().filter(|text| !text.is_empty());
    let mut out = Vec::new();
    match (help, opt.required) {
        (Some(help), true) => out.push(format!("**Required** {help}")),
        (Some(help), false) => out.push(help.to_string()),
        (None, true) => out.push("**Required**".to_string()),
        (None, false) => {}
    }

    let mut extras = Vec::new();
    if let Some(default) = &opt.default {
        match &opt.show_default {
            ShowDefault::Override(text) if !text.is_empty() => {
                extras.push(format!(":default: {text}"));
            }
            ShowDefault::Show => extras.push(format!(":default: {default}")),
            _ => {}
        }
    }
    if let Some(choices) = &opt.choices {
        extras.push(format!(":options: {}", choices.join(" | ")));
    }

    if !extras.is_empty() {
        if !out.is_empty() {
            out.push(String::new());
        }
        out.extend(extras);
    }

    (labels.join(", "), out.join("\n"))
}

fn write_opts(opt: &OptionParam, spellings: &[String]) -> String {
    let mut rv = join_options(spellings);
    if opt.takes_value() {
        let name = match &opt.metavar {
            Some(metavar) => metavar
                .trim_start_matches(['<', '[', '{', '(', '$'])
                .trim_end_matches(['>', ']', '}', ')', '$']),
            None => opt.name.as_str(),
        };
        rv.push_str(&format!(" <{name}>"));
    }
    rv
}

/// Join spellings with shorter prefixes (`-f`) ahead of longer ones (`--foo`).
fn join_options(spellings: &[String]) -> String {
    let mut ordered: Vec<&String> = spellings.iter().collect();
    ordered.sort_by_key(|opt| prefix_len(opt));
    ordered
        .iter()
        .map(|opt| opt.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn prefix_len(opt: &str) -> usize {
    let mut chars = opt.chars();
    let Some(first) = chars.next() else {
        return 0;
    };
    if first.is_alphanumeric() {
        return 0;
    }
    if chars.next() == Some(first) {
        return 2 * first.len_utf8();
    }
    first.len_utf8()
}

pub(super) fn format_argument(arg: &ArgumentParam) -> Vec<String> {
    let noun = if arg.nargs == 1 {
        "argument"
    } else {
        "argument(s)"
    };
    let mut lines = vec![
        format!(".. option:: {}", arg.human_readable_name()),
        String::new(),
    ];
    if arg.required {
        lines.push(indent(&format!("Required {noun}."), 1));
    } else {
        let default = arg
            .default
            .as_ref()
            .map(|value| value.repr())
            .unwrap_or_else(|| "None".to_string());
        lines.push(indent(&format!("Optional {noun}."), 1));
        lines.push(indent(&format!("Default ``{default}``"), 1));
    }
    lines
}

pub(super) fn format_arguments(ctx: &RenderContext<'_>) -> Vec<String> {
    let mut lines = Vec::new();
    for arg in ctx.command.arguments() {
        lines.extend(format_argument(arg));
        lines.push(String::new());
    }
    lines
}

pub(super) fn format_envvar(param: &Parameter, envvar: &str) -> Vec<String> {
    // Options may carry several spellings; the first declared one is the reference.
    let param_ref = match param {
        Parameter::Argument(arg) => arg.human_readable_name(),
        Parameter::Option(opt) => opt
            .opts
            .first()
            .cloned()
            .unwrap_or_else(|| opt.name.clone()),
    };
    vec![
        format!(".. envvar:: {envvar}"),
        "   :noindex:".to_string(),
        String::new(),
        indent(&format!("Provides a default for :option:`{param_ref}`"), 1),
    ]
}

pub(super) fn format_envvars(ctx: &RenderContext<'_>) -> Vec<String> {
    let anchor_path = ctx.anchor_path();
    let mut lines = Vec::new();
    for param in ctx.command.params.iter().filter(|param| !param.is_hidden()) {
        let Some(envvar) = param.envvar() else {
            continue;
        };
        lines.push(format!(".. _{}-{}-{}:", anchor_path, param.name(), envvar));
        lines.push(String::new());
        lines.extend(format_envvar(param, envvar));
        lines.push(String::new());
    }
    lines
}

/// One-line stub for a sub-command listed under its parent.
pub(super) fn format_subcommand(command: &CommandNode) -> Vec<String> {
    let mut lines = vec![format!(".. object:: {}", command.name)];
    let Some(help) = command.help.as_deref().filter(|text| !text.is_empty()) else {
        return lines;
    };
    lines.push(String::new());
    lines.extend(string2lines(help).iter().map(|line| indent(line, 1)));
    lines
}

pub(super) fn format_epilog(ctx: &RenderContext<'_>) -> Vec<String> {
    let Some(epilog) = ctx.command.epilog.as_deref().filter(|text| !text.is_empty()) else {
        return Vec::new();
    };
    let mut lines = string2lines(epilog);
    lines.push(String::new());
    lines
}
