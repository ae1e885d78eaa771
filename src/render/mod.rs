//! Deterministic reStructuredText renderer for a command tree.
//!
//! Output depends only on the command, the nesting mode, and the command
//! filter: sub-commands are ordered by name or by the filter list, parameters
//! by declaration.

use crate::error::DirectiveError;
use crate::model::CommandNode;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

mod context;
mod format;
mod text;

pub use context::RenderContext;
use format::{
    format_arguments, format_description, format_envvars, format_epilog, format_options,
    format_subcommand, format_usage,
};

/// How much sub-command detail one rendering pass discloses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NestedMode {
    /// Sub-commands get their own sections, generated by the caller.
    Full,
    /// Sub-commands are listed as one-line stubs.
    #[default]
    Short,
    /// Sub-commands are omitted.
    None,
}

impl NestedMode {
    pub const VALUES: [&'static str; 3] = ["full", "short", "none"];

    pub fn as_str(self) -> &'static str {
        match self {
            NestedMode::Full => "full",
            NestedMode::Short => "short",
            NestedMode::None => "none",
        }
    }
}

impl fmt::Display for NestedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NestedMode {
    type Err = DirectiveError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "full" => Ok(NestedMode::Full),
            "short" => Ok(NestedMode::Short),
            "none" => Ok(NestedMode::None),
            other => Err(DirectiveError::InvalidOptionValue {
                option: "nested".to_string(),
                message: format!(
                    "\"{other}\" is not a valid value for ':nested:'; allowed values: {}",
                    format_values(&NestedMode::VALUES)
                ),
            }),
        }
    }
}

/// `"a", "b", or "c"`
fn format_values(values: &[&str]) -> String {
    match values.split_last() {
        Some((last, [])) => format!("\"{last}\""),
        Some((last, rest)) => {
            let quoted: Vec<String> = rest.iter().map(|value| format!("\"{value}\"")).collect();
            format!("{}, or \"{last}\"", quoted.join(", "))
        }
        None => String::new(),
    }
}

/// Sub-commands of the context's command, optionally restricted and ordered by
/// a comma-separated list of names.
///
/// Names missing from the command are dropped; repeated names keep their first
/// position.
pub fn filter_commands(ctx: &RenderContext<'_>, commands: Option<&str>) -> Vec<CommandNode> {
    let lookup = ctx.command.subcommands.resolve();
    let Some(commands) = commands else {
        return lookup.into_values().collect();
    };
    let mut seen = BTreeSet::new();
    commands
        .split(',')
        .map(str::trim)
        .filter(|name| seen.insert(*name))
        .filter_map(|name| lookup.get(name).cloned())
        .collect()
}

/// Assemble the full line sequence for one command.
pub fn format_command(
    ctx: &RenderContext<'_>,
    nested: NestedMode,
    commands: Option<&str>,
) -> Vec<String> {
    if ctx.command.hidden {
        return Vec::new();
    }

    let mut lines = format_description(ctx);
    lines.push(format!(".. program:: {}", ctx.command_path()));
    lines.extend(format_usage(ctx));

    // rubrics separate sections without adding entries to the table of contents
    append_section(&mut lines, "Options", format_options(ctx));
    append_section(&mut lines, "Arguments", format_arguments(ctx));
    append_section(&mut lines, "Environment variables", format_envvars(ctx));
    lines.extend(format_epilog(ctx));

    if nested != NestedMode::Short {
        return lines;
    }

    let mut stubs = Vec::new();
    for command in filter_commands(ctx, commands) {
        if command.hidden {
            continue;
        }
        stubs.extend(format_subcommand(&command));
        stubs.push(String::new());
    }
    append_section(&mut lines, "Commands", stubs);
    lines
}

fn append_section(out: &mut Vec<String>, title: &str, body: Vec<String>) {
    if body.is_empty() {
        return;
    }
    out.push(format!(".. rubric:: {title}"));
    out.push(String::new());
    out.extend(body);
}
