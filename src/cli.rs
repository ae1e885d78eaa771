//! CLI argument parsing for the clidoc binary.
//!
//! The binary is a thin wrapper over the library: `render` prints the lines
//! one directive would generate, `build` expands a whole document.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "clidoc",
    version,
    about = "Render command-line interfaces as reStructuredText",
    after_help = "Examples:\n  clidoc render clidoc:cli --prog clidoc --nested full\n  clidoc render docs.cli:app --prog app --commands build,serve\n  clidoc build docs/usage.rst --out _build/usage.rst\n  clidoc init-config --out clidoc.json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Config file (defaults to ./clidoc.json when present)
    #[arg(long, global = true, value_name = "PATH", env = "CLIDOC_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Render(RenderArgs),
    Build(BuildArgs),
    InitConfig(InitConfigArgs),
}

/// Inputs for rendering a single command reference.
#[derive(Parser, Debug)]
#[command(about = "Print the markup generated for one command")]
pub struct RenderArgs {
    /// Command reference in `module:attribute` form
    #[arg(value_name = "MODULE:ATTR")]
    pub reference: String,

    /// Program name shown for the root command
    #[arg(long)]
    pub prog: Option<String>,

    /// Sub-command detail: full, short or none
    #[arg(long, value_name = "MODE")]
    pub nested: Option<String>,

    /// Comma-separated sub-commands to include, in order
    #[arg(long, value_name = "LIST")]
    pub commands: Option<String>,

    /// Deprecated alias for `--nested full`
    #[arg(long)]
    pub show_nested: bool,
}

/// Inputs for expanding the directives of one document.
#[derive(Parser, Debug)]
#[command(about = "Expand clidoc directives in a reStructuredText document")]
pub struct BuildArgs {
    /// Source document
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output path (defaults to stdout)
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Document name used for targets and warnings (defaults to the file stem)
    #[arg(long, value_name = "NAME")]
    pub docname: Option<String>,
}

#[derive(Parser, Debug)]
#[command(about = "Write a config stub")]
pub struct InitConfigArgs {
    /// Output path (defaults to stdout)
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        RootArgs::command().debug_assert();
    }

    #[test]
    fn config_flag_is_global() {
        let args = RootArgs::try_parse_from([
            "clidoc",
            "render",
            "clidoc:cli",
            "--prog",
            "clidoc",
            "--config",
            "docs/clidoc.json",
        ])
        .expect("parse args");
        assert_eq!(args.config, Some(PathBuf::from("docs/clidoc.json")));
        match args.command {
            Command::Render(render) => {
                assert_eq!(render.reference, "clidoc:cli");
                assert_eq!(render.prog.as_deref(), Some("clidoc"));
                assert!(!render.show_nested);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
