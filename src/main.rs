use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser};
use clidoc::cli::{BuildArgs, Command, InitConfigArgs, RenderArgs, RootArgs};
use clidoc::config::{config_stub, load_config, Config};
use clidoc::document::render_nodes;
use clidoc::{
    clap_reader, expand_document, BuildEnv, ChainLoader, CliDirective, DirectiveOptions,
    ManifestLoader, RegistryLoader, RstParser,
};
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "CLIDOC_LOG";

fn main() -> Result<()> {
    init_tracing();
    let args = RootArgs::parse();

    match args.command {
        Command::Render(cmd) => cmd_render(args.config.as_deref(), cmd),
        Command::Build(cmd) => cmd_build(args.config.as_deref(), cmd),
        Command::InitConfig(cmd) => cmd_init_config(cmd),
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
}

/// Manifests under the configured root, plus this binary's own command tree
/// as `clidoc:cli`.
fn build_loader(config: &Config) -> ChainLoader {
    let mut builtin = RegistryLoader::new();
    builtin.register_command("clidoc", "cli", || {
        clap_reader::read_command(&RootArgs::command())
    });
    ChainLoader::new()
        .with(builtin)
        .with(ManifestLoader::new(config.module_root.clone()))
}

fn cmd_render(config_path: Option<&Path>, args: RenderArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let loader = build_loader(&config);

    let mut raw: Vec<(&str, Option<&str>)> = Vec::new();
    if let Some(prog) = args.prog.as_deref() {
        raw.push(("prog", Some(prog)));
    }
    if let Some(nested) = args.nested.as_deref() {
        raw.push(("nested", Some(nested)));
    }
    if let Some(commands) = args.commands.as_deref() {
        raw.push(("commands", Some(commands)));
    }
    if args.show_nested {
        raw.push(("show-nested", None));
    }
    let options = DirectiveOptions::parse(raw).context("parse render options")?;

    let mut env = BuildEnv::new(config);
    env.begin_document("render");
    let directive = CliDirective {
        argument: args.reference.clone(),
        options,
        lineno: 1,
        content_offset: 1,
    };
    let nodes = directive
        .run(&mut env, &loader, &RstParser)
        .with_context(|| format!("render {}", args.reference))?;

    for line in render_nodes(&nodes, "") {
        println!("{line}");
    }
    Ok(())
}

fn cmd_build(config_path: Option<&Path>, args: BuildArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let loader = build_loader(&config);
    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("read document {}", args.input.display()))?;
    let docname = match args.docname {
        Some(docname) => docname,
        None => args
            .input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow!("cannot derive a docname from {}", args.input.display()))?,
    };

    let mut env = BuildEnv::new(config);
    let expanded = expand_document(&mut env, &loader, &RstParser, &docname, &source);

    match args.out {
        Some(out) => {
            if let Some(parent) = out.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
            fs::write(&out, expanded).with_context(|| format!("write {}", out.display()))?;
        }
        None => print!("{expanded}"),
    }

    let warnings = env.warnings().len();
    if warnings > 0 {
        eprintln!("{docname}: {warnings} warning(s)");
    }
    Ok(())
}

fn cmd_init_config(args: InitConfigArgs) -> Result<()> {
    let stub = config_stub()?;
    let Some(out) = args.out else {
        println!("{stub}");
        return Ok(());
    };
    if out.exists() && !args.force {
        return Err(anyhow!(
            "{} already exists (use --force to overwrite)",
            out.display()
        ));
    }
    fs::write(&out, format!("{stub}\n")).with_context(|| format!("write {}", out.display()))?;
    Ok(())
}
