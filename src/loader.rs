//! Resolution of `module:attribute` references to command trees.

use crate::manifest::CommandManifest;
use crate::model::CommandNode;
use anyhow::{anyhow, Context};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A loaded module attribute.
#[derive(Debug, Clone)]
pub enum Attribute {
    Command(CommandNode),
    /// Anything that is not a command, described by its type name.
    Other(String),
}

/// Attributes exported by one loaded module.
#[derive(Debug, Clone, Default)]
pub struct Module {
    attributes: BTreeMap<String, Attribute>,
}

impl Module {
    pub fn insert(&mut self, name: impl Into<String>, attribute: Attribute) {
        self.attributes.insert(name.into(), attribute);
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no module named \"{0}\"")]
    NotFound(String),
    #[error("{0:#}")]
    Failed(anyhow::Error),
    #[error("the module aborted while loading: {0}")]
    Aborted(String),
}

pub trait ModuleLoader {
    fn load(&self, module: &str) -> Result<Module, LoadError>;
}

/// Loads JSON command manifests below a root directory.
///
/// `docs.cli` resolves to `<root>/docs/cli.json`; a name ending in `.json` is
/// taken as a path relative to the root. Top-level keys are attributes.
#[derive(Debug, Clone)]
pub struct ManifestLoader {
    root: PathBuf,
}

impl ManifestLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn module_path(&self, module: &str) -> PathBuf {
        if module.ends_with(".json") {
            return self.root.join(module);
        }
        self.root.join(format!("{}.json", module.replace('.', "/")))
    }
}

impl ModuleLoader for ManifestLoader {
    fn load(&self, module: &str) -> Result<Module, LoadError> {
        let path = self.module_path(module);
        if !path.is_file() {
            return Err(LoadError::NotFound(module.to_string()));
        }
        load_manifest_file(&path).map_err(LoadError::Failed)
    }
}

fn load_manifest_file(path: &Path) -> anyhow::Result<Module> {
    let bytes = fs::read(path).with_context(|| format!("read manifest {}", path.display()))?;
    let value: Value = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse manifest JSON {}", path.display()))?;
    let Value::Object(entries) = value else {
        return Err(anyhow!(
            "manifest {} must be a JSON object of attributes",
            path.display()
        ));
    };

    let mut module = Module::default();
    for (name, value) in entries {
        let attribute = match value {
            Value::Object(_) => {
                let manifest: CommandManifest = serde_json::from_value(value)
                    .with_context(|| format!("parse command \"{name}\" in {}", path.display()))?;
                Attribute::Command(manifest.into_command())
            }
            other => Attribute::Other(json_type_name(&other).to_string()),
        };
        module.insert(name, attribute);
    }
    tracing::debug!(path = %path.display(), "loaded manifest");
    Ok(module)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

type CommandFactory = Box<dyn Fn() -> CommandNode + Send + Sync>;

enum RegistryEntry {
    Command(CommandFactory),
    Other(String),
}

/// In-process modules whose attributes are built on load.
///
/// A factory that panics aborts the whole module load.
#[derive(Default)]
pub struct RegistryLoader {
    modules: BTreeMap<String, BTreeMap<String, RegistryEntry>>,
}

impl RegistryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_command<F>(&mut self, module: &str, attribute: &str, factory: F)
    where
        F: Fn() -> CommandNode + Send + Sync + 'static,
    {
        self.modules
            .entry(module.to_string())
            .or_default()
            .insert(attribute.to_string(), RegistryEntry::Command(Box::new(factory)));
    }

    pub fn register_other(&mut self, module: &str, attribute: &str, type_name: &str) {
        self.modules
            .entry(module.to_string())
            .or_default()
            .insert(
                attribute.to_string(),
                RegistryEntry::Other(type_name.to_string()),
            );
    }
}

impl ModuleLoader for RegistryLoader {
    fn load(&self, module: &str) -> Result<Module, LoadError> {
        let entries = self
            .modules
            .get(module)
            .ok_or_else(|| LoadError::NotFound(module.to_string()))?;
        let mut loaded = Module::default();
        for (name, entry) in entries {
            let attribute = match entry {
                RegistryEntry::Command(factory) => {
                    let command = panic::catch_unwind(AssertUnwindSafe(factory.as_ref()))
                        .map_err(|payload| LoadError::Aborted(panic_message(payload.as_ref())))?;
                    Attribute::Command(command)
                }
                RegistryEntry::Other(type_name) => Attribute::Other(type_name.clone()),
            };
            loaded.insert(name.clone(), attribute);
        }
        Ok(loaded)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "unknown panic".to_string()
}

/// Tries each loader in turn; the first one that knows the module wins.
#[derive(Default)]
pub struct ChainLoader {
    loaders: Vec<Box<dyn ModuleLoader>>,
}

impl ChainLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, loader: impl ModuleLoader + 'static) -> Self {
        self.loaders.push(Box::new(loader));
        self
    }
}

impl ModuleLoader for ChainLoader {
    fn load(&self, module: &str) -> Result<Module, LoadError> {
        for loader in &self.loaders {
            match loader.load(module) {
                Err(LoadError::NotFound(_)) => continue,
                result => return result,
            }
        }
        Err(LoadError::NotFound(module.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_manifest(dir: &Path, rel: &str, body: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create dirs");
        }
        let mut file = fs::File::create(path).expect("create manifest");
        file.write_all(body.as_bytes()).expect("write manifest");
    }

    #[test]
    fn manifest_modules_resolve_dotted_names() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_manifest(
            dir.path(),
            "docs/cli.json",
            r#"{"app": {"name": "app"}, "version": "1.0"}"#,
        );
        let loader = ManifestLoader::new(dir.path());
        let module = loader.load("docs.cli").expect("load");
        assert!(matches!(module.get("app"), Some(Attribute::Command(cmd)) if cmd.name == "app"));
        assert!(matches!(module.get("version"), Some(Attribute::Other(kind)) if kind == "string"));
        assert!(module.get("missing").is_none());
    }

    #[test]
    fn manifest_parse_errors_carry_context() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_manifest(dir.path(), "broken.json", "{not json");
        let loader = ManifestLoader::new(dir.path());
        let err = loader.load("broken").unwrap_err();
        assert!(matches!(err, LoadError::Failed(_)));
        assert!(err.to_string().contains("parse manifest JSON"));
    }

    #[test]
    fn registry_reports_panicking_factory() {
        let mut registry = RegistryLoader::new();
        registry.register_command("app", "cli", || panic!("exit requested"));
        match registry.load("app") {
            Err(LoadError::Aborted(message)) => assert_eq!(message, "exit requested"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn chain_falls_through_unknown_modules() {
        let mut registry = RegistryLoader::new();
        registry.register_command("app", "cli", || CommandNode::new("cli"));
        let chain = ChainLoader::new()
            .with(ManifestLoader::new("/nonexistent"))
            .with(registry);
        assert!(chain.load("app").is_ok());
        assert!(matches!(chain.load("nope"), Err(LoadError::NotFound(_))));
    }
}
