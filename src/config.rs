//! Build configuration helpers.
//!
//! The config is optional: a missing `clidoc.json` yields the defaults, so a
//! bare document can be expanded without any setup.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_SCHEMA_VERSION: u32 = 1;
pub const CONFIG_FILE_NAME: &str = "clidoc.json";

const DEFAULT_DIRECTIVE: &str = "clidoc";
const DEFAULT_TARGET_PREFIX: &str = "cli";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub schema_version: u32,
    /// Directive name recognized in documents (`.. <directive>:: module:attr`).
    #[serde(default = "default_directive")]
    pub directive: String,
    /// Directory manifests are resolved against.
    #[serde(default = "default_module_root")]
    pub module_root: PathBuf,
    /// Prefix of generated target ids (`<prefix>-<serial>`).
    #[serde(default = "default_target_prefix")]
    pub target_prefix: String,
}

fn default_directive() -> String {
    DEFAULT_DIRECTIVE.to_string()
}

fn default_module_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_target_prefix() -> String {
    DEFAULT_TARGET_PREFIX.to_string()
}

impl Default for Config {
    fn default() -> Self {
        default_config()
    }
}

pub fn default_config() -> Config {
    Config {
        schema_version: CONFIG_SCHEMA_VERSION,
        directive: default_directive(),
        module_root: default_module_root(),
        target_prefix: default_target_prefix(),
    }
}

/// Render a pretty JSON config stub.
pub fn config_stub() -> Result<String> {
    serde_json::to_string_pretty(&default_config()).context("serialize config stub")
}

/// Load a config file, or the defaults when `path` is `None` and no
/// `clidoc.json` exists in the working directory.
///
/// A relative `module_root` is resolved against the config file's directory.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let candidate = PathBuf::from(CONFIG_FILE_NAME);
            if !candidate.is_file() {
                return Ok(default_config());
            }
            candidate
        }
    };
    let bytes = fs::read(&path).with_context(|| format!("read config {}", path.display()))?;
    let mut config: Config = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config JSON {}", path.display()))?;
    validate_config(&config)?;
    if config.module_root.is_relative() {
        if let Some(parent) = path.parent() {
            config.module_root = parent.join(&config.module_root);
        }
    }
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

pub fn validate_config(config: &Config) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {}",
            config.schema_version
        ));
    }
    if !is_identifier(&config.directive) {
        return Err(anyhow!(
            "directive must be a non-empty name of letters, digits, '-' or '_' (got {:?})",
            config.directive
        ));
    }
    if !is_identifier(&config.target_prefix) {
        return Err(anyhow!(
            "target_prefix must be a non-empty name of letters, digits, '-' or '_' (got {:?})",
            config.target_prefix
        ));
    }
    Ok(())
}

fn is_identifier(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
}
