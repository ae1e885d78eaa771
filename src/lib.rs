//! Render command-line interfaces as reStructuredText.
//!
//! A command tree (read from a `clap::Command` or a JSON manifest) is turned
//! into directive markup: a description, usage block, options, arguments,
//! environment variables, epilog and sub-commands, plus cross-reference
//! targets registered with the build environment.

pub mod clap_reader;
pub mod cli;
pub mod config;
pub mod directive;
pub mod document;
pub mod env;
pub mod error;
pub mod loader;
pub mod manifest;
pub mod model;
pub mod render;

pub use directive::{CliDirective, DirectiveOptions, NodeGenerator};
pub use document::expand_document;
pub use env::{BuildEnv, Fragment, MarkupParser, Node, NodeRegistry, RstParser, Target};
pub use error::DirectiveError;
pub use loader::{
    Attribute, ChainLoader, LoadError, ManifestLoader, Module, ModuleLoader, RegistryLoader,
};
pub use model::{
    ArgumentParam, CommandNode, DefaultValue, LazyGroup, OptionParam, Parameter, ShowDefault,
    SubCommands,
};
pub use render::{filter_commands, format_command, NestedMode, RenderContext};
