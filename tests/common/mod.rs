//! Shared test infrastructure for integration tests.
#![allow(dead_code)]

use clidoc::document::render_nodes;
use clidoc::{BuildEnv, CliDirective, DirectiveError, DirectiveOptions, ManifestLoader, RstParser};
use std::env;
use std::fs;
use std::path::PathBuf;

pub fn manifest_dir() -> PathBuf {
    PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".into()))
}

/// Manifest modules used by the tests (`sample:<attr>`).
pub fn fixtures_dir() -> PathBuf {
    manifest_dir().join("tests/fixtures")
}

pub fn fixture_loader() -> ManifestLoader {
    ManifestLoader::new(fixtures_dir())
}

/// Run one directive against the fixture manifests in a fresh document.
pub fn run_directive(
    reference: &str,
    options: &[(&str, Option<&str>)],
) -> (BuildEnv, Result<Vec<String>, DirectiveError>) {
    let mut env = BuildEnv::default();
    env.begin_document("index");
    let result = DirectiveOptions::parse(options.iter().copied()).and_then(|options| {
        CliDirective {
            argument: reference.to_string(),
            options,
            lineno: 1,
            content_offset: 2,
        }
        .run(&mut env, &fixture_loader(), &RstParser)
    });
    let lines = result.map(|nodes| render_nodes(&nodes, ""));
    (env, lines)
}

/// Rendered lines of a directive that is expected to succeed.
pub fn render(reference: &str, options: &[(&str, Option<&str>)]) -> Vec<String> {
    let (_, result) = run_directive(reference, options);
    result.unwrap_or_else(|err| panic!("render {reference}: {err}"))
}

/// Compare rendered lines with `tests/golden/<name>.rst`.
pub fn assert_golden(name: &str, lines: &[String]) {
    let path = manifest_dir().join("tests/golden").join(format!("{name}.rst"));
    let expected = fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("read golden {}: {err}", path.display()));
    let actual = lines.join("\n");
    assert_eq!(expected.trim_end(), actual.trim_end(), "golden {name}");
}
