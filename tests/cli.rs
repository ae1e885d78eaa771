//! End-to-end runs of the `clidoc` binary.

mod common;

use common::fixtures_dir;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn clidoc(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_clidoc"))
        .args(args)
        .current_dir(cwd)
        .env_remove("CLIDOC_CONFIG")
        .env("CLIDOC_LOG", "off")
        .output()
        .expect("run clidoc")
}

fn write_config(dir: &Path) -> String {
    let config = serde_json::json!({
        "schema_version": 1,
        "module_root": fixtures_dir(),
    });
    let path = dir.join("clidoc.json");
    fs::write(&path, config.to_string()).expect("write config");
    path.display().to_string()
}

#[test]
fn renders_its_own_command_tree() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let output = clidoc(
        &["render", "clidoc:cli", "--prog", "clidoc", "--nested", "short"],
        temp_dir.path(),
    );
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8(output.stdout).expect("utf8 stdout");
    assert!(stdout.contains(".. program:: clidoc\n"));
    assert!(stdout.contains(".. object:: render\n"));
    assert!(stdout.contains(".. object:: init-config\n"));
    assert!(stdout.contains(".. envvar:: CLIDOC_CONFIG\n"));
}

#[test]
fn render_reports_directive_errors() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let output = clidoc(&["render", "clidoc:cli"], temp_dir.path());
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(":prog: must be specified"), "{stderr}");
}

#[test]
fn builds_document_with_manifest_modules() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let config = write_config(temp_dir.path());
    let input = temp_dir.path().join("usage.rst");
    fs::write(
        &input,
        "Usage\n=====\n\n.. clidoc:: sample:group\n   :prog: cli\n   :nested: full\n\n.. clidoc:: sample:missing\n   :prog: cli\n",
    )
    .expect("write document");
    let out = temp_dir.path().join("build/usage.rst");

    let output = clidoc(
        &[
            "--config",
            &config,
            "build",
            input.to_str().expect("utf8 path"),
            "--out",
            out.to_str().expect("utf8 path"),
        ],
        temp_dir.path(),
    );
    assert!(output.status.success(), "{output:?}");

    let expanded = fs::read_to_string(&out).expect("read output");
    assert!(expanded.starts_with("Usage\n=====\n\n.. _cli-0:\n"));
    assert!(expanded.contains(".. program:: cli hello\n"));
    assert!(expanded.contains(".. error::\n\n   Module \"sample\" has no attribute \"missing\"\n"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("usage: 1 warning(s)"), "{stderr}");
}

#[test]
fn init_config_writes_loadable_stub() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let output = clidoc(&["init-config", "--out", "clidoc.json"], temp_dir.path());
    assert!(output.status.success(), "{output:?}");

    let stub = fs::read_to_string(temp_dir.path().join("clidoc.json")).expect("read stub");
    let value: serde_json::Value = serde_json::from_str(&stub).expect("parse stub");
    assert_eq!(value["directive"], "clidoc");
    assert_eq!(value["target_prefix"], "cli");

    let again = clidoc(&["init-config", "--out", "clidoc.json"], temp_dir.path());
    assert!(!again.status.success());
}
