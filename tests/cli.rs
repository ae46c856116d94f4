//! Command-line smoke tests over template files in a temp directory

mod common;

use common::{INFRA, INFRA_WITH_EXPORT, SERVICES};
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn stackgraph(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_stackgraph"))
        .args(args)
        .env("XDG_CONFIG_HOME", dir)
        .env("HOME", dir)
        .output()
        .expect("binary runs")
}

fn write(dir: &Path, file: &str, text: &str) -> String {
    let path = dir.join(file);
    std::fs::write(&path, text).unwrap();
    path.display().to_string()
}

fn position(stdout: &str, id: &str) -> usize {
    stdout
        .lines()
        .position(|line| line.split_whitespace().next() == Some(id))
        .unwrap_or_else(|| panic!("{} missing from:\n{}", id, stdout))
}

#[test]
fn order_accepts_named_groups_and_file_stems() {
    let dir = TempDir::new().unwrap();
    let infra = write(dir.path(), "infra.yaml", INFRA);

    for input in [format!("infra={}", infra), infra.clone()] {
        let output = stackgraph(dir.path(), &["order", &input]);
        assert!(output.status.success(), "{:?}", output);
        let stdout = String::from_utf8(output.stdout).unwrap();
        assert!(position(&stdout, "infra/Queue") < position(&stdout, "infra/Subscription"));
        assert!(position(&stdout, "infra/Topic") < position(&stdout, "infra/Subscription"));
    }
}

#[test]
fn group_name_overrides_file_stem() {
    let dir = TempDir::new().unwrap();
    let infra = write(dir.path(), "infra.yaml", INFRA);

    let output = stackgraph(dir.path(), &["order", &format!("core={}", infra)]);
    assert!(output.status.success(), "{:?}", output);
    let stdout = String::from_utf8(output.stdout).unwrap();
    position(&stdout, "core/Queue");
    assert!(!stdout.contains("infra/"));
}

#[test]
fn edges_lists_cross_group_imports() {
    let dir = TempDir::new().unwrap();
    let infra = write(dir.path(), "infra.yaml", INFRA_WITH_EXPORT);
    let services = write(dir.path(), "services.yaml", SERVICES);

    let output = stackgraph(dir.path(), &["edges", &infra, &services, "--cross-group"]);
    assert!(output.status.success(), "{:?}", output);
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.lines().count(), 1, "{}", stdout);
    assert!(stdout.contains("services/Worker"));
    assert!(stdout.contains("infra/Topic"));
}

#[test]
fn move_writes_every_group() {
    let dir = TempDir::new().unwrap();
    let infra = write(dir.path(), "infra.yaml", INFRA);
    let out = dir.path().join("out");

    let output = stackgraph(
        dir.path(),
        &[
            "move",
            &infra,
            "--from",
            "infra/Subscription",
            "--to",
            "services/Subscription",
            "--out",
            &out.display().to_string(),
        ],
    );
    assert!(output.status.success(), "{:?}", output);
    assert!(out.join("infra.yaml").exists());
    assert!(out.join("services.yaml").exists());
}

#[test]
fn missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.yaml").display().to_string();

    let output = stackgraph(dir.path(), &["order", &missing]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Error: Failed to read"), "{}", stderr);
}
