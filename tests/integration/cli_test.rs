//! Tests for the `sqlrun` binary.
//!
//! None of these reach a database: they stop at argument parsing, at script
//! discovery, at the confirmation gate, or at a refused connection.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

/// The binary, pointed at a config file that does not exist.
fn sqlrun(config_dir: &TempDir) -> Command {
    sqlrun_with_config(&config_dir.path().join("missing.toml"))
}

fn sqlrun_with_config(config_path: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sqlrun").unwrap();
    cmd.env("SQLRUN_CONFIG", config_path)
        .env_remove("RUST_LOG")
        .env_remove("PGPORT");
    cmd
}

fn write_script(dir: &Path, name: &str) {
    fs::write(dir.join(name), "select 1 as x").unwrap();
}

#[test]
fn test_help_lists_options() {
    let config = tempdir().unwrap();
    sqlrun(&config)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--server"))
        .stdout(predicate::str::contains("--database"))
        .stdout(predicate::str::contains("--credentials"));
}

#[test]
fn test_missing_required_args_is_usage_error() {
    let config = tempdir().unwrap();
    sqlrun(&config)
        .arg("queries")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--server"));
}

#[test]
fn test_invalid_format_is_rejected() {
    let config = tempdir().unwrap();
    let scripts = tempdir().unwrap();
    sqlrun(&config)
        .arg(scripts.path())
        .args(["-S", "localhost", "-d", "db", "-f", "json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("json"));
}

#[test]
fn test_missing_directory_fails() {
    let config = tempdir().unwrap();
    let scripts = tempdir().unwrap();
    sqlrun(&config)
        .arg(scripts.path().join("nowhere"))
        .args(["-S", "localhost", "-d", "db"])
        .write_stdin("y\n")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Run these scripts?").not())
        .stderr(predicate::str::contains("Script directory not found"));
}

#[test]
fn test_decline_writes_nothing() {
    let config = tempdir().unwrap();
    let scripts = tempdir().unwrap();
    write_script(scripts.path(), "report.sql");

    sqlrun(&config)
        .arg(scripts.path())
        .args(["-S", "127.0.0.1", "-p", "1", "-d", "db"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("report.sql"))
        .stdout(predicate::str::contains("Cancelled. Nothing was executed."));

    assert!(!scripts.path().join("report.csv").exists());
}

#[test]
fn test_closed_stdin_declines() {
    let config = tempdir().unwrap();
    let scripts = tempdir().unwrap();
    write_script(scripts.path(), "report.sql");

    sqlrun(&config)
        .arg(scripts.path())
        .args(["-S", "127.0.0.1", "-p", "1", "-d", "db"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cancelled"));
}

#[test]
fn test_unreachable_server_fails_after_confirmation() {
    let config = tempdir().unwrap();
    let scripts = tempdir().unwrap();
    write_script(scripts.path(), "report.sql");

    sqlrun(&config)
        .arg(scripts.path())
        .args(["-S", "127.0.0.1", "-p", "1", "-d", "db", "-f", "table"])
        .write_stdin("y\n")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Connection Error"))
        .stderr(predicate::str::contains("db @ 127.0.0.1:1 as integrated identity"));

    assert!(!scripts.path().join("report.txt").exists());
}

#[test]
fn test_config_file_supplies_instance_port() {
    let config = tempdir().unwrap();
    let config_path = config.path().join("config.toml");
    fs::write(&config_path, "[instances]\nreporting = 1\n").unwrap();
    let scripts = tempdir().unwrap();

    sqlrun_with_config(&config_path)
        .arg(scripts.path())
        .args(["-S", r"127.0.0.1\reporting", "-d", "db"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(r"127.0.0.1\reporting"))
        .stdout(predicate::str::contains("(no script files found)"));
}

#[test]
fn test_unknown_instance_is_a_config_error() {
    let config = tempdir().unwrap();
    let scripts = tempdir().unwrap();

    sqlrun(&config)
        .arg(scripts.path())
        .args(["-S", r"127.0.0.1\nosuch", "-d", "db"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration Error"));
}
