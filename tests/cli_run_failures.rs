//! Integration tests for `skiff deploy run` failure paths
//!
//! These runs all fail before any network connection is attempted, so they
//! exercise the real binary end to end without a remote host.

use std::fs;
use std::process::{Command, Stdio};

use tempfile::tempdir;

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_skiff")
}

fn run_in(dir: &std::path::Path) -> std::process::Output {
    Command::new(bin())
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .stdin(Stdio::null())
        .args(["deploy", "run"])
        .output()
        .unwrap()
}

#[test]
fn run_without_config_and_without_tty_fails() {
    let dir = tempdir().unwrap();

    // No config file: the tool falls into interactive creation, which cannot
    // prompt with stdin closed.
    let output = run_in(dir.path());

    assert!(!output.status.success());
    assert!(
        !dir.path().join("skiff-deploy.json").exists(),
        "no config may be written when creation never completed"
    );
}

#[test]
fn run_with_unreadable_config_fails_with_reason() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("skiff-deploy.json"), "{broken").unwrap();

    let output = run_in(dir.path());

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("cannot read config file"),
        "stderr: {stderr}"
    );
}

#[test]
fn run_with_missing_field_names_the_field() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("dist")).unwrap();
    fs::write(
        dir.path().join("skiff-deploy.json"),
        r#"{
            "username": "root",
            "password": "secret",
            "local_path": "./dist",
            "remote_path": "/srv/app"
        }"#,
    )
    .unwrap();

    let output = run_in(dir.path());

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("'host'"), "stderr: {stderr}");
}

#[test]
fn run_with_missing_local_path_fails_before_connecting() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("skiff-deploy.json"),
        r#"{
            "host": "192.0.2.1",
            "username": "root",
            "password": "secret",
            "local_path": "./does-not-exist",
            "remote_path": "/srv/app"
        }"#,
    )
    .unwrap();

    let output = run_in(dir.path());

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    // An InvalidLocalPath error, not a connection error: validation ran first
    assert!(stderr.contains("local path"), "stderr: {stderr}");
    assert!(!stderr.contains("cannot connect"), "stderr: {stderr}");
}

#[test]
fn run_with_local_path_that_is_a_file_fails() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("dist"), "not a directory").unwrap();
    fs::write(
        dir.path().join("skiff-deploy.json"),
        r#"{
            "host": "192.0.2.1",
            "username": "root",
            "password": "secret",
            "local_path": "./dist",
            "remote_path": "/srv/app"
        }"#,
    )
    .unwrap();

    let output = run_in(dir.path());

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("is not a directory"), "stderr: {stderr}");
}
