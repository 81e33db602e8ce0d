//! Binary-level tests for the command-line front end.

use std::io::Write;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn gatewire() -> Command {
    let mut cmd = cargo_bin_cmd!("gatewire");
    cmd.env_remove("GATEWIRE_USERNAME")
        .env_remove("GATEWIRE_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

fn write_temp_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write temp config");
    file
}

#[test]
fn help_lists_commands() {
    gatewire()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("stream"))
        .stdout(predicate::str::contains("monitor"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn version_names_the_binary() {
    gatewire()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("gatewire"));
}

#[test]
fn check_config_summarizes_a_valid_file() {
    let file = write_temp_config(
        "[instrument]\nmarket = \"CME\"\nproduct = \"ES\"\ncontract = \"Jun13\"\n",
    );

    gatewire()
        .args(["check", "config", "--config"])
        .arg(file.path())
        .env("GATEWIRE_USERNAME", "trader")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file is valid"))
        .stdout(predicate::str::contains("CME Future ES Jun13"))
        .stdout(predicate::str::contains("GATEWIRE_USERNAME is set"))
        .stdout(predicate::str::contains("GATEWIRE_PASSWORD is not set"));
}

#[test]
fn check_config_fails_on_invalid_file() {
    let file = write_temp_config("[gateway]\nkind = \"websocket\"\nurl = \"http://example.com\"\n");

    gatewire()
        .args(["check", "config", "--config"])
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value for url"));
}

#[test]
fn check_config_fails_on_missing_file() {
    let dir = tempfile::tempdir().unwrap();

    gatewire()
        .args(["check", "config", "--config"])
        .arg(dir.path().join("absent.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read config file"));
}

#[test]
fn stream_without_username_fails_fast() {
    let dir = tempfile::tempdir().unwrap();

    gatewire()
        .args(["stream", "--config"])
        .arg(dir.path().join("absent.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("GATEWIRE_USERNAME"));
}

#[test]
fn stream_reports_unlisted_contract() {
    let file = write_temp_config("[sim]\ntick_interval_ms = 5\nseed = 1\n");

    gatewire()
        .args(["stream", "--contract", "Dec99", "--config"])
        .arg(file.path())
        .env("GATEWIRE_USERNAME", "trader")
        .env("GATEWIRE_PASSWORD", "secret")
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "Cannot find instrument: CME Future ES Dec99 is not listed",
        ));
}
