//! Integration tests for the `ihcd` binary: argument parsing, help output,
//! and configuration checking -- no controller required.
#![allow(clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;

/// Build a command for the `ihcd` binary with env isolation.
fn ihcd_cmd() -> Command {
    let mut cmd = Command::cargo_bin("ihcd").unwrap();
    cmd.env_remove("IHCD_LOG")
        .env_remove("IHCD_ENGINE__PACING_SECS")
        .env_remove("IHCD_ENGINE__NOTIFICATION_TIMEOUT_SECS");
    cmd
}

#[test]
fn help_describes_the_daemon() {
    ihcd_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("IHC")
            .and(predicate::str::contains("--config"))
            .and(predicate::str::contains("--check")),
    );
}

#[test]
fn version_flag() {
    ihcd_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ihcd"));
}

#[test]
fn check_accepts_a_valid_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ihcd.toml");
    std::fs::write(
        &path,
        r#"
        [[devices]]
        device_id = "0001E4C0"
        kind = "dimmer"
        serial_number = "4242"

        [[devices]]
        device_id = "00000020"
        kind = "output"
        watched = false
        "#,
    )
    .unwrap();

    ihcd_cmd()
        .args(["--config", path.to_str().unwrap(), "--check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 devices").and(predicate::str::contains("1 watched")));
}

#[test]
fn check_rejects_a_bad_device_id() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ihcd.toml");
    std::fs::write(
        &path,
        r#"
        [[devices]]
        device_id = "not-hex"
        kind = "output"
        "#,
    )
    .unwrap();

    ihcd_cmd()
        .args(["--config", path.to_str().unwrap(), "--check"])
        .assert()
        .failure();
}

#[test]
fn missing_config_file_still_checks() {
    // figment treats a missing TOML file as an empty layer; the daemon
    // then runs with zero devices, which --check reports as such.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    ihcd_cmd()
        .args(["--config", path.to_str().unwrap(), "--check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 devices"));
}
