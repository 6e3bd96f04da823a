//! End-to-end runs of the wearlink binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn wearlink() -> Command {
    Command::cargo_bin("wearlink").unwrap()
}

#[test]
fn config_prints_defaults() {
    wearlink()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("sample_interval_ms = 5000"))
        .stdout(predicate::str::contains("respond_to_sync = true"));
}

#[test]
fn config_file_overrides_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "outbox_capacity = 4").unwrap();

    wearlink()
        .arg("--config")
        .arg(file.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("outbox_capacity = 4"));
}

#[test]
fn bad_config_file_fails() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "sample_interval_ms = 0").unwrap();

    wearlink()
        .arg("--config")
        .arg(file.path())
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn send_reaches_phone() {
    wearlink()
        .args(["send", "--path", "/body_battery/mood", "--data", r#"{"mood": "calm"}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("phone <- /body_battery/mood: "))
        .stdout(predicate::str::contains("mood=\"calm\""));
}

#[test]
fn send_rejects_non_object() {
    wearlink()
        .args(["send", "--data", "[1, 2, 3]"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to publish data item"));
}

#[test]
fn command_reaches_watch() {
    wearlink()
        .args(["command", "pause"])
        .assert()
        .success()
        .stdout(predicate::str::contains("watch <- command from phone: pause"));
}

#[test]
fn simulate_prints_records_and_snapshot() {
    wearlink()
        .args(["simulate", "--ticks", "2", "--interval-ms", "20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("phone <- health:"))
        .stdout(predicate::str::contains("Watch snapshot:"))
        .stdout(predicate::str::contains("heartRate"));
}
