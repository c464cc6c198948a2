//! The `bravo` binary end to end.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

use crate::common::fixtures::{A320_YAML, ProfilesFixture};

/// Command isolated from the user's config and environment.
fn bravo(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("bravo").unwrap();
    cmd.arg("--config")
        .arg(config_home.path().join("config.toml"))
        .env_remove("BRAVO_PROFILES_DIR")
        .env_remove("BRAVO_FORMAT")
        .env_remove("BRAVO_API_URL")
        .env("RUST_LOG", "off");
    cmd
}

fn parse_json(bytes: &[u8]) -> Value {
    let text = String::from_utf8_lossy(bytes);
    serde_json::from_str(text.trim()).unwrap_or_else(|_| panic!("Failed to parse JSON:\n{text}"))
}

#[test]
fn robot_quick_start_names_the_tool() {
    let home = TempDir::new().unwrap();
    let output = bravo(&home).arg("--robot").output().unwrap();
    assert!(output.status.success());

    let json = parse_json(&output.stdout);
    assert_eq!(json["tool"], "bravo");
    assert!(json["commands"].is_array());
}

#[test]
fn check_passes_on_valid_folder() {
    let home = TempDir::new().unwrap();
    let fixture = ProfilesFixture::standard();
    bravo(&home)
        .args(["check", "-p"])
        .arg(fixture.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("a320.yaml"))
        .stdout(predicate::str::contains("3 valid"));
}

#[test]
fn check_fails_on_broken_profile() {
    let home = TempDir::new().unwrap();
    let fixture = ProfilesFixture::with_files(&[
        ("a320.yaml", A320_YAML),
        ("broken.yaml", "metadata: [unclosed"),
    ]);
    let output = bravo(&home)
        .args(["--robot", "check", "-p"])
        .arg(fixture.path())
        .output()
        .unwrap();
    assert!(!output.status.success());

    let json = parse_json(&output.stdout);
    assert_eq!(json["ok"], false);
    assert_eq!(json["summary"]["invalid"], 1);
    assert_eq!(json["summary"]["valid"], 1);
}

#[test]
fn robot_select_reports_profile() {
    let home = TempDir::new().unwrap();
    let fixture = ProfilesFixture::standard();
    let output = bravo(&home)
        .args(["--robot", "select", "A320", "-p"])
        .arg(fixture.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = parse_json(&output.stdout);
    assert_eq!(json["name"], "Airbus A320");
    assert_eq!(json["identity"], "A320");
    assert!(json["file"].as_str().unwrap().ends_with("a320.yaml"));
}

#[test]
fn select_miss_fails_with_robot_error() {
    let home = TempDir::new().unwrap();
    let fixture = ProfilesFixture::standard();
    bravo(&home)
        .args(["--robot", "select", "B738", "-p"])
        .arg(fixture.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"error\": true"))
        .stderr(predicate::str::contains("B738"));
}

#[test]
fn missing_profiles_flag_dir_fails() {
    let home = TempDir::new().unwrap();
    bravo(&home)
        .args(["select", "A320", "-p"])
        .arg(home.path().join("nowhere"))
        .assert()
        .failure();
}

#[test]
fn create_writes_profile_from_template() {
    let home = TempDir::new().unwrap();
    let fixture = ProfilesFixture::standard();
    bravo(&home)
        .args(["create", "a321", "--name", "Airbus A321", "-s", "A321"])
        .arg("-p")
        .arg(fixture.path())
        .assert()
        .success();

    let created = std::fs::read_to_string(fixture.file("a321.yaml")).unwrap();
    assert!(created.contains("Airbus A321"));

    bravo(&home)
        .args(["--robot", "select", "A321", "-p"])
        .arg(fixture.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Airbus A321"));
}

#[test]
fn create_refuses_existing_file() {
    let home = TempDir::new().unwrap();
    let fixture = ProfilesFixture::standard();
    bravo(&home)
        .args(["create", "c172", "--name", "Dup", "-p"])
        .arg(fixture.path())
        .assert()
        .failure();
}

#[test]
fn version_json_has_fields() {
    let home = TempDir::new().unwrap();
    let output = bravo(&home)
        .args(["version", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = parse_json(&output.stdout);
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert!(json.get("git_sha").is_some());
}

#[test]
fn completions_for_bash() {
    let home = TempDir::new().unwrap();
    bravo(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bravo"));
}
