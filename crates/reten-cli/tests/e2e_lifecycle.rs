//! E2E CLI tests covering the full report arc: publish, list, confirm
//! (including the duplicate no-op), comment, and error output contracts.
//!
//! Each test runs `reten` as a subprocess against a store and config dir
//! isolated in a temp directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

/// Build a Command targeting the reten binary, fully isolated in `dir`.
fn reten_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("reten"));
    cmd.env("XDG_CONFIG_HOME", dir.join("config"));
    cmd.env("XDG_DATA_HOME", dir.join("data"));
    cmd.env("HOME", dir);
    cmd.env("RETEN_LOG", "error");
    cmd.args(["--store", &dir.join("retenes.sqlite3").display().to_string()]);
    cmd
}

/// Publish a report and return its id.
fn publish(dir: &Path) -> String {
    let output = reten_cmd(dir)
        .args([
            "report",
            "--lat",
            "4.711",
            "--lng",
            "-74.0721",
            "--category",
            "sobriety-check",
            "--description",
            "both directions",
            "--json",
        ])
        .output()
        .expect("report should not crash");
    assert!(
        output.status.success(),
        "report failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: Value =
        serde_json::from_slice(&output.stdout).expect("report --json should produce valid JSON");
    json["id"]
        .as_str()
        .expect("report output should have an 'id' field")
        .to_string()
}

#[test]
fn published_report_shows_up_in_list() {
    let dir = TempDir::new().expect("create temp dir");
    let id = publish(dir.path());

    let output = reten_cmd(dir.path())
        .args(["list", "--json"])
        .output()
        .expect("list should not crash");
    assert!(output.status.success());

    let rows: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    let rows = rows.as_array().expect("list --json is an array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], id.as_str());
    assert_eq!(rows[0]["category"], "sobriety-check");
    assert_eq!(rows[0]["confirmations"], 0);
    assert_eq!(rows[0]["heat"], "normal");
    assert_eq!(rows[0]["description"], "both directions");
}

#[test]
fn human_list_shows_active_count() {
    let dir = TempDir::new().expect("create temp dir");
    publish(dir.path());

    reten_cmd(dir.path())
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 active report(s)"));
}

#[test]
fn repeat_confirm_from_the_same_device_is_a_noop() {
    let dir = TempDir::new().expect("create temp dir");
    let id = publish(dir.path());

    let first = reten_cmd(dir.path())
        .args(["confirm", &id, "--json"])
        .output()
        .expect("confirm should not crash");
    assert!(first.status.success());
    let first: Value = serde_json::from_slice(&first.stdout).expect("valid JSON");
    assert_eq!(first["already_confirmed"], false);
    assert_eq!(first["report"]["confirmations"], 1);
    assert_eq!(first["report"]["confirmed_by_me"], true);

    // Same device token (same config dir), so the vote must not double.
    let second = reten_cmd(dir.path())
        .args(["confirm", &id, "--json"])
        .output()
        .expect("repeat confirm should not crash");
    assert!(second.status.success());
    let second: Value = serde_json::from_slice(&second.stdout).expect("valid JSON");
    assert_eq!(second["already_confirmed"], true);
    assert_eq!(second["report"]["confirmations"], 1);
}

#[test]
fn comments_append_and_render_in_order() {
    let dir = TempDir::new().expect("create temp dir");
    let id = publish(dir.path());

    reten_cmd(dir.path())
        .args(["comment", &id, "hay 3 agentes"])
        .assert()
        .success();

    let output = reten_cmd(dir.path())
        .args(["comment", &id, "se movieron hacia la 80", "--json"])
        .output()
        .expect("comment should not crash");
    assert!(output.status.success());

    let row: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    let comments = row["comments"].as_array().expect("comments array");
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["text"], "hay 3 agentes");
    assert_eq!(comments[1]["text"], "se movieron hacia la 80");
}

#[test]
fn oversized_comment_fails_with_code() {
    let dir = TempDir::new().expect("create temp dir");
    let id = publish(dir.path());
    let long_comment = "x".repeat(121);

    reten_cmd(dir.path())
        .args(["comment", &id, &long_comment])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1006"));

    let output = reten_cmd(dir.path())
        .args(["comment", &id, &long_comment, "--json"])
        .output()
        .expect("comment should not crash");
    assert!(!output.status.success());
    let err: Value = serde_json::from_slice(&output.stdout).expect("valid JSON error");
    assert_eq!(err["code"], "E1006");
}

#[test]
fn unknown_category_fails_with_code_and_hint() {
    let dir = TempDir::new().expect("create temp dir");

    reten_cmd(dir.path())
        .args([
            "report",
            "--lat",
            "4.711",
            "--lng",
            "-74.0721",
            "--category",
            "roadblock",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1004"))
        .stderr(predicate::str::contains("vehicular-control"));
}

#[test]
fn out_of_range_coordinates_fail_with_code() {
    let dir = TempDir::new().expect("create temp dir");

    reten_cmd(dir.path())
        .args(["report", "--lat", "91.0", "--lng", "0.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1001"));
}

#[test]
fn confirm_of_missing_report_fails_with_code() {
    let dir = TempDir::new().expect("create temp dir");

    reten_cmd(dir.path())
        .args(["confirm", "rt-000000000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2001"));
}

#[test]
fn watch_once_prints_a_snapshot() {
    let dir = TempDir::new().expect("create temp dir");
    let id = publish(dir.path());

    let output = reten_cmd(dir.path())
        .args(["watch", "--once", "--json"])
        .output()
        .expect("watch should not crash");
    assert!(output.status.success());

    let snapshot: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    let reports = snapshot["reports"].as_array().expect("reports array");
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["id"], id.as_str());
}

#[test]
fn token_is_stable_until_rotated() {
    let dir = TempDir::new().expect("create temp dir");

    let first = reten_cmd(dir.path())
        .args(["token", "--json"])
        .output()
        .expect("token should not crash");
    let first: Value = serde_json::from_slice(&first.stdout).expect("valid JSON");

    let again = reten_cmd(dir.path())
        .args(["token", "--json"])
        .output()
        .expect("token should not crash");
    let again: Value = serde_json::from_slice(&again.stdout).expect("valid JSON");
    assert_eq!(first["token"], again["token"]);

    let rotated = reten_cmd(dir.path())
        .args(["token", "--rotate", "--json"])
        .output()
        .expect("rotate should not crash");
    let rotated: Value = serde_json::from_slice(&rotated.stdout).expect("valid JSON");
    assert_eq!(rotated["rotated"], true);
    assert_ne!(rotated["token"], first["token"]);
}

#[test]
fn author_token_never_appears_in_json_output() {
    let dir = TempDir::new().expect("create temp dir");
    publish(dir.path());

    let token = reten_cmd(dir.path())
        .args(["token", "--json"])
        .output()
        .expect("token should not crash");
    let token: Value = serde_json::from_slice(&token.stdout).expect("valid JSON");
    let token = token["token"].as_str().expect("token string");

    let listing = reten_cmd(dir.path())
        .args(["list", "--json"])
        .output()
        .expect("list should not crash");
    let listing = String::from_utf8(listing.stdout).expect("utf8");
    assert!(
        !listing.contains(token),
        "full device token must never be listed"
    );
}
