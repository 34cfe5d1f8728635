//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary with its data directory pointed at a
//! temporary directory and verify outputs.

use std::path::Path;
use std::process::Command;

/// Run a CLI command against `data_dir` and return (stdout, stderr, code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_cadence-cli"))
        .args(args)
        .env("CADENCE_DATA_DIR", data_dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(data_dir: &Path, args: &[&str]) -> serde_json::Value {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

#[test]
fn test_profile_list() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["profile", "list"]);
    assert_eq!(code, 0, "Profile list failed");
    for persona in ["manager", "analyst", "developer", "designer"] {
        assert!(stdout.contains(persona), "missing {persona}");
    }
}

#[test]
fn test_profile_show_json() {
    let dir = tempfile::tempdir().unwrap();
    let profile = run_json(dir.path(), &["profile", "show", "manager", "--json"]);
    assert_eq!(profile["base_interval_minutes"]["morning"], 45.0);
    assert_eq!(profile["flow_protection"]["minimum_protection_minutes"], 45.0);
}

#[test]
fn test_evaluate_claims_slot_across_invocations() {
    let dir = tempfile::tempdir().unwrap();
    let base = [
        "evaluate", "--user", "u1", "--persona", "manager", "--load", "0.85", "--json",
    ];

    let mut first: Vec<&str> = base.to_vec();
    first.extend(["--at", "2026-03-02T10:00:00+00:00"]);
    let decision = run_json(dir.path(), &first);
    assert_eq!(decision["permitted"], true);
    assert_eq!(decision["category"], "FOCUS");
    assert!(decision["content"].is_string());

    let mut second: Vec<&str> = base.to_vec();
    second.extend(["--at", "2026-03-02T10:50:00+00:00"]);
    let decision = run_json(dir.path(), &second);
    assert_eq!(decision["permitted"], false);
    assert_eq!(decision["reason"], "interval_not_elapsed");
    assert!(decision["category"].is_null());

    assert!(dir.path().join("state.json").exists());
}

#[test]
fn test_evaluate_rejects_bad_timestamp() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(
        dir.path(),
        &["evaluate", "--user", "u1", "--at", "yesterday"],
    );
    assert_ne!(code, 0);
    assert!(stderr.contains("invalid --at"));
}

#[test]
fn test_outcomes_retune_and_persist() {
    let dir = tempfile::tempdir().unwrap();
    for _ in 0..10 {
        let (_, stderr, code) = run_cli(
            dir.path(),
            &[
                "outcome", "--user", "u1", "--persona", "analyst", "--hour", "10", "--rejected",
                "--response-time", "12",
            ],
        );
        assert_eq!(code, 0, "outcome failed: {stderr}");
    }

    let stats = run_json(dir.path(), &["stats", "analyst", "--json"]);
    assert_eq!(stats[0]["hour_of_day"], 10);
    assert_eq!(stats[0]["sample_count"], 10);

    let events = run_json(dir.path(), &["adaptations", "--json"]);
    assert_eq!(events.as_array().map(Vec::len), Some(1));
    assert_eq!(events[0]["direction"], "backoff");

    let profile = run_json(dir.path(), &["profile", "show", "analyst", "--json"]);
    assert_eq!(profile["base_interval_minutes"]["morning"], 48.0);

    let lines = std::fs::read_to_string(dir.path().join("outcomes.jsonl")).unwrap();
    assert_eq!(lines.lines().count(), 10);
}

#[test]
fn test_outcome_requires_verdict() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(
        dir.path(),
        &["outcome", "--user", "u1", "--persona", "analyst", "--hour", "10"],
    );
    assert_ne!(code, 0);
}

#[test]
fn test_outcome_rejects_invalid_hour() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(
        dir.path(),
        &["outcome", "--user", "u1", "--persona", "analyst", "--hour", "24", "--accepted"],
    );
    assert_ne!(code, 0);
    assert!(stderr.contains("hour_of_day"));
}

#[test]
fn test_simulate_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let args = ["simulate", "--days", "2", "--users-per-persona", "2", "--seed", "9", "--json"];
    let first = run_json(dir.path(), &args);
    let second = run_json(dir.path(), &args);
    assert_eq!(first, second);
    assert!(first["evaluations"].as_u64().unwrap() > 0);
}

#[test]
fn test_config_set_get_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["config", "set", "tuner.min_samples", "20"]);
    assert_eq!(code, 0);

    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "tuner.min_samples"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "20");

    let (_, _, code) = run_cli(dir.path(), &["config", "get", "tuner.nope"]);
    assert_ne!(code, 0);
}

#[test]
fn test_config_path_points_into_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "path"]);
    assert_eq!(code, 0);
    assert!(stdout.trim().ends_with("config.toml"));
    assert!(stdout.contains(&*dir.path().to_string_lossy()));
}

#[test]
fn test_prune_handles_oversized_window() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(
        dir.path(),
        &["evaluate", "--user", "u1", "--at", "2026-03-02T10:00:00+00:00"],
    );
    assert_eq!(code, 0);

    let (stdout, stderr, code) = run_cli(dir.path(), &["prune", "--idle-hours", "3000000000"]);
    assert_eq!(code, 0, "prune failed: {stderr}");
    assert!(stdout.contains("Pruned 0 user(s), 1 remaining"));

    let (_, stderr, code) = run_cli(
        dir.path(),
        &["prune", "--idle-hours", "9223372036854775807"],
    );
    assert_ne!(code, 0);
    assert!(stderr.contains("out of range"));
}
