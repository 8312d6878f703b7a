//! Integration tests for the watercheck binary.
//!
//! These tests verify end-to-end behavior including:
//! - Logging and removing drinks
//! - Goal updates and validation
//! - Day rollover across process runs (via mock time)
//! - History, statistics and CSV export

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory with an empty config file
fn setup_test_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    fs::write(dir.path().join("config.toml"), "").expect("Failed to write config");
    dir
}

/// CLI pointed at an isolated data dir and config, optionally at a fixed time
fn cli(dir: &Path, mock_time: Option<&str>) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("watercheck"));
    cmd.arg("--data-dir")
        .arg(dir)
        .arg("--config")
        .arg(dir.join("config.toml"));
    match mock_time {
        Some(t) => cmd.env("WATERCHECK_MOCK_TIME", t),
        None => cmd.env_remove("WATERCHECK_MOCK_TIME"),
    };
    cmd
}

fn read_state(dir: &Path) -> serde_json::Value {
    let contents = fs::read_to_string(dir.join("state.json")).expect("Failed to read state");
    serde_json::from_str(&contents).expect("State is not valid JSON")
}

#[test]
fn test_cli_help() {
    Command::new(assert_cmd::cargo::cargo_bin!("watercheck"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Daily water intake tracker"));
}

#[test]
fn test_default_command_shows_status() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path(), None)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 / 2500 ml"))
        .stdout(predicate::str::contains("No drinks logged yet today"));

    // Opening the store records the active day
    assert!(temp_dir.path().join("state.json").exists());
}

#[test]
fn test_add_persists_entry() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path(), None)
        .args(["add", "250"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged 250 ml"));

    cli(temp_dir.path(), None)
        .args(["add", "500"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Today: 750 / 2500 ml"));

    let state = read_state(temp_dir.path());
    assert_eq!(state["current_intake"], 750.0);
    let entries = state["today_entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    // Most recent first
    assert_eq!(entries[0]["amount"], 500.0);
}

#[test]
fn test_add_rejects_non_positive_amount() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path(), None)
        .args(["add", "-100"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("InvalidAmount"));

    cli(temp_dir.path(), None)
        .args(["add", "0"])
        .assert()
        .failure();

    cli(temp_dir.path(), None)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 / 2500 ml"));
}

#[test]
fn test_remove_entry() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path(), None).args(["add", "300"]).assert().success();
    cli(temp_dir.path(), None).args(["add", "200"]).assert().success();

    let state = read_state(temp_dir.path());
    let id = state["today_entries"][1]["id"].as_str().unwrap().to_string();

    cli(temp_dir.path(), None)
        .args(["remove", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 300 ml"))
        .stdout(predicate::str::contains("Today: 200 / 2500 ml"));

    // Removing it again is a harmless no-op
    cli(temp_dir.path(), None)
        .args(["remove", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing removed"));
}

#[test]
fn test_goal_update() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path(), None)
        .args(["goal", "3000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Daily goal set to 3000 ml"));

    cli(temp_dir.path(), None)
        .args(["goal", "-5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("InvalidGoal"));

    assert_eq!(read_state(temp_dir.path())["daily_goal"], 3000.0);
}

#[test]
fn test_config_default_goal() {
    let temp_dir = setup_test_dir();
    fs::write(
        temp_dir.path().join("config.toml"),
        "[goal]\ndefault_ml = 1800.0\n",
    )
    .unwrap();

    cli(temp_dir.path(), None)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 / 1800 ml"));
}

#[test]
fn test_rollover_between_runs() {
    let temp_dir = setup_test_dir();
    let day1 = Some("2025-01-10 12:00:00");
    let day2 = Some("2025-01-11 09:00:00");

    cli(temp_dir.path(), day1).args(["goal", "2000"]).assert().success();
    cli(temp_dir.path(), day1).args(["add", "1000"]).assert().success();
    cli(temp_dir.path(), day1).args(["add", "800"]).assert().success();

    cli(temp_dir.path(), day2)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Today (2025-01-11): 0 / 2000 ml"));

    let state = read_state(temp_dir.path());
    let history = state["historical_data"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["date"], "2025-01-10");
    assert_eq!(history[0]["total_intake"], 1800.0);
    assert_eq!(history[0]["entry_count"], 2);
    assert_eq!(history[0]["goal_met"], false);
    assert_eq!(state["last_active_date"], "2025-01-11");

    cli(temp_dir.path(), day2)
        .args(["history", "--timeframe", "week"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2025-01-10"))
        .stdout(predicate::str::contains("1800 ml"));
}

#[test]
fn test_streak_reported_in_stats() {
    let temp_dir = setup_test_dir();

    for day in ["2025-01-08", "2025-01-09", "2025-01-10"] {
        let t = format!("{} 12:00:00", day);
        cli(temp_dir.path(), Some(&t)).args(["goal", "2000"]).assert().success();
        cli(temp_dir.path(), Some(&t)).args(["add", "2100"]).assert().success();
    }

    cli(temp_dir.path(), Some("2025-01-11 08:00:00"))
        .args(["stats", "--timeframe", "month"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Goal met:   3 of 3 days"))
        .stdout(predicate::str::contains("Streak:     3 days"));

    cli(temp_dir.path(), Some("2025-01-11 08:00:00"))
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Streak: 3 days!"));
}

#[test]
fn test_history_timeframe_parsing() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path(), None)
        .args(["history", "--timeframe", "fortnight"])
        .assert()
        .failure();

    cli(temp_dir.path(), None)
        .args(["history", "--timeframe", "year"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No history for the last year"));
}

#[test]
fn test_export_creates_csv() {
    let temp_dir = setup_test_dir();
    let day1 = Some("2025-01-10 12:00:00");
    let day2 = Some("2025-01-11 12:00:00");

    cli(temp_dir.path(), day1).args(["add", "2600"]).assert().success();
    cli(temp_dir.path(), day2).args(["add", "400"]).assert().success();

    let csv_path = temp_dir.path().join("export.csv");
    cli(temp_dir.path(), day2)
        .arg("export")
        .arg("--output")
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 2 days"));

    let csv_content = fs::read_to_string(&csv_path).expect("Failed to read CSV");
    let lines: Vec<_> = csv_content.lines().collect();
    assert_eq!(lines[0], "date,total_intake_ml,entry_count,goal_met");
    assert_eq!(lines[1], "2025-01-11,400,1,false");
    assert_eq!(lines[2], "2025-01-10,2600,1,true");
}

#[test]
fn test_recommend_and_apply() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path(), None)
        .args(["recommend", "--weight", "70", "--height", "175", "--apply"])
        .assert()
        .success()
        .stdout(predicate::str::contains("BMI: 22.9 (Normal weight)"))
        .stdout(predicate::str::contains("Suggested daily goal: 2450 ml"));

    assert_eq!(read_state(temp_dir.path())["daily_goal"], 2450.0);
}

#[test]
fn test_reset_requires_confirmation() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path(), None).args(["add", "500"]).assert().success();

    cli(temp_dir.path(), None)
        .arg("reset")
        .assert()
        .success()
        .stdout(predicate::str::contains("--yes"));
    assert_eq!(read_state(temp_dir.path())["current_intake"], 500.0);

    cli(temp_dir.path(), None)
        .args(["reset", "--yes"])
        .assert()
        .success();
    let state = read_state(temp_dir.path());
    assert_eq!(state["current_intake"], 0.0);
    assert!(state["today_entries"].as_array().unwrap().is_empty());
}

#[test]
fn test_debug_logging_goes_to_stderr() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path(), None)
        .args(["add", "200"])
        .env("RUST_LOG", "debug")
        .assert()
        .success()
        .stderr(predicate::str::contains("Dispatching command"))
        .stdout(predicate::str::contains("Dispatching command").not());
}
