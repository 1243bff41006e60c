//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run and verify outputs. Only
//! store-free commands are exercised here; the storage behavior is covered
//! by the core crate's integration tests.

use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "cadence-cli", "--"])
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_help_lists_subcommands() {
    let (stdout, _, code) = run_cli(&["--help"]);
    assert_eq!(code, 0, "help failed");
    for subcommand in ["project", "goal", "task", "habit", "expand"] {
        assert!(stdout.contains(subcommand), "help is missing {subcommand}");
    }
}

#[test]
fn test_expand_mon_wed_fri_week() {
    let (stdout, _, code) = run_cli(&[
        "expand",
        "--anchor", "2024-01-01",
        "--time", "09:00",
        "--days", "0,2,4",
        "--from", "2024-01-01",
        "--to", "2024-01-07",
    ]);
    assert_eq!(code, 0, "expand failed");

    let occurrences: Vec<String> = serde_json::from_str(&stdout).expect("expand output is JSON");
    assert_eq!(
        occurrences,
        vec![
            "2024-01-01 09:00:00",
            "2024-01-03 09:00:00",
            "2024-01-05 09:00:00",
        ]
    );
}

#[test]
fn test_expand_empty_days_yields_empty_list() {
    let (stdout, _, code) = run_cli(&[
        "expand",
        "--anchor", "2024-01-01",
        "--time", "09:00",
        "--days", "",
        "--from", "2024-01-01",
        "--to", "2024-12-31",
    ]);
    assert_eq!(code, 0, "expand failed");
    let occurrences: Vec<String> = serde_json::from_str(&stdout).expect("expand output is JSON");
    assert!(occurrences.is_empty());
}

#[test]
fn test_expand_inverted_range_fails() {
    let (_, stderr, code) = run_cli(&[
        "expand",
        "--anchor", "2024-01-01",
        "--time", "09:00",
        "--days", "0,2,4",
        "--from", "2024-02-01",
        "--to", "2024-01-01",
    ]);
    assert_ne!(code, 0, "inverted range must fail");
    assert!(stderr.contains("Invalid range"));
}

#[test]
fn test_expand_rejects_bad_weekday() {
    let (_, stderr, code) = run_cli(&[
        "expand",
        "--anchor", "2024-01-01",
        "--time", "09:00",
        "--days", "0,7",
        "--from", "2024-01-01",
        "--to", "2024-01-07",
    ]);
    assert_ne!(code, 0, "weekday 7 must be rejected");
    assert!(stderr.contains("Invalid weekday"));
}

#[test]
fn test_expand_rejects_end_before_anchor() {
    let (_, stderr, code) = run_cli(&[
        "expand",
        "--anchor", "2024-06-01",
        "--time", "09:00",
        "--days", "0",
        "--until", "2024-01-01",
        "--from", "2024-01-01",
        "--to", "2024-12-31",
    ]);
    assert_ne!(code, 0, "end before anchor must be rejected");
    assert!(stderr.contains("Invalid date order"));
}
