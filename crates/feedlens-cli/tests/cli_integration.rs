//! CLI integration tests: run the actual feedlens binary.
//! Marked `#[ignore]` because most of them need the analysis service
//! running at the configured base URL.

use std::process::Command;

fn feedlens() -> Command {
    Command::new(env!("CARGO_BIN_EXE_feedlens"))
}

#[test]
#[ignore]
fn test_cli_status_output() {
    let output = feedlens().arg("status").output().expect("failed to execute");
    assert!(
        output.status.success(),
        "feedlens status failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
#[ignore]
fn test_cli_list_json() {
    let output = feedlens()
        .args(["list", "--json", "--limit", "5"])
        .output()
        .expect("failed to execute");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let rows: Vec<serde_json::Value> =
        serde_json::from_str(stdout.trim()).expect("invalid JSON output");
    assert!(rows.len() <= 5);
}

#[test]
#[ignore]
fn test_cli_insights_json() {
    let output = feedlens()
        .args(["insights", "--json"])
        .output()
        .expect("failed to execute");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let insights: serde_json::Value =
        serde_json::from_str(stdout.trim()).expect("invalid JSON output");
    assert!(insights.get("themes").is_some());
}

#[test]
fn test_cli_rejects_short_feedback() {
    let output = feedlens()
        .args(["submit", "too short"])
        .env("FEEDLENS_API_URL", "http://127.0.0.1:9")
        .output()
        .expect("failed to execute");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("at least 10 characters"),
        "unexpected stderr: {stderr}"
    );
}

#[test]
fn test_cli_rejects_unknown_sort_key() {
    let output = feedlens()
        .args(["list", "--sort", "loudness"])
        .env("FEEDLENS_API_URL", "http://127.0.0.1:9")
        .output()
        .expect("failed to execute");
    assert!(!output.status.success());
}

#[test]
fn test_cli_asc_and_desc_conflict() {
    let output = feedlens()
        .args(["list", "--asc", "--desc"])
        .output()
        .expect("failed to execute");
    assert!(!output.status.success());
}
