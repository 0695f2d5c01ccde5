//! CLI Integration Tests
//!
//! Run the built `mintsale` binary. Only `--mock` and offline commands are
//! exercised; nothing here needs a gateway.

use std::process::{Command, Output};

/// Note: test helper, may use expect() for clarity.
fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mintsale"))
        .args(args)
        .env_remove("MINTSALE_CONFIG")
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to execute mintsale binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// ════════════════════════════════════════════════════════════════════════════
// HELP TEXT
// ════════════════════════════════════════════════════════════════════════════

#[test]
fn test_cli_main_help() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Mintsale operator CLI"));
}

#[test]
fn test_cli_version() {
    assert!(run_cli(&["--version"]).status.success());
}

#[test]
fn test_subcommands_exist() {
    for cmd in [&["phase"][..], &["zone"], &["watch"], &["mint"], &["whitelist", "format"], &["whitelist", "fetch"]] {
        let mut args = cmd.to_vec();
        args.push("--help");
        assert!(run_cli(&args).status.success(), "{:?} --help failed", cmd);
    }
}

#[test]
fn test_unknown_command_fails() {
    assert!(!run_cli(&["refund"]).status.success());
}

// ════════════════════════════════════════════════════════════════════════════
// OFFLINE COMMANDS
// ════════════════════════════════════════════════════════════════════════════

#[test]
fn test_phase_json_at_instant() {
    let output = run_cli(&["phase", "--json", "--at", "2025-02-09T18:00:00Z"]);
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("json output");
    assert_eq!(report["phase"], "OG");
    assert_eq!(report["board"]["fcfs"]["state"], "active");
}

#[test]
fn test_phase_table_before_start() {
    let output = run_cli(&["phase", "--at", "2025-02-01T00:00:00Z"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Not Started"));
}

#[test]
fn test_whitelist_format() {
    let dir = tempfile::tempdir().expect("tempdir");
    let csv = dir.path().join("og.csv");
    let out = dir.path().join("og.txt");
    std::fs::write(&csv, "addr1,x\naddr2,y\n").expect("write csv");

    let output = run_cli(&["whitelist", "format", csv.to_str().unwrap(), out.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("2 entries"));
    assert_eq!(
        std::fs::read_to_string(&out).expect("read output"),
        "[\"addr1\"] = true,\n[\"addr2\"] = true,\n"
    );
}

#[test]
fn test_mock_zone_and_mint() {
    let zone = run_cli(&["--mock", "zone", "--json"]);
    assert!(zone.status.success());
    let report: serde_json::Value = serde_json::from_str(&stdout(&zone)).expect("json output");
    assert_eq!(report["current_zone"], 1);
    assert_eq!(report["zones"][0]["can_purchase"], true);

    let mint = run_cli(&["--mock", "mint", "-q", "2"]);
    assert!(mint.status.success(), "{}", String::from_utf8_lossy(&mint.stderr));
    assert!(stdout(&mint).contains("Minted 2"));
    assert!(stdout(&mint).contains("Paid: 1 wAR"));
}

#[test]
fn test_mock_mint_over_limit_fails() {
    let output = run_cli(&["--mock", "mint", "-q", "5"]);
    assert!(!output.status.success());
}
