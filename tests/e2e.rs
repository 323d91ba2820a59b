use std::process::Command;

use tempfile::NamedTempFile;

fn run_with(fixture: &str, args: &[&str], log: &str) -> (String, String, bool) {
    let path = format!("tests/fixtures/{fixture}");
    let output = Command::new(env!("CARGO_BIN_EXE_ledger"))
        .arg(&path)
        .args(args)
        .env("RUST_LOG", log)
        .env("NO_COLOR", "1")
        .env_remove("LEDGER_OPENING_BALANCE")
        .output()
        .expect("failed to run binary");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn run(fixture: &str) -> (String, String, bool) {
    run_with(fixture, &[], "warn")
}

#[test]
fn valid_commands() {
    let (stdout, stderr, success) = run("valid.csv");

    assert!(success);
    assert!(stderr.is_empty());

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "account,name,balance",
            "user-1,Alice,2050.0000",
            "user-2,Bob,24.5000",
        ]
    );
}

#[test]
fn errors_warn_but_do_not_block() {
    let (stdout, stderr, success) = run("with_errors.csv");

    assert!(success);
    assert!(stderr.contains("unrecognized operation 'refund'"));
    assert!(stderr.contains("deposit missing amount"));

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "account,name,balance");
    assert_eq!(lines[1], "user-1,Alice,800.0000");
    assert_eq!(lines[2], "user-2,Bob,0.0000");
}

#[test]
fn ledger_failures_are_logged_at_info() {
    let (_, stderr, success) = run_with("with_errors.csv", &[], "info");

    assert!(success);
    assert!(stderr.contains("deposit skipped"));
    assert!(stderr.contains("cannot transfer from account user-1 to itself"));
    assert!(stderr.contains("insufficient funds in account user-2"));
    assert!(stderr.contains("withdraw applied"));
}

#[test]
fn opening_balance_flag_overrides_default() {
    let (stdout, _, success) = run_with("valid.csv", &["--opening-balance", "100"], "warn");

    assert!(success);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[1], "user-1,Alice,150.0000");
    assert_eq!(lines[2], "user-2,Bob,124.5000");
}

#[test]
fn negative_opening_balance_is_rejected() {
    let (stdout, _, success) = run_with("valid.csv", &["--opening-balance=-5"], "warn");

    assert!(!success);
    assert!(stdout.is_empty());
}

#[test]
fn restore_then_snapshot() {
    let out = NamedTempFile::new().unwrap();
    let out_path = out.path().to_str().unwrap();
    let (stdout, _, success) = run_with(
        "after_restore.csv",
        &[
            "--restore",
            "tests/fixtures/snapshot.json",
            "--snapshot",
            out_path,
        ],
        "warn",
    );

    assert!(success);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "account,name,balance",
            "user-1,Alice,950.0000",
            "user-2,Bob,1000.0000",
            "user-3,Carol,60.0000",
        ]
    );

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.path()).unwrap()).unwrap();
    assert_eq!(written["next_transaction_id"], 3);
    assert_eq!(written["next_account_seq"], 4);
    assert_eq!(written["accounts"][2]["balance"], "60.0000");
}

#[test]
fn missing_input_fails() {
    let (_, stderr, success) = run("does_not_exist.csv");

    assert!(!success);
    assert!(stderr.contains("failed to open"));
}
