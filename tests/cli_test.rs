mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use axum::http::StatusCode;
use common::{MockServices, blocked_risk, low_risk, warning_risk};
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn input_file(rows: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "recipient,amount,remarks").unwrap();
    write!(file, "{rows}").unwrap();
    file
}

fn txguard(api_url: &str, input: &NamedTempFile) -> Command {
    let mut cmd = Command::new(cargo_bin!("txguard"));
    cmd.arg(input.path()).arg("--api-url").arg(api_url);
    cmd
}

#[test]
fn test_cli_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let services = MockServices::new(low_risk());
    let url = services.spawn_in_background();
    let input = input_file("rahul@upi,2500,lunch\nrahul.upi,100,\n");

    txguard(&url, &input)
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "id,recipient,amount,remarks,status,score,level,action",
        ))
        .stdout(predicate::str::contains(
            ",rahul@upi,2500,lunch,completed,12,LOW,ALLOW",
        ))
        .stdout(predicate::str::contains("rahul.upi").not())
        .stderr(predicate::str::contains("Row 2: Invalid UPI ID"));

    assert_eq!(services.sent().len(), 1);
    assert_eq!(services.analyze_calls(), 1);
    Ok(())
}

#[test]
fn test_cli_reports_blocked_payments() -> Result<(), Box<dyn std::error::Error>> {
    let services = MockServices::new(blocked_risk());
    let url = services.spawn_in_background();
    let input = input_file("unknown@paytm,45000,send otp\n");

    txguard(&url, &input)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            ",unknown@paytm,45000,send otp,blocked,91,HIGH,BLOCK",
        ));

    assert_eq!(services.sent().len(), 1);
    Ok(())
}

#[test]
fn test_cli_cancel_on_warning() -> Result<(), Box<dyn std::error::Error>> {
    let services = MockServices::new(warning_risk());
    let url = services.spawn_in_background();
    let input = input_file("shop@okaxis,900,\n");

    txguard(&url, &input)
        .arg("--cancel-on-warning")
        .assert()
        .success()
        .stdout(predicate::str::contains(",shop@okaxis,900,,cancelled,38,MEDIUM,WARN"));

    assert!(services.sent().is_empty());
    Ok(())
}

#[test]
fn test_cli_dry_run_skips_send() -> Result<(), Box<dyn std::error::Error>> {
    let services = MockServices::new(low_risk());
    let url = services.spawn_in_background();
    let input = input_file("rahul@upi,10,tea\n");

    txguard(&url, &input)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("completed"));

    assert!(services.sent().is_empty());
    Ok(())
}

#[test]
fn test_cli_cancels_after_send_attempts() -> Result<(), Box<dyn std::error::Error>> {
    let services = MockServices::new(low_risk());
    services.set_send_status(StatusCode::SERVICE_UNAVAILABLE);
    let url = services.spawn_in_background();
    let input = input_file("rahul@upi,10,tea\n");

    txguard(&url, &input)
        .args(["--send-attempts", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cancelled"))
        .stderr(predicate::str::contains("attempt 2: Transaction failed"));

    assert_eq!(services.sent().len(), 2);
    Ok(())
}

#[test]
fn test_cli_missing_input_file() {
    Command::new(cargo_bin!("txguard"))
        .arg("does-not-exist.csv")
        .assert()
        .failure();
}
