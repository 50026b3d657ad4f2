//! Integration tests for the asa CLI
//!
//! These run the binary end-to-end with assert_cmd. Nothing here reaches
//! the network: every case fails or finishes before an API call is made.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const CREDENTIAL_VARS: &[&str] = &[
    "ASA_CLIENT_ID",
    "ASA_TEAM_ID",
    "ASA_KEY_ID",
    "ASA_ORG_ID",
    "ASA_PRIVATE_KEY_PATH",
    "ASA_PRIVATE_KEY",
    "ASA_API_BASE_URL",
    "ASA_TOKEN_URL",
    "ASA_TIMEOUT_SECS",
];

/// An asa command isolated from the caller's credentials and config file
fn asa(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("asa").unwrap();
    for var in CREDENTIAL_VARS {
        cmd.env_remove(var);
    }
    cmd.env("ASA_CONFIG", tmp.path().join("config.yaml"))
        .env("NO_COLOR", "1")
        .current_dir(tmp.path());
    cmd
}

/// Same, pointed at an env file that does not exist
fn asa_without_credentials(tmp: &TempDir) -> Command {
    let mut cmd = asa(tmp);
    cmd.arg("--env-file").arg(tmp.path().join("missing.env"));
    cmd
}

// ============================================================================
// Help and version
// ============================================================================

#[test]
fn test_help_lists_command_groups() {
    let tmp = TempDir::new().unwrap();
    asa(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("campaigns"))
        .stdout(predicate::str::contains("ad-groups"))
        .stdout(predicate::str::contains("keywords"))
        .stdout(predicate::str::contains("reports"))
        .stdout(predicate::str::contains("brand"))
        .stdout(predicate::str::contains("optimize"))
        .stdout(predicate::str::contains("impression-share"));
}

#[test]
fn test_version_flags() {
    let tmp = TempDir::new().unwrap();
    asa(&tmp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("asa"));
    asa(&tmp)
        .arg("-v")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_campaigns_help() {
    let tmp = TempDir::new().unwrap();
    asa(&tmp)
        .args(["campaigns", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("set-budget"));
}

#[test]
fn test_auth_help() {
    let tmp = TempDir::new().unwrap();
    asa(&tmp)
        .args(["auth", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("test"));
}

#[test]
fn test_optimize_help() {
    let tmp = TempDir::new().unwrap();
    asa(&tmp)
        .args(["optimize", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bid-check"))
        .stdout(predicate::str::contains("expand"))
        .stdout(predicate::str::contains("bid-review"));
}

#[test]
fn test_no_subcommand_is_an_error() {
    let tmp = TempDir::new().unwrap();
    asa(&tmp).assert().failure();
}

// ============================================================================
// Credentials
// ============================================================================

#[test]
fn test_missing_credentials_fail() {
    let tmp = TempDir::new().unwrap();
    asa_without_credentials(&tmp)
        .args(["campaigns", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ASA_CLIENT_ID"));
}

#[test]
fn test_auth_test_reports_missing_settings() {
    let tmp = TempDir::new().unwrap();
    asa_without_credentials(&tmp)
        .args(["auth", "test"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Configuration Status"))
        .stdout(predicate::str::contains("missing"));
}

#[test]
fn test_auth_show_reads_env_file() {
    let tmp = TempDir::new().unwrap();
    let env_file = tmp.path().join("creds.env");
    fs::write(
        &env_file,
        "# Apple Search Ads\n\
         export ASA_CLIENT_ID=SEARCHADS.1234567890abcdefgh\n\
         ASA_TEAM_ID=\"SEARCHADS.team\"\n\
         ASA_KEY_ID='key-1'\n\
         ASA_ORG_ID=424242\n",
    )
    .unwrap();

    asa(&tmp)
        .arg("--env-file")
        .arg(&env_file)
        .args(["auth", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Current Configuration"))
        .stdout(predicate::str::contains("SEARCHADS.1234567890..."))
        .stdout(predicate::str::contains("SEARCHADS.1234567890abcdefgh").not())
        .stdout(predicate::str::contains("424242"))
        .stdout(predicate::str::contains("<not set>"));
}

#[test]
fn test_auth_show_without_any_config() {
    let tmp = TempDir::new().unwrap();
    asa_without_credentials(&tmp)
        .args(["auth", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("from environment variables"));
}

// ============================================================================
// Pre-flight validation
// ============================================================================

#[test]
fn test_report_rejects_bad_date() {
    let tmp = TempDir::new().unwrap();
    asa_without_credentials(&tmp)
        .args(["reports", "campaigns", "--start", "2026/01/01", "--end", "2026-01-31"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid date format"));
}

#[test]
fn test_report_rejects_unknown_export_format() {
    let tmp = TempDir::new().unwrap();
    asa_without_credentials(&tmp)
        .args([
            "reports",
            "campaigns",
            "--start",
            "2026-01-01",
            "--end",
            "2026-01-31",
            "--output",
            "report.xlsx",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not supported"));
}

#[test]
fn test_set_budget_requires_an_amount() {
    let tmp = TempDir::new().unwrap();
    asa_without_credentials(&tmp)
        .args(["campaigns", "set-budget", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Specify at least --daily or --total budget"));
}

#[test]
fn test_correlate_requires_country() {
    let tmp = TempDir::new().unwrap();
    asa_without_credentials(&tmp)
        .args(["impression-share", "correlate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Country is required for correlation"));
}

#[test]
fn test_correlate_matched_conflicts_with_unmatched() {
    let tmp = TempDir::new().unwrap();
    asa_without_credentials(&tmp)
        .args(["impression-share", "correlate", "-c", "US", "--matched", "--unmatched"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_expand_rejects_unknown_match_type() {
    let tmp = TempDir::new().unwrap();
    asa_without_credentials(&tmp)
        .args(["optimize", "expand", "--match", "XM"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid match type"));
}

#[test]
fn test_campaigns_list_status_conflicts_with_all() {
    let tmp = TempDir::new().unwrap();
    asa_without_credentials(&tmp)
        .args(["campaigns", "list", "--all", "--status", "paused"])
        .assert()
        .failure();
}

// ============================================================================
// Completions
// ============================================================================

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();
    asa(&tmp)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("asa"));
}

#[test]
fn test_completions_zsh_covers_optimize() {
    let tmp = TempDir::new().unwrap();
    asa(&tmp)
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef asa"))
        .stdout(predicate::str::contains("bid-check"));
}
