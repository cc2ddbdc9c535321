//! # Illusion Bot CLI Integration Tests
//!
//! File: bot/tests/cli.rs
//!
//! ## Overview
//!
//! Runs the compiled binary against a throwaway data directory and checks
//! what an operator sees.
//!

mod common;
use common::*;
use predicates::prelude::*;

#[test]
fn test_help_lists_subcommands() {
    let sandbox = sandbox();
    illusion_cmd(sandbox.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("record")
                .and(predicate::str::contains("stats"))
                .and(predicate::str::contains("leaderboard"))
                .and(predicate::str::contains("reset-leaderboard"))
                .and(predicate::str::contains("serve")),
        );
}

#[test]
fn test_version_flag() {
    let sandbox = sandbox();
    illusion_cmd(sandbox.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_stats_for_unknown_user() {
    let sandbox = sandbox();
    let data = sandbox.path().join("data");
    illusion_cmd(sandbox.path())
        .arg("--data-dir")
        .arg(&data)
        .args(["stats", "42"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "User 42 has not completed any challenges yet.",
        ));
}

#[test]
fn test_record_then_stats_and_leaderboard() {
    let sandbox = sandbox();
    let data = sandbox.path().join("data");

    illusion_cmd(sandbox.path())
        .arg("--data-dir")
        .arg(&data)
        .args(["record", "42", "--correct", "--username", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Recorded a correct answer for 42: 1/1 correct",
        ));
    illusion_cmd(sandbox.path())
        .env("ILLUSION_BOT_DATA_DIR", &data)
        .args(["record", "42", "--incorrect"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1/2 correct"));

    illusion_cmd(sandbox.path())
        .arg("--data-dir")
        .arg(&data)
        .args(["stats", "42"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Statistics for alice (42):")
                .and(predicate::str::contains("Accuracy: 50.0%")),
        );

    illusion_cmd(sandbox.path())
        .arg("--data-dir")
        .arg(&data)
        .args(["top", "--user", "42", "--limit", "5"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("1. alice")
                .and(predicate::str::contains("Your position:")),
        );
}

#[test]
fn test_reset_requires_confirmation() {
    let sandbox = sandbox();
    let data = sandbox.path().join("data");

    illusion_cmd(sandbox.path())
        .arg("--data-dir")
        .arg(&data)
        .args(["record", "42", "--correct"])
        .assert()
        .success();

    illusion_cmd(sandbox.path())
        .arg("--data-dir")
        .arg(&data)
        .arg("reset-leaderboard")
        .assert()
        .failure()
        .stderr(predicate::str::contains("without --yes"));

    illusion_cmd(sandbox.path())
        .arg("--data-dir")
        .arg(&data)
        .args(["reset-leaderboard", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Leaderboard reset."));

    illusion_cmd(sandbox.path())
        .arg("--data-dir")
        .arg(&data)
        .args(["stats", "42"])
        .assert()
        .success()
        .stdout(predicate::str::contains("has not completed any challenges yet."));
}

#[test]
fn test_invalid_project_config_is_reported() {
    let sandbox = sandbox();
    std::fs::write(
        sandbox.path().join(".illusion-bot.toml"),
        "[challenges]\ntimeout_secs = 0\n",
    )
    .unwrap();

    illusion_cmd(sandbox.path())
        .args(["stats", "42"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration validation failed"));
}
