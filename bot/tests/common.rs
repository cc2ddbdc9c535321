//! # Illusion Bot Integration Test Common Helpers
//!
//! File: bot/tests/common.rs
//!
//! ## Overview
//!
//! Shared helpers for the integration tests in `bot/tests/`. Each test file
//! declares `mod common;` and picks what it needs.
//!

// Different test files use different helpers.
#![allow(dead_code)]

pub use assert_cmd::Command;
use std::path::Path;
use tempfile::TempDir;

/// Creates an `assert_cmd::Command` for the compiled `illusion-bot` binary.
///
/// The command runs inside `sandbox` with `HOME` and the XDG config directory
/// pointed there too, so neither a user config file nor a project
/// `.illusion-bot.toml` from the developer's machine leaks into the test.
pub fn illusion_cmd(sandbox: &Path) -> Command {
    let mut cmd =
        Command::cargo_bin("illusion-bot").expect("Failed to find illusion-bot binary for testing");
    cmd.current_dir(sandbox)
        .env("HOME", sandbox)
        .env("XDG_CONFIG_HOME", sandbox.join(".config"))
        .env_remove("ILLUSION_BOT_DATA_DIR")
        .env_remove("RUST_LOG");
    cmd
}

/// A scratch directory holding a `.git` marker so the project config search stops there.
pub fn sandbox() -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create sandbox dir");
    std::fs::create_dir(dir.path().join(".git")).expect("Failed to create .git marker");
    dir
}
