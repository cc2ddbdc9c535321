//! # Illusion Bot Command Modules
//!
//! File: bot/src/commands/mod.rs
//!
//! ## Overview
//!
//! One module per operator subcommand. Each defines its Clap argument struct
//! and an async `handle_*` function that opens the game core from the loaded
//! configuration, does its work, and flushes pending writes before returning.
//!

/// `record`: count one answer for a user.
pub mod record;
/// `stats`: print a user's totals and accuracy.
pub mod stats;
/// `leaderboard`: print the ranked table.
pub mod leaderboard;
/// `reset-leaderboard`: wipe every user's statistics.
pub mod reset;
/// `serve`: keep the core running with the periodic expiry sweep.
pub mod serve;
