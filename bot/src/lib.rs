//! # Illusion Bot Game Core
//!
//! File: bot/src/lib.rs
//!
//! ## Overview
//!
//! The in-process game logic behind the optical illusion chat bot: who has a
//! puzzle waiting, whether their answer was right, and how every player ranks.
//! Chat transport and AI provider clients sit outside this crate and talk to
//! it through [`game::IllusionGame`].
//!
//! ## Architecture
//!
//! - `core`: configuration and error types
//! - `game`: challenge model, registry, generation seam, and the facade
//! - `stats`: cached per-user statistics, SQLite persistence, leaderboard
//!
pub mod core;
pub mod game;
pub mod stats;

pub use crate::game::{Answer, Challenge, IllusionGame};
pub use crate::stats::{Leaderboard, LeaderboardEntry, UserStats};
