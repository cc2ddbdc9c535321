//! # Illusion Bot Core Infrastructure
//!
//! File: bot/src/core/mod.rs
//!
//! ## Overview
//!
//! Foundational pieces shared by the game modules and the operator CLI:
//! - `config`: configuration loading, merging, and validation
//! - `error`: the `GameError` enum and the crate-wide `Result` alias
//!
//! ```ignore
//! use crate::core::config; // For loading configuration
//! use crate::core::error::{GameError, Result}; // For error handling
//! ```
//!
pub mod config;
pub mod error;
