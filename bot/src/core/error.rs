//! # Illusion Bot Error Types
//!
//! File: bot/src/core/error.rs
//!
//! ## Overview
//!
//! Error types shared by the game core and the operator CLI.
//!
//! ## Architecture
//!
//! - `GameError`: a `thiserror` enum naming the failure domains of the core
//! - `Result<T>`: an alias for `anyhow::Result<T>` so callers can attach context
//!
//! Most core operations never return an error at all: a missing or expired
//! challenge is an absent value, and a failed durable read or write is logged
//! and degraded. The places that do propagate are opening the store, loading
//! configuration, generating a challenge, and `reset_leaderboard`.
//!
//! ```ignore
//! // Distinguish a storage failure from other errors after a reset.
//! match game.reset_leaderboard().await {
//!     Ok(()) => {}
//!     Err(e) if e.downcast_ref::<GameError>().is_some() => eprintln!("core: {e}"),
//!     Err(e) => return Err(e),
//! }
//! ```
//!
use thiserror::Error;

/// Custom error type for the game core.
#[derive(Error, Debug)]
pub enum GameError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {source}")]
    Storage {
        #[from]
        source: rusqlite::Error,
    },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Invalid answer '{0}'. Expected one of: left, right, equal.")]
    InvalidAnswer(String),

    #[error("Challenge generation failed: {0}")]
    Generation(String),
}

/// Type alias for Result using anyhow::Error for broad compatibility.
pub type Result<T> = anyhow::Result<T>;

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let config_err = GameError::Config("timeout_secs must be positive".to_string());
        assert_eq!(
            config_err.to_string(),
            "Configuration error: timeout_secs must be positive"
        );

        let invalid = GameError::InvalidAnswer("LEFT".into());
        assert_eq!(
            invalid.to_string(),
            "Invalid answer 'LEFT'. Expected one of: left, right, equal."
        );

        let generation = GameError::Generation("image generator returned no data".into());
        assert_eq!(
            generation.to_string(),
            "Challenge generation failed: image generator returned no data"
        );
    }

    #[test]
    fn test_storage_error_from_rusqlite() {
        let err: GameError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, GameError::Storage { .. }));
        assert!(err.to_string().starts_with("Storage error:"));
    }
}
