//! # Player Statistics
//!
//! File: bot/src/stats/mod.rs
//!
//! ## Overview
//!
//! Per-user cumulative answer counts, kept in an in-memory cache that is the
//! source of truth once populated and replicated to a SQLite table by a
//! background persistence task.
//!
//! ## Architecture
//!
//! - `db`: the `user_stats` table (schema, migration, queries)
//! - `store`: `StatsStore`, the cache plus the serialization discipline
//! - `persistence`: the bounded upsert queue and the task that drains it
//! - `leaderboard`: ranked, display-ready views over the table
//!
pub(crate) mod db;
pub mod leaderboard;
mod persistence;
pub mod store;

pub use leaderboard::{Leaderboard, LeaderboardEntry, ANONYMOUS};
pub use store::StatsStore;

/// Cumulative record for one user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserStats {
    pub user_id: String,
    pub total_challenges: u64,
    /// Never exceeds `total_challenges`.
    pub correct_answers: u64,
    /// Last known display name; empty when never provided.
    pub username: String,
}

impl UserStats {
    /// A zeroed record for a user with no history.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    /// Counts one answer. A non-empty `username` replaces the stored one.
    pub fn record(&mut self, is_correct: bool, username: &str) {
        self.total_challenges += 1;
        if is_correct {
            self.correct_answers += 1;
        }
        if !username.is_empty() {
            self.username = username.to_string();
        }
    }

    /// Adds the counts of `durable` to this record.
    ///
    /// Used when the counts held here were gathered while the durable row
    /// could not be read, so they are increments on top of it. A username
    /// seen since then wins over the stored one.
    pub(crate) fn absorb(&mut self, durable: &UserStats) {
        self.total_challenges += durable.total_challenges;
        self.correct_answers += durable.correct_answers;
        if self.username.is_empty() {
            self.username = durable.username.clone();
        }
    }

    /// Share of correct answers in percent, 0 when nothing was answered.
    pub fn accuracy_percent(&self) -> f64 {
        if self.total_challenges == 0 {
            return 0.0;
        }
        self.correct_answers as f64 / self.total_challenges as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_counts_and_keeps_known_username() {
        let mut stats = UserStats::new("1");
        stats.record(true, "alice");
        stats.record(false, "");
        stats.record(true, "alice_b");

        assert_eq!(stats.total_challenges, 3);
        assert_eq!(stats.correct_answers, 2);
        assert_eq!(stats.username, "alice_b");

        stats.record(false, "");
        assert_eq!(stats.username, "alice_b");
    }

    #[test]
    fn absorb_adds_durable_counts() {
        let mut pending = UserStats::new("1");
        pending.record(true, "");
        let durable = UserStats {
            user_id: "1".into(),
            total_challenges: 10,
            correct_answers: 5,
            username: "alice".into(),
        };

        pending.absorb(&durable);

        assert_eq!(pending.correct_answers, 6);
        assert_eq!(pending.total_challenges, 11);
        assert_eq!(pending.username, "alice");
    }

    #[test]
    fn accuracy_handles_zero_total() {
        assert_eq!(UserStats::new("1").accuracy_percent(), 0.0);
        let stats = UserStats {
            user_id: "1".into(),
            total_challenges: 4,
            correct_answers: 3,
            username: String::new(),
        };
        assert_eq!(stats.accuracy_percent(), 75.0);
    }
}
