//! # Leaderboard
//!
//! File: bot/src/stats/leaderboard.rs
//!
//! Ranked view over the stats table. Rows come from `db::top_users` and
//! `db::rank_of`; this module turns them into display-ready entries (rank,
//! name fallback, accuracy).
//!
use super::UserStats;

/// Name shown for players who never shared a display name.
pub const ANONYMOUS: &str = "Anonymous";

/// One ranked row.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    /// 1-based position.
    pub rank: u64,
    pub user_id: String,
    /// Last known username, or [`ANONYMOUS`].
    pub display_name: String,
    pub correct_answers: u64,
    pub accuracy_percent: f64,
}

impl LeaderboardEntry {
    pub fn from_stats(rank: u64, stats: &UserStats) -> Self {
        let display_name = if stats.username.is_empty() {
            ANONYMOUS.to_string()
        } else {
            stats.username.clone()
        };
        Self {
            rank,
            user_id: stats.user_id.clone(),
            display_name,
            correct_answers: stats.correct_answers,
            accuracy_percent: stats.accuracy_percent(),
        }
    }
}

/// Top players plus the querying user's own position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Leaderboard {
    pub top_users: Vec<LeaderboardEntry>,
    /// Absent when the user has not answered anything yet.
    pub user_rank: Option<LeaderboardEntry>,
}

impl Leaderboard {
    /// Builds the board from rows already in rank order.
    pub(crate) fn from_rows(top: Vec<UserStats>, user: Option<(u64, UserStats)>) -> Self {
        let top_users = (1u64..)
            .zip(top.iter())
            .map(|(rank, stats)| LeaderboardEntry::from_stats(rank, stats))
            .collect();
        let user_rank = user.map(|(rank, stats)| LeaderboardEntry::from_stats(rank, &stats));
        Self {
            top_users,
            user_rank,
        }
    }
}
