//! # Stats Store
//!
//! File: bot/src/stats/store.rs
//!
//! ## Overview
//!
//! `StatsStore` owns every user's cumulative record. Reads and updates go to an
//! in-memory cache; each update queues an upsert that a background task writes
//! to the SQLite table.
//!
//! ## Architecture
//!
//! - `cache` (`RwLock`): user id → `UserStats`, plus a `generation` counter
//!   bumped by every reset.
//! - `write_lock` (`Mutex<()>`): held around every durable mutation (upserts,
//!   the reset) and the leaderboard queries, so the table is only ever touched
//!   by one writer at a time.
//! - Lock order is always `write_lock` then `cache`.
//! - The persistence task snapshots the cache at write time, so a queued
//!   upsert always writes the newest row, and an upsert queued before a reset
//!   finds nothing to write.
//! - A cold-miss read runs without the write lock. It only populates the cache
//!   if no reset happened while it was reading (same `generation`).
//!
//! ## Failure handling
//!
//! Durable read failures are logged and treated as "no row". When the read
//! that should warm an answering user fails, the entry is marked unverified:
//! its counts are increments, and the persistence task adds the durable row
//! to them before writing anything, so a stored total never goes down.
//! Durable write failures are logged by the persistence task and leave the
//! cache ahead of the table. `reset_leaderboard` is the one operation that
//! returns an error.
//!
use super::db::{self, Database};
use super::leaderboard::Leaderboard;
use super::persistence::PersistQueue;
use super::UserStats;
use crate::core::config::PersistenceConfig;
use crate::core::error::Result;
use anyhow::Context;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument, warn};

/// In-memory replica of the stats table.
#[derive(Debug, Default)]
pub(super) struct StatsCache {
    pub(super) entries: HashMap<String, UserStats>,
    /// Users whose durable row could not be read when they were first
    /// cached. Their entries hold increments, not totals, until the
    /// persistence task merges them with the row.
    pub(super) unverified: HashSet<String>,
    pub(super) generation: u64,
}

/// Outcome of a cache-miss read.
#[derive(Debug)]
enum ColdRead {
    Found(UserStats),
    /// No row, or the read overlapped a reset.
    Missing,
    Failed,
}

/// State shared between the store handle and its persistence task.
#[derive(Debug)]
pub(super) struct StoreState {
    pub(super) db: Database,
    pub(super) cache: RwLock<StatsCache>,
    pub(super) write_lock: Mutex<()>,
}

/// Cached, durably replicated per-user statistics.
#[derive(Debug)]
pub struct StatsStore {
    state: Arc<StoreState>,
    queue: PersistQueue,
}

impl StatsStore {
    /// Opens (creating if needed) the database at `path` and starts the persistence task.
    ///
    /// Must be called inside a Tokio runtime.
    pub async fn open(path: impl AsRef<Path>, config: &PersistenceConfig) -> Result<Self> {
        let db = Database::new(path.as_ref(), config.busy_timeout());
        db.initialize()
            .await
            .with_context(|| format!("Failed to open stats store at {}", path.as_ref().display()))?;
        let state = Arc::new(StoreState {
            db,
            cache: RwLock::new(StatsCache::default()),
            write_lock: Mutex::new(()),
        });
        let queue = PersistQueue::spawn(Arc::clone(&state), config.queue_capacity);
        Ok(Self { state, queue })
    }

    pub fn database_path(&self) -> &Path {
        self.state.db.path()
    }

    /// Counts one answer for `user_id` and queues a durable upsert of the full row.
    ///
    /// An empty `username` never overwrites a known one. The durable write
    /// happens later on the persistence task; use [`StatsStore::flush`] to wait for it.
    #[instrument(skip(self, user_id, username), fields(user = %user_id))]
    pub async fn record_answer(&self, user_id: &str, is_correct: bool, username: &str) {
        // Warm a cold entry from the table so a restart keeps counting.
        let warm_failed = !self.is_cached(user_id).await
            && matches!(self.load_into_cache(user_id).await, ColdRead::Failed);

        let updated = {
            let mut cache = self.state.cache.write().await;
            if warm_failed && !cache.entries.contains_key(user_id) {
                warn!("Stats row unreadable; counting increments until it can be merged");
                cache.unverified.insert(user_id.to_string());
            }
            let entry = cache
                .entries
                .entry(user_id.to_string())
                .or_insert_with(|| UserStats::new(user_id));
            entry.record(is_correct, username);
            entry.clone()
        };
        info!(
            total = updated.total_challenges,
            correct = updated.correct_answers,
            username = %updated.username,
            "Updated stats"
        );

        self.queue.enqueue(user_id.to_string()).await;
    }

    /// Current record for `user_id`; zeroed (and not cached) when the user has no history.
    pub async fn get_user_stats(&self, user_id: &str) -> UserStats {
        if let Some(stats) = self.state.cache.read().await.entries.get(user_id) {
            return stats.clone();
        }
        match self.load_into_cache(user_id).await {
            ColdRead::Found(stats) => stats,
            ColdRead::Missing | ColdRead::Failed => UserStats::new(user_id),
        }
    }

    /// Top `limit` players plus `user_id`'s own rank.
    ///
    /// Pending upserts are flushed first so the board reflects every recorded
    /// answer. Storage failures are logged and yield an empty board.
    pub async fn get_leaderboard(&self, user_id: &str, limit: usize) -> Leaderboard {
        self.flush().await;
        let _guard = self.state.write_lock.lock().await;

        let key = user_id.to_string();
        let result = self
            .state
            .db
            .run(move |conn| {
                let top = db::top_users(conn, limit)?;
                let mut user = None;
                if !key.is_empty() {
                    if let Some(stats) = db::load(conn, &key)?.filter(|s| s.total_challenges > 0) {
                        let rank = db::rank_of(conn, &stats)?;
                        user = Some((rank, stats));
                    }
                }
                Ok((top, user))
            })
            .await;

        match result {
            Ok((top, user)) => {
                info!("Retrieved leaderboard: {} top users", top.len());
                Leaderboard::from_rows(top, user)
            }
            Err(e) => {
                error!("Error getting leaderboard: {:#}", e);
                Leaderboard::default()
            }
        }
    }

    /// Deletes every durable row and clears the cache.
    ///
    /// Holds the write lock and the cache lock for the whole operation, so no
    /// reader sees a wiped table behind a populated cache or the reverse. On
    /// failure the table is rolled back, the cache is untouched, and the error
    /// is returned.
    pub async fn reset_leaderboard(&self) -> Result<()> {
        let _guard = self.state.write_lock.lock().await;
        let mut cache = self.state.cache.write().await;

        let removed = self
            .state
            .db
            .run(db::delete_all)
            .await
            .context("Failed to reset leaderboard")?;

        cache.entries.clear();
        cache.unverified.clear();
        cache.generation += 1;
        warn!(
            "All user statistics have been deleted ({} rows); in-memory cache cleared",
            removed
        );
        Ok(())
    }

    /// Waits until every upsert queued so far has been written (or has failed).
    pub async fn flush(&self) {
        self.queue.flush().await;
    }

    async fn is_cached(&self, user_id: &str) -> bool {
        self.state.cache.read().await.entries.contains_key(user_id)
    }

    /// Reads the durable row into the cache.
    async fn load_into_cache(&self, user_id: &str) -> ColdRead {
        let generation = self.state.cache.read().await.generation;
        let key = user_id.to_string();
        match self.state.db.run(move |conn| db::load(conn, &key)).await {
            Ok(Some(loaded)) => self.cache_loaded(generation, loaded).await,
            Ok(None) => ColdRead::Missing,
            Err(e) => {
                error!(user = %user_id, "Error loading stats: {:#}", e);
                ColdRead::Failed
            }
        }
    }

    /// Caches a row read under `generation`, unless a reset has run since.
    /// An entry cached in the meantime is newer and is kept.
    async fn cache_loaded(&self, generation: u64, loaded: UserStats) -> ColdRead {
        let mut cache = self.state.cache.write().await;
        if cache.generation != generation {
            debug!(user = %loaded.user_id, "Discarding stats read across a reset");
            return ColdRead::Missing;
        }
        debug!(user = %loaded.user_id, "Loaded stats from database");
        let cached = cache
            .entries
            .entry(loaded.user_id.clone())
            .or_insert(loaded);
        ColdRead::Found(cached.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    async fn open_in(dir: &TempDir) -> StatsStore {
        StatsStore::open(dir.path().join("user_stats.db"), &PersistenceConfig::default())
            .await
            .unwrap()
    }

    async fn record_many(store: &StatsStore, user_id: &str, correct: u64, total: u64) {
        for i in 0..total {
            store.record_answer(user_id, i < correct, "").await;
        }
    }

    #[tokio::test]
    async fn counts_match_recorded_answers() {
        let dir = tempdir().unwrap();
        let store = open_in(&dir).await;
        let answers = [true, false, true, true, false];

        for is_correct in answers {
            store.record_answer("u1", is_correct, "").await;
        }

        let stats = store.get_user_stats("u1").await;
        assert_eq!(stats.total_challenges, 5);
        assert_eq!(stats.correct_answers, 3);
    }

    #[tokio::test]
    async fn unknown_user_is_zeroed_and_not_cached() {
        let dir = tempdir().unwrap();
        let store = open_in(&dir).await;

        assert_eq!(store.get_user_stats("ghost").await, UserStats::new("ghost"));
        assert!(!store.is_cached("ghost").await);
    }

    #[tokio::test]
    async fn empty_username_keeps_previous_one() {
        let dir = tempdir().unwrap();
        let store = open_in(&dir).await;

        store.record_answer("u1", true, "alice").await;
        store.record_answer("u1", false, "").await;
        assert_eq!(store.get_user_stats("u1").await.username, "alice");

        store.record_answer("u1", false, "alice_w").await;
        assert_eq!(store.get_user_stats("u1").await.username, "alice_w");
    }

    #[tokio::test]
    async fn fresh_store_reads_persisted_rows() {
        let dir = tempdir().unwrap();
        let store = open_in(&dir).await;
        store.record_answer("u1", true, "alice").await;
        store.record_answer("u1", false, "").await;
        store.record_answer("u2", false, "bob").await;
        store.flush().await;

        let reopened = open_in(&dir).await;
        assert_eq!(
            reopened.get_user_stats("u1").await,
            store.get_user_stats("u1").await
        );
        let u2 = reopened.get_user_stats("u2").await;
        assert_eq!((u2.total_challenges, u2.correct_answers), (1, 0));
        assert_eq!(u2.username, "bob");
    }

    #[tokio::test]
    async fn restarted_store_keeps_counting() {
        let dir = tempdir().unwrap();
        let store = open_in(&dir).await;
        record_many(&store, "u1", 2, 3).await;
        store.flush().await;

        let reopened = open_in(&dir).await;
        reopened.record_answer("u1", true, "").await;

        let stats = reopened.get_user_stats("u1").await;
        assert_eq!((stats.correct_answers, stats.total_challenges), (3, 4));
    }

    #[tokio::test]
    async fn concurrent_records_are_not_lost() {
        let dir = tempdir().unwrap();
        let store = Arc::new(open_in(&dir).await);

        let mut handles = Vec::new();
        for i in 0..40 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.record_answer("shared", i % 2 == 0, "").await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        store.flush().await;

        let stats = store.get_user_stats("shared").await;
        assert_eq!((stats.correct_answers, stats.total_challenges), (20, 40));
        let durable = open_in(&dir).await.get_user_stats("shared").await;
        assert_eq!(durable, stats);
    }

    #[tokio::test]
    async fn leaderboard_orders_and_ranks() {
        let dir = tempdir().unwrap();
        let store = open_in(&dir).await;
        record_many(&store, "u510", 5, 10).await;
        record_many(&store, "u58", 5, 8).await;
        record_many(&store, "u720", 7, 20).await;
        store.record_answer("u720", false, "carol").await;

        let board = store.get_leaderboard("u510", 10).await;
        let order: Vec<_> = board.top_users.iter().map(|e| e.user_id.as_str()).collect();
        assert_eq!(order, ["u720", "u58", "u510"]);
        assert_eq!(board.top_users[0].display_name, "carol");
        assert_eq!(board.top_users[1].display_name, "Anonymous");
        assert_eq!(board.top_users[1].accuracy_percent, 62.5);

        let mine = board.user_rank.unwrap();
        assert_eq!(mine.rank, 3);
        assert_eq!(mine.accuracy_percent, 50.0);
    }

    #[tokio::test]
    async fn user_rank_consistent_outside_limit() {
        let dir = tempdir().unwrap();
        let store = open_in(&dir).await;
        record_many(&store, "u510", 5, 10).await;
        record_many(&store, "u58", 5, 8).await;
        record_many(&store, "u720", 7, 20).await;

        let board = store.get_leaderboard("u510", 1).await;
        assert_eq!(board.top_users.len(), 1);
        assert_eq!(board.top_users[0].user_id, "u720");
        assert_eq!(board.user_rank.unwrap().rank, 3);
    }

    #[tokio::test]
    async fn user_without_answers_has_no_rank() {
        let dir = tempdir().unwrap();
        let store = open_in(&dir).await;
        record_many(&store, "u1", 1, 1).await;

        let board = store.get_leaderboard("newcomer", 10).await;
        assert_eq!(board.top_users.len(), 1);
        assert!(board.user_rank.is_none());
        assert!(store.get_leaderboard("", 10).await.user_rank.is_none());
    }

    #[tokio::test]
    async fn reset_wipes_cache_and_table() {
        let dir = tempdir().unwrap();
        let store = open_in(&dir).await;
        record_many(&store, "u1", 3, 4).await;
        record_many(&store, "u2", 1, 1).await;
        store.flush().await;

        store.reset_leaderboard().await.unwrap();

        assert_eq!(store.get_user_stats("u1").await, UserStats::new("u1"));
        assert!(store.get_leaderboard("u1", 10).await.top_users.is_empty());
        let reopened = open_in(&dir).await;
        assert_eq!(reopened.get_user_stats("u2").await, UserStats::new("u2"));
    }

    #[tokio::test]
    async fn upserts_queued_before_reset_do_not_resurrect_rows() {
        let dir = tempdir().unwrap();
        let store = open_in(&dir).await;
        record_many(&store, "u1", 2, 2).await;

        // No flush: the upserts may still be queued when the reset runs.
        store.reset_leaderboard().await.unwrap();
        store.flush().await;

        let reopened = open_in(&dir).await;
        assert_eq!(reopened.get_user_stats("u1").await, UserStats::new("u1"));
    }

    #[tokio::test]
    async fn reset_failure_is_propagated() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let store = StatsStore::open(data_dir.join("user_stats.db"), &PersistenceConfig::default())
            .await
            .unwrap();
        std::fs::remove_dir_all(&data_dir).unwrap();

        let result = store.reset_leaderboard().await;
        assert!(result.is_err());
        assert!(format!("{:#}", result.unwrap_err()).contains("Failed to reset leaderboard"));
    }

    #[tokio::test]
    async fn write_failure_keeps_memory_updated() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let store = StatsStore::open(data_dir.join("user_stats.db"), &PersistenceConfig::default())
            .await
            .unwrap();
        std::fs::remove_dir_all(&data_dir).unwrap();

        store.record_answer("u1", true, "").await;
        store.flush().await;

        let stats = store.get_user_stats("u1").await;
        assert_eq!((stats.correct_answers, stats.total_challenges), (1, 1));
        // Cold reads against the broken store degrade to zero.
        assert_eq!(store.get_user_stats("u2").await, UserStats::new("u2"));
    }

    #[tokio::test]
    async fn unreadable_row_during_warm_up_does_not_shrink_durable_counts() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let moved_dir = dir.path().join("data-offline");
        let db_path = data_dir.join("user_stats.db");
        let config = PersistenceConfig::default();
        {
            let seed = StatsStore::open(&db_path, &config).await.unwrap();
            record_many(&seed, "u1", 5, 10).await;
            seed.flush().await;
        }

        let store = StatsStore::open(&db_path, &config).await.unwrap();
        std::fs::rename(&data_dir, &moved_dir).unwrap();
        store.record_answer("u1", true, "").await;
        store.flush().await;
        std::fs::rename(&moved_dir, &data_dir).unwrap();
        store.record_answer("u1", true, "").await;
        store.flush().await;

        let stats = store.get_user_stats("u1").await;
        assert_eq!((stats.correct_answers, stats.total_challenges), (7, 12));
        let durable = StatsStore::open(&db_path, &config)
            .await
            .unwrap()
            .get_user_stats("u1")
            .await;
        assert_eq!((durable.correct_answers, durable.total_challenges), (7, 12));
    }

    #[tokio::test]
    async fn cold_read_overlapping_reset_is_discarded() {
        let dir = tempdir().unwrap();
        {
            let seed = open_in(&dir).await;
            record_many(&seed, "u1", 3, 4).await;
            seed.flush().await;
        }
        let store = open_in(&dir).await;

        // Read the row the way a cache miss does, then let a reset win the race.
        let generation = store.state.cache.read().await.generation;
        let row = store
            .state
            .db
            .run(|conn| db::load(conn, "u1"))
            .await
            .unwrap()
            .unwrap();
        store.reset_leaderboard().await.unwrap();

        assert!(matches!(
            store.cache_loaded(generation, row).await,
            ColdRead::Missing
        ));
        assert!(!store.is_cached("u1").await);
        assert_eq!(store.get_user_stats("u1").await, UserStats::new("u1"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_cold_reads_never_outlive_reset() {
        let dir = tempdir().unwrap();
        let users: Vec<String> = (0..20).map(|i| format!("u{}", i)).collect();
        {
            let seed = open_in(&dir).await;
            for user in &users {
                record_many(&seed, user, 1, 2).await;
            }
            seed.flush().await;
        }
        let store = Arc::new(open_in(&dir).await);

        let mut readers = Vec::new();
        for user in users.clone() {
            let store = Arc::clone(&store);
            readers.push(tokio::spawn(async move {
                for _ in 0..5 {
                    store.get_user_stats(&user).await;
                }
            }));
        }
        store.reset_leaderboard().await.unwrap();
        for reader in readers {
            reader.await.unwrap();
        }

        for user in &users {
            assert_eq!(
                store.get_user_stats(user).await,
                UserStats::new(user.as_str())
            );
        }
        assert!(store.get_leaderboard("u0", 10).await.top_users.is_empty());
    }
}
