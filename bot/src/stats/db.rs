//! # Durable Stats Table
//!
//! File: bot/src/stats/db.rs
//!
//! ## Overview
//!
//! Synchronous `rusqlite` access to the `user_stats` table. Every operation
//! opens its own connection, does its work, commits, and closes, so no
//! connection is ever shared between tasks.
//!
//! ## Architecture
//!
//! - `Database` carries the path and busy timeout and runs closures on the
//!   blocking thread pool via `tokio::task::spawn_blocking`.
//! - The free functions take a `&Connection` and hold the SQL. They are plain
//!   sync code and are unit-tested against a temporary file.
//! - Counters are stored as SQLite `INTEGER` (i64) and converted at the edge.
//!
//! Serialization of writes is not handled here; callers hold the store's
//! write lock around `run` when they mutate.
//!
use super::UserStats;
use crate::core::error::{GameError, Result};
use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS user_stats (
        user_id TEXT PRIMARY KEY,
        total_challenges INTEGER DEFAULT 0,
        correct_answers INTEGER DEFAULT 0,
        username TEXT DEFAULT ''
    )";

/// Location and connection settings of the stats database.
#[derive(Debug, Clone)]
pub(crate) struct Database {
    path: PathBuf,
    busy_timeout: Duration,
}

impl Database {
    pub(crate) fn new(path: impl Into<PathBuf>, busy_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            busy_timeout,
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Opens a fresh connection, hands it to `f` on the blocking pool, then drops it.
    pub(crate) async fn run<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let path = self.path.clone();
        let busy_timeout = self.busy_timeout;
        let outcome = tokio::task::spawn_blocking(move || {
            let mut conn = open(&path, busy_timeout)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| GameError::Persistence(format!("Database task failed: {}", e)))?;
        outcome
            .map_err(GameError::from)
            .with_context(|| format!("Database operation failed on {}", self.path.display()))
    }

    /// Creates the data directory and table, migrating older schemas.
    pub(crate) async fn initialize(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create data directory {}", parent.display()))?;
        }
        self.run(migrate).await?;
        info!("Stats database ready at {}", self.path.display());
        Ok(())
    }
}

fn open(path: &Path, busy_timeout: Duration) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(busy_timeout)?;
    Ok(conn)
}

/// Creates `user_stats` and adds the `username` column if an older table lacks it.
pub(crate) fn migrate(conn: &mut Connection) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    tx.execute(CREATE_TABLE, [])?;
    let has_username = {
        let mut stmt = tx.prepare("PRAGMA table_info(user_stats)")?;
        let columns = stmt.query_map([], |row| row.get::<_, String>(1))?;
        let mut found = false;
        for column in columns {
            if column? == "username" {
                found = true;
            }
        }
        found
    };
    if !has_username {
        info!("Adding username column to user_stats table");
        tx.execute(
            "ALTER TABLE user_stats ADD COLUMN username TEXT DEFAULT ''",
            [],
        )?;
    }
    tx.commit()
}

/// Inserts or replaces the full row for one user.
pub(crate) fn upsert(conn: &Connection, stats: &UserStats) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO user_stats (user_id, total_challenges, correct_answers, username)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            stats.user_id,
            to_sql_count(stats.total_challenges),
            to_sql_count(stats.correct_answers),
            stats.username,
        ],
    )?;
    debug!(user = %stats.user_id, "Upserted stats row");
    Ok(())
}

pub(crate) fn load(conn: &Connection, user_id: &str) -> rusqlite::Result<Option<UserStats>> {
    conn.query_row(
        "SELECT user_id, total_challenges, correct_answers, username
         FROM user_stats WHERE user_id = ?1",
        params![user_id],
        row_to_stats,
    )
    .optional()
}

/// Deletes every row in one transaction. Returns the number removed.
pub(crate) fn delete_all(conn: &mut Connection) -> rusqlite::Result<usize> {
    let tx = conn.transaction()?;
    let removed = tx.execute("DELETE FROM user_stats", [])?;
    tx.commit()?;
    Ok(removed)
}

/// Players with at least one answer, best first.
///
/// Ordered by correct answers descending, then by fewer attempts; `user_id`
/// breaks exact ties so the order is stable.
pub(crate) fn top_users(conn: &Connection, limit: usize) -> rusqlite::Result<Vec<UserStats>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, total_challenges, correct_answers, username
         FROM user_stats
         WHERE total_challenges > 0
         ORDER BY correct_answers DESC, total_challenges ASC, user_id ASC
         LIMIT ?1",
    )?;
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = stmt.query_map(params![limit], row_to_stats)?;
    rows.collect()
}

/// 1-based rank of `stats` under the same ordering as `top_users`.
pub(crate) fn rank_of(conn: &Connection, stats: &UserStats) -> rusqlite::Result<u64> {
    let correct = to_sql_count(stats.correct_answers);
    let total = to_sql_count(stats.total_challenges);
    let ahead: i64 = conn.query_row(
        "SELECT COUNT(*)
         FROM user_stats
         WHERE total_challenges > 0 AND (
             correct_answers > ?1 OR
             (correct_answers = ?1 AND total_challenges < ?2)
         )",
        params![correct, total],
        |row| row.get(0),
    )?;
    Ok(from_sql_count(ahead) + 1)
}

fn row_to_stats(row: &Row<'_>) -> rusqlite::Result<UserStats> {
    Ok(UserStats {
        user_id: row.get(0)?,
        total_challenges: from_sql_count(row.get::<_, Option<i64>>(1)?.unwrap_or(0)),
        correct_answers: from_sql_count(row.get::<_, Option<i64>>(2)?.unwrap_or(0)),
        username: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
    })
}

fn to_sql_count(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

fn from_sql_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
