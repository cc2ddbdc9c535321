//! # Background Persistence
//!
//! File: bot/src/stats/persistence.rs
//!
//! A bounded queue of upsert requests drained by one Tokio task. Commands
//! carry only the user id; the task reads the current row from the cache
//! under the store's write lock and writes it, so the order in which requests
//! were queued never matters for the final table contents.
//!
//! `Flush` is answered once every command queued before it has been handled,
//! which is how callers wait for durability (tests, leaderboard reads,
//! shutdown).
//!
use super::db;
use super::store::StoreState;
use crate::core::error::Result;
use anyhow::Context;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

#[derive(Debug)]
enum PersistCommand {
    Upsert { user_id: String },
    Flush { done: oneshot::Sender<()> },
}

/// Sending half of the persistence queue. The task stops once this is dropped.
#[derive(Debug, Clone)]
pub(super) struct PersistQueue {
    sender: mpsc::Sender<PersistCommand>,
}

impl PersistQueue {
    /// Spawns the drain task on the current runtime.
    pub(super) fn spawn(state: Arc<StoreState>, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        tokio::spawn(drain(state, receiver));
        Self { sender }
    }

    /// Queues an upsert of `user_id`'s row. Waits only if the queue is full.
    pub(super) async fn enqueue(&self, user_id: String) {
        if let Err(e) = self.sender.send(PersistCommand::Upsert { user_id }).await {
            if let PersistCommand::Upsert { user_id } = e.0 {
                error!(user = %user_id, "Persistence queue closed; stats not saved");
            }
        }
    }

    pub(super) async fn flush(&self) {
        let (done, finished) = oneshot::channel();
        if self.sender.send(PersistCommand::Flush { done }).await.is_err() {
            warn!("Persistence queue closed; nothing to flush");
            return;
        }
        if finished.await.is_err() {
            warn!("Persistence task stopped before flush completed");
        }
    }
}

async fn drain(state: Arc<StoreState>, mut receiver: mpsc::Receiver<PersistCommand>) {
    while let Some(command) = receiver.recv().await {
        match command {
            PersistCommand::Upsert { user_id } => {
                if let Err(e) = persist_user(&state, &user_id).await {
                    error!(user = %user_id, "Error saving stats: {:#}", e);
                }
            }
            PersistCommand::Flush { done } => {
                // The caller may have given up waiting; nothing to do then.
                let _ = done.send(());
            }
        }
    }
    debug!("Persistence queue drained and closed");
}

/// Writes the cached row for `user_id` under the write lock.
///
/// An unverified entry is first merged with the durable row; while that row
/// stays unreadable nothing is written.
async fn persist_user(state: &StoreState, user_id: &str) -> Result<()> {
    let _guard = state.write_lock.lock().await;
    if state.cache.read().await.unverified.contains(user_id) {
        merge_durable(state, user_id).await?;
    }
    let Some(row) = state.cache.read().await.entries.get(user_id).cloned() else {
        debug!(user = %user_id, "Stats no longer cached (reset), skipping save");
        return Ok(());
    };
    state.db.run(move |conn| db::upsert(conn, &row)).await?;
    info!(user = %user_id, "Saved stats");
    Ok(())
}

/// Folds the durable row into an unverified entry. Caller holds the write lock.
async fn merge_durable(state: &StoreState, user_id: &str) -> Result<()> {
    let key = user_id.to_string();
    let durable = state
        .db
        .run(move |conn| db::load(conn, &key))
        .await
        .context("Stats row still unreadable; keeping increments in memory")?;

    let mut cache = state.cache.write().await;
    if !cache.unverified.remove(user_id) {
        return Ok(());
    }
    if let (Some(entry), Some(durable)) = (cache.entries.get_mut(user_id), durable) {
        entry.absorb(&durable);
        info!(
            user = %user_id,
            total = entry.total_challenges,
            correct = entry.correct_answers,
            "Merged pending answers with stored stats"
        );
    }
    Ok(())
}
