//! # Illusion Game Facade
//!
//! File: bot/src/game/mod.rs
//!
//! ## Overview
//!
//! `IllusionGame` is the only surface the chat transport talks to. It owns
//! the `ChallengeRegistry` (who is being asked what) and the `StatsStore`
//! (how well everyone has done) and passes calls straight through to them.
//!
//! ## Answer flow
//!
//! Checking and recording are separate on purpose. The registry never learns
//! who answered, and the stats store never sees challenge content. A transport
//! handling a button press does:
//!
//! ```ignore
//! let challenge = game.get_active_challenge(&chat_id).await; // for feedback text
//! let is_correct = game.check_answer(&chat_id, &pressed).await;
//! if challenge.is_some() {
//!     game.record_answer(&user_id, is_correct, &display_name).await;
//! }
//! ```
//!
//! ## Lifecycle
//!
//! `spawn_cleanup` starts the periodic expiry sweep; `shutdown` stops it and
//! flushes pending stats writes so nothing is lost on exit.
//!
pub mod challenge;
pub mod generation;
pub mod registry;

pub use challenge::{Answer, Challenge};
pub use generation::{IllusionSource, PuzzleDescription};
pub use registry::ChallengeRegistry;

use crate::core::config::Config;
use crate::core::error::{GameError, Result};
use crate::stats::{Leaderboard, StatsStore, UserStats};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

/// Challenge lifecycle plus player statistics behind one handle.
#[derive(Debug)]
pub struct IllusionGame {
    challenges: ChallengeRegistry,
    stats: StatsStore,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl IllusionGame {
    pub fn new(challenges: ChallengeRegistry, stats: StatsStore) -> Self {
        Self {
            challenges,
            stats,
            sweeper: Mutex::new(None),
        }
    }

    /// Builds the registry and opens the stats store described by `config`.
    pub async fn open(config: &Config) -> Result<Self> {
        let stats =
            StatsStore::open(config.storage.database_path(), &config.persistence).await?;
        let challenges = ChallengeRegistry::new(config.challenges.timeout());
        Ok(Self::new(challenges, stats))
    }

    /// Stores a challenge for the conversation. `None` when the id is empty.
    pub async fn start_challenge(
        &self,
        conversation_id: &str,
        prompt: impl Into<String>,
        correct_answer: Answer,
        explanation: impl Into<String>,
        image: Vec<u8>,
    ) -> Option<Arc<Challenge>> {
        self.challenges
            .start_challenge(
                conversation_id,
                prompt.into(),
                correct_answer,
                explanation.into(),
                image,
            )
            .await
    }

    /// Asks `source` for a puzzle and its image, then starts it for the conversation.
    ///
    /// Nothing is stored if either call fails or returns empty content.
    #[instrument(skip(self, source, conversation_id), fields(conversation = %conversation_id))]
    pub async fn create_challenge<S>(
        &self,
        conversation_id: &str,
        source: &S,
    ) -> Result<Arc<Challenge>>
    where
        S: IllusionSource + Sync,
    {
        let puzzle = source.describe_puzzle().await?;
        if puzzle.prompt.trim().is_empty() {
            let reason = "puzzle description has an empty prompt";
            return Err(GameError::Generation(reason.into()).into());
        }
        debug!("Received prompt: {}", puzzle.prompt);

        let image = source.render_image(&puzzle.prompt).await?;
        if image.is_empty() {
            let reason = "image generator returned no data";
            return Err(GameError::Generation(reason.into()).into());
        }

        self.start_challenge(
            conversation_id,
            puzzle.prompt,
            puzzle.correct_answer,
            puzzle.explanation,
            image,
        )
        .await
        .ok_or_else(|| {
            GameError::Generation(format!(
                "challenge for conversation '{}' was not stored",
                conversation_id
            ))
            .into()
        })
    }

    pub async fn get_active_challenge(&self, conversation_id: &str) -> Option<Arc<Challenge>> {
        self.challenges.get_active_challenge(conversation_id).await
    }

    /// Consumes the conversation's challenge. Does not touch statistics.
    pub async fn check_answer(&self, conversation_id: &str, answer: &str) -> bool {
        self.challenges.check_answer(conversation_id, answer).await
    }

    pub async fn record_answer(&self, user_id: &str, is_correct: bool, username: &str) {
        self.stats.record_answer(user_id, is_correct, username).await;
    }

    pub async fn get_user_stats(&self, user_id: &str) -> UserStats {
        self.stats.get_user_stats(user_id).await
    }

    pub async fn get_leaderboard(&self, user_id: &str, limit: usize) -> Leaderboard {
        self.stats.get_leaderboard(user_id, limit).await
    }

    pub async fn reset_leaderboard(&self) -> Result<()> {
        self.stats.reset_leaderboard().await
    }

    pub async fn cleanup_expired_challenges(&self) {
        self.challenges.cleanup_expired().await;
    }

    /// Runs `cleanup_expired_challenges` every `interval` until `shutdown`.
    ///
    /// Calling it again replaces the previous sweep. A zero interval is
    /// rejected and leaves any running sweep in place.
    pub async fn spawn_cleanup(self: &Arc<Self>, interval: Duration) -> Result<()> {
        if interval.is_zero() {
            let reason = "cleanup interval must be positive";
            return Err(GameError::Config(reason.into()).into());
        }
        let game = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                game.cleanup_expired_challenges().await;
            }
        });
        if let Some(previous) = self.sweeper.lock().await.replace(handle) {
            previous.abort();
        }
        info!("Expiry sweep scheduled every {:?}", interval);
        Ok(())
    }

    /// Stops the sweep and waits for every pending stats write.
    pub async fn shutdown(&self) {
        if let Some(sweeper) = self.sweeper.lock().await.take() {
            sweeper.abort();
            debug!("Expiry sweep stopped");
        }
        self.stats.flush().await;
        info!("Pending stats writes flushed");
    }

    pub fn challenges(&self) -> &ChallengeRegistry {
        &self.challenges
    }

    pub fn stats(&self) -> &StatsStore {
        &self.stats
    }
}
