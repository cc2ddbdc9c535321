//! # Challenge Registry
//!
//! File: bot/src/game/registry.rs
//!
//! ## Overview
//!
//! In-memory map from conversation identifier to the single active challenge
//! of that conversation. Entries expire lazily: a read treats an aged-out
//! challenge as absent but leaves it in the map, and `cleanup_expired` is the
//! only thing that physically removes stale entries.
//!
//! ## Architecture
//!
//! - One coarse `tokio::sync::Mutex` guards the whole map, so the
//!   read-compare-delete in `check_answer` cannot interleave with a concurrent
//!   `start_challenge` or `check_answer` for the same conversation.
//! - Challenges are stored behind `Arc` so readers get a cheap handle to the
//!   image bytes without copying them out of the lock.
//! - `check_answer` evaluates whatever challenge is stored, expired or not.
//!   Expiry only governs `get_active_challenge` and the sweep.
//!
use super::challenge::{Answer, Challenge};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Challenge age at which reads start treating it as gone.
pub const DEFAULT_CHALLENGE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Owner of every in-flight challenge.
#[derive(Debug)]
pub struct ChallengeRegistry {
    active: Mutex<HashMap<String, Arc<Challenge>>>,
    timeout: TimeDelta,
}

impl Default for ChallengeRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CHALLENGE_TIMEOUT)
    }
}

impl ChallengeRegistry {
    pub fn new(timeout: Duration) -> Self {
        Self {
            active: Mutex::new(HashMap::new()),
            timeout: TimeDelta::from_std(timeout).unwrap_or(TimeDelta::MAX),
        }
    }

    pub fn timeout(&self) -> TimeDelta {
        self.timeout
    }

    /// Stores a fresh challenge, replacing any unresolved one for the conversation,
    /// and returns the stored handle.
    ///
    /// An empty conversation id cannot own a challenge; the call is logged and
    /// ignored and `None` is returned.
    #[instrument(skip_all, fields(conversation = %conversation_id))]
    pub async fn start_challenge(
        &self,
        conversation_id: &str,
        prompt: String,
        correct_answer: Answer,
        explanation: String,
        image: Vec<u8>,
    ) -> Option<Arc<Challenge>> {
        if conversation_id.is_empty() {
            warn!("Refusing to start a challenge without a conversation id.");
            return None;
        }
        let challenge = Challenge {
            conversation_id: conversation_id.to_string(),
            prompt,
            correct_answer,
            explanation,
            image,
            created_at: Utc::now(),
        };
        Some(self.insert(challenge).await)
    }

    /// Inserts a fully built challenge, keeping its timestamp.
    async fn insert(&self, challenge: Challenge) -> Arc<Challenge> {
        let challenge = Arc::new(challenge);
        let replaced = self
            .active
            .lock()
            .await
            .insert(challenge.conversation_id.clone(), Arc::clone(&challenge))
            .is_some();
        if replaced {
            debug!("Replaced an unresolved challenge.");
        }
        info!("Challenge started with answer: {}", challenge.correct_answer);
        challenge
    }

    /// Returns the stored challenge unless it has aged out. Never evicts.
    pub async fn get_active_challenge(&self, conversation_id: &str) -> Option<Arc<Challenge>> {
        let active = self.active.lock().await;
        let challenge = active.get(conversation_id)?;
        let now = Utc::now();
        if challenge.is_expired(now, self.timeout) {
            debug!(
                conversation = %conversation_id,
                "Challenge expired, created {:.1} minutes ago",
                minutes(challenge.age(now))
            );
            return None;
        }
        Some(Arc::clone(challenge))
    }

    /// Removes the conversation's challenge and reports whether `answer` matched it.
    ///
    /// Returns `false` without side effects when nothing is stored. Expiry is
    /// not consulted.
    #[instrument(skip(self, conversation_id), fields(conversation = %conversation_id))]
    pub async fn check_answer(&self, conversation_id: &str, answer: &str) -> bool {
        let Some(challenge) = self.active.lock().await.remove(conversation_id) else {
            info!("No active challenge found.");
            return false;
        };
        let is_correct = challenge.accepts(answer);
        info!(
            "Answer is {}",
            if is_correct { "correct" } else { "incorrect" }
        );
        is_correct
    }

    /// Deletes every challenge whose age has reached the timeout. Returns how many went.
    pub async fn cleanup_expired(&self) -> usize {
        self.cleanup_expired_at(Utc::now()).await
    }

    async fn cleanup_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut active = self.active.lock().await;
        let before = active.len();
        active.retain(|conversation_id, challenge| {
            let expired = challenge.is_expired(now, self.timeout);
            if expired {
                debug!(conversation = %conversation_id, "Removing expired challenge");
            }
            !expired
        });
        let removed = before - active.len();
        info!("Cleaned up {} expired challenges", removed);
        removed
    }

    /// Number of stored challenges, stale ones included.
    pub async fn len(&self) -> usize {
        self.active.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn minutes(age: TimeDelta) -> f64 {
    age.num_milliseconds() as f64 / 60_000.0
}
