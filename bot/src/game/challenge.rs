//! # Challenge Model
//!
//! File: bot/src/game/challenge.rs
//!
//! The `Answer` token a user picks from the three choices, and the `Challenge`
//! record kept for a conversation while it waits for that pick.
//!
use crate::core::error::GameError;
use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;
use std::str::FromStr;

/// Which of the two pictured objects is actually larger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Answer {
    Left,
    Right,
    Equal,
}

impl Answer {
    /// Every answer, in the order the choices are presented.
    pub const ALL: [Answer; 3] = [Answer::Left, Answer::Right, Answer::Equal];

    /// The wire token the chat transport sends back for this choice.
    pub fn as_str(self) -> &'static str {
        match self {
            Answer::Left => "left",
            Answer::Right => "right",
            Answer::Equal => "equal",
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse: tokens are case-sensitive and untrimmed.
impl FromStr for Answer {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Answer::ALL
            .into_iter()
            .find(|answer| answer.as_str() == s)
            .ok_or_else(|| GameError::InvalidAnswer(s.to_string()))
    }
}

/// One outstanding puzzle for one conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub conversation_id: String,
    /// Text handed to the image generator. Opaque to the core.
    pub prompt: String,
    pub correct_answer: Answer,
    pub explanation: String,
    /// Rendered image bytes. Opaque to the core.
    pub image: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

impl Challenge {
    /// Time elapsed since the challenge was started, clamped at zero for clock skew.
    pub fn age(&self, now: DateTime<Utc>) -> TimeDelta {
        (now - self.created_at).max(TimeDelta::zero())
    }

    /// A challenge is expired once its age reaches the timeout.
    pub fn is_expired(&self, now: DateTime<Utc>, timeout: TimeDelta) -> bool {
        self.age(now) >= timeout
    }

    /// Exact comparison of a raw answer token against the stored answer.
    pub fn accepts(&self, answer: &str) -> bool {
        self.correct_answer.as_str() == answer
    }
}
