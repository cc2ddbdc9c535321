//! # Challenge Generation Seam
//!
//! File: bot/src/game/generation.rs
//!
//! The two calls the core needs from the AI providers, and nothing more: a
//! language model describes a puzzle, then an image model renders its prompt.
//! Provider clients live with the chat transport and implement
//! `IllusionSource`; the core only sees the finished strings and bytes.
//!
use super::challenge::Answer;
use crate::core::error::Result;
use std::future::Future;

/// What the language model produced for one puzzle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PuzzleDescription {
    /// Prompt for the image generator.
    pub prompt: String,
    pub correct_answer: Answer,
    pub explanation: String,
}

/// A provider able to invent and render optical-illusion puzzles.
pub trait IllusionSource {
    fn describe_puzzle(&self) -> impl Future<Output = Result<PuzzleDescription>> + Send;

    fn render_image(&self, prompt: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}
