//! # Record Command
//!
//! File: bot/src/commands/record.rs
//!
//! Counts one answer for a user, exactly as the chat transport does after a
//! button press. Useful for seeding a fresh database or correcting a player's
//! record by hand.
//!
use clap::{ArgGroup, Parser};
use illusion_bot::core::config::Config;
use illusion_bot::core::error::Result;
use illusion_bot::IllusionGame;
use tracing::info;

#[derive(Parser, Debug)]
#[command(group(
    ArgGroup::new("outcome")
        .required(true)
        .args(["correct", "incorrect"])
))]
pub struct RecordArgs {
    /// User identifier as the chat transport reports it.
    pub user_id: String,

    /// The answer was correct.
    #[arg(long)]
    pub correct: bool,

    /// The answer was wrong.
    #[arg(long)]
    pub incorrect: bool,

    /// Display name to remember for the leaderboard. Empty keeps the known one.
    #[arg(long, default_value = "")]
    pub username: String,
}

pub async fn handle_record(args: RecordArgs, config: &Config) -> Result<()> {
    info!("Handling record command with args: {:?}", args);
    let game = IllusionGame::open(config).await?;

    game.record_answer(&args.user_id, args.correct, &args.username)
        .await;
    game.shutdown().await;

    let stats = game.get_user_stats(&args.user_id).await;
    println!(
        "Recorded {} answer for {}: {}/{} correct",
        if args.correct { "a correct" } else { "an incorrect" },
        args.user_id,
        stats.correct_answers,
        stats.total_challenges
    );
    Ok(())
}
