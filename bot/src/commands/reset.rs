//! # Reset Leaderboard Command
//!
//! File: bot/src/commands/reset.rs
//!
//! Deletes every user's statistics, both the durable rows and the in-memory
//! cache. Irreversible, so it refuses to run without `--yes`.
//!
use anyhow::bail;
use clap::Parser;
use illusion_bot::core::config::Config;
use illusion_bot::core::error::Result;
use illusion_bot::IllusionGame;
use tracing::{info, warn};

#[derive(Parser, Debug)]
pub struct ResetArgs {
    /// Confirm that all statistics should be deleted.
    #[arg(long)]
    pub yes: bool,
}

pub async fn handle_reset(args: ResetArgs, config: &Config) -> Result<()> {
    info!("Handling reset-leaderboard command with args: {:?}", args);
    if !args.yes {
        bail!(
            "Refusing to delete all statistics in {} without --yes",
            config.storage.database_path().display()
        );
    }

    let game = IllusionGame::open(config).await?;
    if let Err(e) = game.reset_leaderboard().await {
        warn!("Leaderboard reset failed: {:#}", e);
        return Err(e);
    }
    game.shutdown().await;

    println!("Leaderboard reset. All user statistics were deleted.");
    Ok(())
}
