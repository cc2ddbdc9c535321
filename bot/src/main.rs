//! # Illusion Bot Main Entry Point
//!
//! File: bot/src/main.rs
//!
//! ## Overview
//!
//! Operator CLI for the game core. It handles:
//! - Command-line argument parsing using Clap
//! - Setting up logging based on verbosity flags
//! - Loading configuration (with `--data-dir` override)
//! - Routing execution to the command handlers
//!
//! ## Examples
//!
//! ```bash
//! # Show one player's statistics
//! illusion-bot stats 123456
//!
//! # Top five players and where 123456 stands
//! illusion-bot -v leaderboard --user 123456 --limit 5
//!
//! # Run the expiry sweep until Ctrl+C
//! illusion-bot serve
//! ```
//!
use clap::Parser;
use illusion_bot::core::config;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

/// Top-level command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "illusion-bot",
    about = "Optical illusion challenge bot: statistics, leaderboard and challenge sweep",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Directory holding the stats database (overrides configuration files).
    #[arg(long, global = true, env = "ILLUSION_BOT_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Record one answer for a user.
    Record(commands::record::RecordArgs),
    /// Show a user's statistics.
    Stats(commands::stats::StatsArgs),
    /// Show the leaderboard.
    #[command(alias = "top")]
    Leaderboard(commands::leaderboard::LeaderboardArgs),
    /// Delete every user's statistics.
    ResetLeaderboard(commands::reset::ResetArgs),
    /// Run the periodic challenge sweep until interrupted.
    Serve(commands::serve::ServeArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let command_result = match config::load_config(cli.data_dir.as_deref()) {
        Ok(cfg) => match cli.command {
            Commands::Record(args) => commands::record::handle_record(args, &cfg).await,
            Commands::Stats(args) => commands::stats::handle_stats(args, &cfg).await,
            Commands::Leaderboard(args) => {
                commands::leaderboard::handle_leaderboard(args, &cfg).await
            }
            Commands::ResetLeaderboard(args) => commands::reset::handle_reset(args, &cfg).await,
            Commands::Serve(args) => commands::serve::handle_serve(args, &cfg).await,
        },
        Err(e) => Err(e),
    };

    if let Err(e) = command_result {
        tracing::error!("Command execution failed: {:?}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
