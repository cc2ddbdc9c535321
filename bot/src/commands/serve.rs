//! # Serve Command
//!
//! File: bot/src/commands/serve.rs
//!
//! Keeps the game core alive with its periodic expiry sweep until Ctrl+C or
//! SIGTERM, then stops the sweep and flushes pending stats writes. A chat
//! transport embeds `IllusionGame` the same way.
//!
use clap::Parser;
use illusion_bot::core::config::Config;
use illusion_bot::core::error::Result;
use illusion_bot::IllusionGame;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Seconds between expiry sweeps (overrides `challenges.cleanup_interval_secs`).
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub cleanup_interval: Option<u64>,
}

pub async fn handle_serve(args: ServeArgs, config: &Config) -> Result<()> {
    info!("Handling serve command with args: {:?}", args);
    let interval = args
        .cleanup_interval
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.challenges.cleanup_interval());

    let game = Arc::new(IllusionGame::open(config).await?);
    game.spawn_cleanup(interval).await?;

    println!(
        "Illusion game core running (stats in {}, sweep every {}s). Press Ctrl+C to stop.",
        game.stats().database_path().display(),
        interval.as_secs()
    );

    shutdown_signal().await;
    game.shutdown().await;

    println!("Shutdown complete.");
    Ok(())
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
///
/// A handler that cannot be installed leaves its branch pending, so the other
/// signal still works.
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down..."),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
                info!("Received SIGTERM, shutting down...");
            }
            Err(e) => {
                error!(
                    "Failed to install SIGTERM handler: {}. Shutdown on SIGTERM might not work.",
                    e
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shutdown_signal_does_not_resolve_on_its_own() {
        let waited =
            tokio::time::timeout(Duration::from_millis(50), shutdown_signal()).await;
        assert!(waited.is_err());
    }
}
