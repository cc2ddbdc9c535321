//! # Leaderboard Command
//!
//! File: bot/src/commands/leaderboard.rs
//!
//! Prints the top players (correct answers first, fewer attempts breaking
//! ties) and, with `--user`, that player's own rank even when it falls
//! outside the listed rows.
//!
use clap::Parser;
use illusion_bot::core::config::Config;
use illusion_bot::core::error::Result;
use illusion_bot::{IllusionGame, Leaderboard, LeaderboardEntry};
use tracing::info;

#[derive(Parser, Debug)]
pub struct LeaderboardArgs {
    /// Also show this user's rank.
    #[arg(long, short)]
    pub user: Option<String>,

    /// Number of rows to list. Defaults to `leaderboard.default_limit`.
    #[arg(long, short)]
    pub limit: Option<usize>,
}

pub async fn handle_leaderboard(args: LeaderboardArgs, config: &Config) -> Result<()> {
    info!("Handling leaderboard command with args: {:?}", args);
    let limit = args.limit.unwrap_or(config.leaderboard.default_limit);
    let game = IllusionGame::open(config).await?;
    let board = game
        .get_leaderboard(args.user.as_deref().unwrap_or_default(), limit)
        .await;
    print!("{}", render_leaderboard(&board, args.user.as_deref()));
    Ok(())
}

fn render_entry(entry: &LeaderboardEntry) -> String {
    format!(
        "{:>3}. {:<24} {:>5} correct  {:>5.1}%\n",
        entry.rank, entry.display_name, entry.correct_answers, entry.accuracy_percent
    )
}

fn render_leaderboard(board: &Leaderboard, user: Option<&str>) -> String {
    let mut out = String::from("Leaderboard\n");
    if board.top_users.is_empty() {
        out.push_str("No one has answered a challenge yet.\n");
    }
    for entry in &board.top_users {
        out.push_str(&render_entry(entry));
    }
    match (user, &board.user_rank) {
        (Some(_), Some(entry)) => {
            out.push_str("\nYour position:\n");
            out.push_str(&render_entry(entry));
        }
        (Some(user_id), None) => {
            out.push_str(&format!("\nUser {} is not ranked yet.\n", user_id));
        }
        (None, _) => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(rank: u64, name: &str, correct: u64, accuracy: f64) -> LeaderboardEntry {
        LeaderboardEntry {
            rank,
            user_id: format!("id-{}", rank),
            display_name: name.into(),
            correct_answers: correct,
            accuracy_percent: accuracy,
        }
    }

    #[test]
    fn renders_rows_and_user_rank() {
        let board = Leaderboard {
            top_users: vec![entry(1, "carol", 7, 35.0), entry(2, "Anonymous", 5, 62.5)],
            user_rank: Some(entry(3, "alice", 5, 50.0)),
        };

        let text = render_leaderboard(&board, Some("id-3"));

        assert!(text.contains("  1. carol"));
        assert!(text.contains("62.5%"));
        assert!(text.contains("Your position:\n  3. alice"));
    }

    #[test]
    fn renders_empty_board_and_unranked_user() {
        let text = render_leaderboard(&Leaderboard::default(), Some("42"));
        assert!(text.contains("No one has answered a challenge yet."));
        assert!(text.contains("User 42 is not ranked yet."));
    }
}
