//! # Stats Command
//!
//! File: bot/src/commands/stats.rs
//!
use clap::Parser;
use illusion_bot::core::config::Config;
use illusion_bot::core::error::Result;
use illusion_bot::{IllusionGame, UserStats};
use tracing::info;

#[derive(Parser, Debug)]
pub struct StatsArgs {
    /// User identifier to look up.
    pub user_id: String,
}

pub async fn handle_stats(args: StatsArgs, config: &Config) -> Result<()> {
    info!("Handling stats command for user {}", args.user_id);
    let game = IllusionGame::open(config).await?;
    let stats = game.get_user_stats(&args.user_id).await;
    println!("{}", render_stats(&stats));
    Ok(())
}

fn render_stats(stats: &UserStats) -> String {
    if stats.total_challenges == 0 {
        return format!("User {} has not completed any challenges yet.", stats.user_id);
    }
    let name = if stats.username.is_empty() {
        stats.user_id.clone()
    } else {
        format!("{} ({})", stats.username, stats.user_id)
    };
    format!(
        "Statistics for {}:\nTotal challenges: {}\nCorrect answers: {}\nAccuracy: {:.1}%",
        name,
        stats.total_challenges,
        stats.correct_answers,
        stats.accuracy_percent()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_empty_history() {
        let text = render_stats(&UserStats::new("42"));
        assert_eq!(text, "User 42 has not completed any challenges yet.");
    }

    #[test]
    fn renders_accuracy_with_one_decimal() {
        let stats = UserStats {
            user_id: "42".into(),
            total_challenges: 3,
            correct_answers: 2,
            username: "alice".into(),
        };
        let text = render_stats(&stats);
        assert!(text.starts_with("Statistics for alice (42):"));
        assert!(text.contains("Total challenges: 3"));
        assert!(text.contains("Accuracy: 66.7%"));
    }
}
