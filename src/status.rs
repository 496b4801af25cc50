// System status display: backend, schema size, and this week's activity.

use anyhow::Result;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::db::Database;
use crate::ranking::{LeaderboardService, Period};

/// Display system status to the terminal.
pub async fn show(db: &Arc<dyn Database>, config: &Config) -> Result<()> {
    if config.uses_postgres() {
        println!("Database: PostgreSQL");
    } else {
        let file_size = std::fs::metadata(&config.db_path)
            .map(|m| format_bytes(m.len()))
            .unwrap_or_else(|_| "unknown".to_string());
        println!("Database: {} ({})", config.db_path, file_size);
    }

    println!("Tables: {}", db.table_count().await?);

    let now = Utc::now();
    let weekly = db
        .get_posts_created_since(Period::Week.window_start(now))
        .await?;
    println!("Posts this week: {}", weekly.len());

    if weekly.is_empty() {
        println!("  Run `photoforum post` to add one");
        return Ok(());
    }

    let leaderboard = LeaderboardService::new(db.clone());
    if let Some(top) = leaderboard.hot_posts(Period::Week, 1, now).await?.first() {
        println!(
            "Hottest this week: #{} \"{}\" (score {:.2})",
            top.post.id,
            crate::output::preview(&top.post.title, 40),
            top.hot_score
        );
    }

    Ok(())
}

/// Human-readable file size.
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// True if the SQLite file exists yet.
pub fn sqlite_initialized(config: &Config) -> bool {
    Path::new(&config.db_path).exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
