use std::env;

use anyhow::{Context, Result};

pub const DEFAULT_DB_PATH: &str = "./photoforum.db";
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;
pub const MAX_LEADERBOARD_LIMIT: usize = 100;
pub const DEFAULT_SEARCH_LIMIT: u32 = 100;

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    /// PostgreSQL connection URL (when set and starts with postgres://, uses Postgres backend)
    pub database_url: Option<String>,
    /// Posts shown by `leaderboard` when no --limit is given (1..=100)
    pub leaderboard_limit: usize,
    /// Page size for `search` and the feeds when no --limit is given
    pub search_limit: u32,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything has a default; a variable that is set but malformed is an
    /// error rather than being silently ignored.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. `load` passes the process
    /// environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let leaderboard_limit = match lookup("FORUM_LEADERBOARD_LIMIT") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("FORUM_LEADERBOARD_LIMIT is not a number: {raw}"))?,
            None => DEFAULT_LEADERBOARD_LIMIT,
        };
        let search_limit = match lookup("FORUM_SEARCH_LIMIT") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .with_context(|| format!("FORUM_SEARCH_LIMIT is not a number: {raw}"))?,
            None => DEFAULT_SEARCH_LIMIT,
        };

        let config = Self {
            db_path: lookup("FORUM_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            leaderboard_limit,
            search_limit,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        check_leaderboard_limit(self.leaderboard_limit, "FORUM_LEADERBOARD_LIMIT")?;
        if self.search_limit == 0 {
            anyhow::bail!("FORUM_SEARCH_LIMIT must be at least 1");
        }
        Ok(())
    }

    /// Leaderboard size for a command: the `--limit` override if given,
    /// otherwise the configured default. Both obey the same bounds.
    pub fn resolve_leaderboard_limit(&self, requested: Option<usize>) -> Result<usize> {
        match requested {
            Some(limit) => check_leaderboard_limit(limit, "--limit"),
            None => Ok(self.leaderboard_limit),
        }
    }

    /// True when DATABASE_URL selects the PostgreSQL backend.
    pub fn uses_postgres(&self) -> bool {
        self.database_url
            .as_deref()
            .is_some_and(|url| url.starts_with("postgres://") || url.starts_with("postgresql://"))
    }
}

fn check_leaderboard_limit(limit: usize, source: &str) -> Result<usize> {
    if !(1..=MAX_LEADERBOARD_LIMIT).contains(&limit) {
        anyhow::bail!("{source} must be between 1 and {MAX_LEADERBOARD_LIMIT}, got {limit}");
    }
    Ok(limit)
}
