// Leaderboard, search and feeds: fetch posts, attach stats in one batch,
// rank by hot score.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::hot::{hot_score, rank_by_hot_score, HotWeights, RankedPost};
use crate::db::models::Post;
use crate::db::Database;
use crate::error::{ForumError, ForumResult};
use crate::stats::{PostWithStats, StatsComposer};

/// Leaderboard time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Week,
    Month,
    Year,
}

impl Period {
    /// Parse a period token. Anything other than `month` or `year` is a week.
    pub fn parse(token: &str) -> Self {
        match token {
            "month" => Period::Month,
            "year" => Period::Year,
            _ => Period::Week,
        }
    }

    pub fn days(&self) -> i64 {
        match self {
            Period::Week => 7,
            Period::Month => 30,
            Period::Year => 365,
        }
    }

    /// Earliest creation time that still falls inside the window.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.days())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
pub struct LeaderboardService {
    db: Arc<dyn Database>,
    composer: StatsComposer,
    weights: HotWeights,
}

impl LeaderboardService {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self::with_weights(db, HotWeights::default())
    }

    pub fn with_weights(db: Arc<dyn Database>, weights: HotWeights) -> Self {
        Self {
            composer: StatsComposer::new(db.clone()),
            db,
            weights,
        }
    }

    /// Hottest posts created within `period` of `now`, at most `limit`.
    pub async fn hot_posts(
        &self,
        period: Period,
        limit: usize,
        now: DateTime<Utc>,
    ) -> ForumResult<Vec<RankedPost>> {
        let start = period.window_start(now);
        let posts = self.db.get_posts_created_since(start).await?;
        if posts.is_empty() {
            debug!(period = %period, "no posts in window");
            return Ok(Vec::new());
        }

        let candidates = posts.len();
        let mut ranked = self.rank(posts).await?;
        ranked.truncate(limit);

        info!(
            period = %period,
            candidates,
            returned = ranked.len(),
            "built hot posts leaderboard"
        );
        Ok(ranked)
    }

    /// Posts whose title contains `query` (case-sensitive). Offset and limit
    /// select the page in id order first; only that page is ranked.
    pub async fn search(
        &self,
        query: &str,
        offset: u32,
        limit: u32,
    ) -> ForumResult<Vec<RankedPost>> {
        let posts = self
            .db
            .get_posts_by_title_substring(query, offset, limit)
            .await?;
        let ranked = self.rank(posts).await?;
        info!(query, offset, limit, returned = ranked.len(), "searched posts");
        Ok(ranked)
    }

    /// Newest posts first, with stats.
    pub async fn recent_feed(&self, offset: u32, limit: u32) -> ForumResult<Vec<PostWithStats>> {
        let posts = self.db.get_recent_posts(offset, limit).await?;
        self.composer.compose_posts(posts).await
    }

    /// One author's posts in id order, with stats.
    pub async fn author_posts(
        &self,
        author_id: i64,
        offset: u32,
        limit: u32,
    ) -> ForumResult<Vec<PostWithStats>> {
        if self.db.get_user(author_id).await?.is_none() {
            return Err(ForumError::not_found("user", author_id));
        }
        let posts = self
            .db
            .get_posts_by_author(author_id, offset, limit)
            .await?;
        self.composer.compose_posts(posts).await
    }

    async fn rank(&self, posts: Vec<Post>) -> ForumResult<Vec<RankedPost>> {
        let enriched = self.composer.compose_posts(posts).await?;
        let scored = enriched
            .into_iter()
            .map(|PostWithStats { post, stats }| RankedPost {
                hot_score: hot_score(&stats, &self.weights),
                post,
                stats,
            })
            .collect();
        Ok(rank_by_hot_score(scored))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_period_parse() {
        assert_eq!(Period::parse("week"), Period::Week);
        assert_eq!(Period::parse("month"), Period::Month);
        assert_eq!(Period::parse("year"), Period::Year);
    }

    #[test]
    fn test_unknown_period_is_week() {
        assert_eq!(Period::parse("fortnight"), Period::Week);
        assert_eq!(Period::parse(""), Period::Week);
        // Tokens are matched exactly
        assert_eq!(Period::parse("Month"), Period::Week);
    }

    #[test]
    fn test_window_start() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
        assert_eq!(
            Period::Month.window_start(now),
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
        );
        assert_eq!(Period::Year.days(), 365);
        assert_eq!(Period::Week.days(), 7);
    }
}
