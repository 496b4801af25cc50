// Hot score: weighted engagement used to order leaderboards and search.
//
// score = likes * 0.30 + comments * 0.25 + shares * 0.25
//       + average_rating * rating_count * 0.20   (only when rated)
//
// Collections are counted and shown but carry no weight.

use serde::{Deserialize, Serialize};

use crate::db::models::Post;
use crate::stats::StatsRecord;

/// Weights for each engagement signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HotWeights {
    pub likes: f64,
    pub comments: f64,
    pub shares: f64,
    /// Applied to `average_rating * rating_count`
    pub rating: f64,
}

impl Default for HotWeights {
    fn default() -> Self {
        Self {
            likes: 0.30,
            comments: 0.25,
            shares: 0.25,
            rating: 0.20,
        }
    }
}

/// Compute a post's hot score. All-zero stats score exactly 0.0.
pub fn hot_score(stats: &StatsRecord, weights: &HotWeights) -> f64 {
    let rating_term = match stats.average_rating {
        Some(avg) => avg * stats.rating_count as f64 * weights.rating,
        None => 0.0,
    };

    stats.likes_count as f64 * weights.likes
        + stats.comments_count as f64 * weights.comments
        + stats.shares_count as f64 * weights.shares
        + rating_term
}

/// A post with its stats and computed hot score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPost {
    pub post: Post,
    pub stats: StatsRecord,
    pub hot_score: f64,
}

/// Sort by hot score, highest first. The sort is stable: posts with equal
/// scores keep the order they came in.
pub fn rank_by_hot_score(mut posts: Vec<RankedPost>) -> Vec<RankedPost> {
    posts.sort_by(|a, b| b.hot_score.total_cmp(&a.hot_score));
    posts
}
