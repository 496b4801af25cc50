// Stats composition: merge the four interaction counts and the rating
// aggregate into one record per post.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::counting::CountingStore;
use super::rating::{RatingAggregator, RatingInfo};
use crate::db::models::{InteractionKind, Post};
use crate::db::Database;
use crate::error::{ForumError, ForumResult};

/// Derived engagement numbers for one post. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsRecord {
    pub post_id: i64,
    pub likes_count: i64,
    pub comments_count: i64,
    pub shares_count: i64,
    pub collections_count: i64,
    pub rating_count: i64,
    /// One-decimal mean; None exactly when `rating_count == 0`
    pub average_rating: Option<f64>,
}

impl StatsRecord {
    /// A post nobody has touched.
    pub fn empty(post_id: i64) -> Self {
        Self {
            post_id,
            likes_count: 0,
            comments_count: 0,
            shares_count: 0,
            collections_count: 0,
            rating_count: 0,
            average_rating: None,
        }
    }

    fn with_rating(mut self, rating: RatingInfo) -> Self {
        self.rating_count = rating.count;
        self.average_rating = rating.average;
        self
    }
}

/// A post paired with its engagement numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostWithStats {
    pub post: Post,
    pub stats: StatsRecord,
}

#[derive(Clone)]
pub struct StatsComposer {
    db: Arc<dyn Database>,
    counts: CountingStore,
    ratings: RatingAggregator,
}

impl StatsComposer {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self {
            counts: CountingStore::new(db.clone()),
            ratings: RatingAggregator::new(db.clone()),
            db,
        }
    }

    /// Stats for a single post: one count per interaction kind plus one
    /// rating lookup.
    pub async fn compose(&self, post_id: i64) -> ForumResult<StatsRecord> {
        let likes_count = self.counts.count_for(InteractionKind::Like, post_id).await?;
        let comments_count = self
            .counts
            .count_for(InteractionKind::Comment, post_id)
            .await?;
        let shares_count = self.counts.count_for(InteractionKind::Share, post_id).await?;
        let collections_count = self
            .counts
            .count_for(InteractionKind::Collection, post_id)
            .await?;
        let rating = self.ratings.rating_info(post_id).await?;

        Ok(StatsRecord {
            post_id,
            likes_count,
            comments_count,
            shares_count,
            collections_count,
            rating_count: 0,
            average_rating: None,
        }
        .with_rating(rating))
    }

    /// Stats for many posts with exactly five storage calls: four grouped
    /// counts and one grouped rating tally. Duplicate ids collapse to one
    /// entry. Empty input makes no calls at all.
    pub async fn compose_batch(&self, post_ids: &[i64]) -> ForumResult<HashMap<i64, StatsRecord>> {
        let mut seen = HashSet::with_capacity(post_ids.len());
        let ids: Vec<i64> = post_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let likes = self.counts.count_batch(InteractionKind::Like, &ids).await?;
        let comments = self.counts.count_batch(InteractionKind::Comment, &ids).await?;
        let shares = self.counts.count_batch(InteractionKind::Share, &ids).await?;
        let collections = self
            .counts
            .count_batch(InteractionKind::Collection, &ids)
            .await?;
        let mut ratings = self.ratings.rating_info_batch(&ids).await?;

        let count = |map: &HashMap<i64, i64>, id: &i64| map.get(id).copied().unwrap_or(0);

        let records: HashMap<i64, StatsRecord> = ids
            .iter()
            .map(|id| {
                let record = StatsRecord {
                    post_id: *id,
                    likes_count: count(&likes, id),
                    comments_count: count(&comments, id),
                    shares_count: count(&shares, id),
                    collections_count: count(&collections, id),
                    rating_count: 0,
                    average_rating: None,
                }
                .with_rating(ratings.remove(id).unwrap_or_default());
                (*id, record)
            })
            .collect();

        debug!(posts = records.len(), "composed batch stats");
        Ok(records)
    }

    /// Pair each post with its stats, keeping the input order.
    pub async fn compose_posts(&self, posts: Vec<Post>) -> ForumResult<Vec<PostWithStats>> {
        let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
        let stats = self.compose_batch(&ids).await?;

        Ok(posts
            .into_iter()
            .map(|post| {
                // A post listed twice gets the same numbers both times
                let record = stats
                    .get(&post.id)
                    .cloned()
                    .unwrap_or_else(|| StatsRecord::empty(post.id));
                PostWithStats { post, stats: record }
            })
            .collect())
    }

    /// One post with its stats, or NotFound.
    pub async fn post_with_stats(&self, post_id: i64) -> ForumResult<PostWithStats> {
        let post = self
            .db
            .get_post(post_id)
            .await?
            .ok_or_else(|| ForumError::not_found("post", post_id))?;
        let stats = self.compose(post_id).await?;
        Ok(PostWithStats { post, stats })
    }
}
