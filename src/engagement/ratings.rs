// Rating submission, update and removal.
//
// One rating per (user, post), and nobody rates their own post.

use std::sync::Arc;

use tracing::info;

use super::require_post;
use crate::db::models::Rating;
use crate::db::Database;
use crate::error::{ForumError, ForumResult};
use crate::stats::rating::validate_score;

#[derive(Clone)]
pub struct RatingService {
    db: Arc<dyn Database>,
}

impl RatingService {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    pub async fn submit(&self, user_id: i64, post_id: i64, score: f64) -> ForumResult<Rating> {
        let score = validate_score(score)?;
        let post = require_post(self.db.as_ref(), post_id).await?;

        if post.author_id == user_id {
            return Err(ForumError::Conflict("cannot rate your own post".into()));
        }

        let rating = self
            .db
            .insert_rating(user_id, post_id, score)
            .await?
            .ok_or_else(|| {
                ForumError::Conflict(format!("user {user_id} has already rated post {post_id}"))
            })?;
        info!(user_id, post_id, score, "rating submitted");
        Ok(rating)
    }

    pub async fn update(&self, user_id: i64, post_id: i64, score: f64) -> ForumResult<Rating> {
        let score = validate_score(score)?;
        let rating = self
            .db
            .update_rating(user_id, post_id, score)
            .await?
            .ok_or_else(|| {
                ForumError::NotFound(format!("rating by user {user_id} on post {post_id}"))
            })?;
        info!(user_id, post_id, score, "rating updated");
        Ok(rating)
    }

    pub async fn remove(&self, user_id: i64, post_id: i64) -> ForumResult<()> {
        if !self.db.delete_rating(user_id, post_id).await? {
            return Err(ForumError::NotFound(format!(
                "rating by user {user_id} on post {post_id}"
            )));
        }
        info!(user_id, post_id, "rating removed");
        Ok(())
    }
}
