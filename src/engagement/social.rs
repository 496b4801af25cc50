// Follows and per-user profile counters.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::require_user;
use crate::db::Database;
use crate::error::{ForumError, ForumResult};

/// Headline numbers shown on a user's profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileStats {
    pub user_id: i64,
    pub post_count: i64,
    pub followers: i64,
    pub following: i64,
    /// Likes across all of the user's posts
    pub likes_received: i64,
}

#[derive(Clone)]
pub struct SocialService {
    db: Arc<dyn Database>,
}

impl SocialService {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Follow another user. Returns false if already following.
    pub async fn follow(&self, follower_id: i64, following_id: i64) -> ForumResult<bool> {
        if follower_id == following_id {
            return Err(ForumError::Conflict("cannot follow yourself".into()));
        }
        require_user(self.db.as_ref(), follower_id).await?;
        require_user(self.db.as_ref(), following_id).await?;

        let created = self.db.insert_follow(follower_id, following_id).await?;
        if created {
            info!(follower_id, following_id, "follow added");
        }
        Ok(created)
    }

    /// Returns whether a follow was removed.
    pub async fn unfollow(&self, follower_id: i64, following_id: i64) -> ForumResult<bool> {
        let removed = self.db.delete_follow(follower_id, following_id).await?;
        if removed {
            info!(follower_id, following_id, "follow removed");
        }
        Ok(removed)
    }

    pub async fn profile_stats(&self, user_id: i64) -> ForumResult<ProfileStats> {
        require_user(self.db.as_ref(), user_id).await?;
        Ok(ProfileStats {
            user_id,
            post_count: self.db.count_posts_by_author(user_id).await?,
            followers: self.db.count_followers(user_id).await?,
            following: self.db.count_following(user_id).await?,
            likes_received: self.db.count_likes_received(user_id).await?,
        })
    }
}
