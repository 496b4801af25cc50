// Likes, shares and comments.

use std::sync::Arc;

use tracing::info;

use super::{require_post, require_user, Recorded};
use crate::db::models::{Comment, Interaction, InteractionKind};
use crate::db::Database;
use crate::error::{ForumError, ForumResult};

#[derive(Clone)]
pub struct InteractionService {
    db: Arc<dyn Database>,
}

impl InteractionService {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Like a post. Liking twice returns the original like.
    pub async fn like(&self, user_id: i64, post_id: i64) -> ForumResult<Recorded<Interaction>> {
        self.record(InteractionKind::Like, user_id, post_id).await
    }

    /// Returns whether a like was removed.
    pub async fn unlike(&self, user_id: i64, post_id: i64) -> ForumResult<bool> {
        self.remove(InteractionKind::Like, user_id, post_id).await
    }

    /// Share a post. Sharing twice returns the original share.
    pub async fn share(&self, user_id: i64, post_id: i64) -> ForumResult<Recorded<Interaction>> {
        self.record(InteractionKind::Share, user_id, post_id).await
    }

    pub async fn unshare(&self, user_id: i64, post_id: i64) -> ForumResult<bool> {
        self.remove(InteractionKind::Share, user_id, post_id).await
    }

    /// Add a comment. Content is trimmed and must not be empty.
    pub async fn comment(&self, user_id: i64, post_id: i64, content: &str) -> ForumResult<Comment> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ForumError::Validation("comment content is empty".into()));
        }
        require_user(self.db.as_ref(), user_id).await?;
        require_post(self.db.as_ref(), post_id).await?;

        let comment = self.db.insert_comment(user_id, post_id, content).await?;
        info!(user_id, post_id, comment_id = comment.id, "comment added");
        Ok(comment)
    }

    async fn record(
        &self,
        kind: InteractionKind,
        user_id: i64,
        post_id: i64,
    ) -> ForumResult<Recorded<Interaction>> {
        require_user(self.db.as_ref(), user_id).await?;
        require_post(self.db.as_ref(), post_id).await?;

        let (record, created) = self.db.insert_interaction(kind, user_id, post_id).await?;
        if created {
            info!(kind = %kind, user_id, post_id, "interaction recorded");
        }
        Ok(Recorded { record, created })
    }

    async fn remove(&self, kind: InteractionKind, user_id: i64, post_id: i64) -> ForumResult<bool> {
        let removed = self.db.delete_interaction(kind, user_id, post_id).await?;
        if removed {
            info!(kind = %kind, user_id, post_id, "interaction removed");
        }
        Ok(removed)
    }
}
