// Engagement actions: the write paths that keep the interaction tables
// consistent: likes, shares, comments, ratings, collections and follows.
//
// Each service checks the referenced rows exist and enforces the per-kind
// rules before writing, so callers get NotFound/Conflict/Validation instead
// of a raw constraint failure from storage.

pub mod collections;
pub mod interactions;
pub mod ratings;
pub mod social;

pub use collections::{select_target_collection, CollectionService, TargetCollection};
pub use interactions::InteractionService;
pub use ratings::RatingService;
pub use social::{ProfileStats, SocialService};

use serde::Serialize;

use crate::db::models::{Post, User};
use crate::db::Database;
use crate::error::{ForumError, ForumResult};

/// A write result that may have found the row already in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recorded<T> {
    pub record: T,
    /// False when an identical record already existed
    pub created: bool,
}

pub(crate) async fn require_post(db: &dyn Database, post_id: i64) -> ForumResult<Post> {
    db.get_post(post_id)
        .await?
        .ok_or_else(|| ForumError::not_found("post", post_id))
}

pub(crate) async fn require_user(db: &dyn Database, user_id: i64) -> ForumResult<User> {
    db.get_user(user_id)
        .await?
        .ok_or_else(|| ForumError::not_found("user", user_id))
}
