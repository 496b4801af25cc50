// Database trait: backend-agnostic async interface for all DB operations.
//
// Implementors: SqliteDatabase (wraps rusqlite), PgDatabase (wraps sqlx).
// All methods are async so both sync (rusqlite via Mutex) and native async
// (sqlx) backends fit behind a single interface.
//
// Batched methods take a slice of post ids. Backends guard against an empty
// slice themselves, but the stats layer never calls them with one.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::models::{
    Collection, CollectionItem, Comment, Interaction, InteractionKind, NewPost, Post, Rating,
    RatingTally, User,
};

#[async_trait]
pub trait Database: Send + Sync {
    // --- Lifecycle ---

    /// Count the number of user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    // --- Users and follows ---

    async fn create_user(&self, username: &str) -> Result<User>;

    async fn get_user(&self, user_id: i64) -> Result<Option<User>>;

    /// Insert a follow edge. Returns false if it already existed.
    async fn insert_follow(&self, follower_id: i64, following_id: i64) -> Result<bool>;

    /// Remove a follow edge. Returns false if there was nothing to remove.
    async fn delete_follow(&self, follower_id: i64, following_id: i64) -> Result<bool>;

    async fn count_followers(&self, user_id: i64) -> Result<i64>;

    async fn count_following(&self, user_id: i64) -> Result<i64>;

    /// Total likes across every post the user has authored.
    async fn count_likes_received(&self, user_id: i64) -> Result<i64>;

    // --- Posts ---

    async fn create_post(&self, post: &NewPost) -> Result<Post>;

    async fn get_post(&self, post_id: i64) -> Result<Option<Post>>;

    /// An author's posts in id order, paged.
    async fn get_posts_by_author(&self, author_id: i64, offset: u32, limit: u32)
        -> Result<Vec<Post>>;

    async fn count_posts_by_author(&self, author_id: i64) -> Result<i64>;

    /// All posts created at or after `since`, in id order.
    async fn get_posts_created_since(&self, since: DateTime<Utc>) -> Result<Vec<Post>>;

    /// Posts whose title contains `query` (case-sensitive), in id order.
    /// Offset and limit are applied here, before any ranking.
    async fn get_posts_by_title_substring(
        &self,
        query: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Post>>;

    /// Newest posts first, paged.
    async fn get_recent_posts(&self, offset: u32, limit: u32) -> Result<Vec<Post>>;

    // --- Interactions (likes, comments, shares, collection items) ---

    /// Number of records of `kind` attached to one post.
    async fn count_interactions(&self, kind: InteractionKind, post_id: i64) -> Result<i64>;

    /// Grouped count of `kind` records per post. Posts with no records are
    /// absent from the returned map.
    async fn count_interactions_batch(
        &self,
        kind: InteractionKind,
        post_ids: &[i64],
    ) -> Result<HashMap<i64, i64>>;

    /// Insert a like or share. Returns the row and whether it was newly created.
    async fn insert_interaction(
        &self,
        kind: InteractionKind,
        user_id: i64,
        post_id: i64,
    ) -> Result<(Interaction, bool)>;

    /// Delete a like or share. Returns false if there was nothing to delete.
    async fn delete_interaction(
        &self,
        kind: InteractionKind,
        user_id: i64,
        post_id: i64,
    ) -> Result<bool>;

    async fn insert_comment(&self, author_id: i64, post_id: i64, content: &str)
        -> Result<Comment>;

    // --- Ratings ---

    async fn get_rating(&self, user_id: i64, post_id: i64) -> Result<Option<Rating>>;

    /// Record a first rating. Returns None, without touching the stored row,
    /// if the user has already rated the post.
    async fn insert_rating(&self, user_id: i64, post_id: i64, score: f64)
        -> Result<Option<Rating>>;

    /// Change an existing rating's score. Returns None if the user has not
    /// rated the post.
    async fn update_rating(&self, user_id: i64, post_id: i64, score: f64)
        -> Result<Option<Rating>>;

    async fn delete_rating(&self, user_id: i64, post_id: i64) -> Result<bool>;

    async fn rating_tally(&self, post_id: i64) -> Result<RatingTally>;

    /// Grouped rating tallies. Posts without ratings are absent.
    async fn rating_tally_batch(&self, post_ids: &[i64]) -> Result<HashMap<i64, RatingTally>>;

    // --- Collections ---

    /// A user's collections in creation order.
    async fn get_collections_by_user(&self, user_id: i64) -> Result<Vec<Collection>>;

    async fn create_collection(&self, user_id: i64, name: &str, is_default: bool)
        -> Result<Collection>;

    /// The user's default collection, created under `name` if they have none.
    /// Concurrent callers all get the same row.
    async fn ensure_default_collection(&self, user_id: i64, name: &str) -> Result<Collection>;

    /// File a post into a collection. A user holds at most one item per post;
    /// the existing item is returned (with `false`) when there already is one.
    async fn insert_collection_item(
        &self,
        user_id: i64,
        post_id: i64,
        collection_id: i64,
    ) -> Result<(CollectionItem, bool)>;
}
