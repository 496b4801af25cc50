// Data models: Rust structs that map to database rows.
//
// These are the types that flow through the application. They're separate
// from the database queries so the stats and ranking layers can use them
// without depending on rusqlite or sqlx directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered forum user. Only the fields the interaction tables need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// A photo post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub content: String,
    /// Image URLs (JSON-encoded in SQLite)
    pub images: Vec<String>,
    /// Visibility code chosen by the author (0 = everyone)
    pub visibility: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to insert a new post.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: i64,
    pub title: String,
    pub content: String,
    pub images: Vec<String>,
    pub visibility: i32,
    pub created_at: DateTime<Utc>,
}

impl NewPost {
    /// A public post with no images, created now.
    pub fn new(author_id: i64, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            author_id,
            title: title.into(),
            content: content.into(),
            images: Vec::new(),
            visibility: 0,
            created_at: Utc::now(),
        }
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }
}

/// The kinds of per-post engagement that are counted.
///
/// Likes, shares and collection items are unique per (user, post);
/// comments are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractionKind {
    Like,
    Comment,
    Share,
    Collection,
}

impl InteractionKind {
    /// Backing table for this interaction type.
    pub fn table(&self) -> &'static str {
        match self {
            InteractionKind::Like => "likes",
            InteractionKind::Comment => "comments",
            InteractionKind::Share => "shares",
            InteractionKind::Collection => "collection_items",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::Like => "like",
            InteractionKind::Comment => "comment",
            InteractionKind::Share => "share",
            InteractionKind::Collection => "collection",
        }
    }
}

impl std::fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A like or share row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: i64,
    pub user_id: i64,
    pub post_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A comment on a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub author_id: i64,
    pub post_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A user's score for a post, 0.0 to 10.0 in steps of 0.1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub id: i64,
    pub user_id: i64,
    pub post_id: i64,
    pub score: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw rating aggregate for one post as returned by storage.
///
/// `sum_tenths` is the sum of every score expressed in whole tenths, so the
/// mean can be rounded without floating point drift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatingTally {
    pub count: i64,
    pub sum_tenths: i64,
}

/// A user-owned favorites folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A post saved into a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionItem {
    pub id: i64,
    pub user_id: i64,
    pub post_id: i64,
    pub collection_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Name given to the collection created on a user's first collect.
pub const DEFAULT_COLLECTION_NAME: &str = "Favorites";
