// SqliteDatabase: rusqlite backend implementing the Database trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Send.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.
// The lock is never held across .await points. Rust enforces this because
// MutexGuard is !Send.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{
    Collection, CollectionItem, Comment, Interaction, InteractionKind, NewPost, Post, Rating,
    RatingTally, User,
};
use super::queries;
use super::traits::Database;

pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Fresh in-memory database with the schema applied. Used by tests and
    /// throwaway CLI runs.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        super::schema::create_tables(&conn)?;
        Ok(Self::new(conn))
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn create_user(&self, username: &str) -> Result<User> {
        let conn = self.conn.lock().await;
        queries::create_user(&conn, username)
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let conn = self.conn.lock().await;
        queries::get_user(&conn, user_id)
    }

    async fn insert_follow(&self, follower_id: i64, following_id: i64) -> Result<bool> {
        let conn = self.conn.lock().await;
        queries::insert_follow(&conn, follower_id, following_id)
    }

    async fn delete_follow(&self, follower_id: i64, following_id: i64) -> Result<bool> {
        let conn = self.conn.lock().await;
        queries::delete_follow(&conn, follower_id, following_id)
    }

    async fn count_followers(&self, user_id: i64) -> Result<i64> {
        let conn = self.conn.lock().await;
        queries::count_followers(&conn, user_id)
    }

    async fn count_following(&self, user_id: i64) -> Result<i64> {
        let conn = self.conn.lock().await;
        queries::count_following(&conn, user_id)
    }

    async fn count_likes_received(&self, user_id: i64) -> Result<i64> {
        let conn = self.conn.lock().await;
        queries::count_likes_received(&conn, user_id)
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post> {
        let conn = self.conn.lock().await;
        queries::create_post(&conn, post)
    }

    async fn get_post(&self, post_id: i64) -> Result<Option<Post>> {
        let conn = self.conn.lock().await;
        queries::get_post(&conn, post_id)
    }

    async fn get_posts_by_author(
        &self,
        author_id: i64,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Post>> {
        let conn = self.conn.lock().await;
        queries::get_posts_by_author(&conn, author_id, offset, limit)
    }

    async fn count_posts_by_author(&self, author_id: i64) -> Result<i64> {
        let conn = self.conn.lock().await;
        queries::count_posts_by_author(&conn, author_id)
    }

    async fn get_posts_created_since(&self, since: DateTime<Utc>) -> Result<Vec<Post>> {
        let conn = self.conn.lock().await;
        queries::get_posts_created_since(&conn, &since)
    }

    async fn get_posts_by_title_substring(
        &self,
        query: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Post>> {
        let conn = self.conn.lock().await;
        queries::get_posts_by_title_substring(&conn, query, offset, limit)
    }

    async fn get_recent_posts(&self, offset: u32, limit: u32) -> Result<Vec<Post>> {
        let conn = self.conn.lock().await;
        queries::get_recent_posts(&conn, offset, limit)
    }

    async fn count_interactions(&self, kind: InteractionKind, post_id: i64) -> Result<i64> {
        let conn = self.conn.lock().await;
        queries::count_interactions(&conn, kind, post_id)
    }

    async fn count_interactions_batch(
        &self,
        kind: InteractionKind,
        post_ids: &[i64],
    ) -> Result<HashMap<i64, i64>> {
        let conn = self.conn.lock().await;
        queries::count_interactions_batch(&conn, kind, post_ids)
    }

    async fn insert_interaction(
        &self,
        kind: InteractionKind,
        user_id: i64,
        post_id: i64,
    ) -> Result<(Interaction, bool)> {
        let conn = self.conn.lock().await;
        queries::insert_interaction(&conn, kind, user_id, post_id)
    }

    async fn delete_interaction(
        &self,
        kind: InteractionKind,
        user_id: i64,
        post_id: i64,
    ) -> Result<bool> {
        let conn = self.conn.lock().await;
        queries::delete_interaction(&conn, kind, user_id, post_id)
    }

    async fn insert_comment(
        &self,
        author_id: i64,
        post_id: i64,
        content: &str,
    ) -> Result<Comment> {
        let conn = self.conn.lock().await;
        queries::insert_comment(&conn, author_id, post_id, content)
    }

    async fn get_rating(&self, user_id: i64, post_id: i64) -> Result<Option<Rating>> {
        let conn = self.conn.lock().await;
        queries::get_rating(&conn, user_id, post_id)
    }

    async fn insert_rating(
        &self,
        user_id: i64,
        post_id: i64,
        score: f64,
    ) -> Result<Option<Rating>> {
        let conn = self.conn.lock().await;
        queries::insert_rating(&conn, user_id, post_id, score)
    }

    async fn update_rating(
        &self,
        user_id: i64,
        post_id: i64,
        score: f64,
    ) -> Result<Option<Rating>> {
        let conn = self.conn.lock().await;
        queries::update_rating(&conn, user_id, post_id, score)
    }

    async fn delete_rating(&self, user_id: i64, post_id: i64) -> Result<bool> {
        let conn = self.conn.lock().await;
        queries::delete_rating(&conn, user_id, post_id)
    }

    async fn rating_tally(&self, post_id: i64) -> Result<RatingTally> {
        let conn = self.conn.lock().await;
        queries::rating_tally(&conn, post_id)
    }

    async fn rating_tally_batch(&self, post_ids: &[i64]) -> Result<HashMap<i64, RatingTally>> {
        let conn = self.conn.lock().await;
        queries::rating_tally_batch(&conn, post_ids)
    }

    async fn get_collections_by_user(&self, user_id: i64) -> Result<Vec<Collection>> {
        let conn = self.conn.lock().await;
        queries::get_collections_by_user(&conn, user_id)
    }

    async fn create_collection(
        &self,
        user_id: i64,
        name: &str,
        is_default: bool,
    ) -> Result<Collection> {
        let conn = self.conn.lock().await;
        queries::create_collection(&conn, user_id, name, is_default)
    }

    async fn ensure_default_collection(&self, user_id: i64, name: &str) -> Result<Collection> {
        let conn = self.conn.lock().await;
        queries::ensure_default_collection(&conn, user_id, name)
    }

    async fn insert_collection_item(
        &self,
        user_id: i64,
        post_id: i64,
        collection_id: i64,
    ) -> Result<(CollectionItem, bool)> {
        let conn = self.conn.lock().await;
        queries::insert_collection_item(&conn, user_id, post_id, collection_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trait_table_count() {
        let db = SqliteDatabase::in_memory().unwrap();
        assert_eq!(db.table_count().await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_trait_user_roundtrip() {
        let db = SqliteDatabase::in_memory().unwrap();
        let user = db.create_user("vivian").await.unwrap();
        let loaded = db.get_user(user.id).await.unwrap().unwrap();
        assert_eq!(loaded.username, "vivian");
        assert!(db.get_user(user.id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_trait_duplicate_username_fails() {
        let db = SqliteDatabase::in_memory().unwrap();
        db.create_user("dup").await.unwrap();
        assert!(db.create_user("dup").await.is_err());
    }

    #[tokio::test]
    async fn test_trait_follow_counts() {
        let db = SqliteDatabase::in_memory().unwrap();
        let a = db.create_user("a").await.unwrap();
        let b = db.create_user("b").await.unwrap();
        assert!(db.insert_follow(a.id, b.id).await.unwrap());
        assert!(!db.insert_follow(a.id, b.id).await.unwrap());
        assert_eq!(db.count_followers(b.id).await.unwrap(), 1);
        assert_eq!(db.count_following(a.id).await.unwrap(), 1);
        assert!(db.delete_follow(a.id, b.id).await.unwrap());
        assert!(!db.delete_follow(a.id, b.id).await.unwrap());
        assert_eq!(db.count_followers(b.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_trait_rating_lifecycle() {
        let db = SqliteDatabase::in_memory().unwrap();
        let author = db.create_user("author").await.unwrap();
        let rater = db.create_user("rater").await.unwrap();
        let post = db
            .create_post(&NewPost::new(author.id, "Dunes", ""))
            .await
            .unwrap();

        assert!(db.insert_rating(rater.id, post.id, 6.5).await.unwrap().is_some());
        assert!(db.insert_rating(rater.id, post.id, 7.0).await.unwrap().is_none());
        let kept = db.get_rating(rater.id, post.id).await.unwrap().unwrap();
        assert!((kept.score - 6.5).abs() < f64::EPSILON);

        let updated = db.update_rating(rater.id, post.id, 9.0).await.unwrap().unwrap();
        assert!((updated.score - 9.0).abs() < f64::EPSILON);

        let tallies = db.rating_tally_batch(&[post.id]).await.unwrap();
        assert_eq!(tallies[&post.id], RatingTally { count: 1, sum_tenths: 90 });

        assert!(db.delete_rating(rater.id, post.id).await.unwrap());
        assert!(db.get_rating(rater.id, post.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_trait_recent_posts_newest_first() {
        let db = SqliteDatabase::in_memory().unwrap();
        let author = db.create_user("author").await.unwrap();
        let now = Utc::now();
        for (title, age) in [("old", 3), ("new", 1), ("mid", 2)] {
            let post = NewPost::new(author.id, title, "").created_at(now - chrono::Duration::days(age));
            db.create_post(&post).await.unwrap();
        }
        let titles: Vec<String> = db
            .get_recent_posts(0, 10)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["new", "mid", "old"]);
    }
}
