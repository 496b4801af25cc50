// PgDatabase: PostgreSQL backend implementing the Database trait.
//
// Uses sqlx PgPool for native async queries. All queries use runtime
// parameter binding (not compile-time macros) to avoid requiring
// DATABASE_URL at compile time.
//
// Key differences from SQLite:
// - TIMESTAMPTZ instead of TEXT for timestamps
// - TEXT[] instead of a JSON string for post images
// - batched lookups bind the whole id list to `= ANY($1)`
// - GENERATED ALWAYS AS IDENTITY plus RETURNING instead of last_insert_rowid

use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx_core::pool::Pool;
use sqlx_core::row::Row;
use sqlx_postgres::{PgRow, Postgres};

use super::models::{
    Collection, CollectionItem, Comment, Interaction, InteractionKind, NewPost, Post, Rating,
    RatingTally, User,
};
use super::traits::Database;

/// Type alias for the PostgreSQL connection pool.
pub type PgPool = Pool<Postgres>;

const POST_COLUMNS: &str =
    "id, author_id, title, content, images, visibility, created_at, updated_at";

pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    /// Connect to PostgreSQL and run migrations.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Run all pending migrations under a session-level advisory lock.
    ///
    /// The lock and unlock must run on the same physical connection, so a
    /// dedicated connection holds the lock while migrations use the pool.
    /// The unlock always runs; a migration error takes priority over an
    /// unlock error.
    async fn run_migrations(&self) -> Result<()> {
        // ASCII "PHOTOFRM" as a big-endian i64.
        const MIGRATION_LOCK_KEY: i64 = 0x50484F544F46524D_u64 as i64;

        let mut lock_conn = self
            .pool
            .acquire()
            .await
            .context("Failed to acquire connection for migration advisory lock")?;

        sqlx_core::query::query("SELECT pg_advisory_lock($1)")
            .bind(MIGRATION_LOCK_KEY)
            .execute(&mut *lock_conn)
            .await
            .context("Failed to acquire migration advisory lock")?;

        let migration_result: Result<()> = async {
            sqlx_core::query::query(
                "CREATE TABLE IF NOT EXISTS schema_version (
                    version INTEGER PRIMARY KEY,
                    applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                )",
            )
            .execute(&self.pool)
            .await?;

            let migrations = [
                (
                    1,
                    include_str!("../../migrations/postgres/0001_initial.sql"),
                ),
            ];

            for (version, sql) in migrations {
                let applied: bool = sqlx_core::query::query(
                    "SELECT COUNT(*) > 0 FROM schema_version WHERE version = $1",
                )
                .bind(version)
                .fetch_one(&self.pool)
                .await?
                .try_get(0)?;

                if !applied {
                    // Schema change and version row commit together.
                    let mut tx = self.pool.begin().await?;
                    sqlx_core::raw_sql::raw_sql(sql).execute(&mut *tx).await?;
                    sqlx_core::query::query("INSERT INTO schema_version (version) VALUES ($1)")
                        .bind(version)
                        .execute(&mut *tx)
                        .await?;
                    tx.commit()
                        .await
                        .with_context(|| format!("Migration v{version} failed"))?;
                }
            }

            Ok(())
        }
        .await;

        let unlock_result = sqlx_core::query::query("SELECT pg_advisory_unlock($1)")
            .bind(MIGRATION_LOCK_KEY)
            .execute(&mut *lock_conn)
            .await
            .context("Failed to release migration advisory lock");

        migration_result?;
        unlock_result?;

        Ok(())
    }

    async fn count_scalar(&self, sql: &str, id: i64) -> Result<i64> {
        let row = sqlx_core::query::query(sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>(0)?)
    }
}

fn user_from_row(row: &PgRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        created_at: row.try_get("created_at")?,
    })
}

fn post_from_row(row: &PgRow) -> Result<Post> {
    Ok(Post {
        id: row.try_get("id")?,
        author_id: row.try_get("author_id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        images: row.try_get("images")?,
        visibility: row.try_get("visibility")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn interaction_from_row(row: &PgRow) -> Result<Interaction> {
    Ok(Interaction {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        post_id: row.try_get("post_id")?,
        created_at: row.try_get("created_at")?,
    })
}

fn rating_from_row(row: &PgRow) -> Result<Rating> {
    Ok(Rating {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        post_id: row.try_get("post_id")?,
        score: row.try_get("score")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn collection_from_row(row: &PgRow) -> Result<Collection> {
    Ok(Collection {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        is_default: row.try_get("is_default")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn collection_item_from_row(row: &PgRow) -> Result<CollectionItem> {
    Ok(CollectionItem {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        post_id: row.try_get("post_id")?,
        collection_id: row.try_get("collection_id")?,
        created_at: row.try_get("created_at")?,
    })
}

fn toggle_table(kind: InteractionKind) -> Result<&'static str> {
    match kind {
        InteractionKind::Like | InteractionKind::Share => Ok(kind.table()),
        other => bail!("{other} records are not toggled per (user, post)"),
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn table_count(&self) -> Result<i64> {
        let row = sqlx_core::query::query(
            "SELECT COUNT(*)::bigint FROM information_schema.tables
             WHERE table_schema = 'public' AND table_type = 'BASE TABLE'",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get::<i64, _>(0)?)
    }

    async fn create_user(&self, username: &str) -> Result<User> {
        let row = sqlx_core::query::query(
            "INSERT INTO users (username) VALUES ($1) RETURNING id, username, created_at",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("Failed to create user {username}"))?;
        user_from_row(&row)
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let row = sqlx_core::query::query("SELECT id, username, created_at FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn insert_follow(&self, follower_id: i64, following_id: i64) -> Result<bool> {
        let result = sqlx_core::query::query(
            "INSERT INTO follows (follower_id, following_id) VALUES ($1, $2)
             ON CONFLICT (follower_id, following_id) DO NOTHING",
        )
        .bind(follower_id)
        .bind(following_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_follow(&self, follower_id: i64, following_id: i64) -> Result<bool> {
        let result =
            sqlx_core::query::query("DELETE FROM follows WHERE follower_id = $1 AND following_id = $2")
                .bind(follower_id)
                .bind(following_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_followers(&self, user_id: i64) -> Result<i64> {
        self.count_scalar("SELECT COUNT(*) FROM follows WHERE following_id = $1", user_id)
            .await
    }

    async fn count_following(&self, user_id: i64) -> Result<i64> {
        self.count_scalar("SELECT COUNT(*) FROM follows WHERE follower_id = $1", user_id)
            .await
    }

    async fn count_likes_received(&self, user_id: i64) -> Result<i64> {
        self.count_scalar(
            "SELECT COUNT(l.id) FROM likes l JOIN posts p ON p.id = l.post_id
             WHERE p.author_id = $1",
            user_id,
        )
        .await
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post> {
        let sql = format!(
            "INSERT INTO posts (author_id, title, content, images, visibility, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             RETURNING {POST_COLUMNS}"
        );
        let row = sqlx_core::query::query(&sql)
            .bind(post.author_id)
            .bind(&post.title)
            .bind(&post.content)
            .bind(&post.images)
            .bind(post.visibility)
            .bind(post.created_at)
            .fetch_one(&self.pool)
            .await
            .context("Failed to insert post")?;
        post_from_row(&row)
    }

    async fn get_post(&self, post_id: i64) -> Result<Option<Post>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        let row = sqlx_core::query::query(&sql)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(post_from_row).transpose()
    }

    async fn get_posts_by_author(
        &self,
        author_id: i64,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Post>> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE author_id = $1 ORDER BY id LIMIT $2 OFFSET $3"
        );
        let rows = sqlx_core::query::query(&sql)
            .bind(author_id)
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(post_from_row).collect()
    }

    async fn count_posts_by_author(&self, author_id: i64) -> Result<i64> {
        self.count_scalar("SELECT COUNT(*) FROM posts WHERE author_id = $1", author_id)
            .await
    }

    async fn get_posts_created_since(&self, since: DateTime<Utc>) -> Result<Vec<Post>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE created_at >= $1 ORDER BY id");
        let rows = sqlx_core::query::query(&sql)
            .bind(since)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(post_from_row).collect()
    }

    async fn get_posts_by_title_substring(
        &self,
        query: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Post>> {
        // strpos is case-sensitive and treats % and _ literally.
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE strpos(title, $1) > 0
             ORDER BY id LIMIT $2 OFFSET $3"
        );
        let rows = sqlx_core::query::query(&sql)
            .bind(query)
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(post_from_row).collect()
    }

    async fn get_recent_posts(&self, offset: u32, limit: u32) -> Result<Vec<Post>> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        );
        let rows = sqlx_core::query::query(&sql)
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(post_from_row).collect()
    }

    async fn count_interactions(&self, kind: InteractionKind, post_id: i64) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE post_id = $1", kind.table());
        self.count_scalar(&sql, post_id).await
    }

    async fn count_interactions_batch(
        &self,
        kind: InteractionKind,
        post_ids: &[i64],
    ) -> Result<HashMap<i64, i64>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!(
            "SELECT post_id, COUNT(*) FROM {} WHERE post_id = ANY($1) GROUP BY post_id",
            kind.table()
        );
        let rows = sqlx_core::query::query(&sql)
            .bind(post_ids.to_vec())
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to batch count {kind} records"))?;

        let mut counts = HashMap::with_capacity(rows.len());
        for row in rows {
            counts.insert(row.try_get::<i64, _>(0)?, row.try_get::<i64, _>(1)?);
        }
        Ok(counts)
    }

    async fn insert_interaction(
        &self,
        kind: InteractionKind,
        user_id: i64,
        post_id: i64,
    ) -> Result<(Interaction, bool)> {
        let table = toggle_table(kind)?;
        let insert = format!(
            "INSERT INTO {table} (user_id, post_id) VALUES ($1, $2)
             ON CONFLICT (user_id, post_id) DO NOTHING
             RETURNING id, user_id, post_id, created_at"
        );
        let inserted = sqlx_core::query::query(&insert)
            .bind(user_id)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to record {kind} on post {post_id}"))?;
        if let Some(row) = inserted {
            return Ok((interaction_from_row(&row)?, true));
        }

        let select = format!(
            "SELECT id, user_id, post_id, created_at FROM {table} WHERE user_id = $1 AND post_id = $2"
        );
        let row = sqlx_core::query::query(&select)
            .bind(user_id)
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;
        Ok((interaction_from_row(&row)?, false))
    }

    async fn delete_interaction(
        &self,
        kind: InteractionKind,
        user_id: i64,
        post_id: i64,
    ) -> Result<bool> {
        let table = toggle_table(kind)?;
        let sql = format!("DELETE FROM {table} WHERE user_id = $1 AND post_id = $2");
        let result = sqlx_core::query::query(&sql)
            .bind(user_id)
            .bind(post_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_comment(
        &self,
        author_id: i64,
        post_id: i64,
        content: &str,
    ) -> Result<Comment> {
        let row = sqlx_core::query::query(
            "INSERT INTO comments (author_id, post_id, content) VALUES ($1, $2, $3)
             RETURNING id, author_id, post_id, content, created_at",
        )
        .bind(author_id)
        .bind(post_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert comment")?;
        Ok(Comment {
            id: row.try_get("id")?,
            author_id: row.try_get("author_id")?,
            post_id: row.try_get("post_id")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }

    async fn get_rating(&self, user_id: i64, post_id: i64) -> Result<Option<Rating>> {
        let row = sqlx_core::query::query(
            "SELECT id, user_id, post_id, score, created_at, updated_at
             FROM ratings WHERE user_id = $1 AND post_id = $2",
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(rating_from_row).transpose()
    }

    async fn insert_rating(
        &self,
        user_id: i64,
        post_id: i64,
        score: f64,
    ) -> Result<Option<Rating>> {
        let row = sqlx_core::query::query(
            "INSERT INTO ratings (user_id, post_id, score) VALUES ($1, $2, $3)
             ON CONFLICT (user_id, post_id) DO NOTHING
             RETURNING id, user_id, post_id, score, created_at, updated_at",
        )
        .bind(user_id)
        .bind(post_id)
        .bind(score)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to insert rating for post {post_id}"))?;
        row.as_ref().map(rating_from_row).transpose()
    }

    async fn update_rating(
        &self,
        user_id: i64,
        post_id: i64,
        score: f64,
    ) -> Result<Option<Rating>> {
        let row = sqlx_core::query::query(
            "UPDATE ratings SET score = $3, updated_at = NOW()
             WHERE user_id = $1 AND post_id = $2
             RETURNING id, user_id, post_id, score, created_at, updated_at",
        )
        .bind(user_id)
        .bind(post_id)
        .bind(score)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(rating_from_row).transpose()
    }

    async fn delete_rating(&self, user_id: i64, post_id: i64) -> Result<bool> {
        let result = sqlx_core::query::query("DELETE FROM ratings WHERE user_id = $1 AND post_id = $2")
            .bind(user_id)
            .bind(post_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn rating_tally(&self, post_id: i64) -> Result<RatingTally> {
        let row = sqlx_core::query::query(
            "SELECT COUNT(*), COALESCE(SUM(ROUND(score * 10)), 0)::bigint
             FROM ratings WHERE post_id = $1",
        )
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(RatingTally {
            count: row.try_get(0)?,
            sum_tenths: row.try_get(1)?,
        })
    }

    async fn rating_tally_batch(&self, post_ids: &[i64]) -> Result<HashMap<i64, RatingTally>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx_core::query::query(
            "SELECT post_id, COUNT(*), SUM(ROUND(score * 10))::bigint
             FROM ratings WHERE post_id = ANY($1) GROUP BY post_id",
        )
        .bind(post_ids.to_vec())
        .fetch_all(&self.pool)
        .await
        .context("Failed to batch load rating tallies")?;

        let mut tallies = HashMap::with_capacity(rows.len());
        for row in rows {
            tallies.insert(
                row.try_get::<i64, _>(0)?,
                RatingTally {
                    count: row.try_get(1)?,
                    sum_tenths: row.try_get(2)?,
                },
            );
        }
        Ok(tallies)
    }

    async fn get_collections_by_user(&self, user_id: i64) -> Result<Vec<Collection>> {
        let rows = sqlx_core::query::query(
            "SELECT id, user_id, name, is_default, created_at, updated_at
             FROM collections WHERE user_id = $1 ORDER BY created_at, id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(collection_from_row).collect()
    }

    async fn create_collection(
        &self,
        user_id: i64,
        name: &str,
        is_default: bool,
    ) -> Result<Collection> {
        let row = sqlx_core::query::query(
            "INSERT INTO collections (user_id, name, is_default) VALUES ($1, $2, $3)
             RETURNING id, user_id, name, is_default, created_at, updated_at",
        )
        .bind(user_id)
        .bind(name)
        .bind(is_default)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("Failed to create collection {name}"))?;
        collection_from_row(&row)
    }

    async fn ensure_default_collection(&self, user_id: i64, name: &str) -> Result<Collection> {
        let inserted = sqlx_core::query::query(
            "INSERT INTO collections (user_id, name, is_default) VALUES ($1, $2, TRUE)
             ON CONFLICT (user_id) WHERE is_default DO NOTHING
             RETURNING id, user_id, name, is_default, created_at, updated_at",
        )
        .bind(user_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to create default collection")?;
        if let Some(row) = inserted {
            return collection_from_row(&row);
        }

        let row = sqlx_core::query::query(
            "SELECT id, user_id, name, is_default, created_at, updated_at
             FROM collections WHERE user_id = $1 AND is_default",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        collection_from_row(&row)
    }

    async fn insert_collection_item(
        &self,
        user_id: i64,
        post_id: i64,
        collection_id: i64,
    ) -> Result<(CollectionItem, bool)> {
        let inserted = sqlx_core::query::query(
            "INSERT INTO collection_items (user_id, post_id, collection_id) VALUES ($1, $2, $3)
             ON CONFLICT (user_id, post_id) DO NOTHING
             RETURNING id, user_id, post_id, collection_id, created_at",
        )
        .bind(user_id)
        .bind(post_id)
        .bind(collection_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to insert collection item")?;
        if let Some(row) = inserted {
            return Ok((collection_item_from_row(&row)?, true));
        }

        let row = sqlx_core::query::query(
            "SELECT id, user_id, post_id, collection_id, created_at
             FROM collection_items WHERE user_id = $1 AND post_id = $2",
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;
        Ok((collection_item_from_row(&row)?, false))
    }
}
