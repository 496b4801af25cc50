// Database queries: SQLite reads and writes for every table.
//
// Every SQLite interaction goes through this module. This keeps SQL
// contained in one place and gives the rest of the app clean Rust interfaces.

use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::models::{
    Collection, CollectionItem, Comment, Interaction, InteractionKind, NewPost, Post, Rating,
    RatingTally, User,
};

/// SQLite caps the number of bound parameters per statement.
const BATCH_CHUNK: usize = 500;

const POST_COLUMNS: &str =
    "id, author_id, title, content, images, visibility, created_at, updated_at";

// --- Timestamps ---

/// Fixed-width RFC 3339 so lexicographic order matches chronological order.
pub fn to_ts(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

fn ts_col(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}

// --- Row mapping ---

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        created_at: ts_col(row, 2)?,
    })
}

fn post_from_row(row: &Row) -> rusqlite::Result<Post> {
    let images_json: String = row.get(4)?;
    let images: Vec<String> = serde_json::from_str(&images_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
    Ok(Post {
        id: row.get(0)?,
        author_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        images,
        visibility: row.get(5)?,
        created_at: ts_col(row, 6)?,
        updated_at: ts_col(row, 7)?,
    })
}

fn interaction_from_row(row: &Row) -> rusqlite::Result<Interaction> {
    Ok(Interaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        post_id: row.get(2)?,
        created_at: ts_col(row, 3)?,
    })
}

fn rating_from_row(row: &Row) -> rusqlite::Result<Rating> {
    Ok(Rating {
        id: row.get(0)?,
        user_id: row.get(1)?,
        post_id: row.get(2)?,
        score: row.get(3)?,
        created_at: ts_col(row, 4)?,
        updated_at: ts_col(row, 5)?,
    })
}

fn collection_from_row(row: &Row) -> rusqlite::Result<Collection> {
    Ok(Collection {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        is_default: row.get(3)?,
        created_at: ts_col(row, 4)?,
        updated_at: ts_col(row, 5)?,
    })
}

fn collection_item_from_row(row: &Row) -> rusqlite::Result<CollectionItem> {
    Ok(CollectionItem {
        id: row.get(0)?,
        user_id: row.get(1)?,
        post_id: row.get(2)?,
        collection_id: row.get(3)?,
        created_at: ts_col(row, 4)?,
    })
}

// --- Users and follows ---

pub fn create_user(conn: &Connection, username: &str) -> Result<User> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO users (username, created_at) VALUES (?1, ?2)",
        params![username, to_ts(&now)],
    )
    .with_context(|| format!("Failed to create user {username}"))?;
    Ok(User {
        id: conn.last_insert_rowid(),
        username: username.to_string(),
        created_at: now,
    })
}

pub fn get_user(conn: &Connection, user_id: i64) -> Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, username, created_at FROM users WHERE id = ?1",
            params![user_id],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

pub fn insert_follow(conn: &Connection, follower_id: i64, following_id: i64) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO follows (follower_id, following_id, created_at)
         VALUES (?1, ?2, ?3)",
        params![follower_id, following_id, to_ts(&Utc::now())],
    )?;
    Ok(inserted > 0)
}

pub fn delete_follow(conn: &Connection, follower_id: i64, following_id: i64) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM follows WHERE follower_id = ?1 AND following_id = ?2",
        params![follower_id, following_id],
    )?;
    Ok(deleted > 0)
}

pub fn count_followers(conn: &Connection, user_id: i64) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM follows WHERE following_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn count_following(conn: &Connection, user_id: i64) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM follows WHERE follower_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Likes received across all of a user's posts.
pub fn count_likes_received(conn: &Connection, user_id: i64) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(l.id) FROM likes l
         JOIN posts p ON p.id = l.post_id
         WHERE p.author_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

// --- Posts ---

pub fn create_post(conn: &Connection, post: &NewPost) -> Result<Post> {
    let images_json = serde_json::to_string(&post.images)?;
    let created = to_ts(&post.created_at);
    conn.execute(
        "INSERT INTO posts (author_id, title, content, images, visibility, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        params![
            post.author_id,
            post.title,
            post.content,
            images_json,
            post.visibility,
            created,
        ],
    )
    .context("Failed to insert post")?;
    Ok(Post {
        id: conn.last_insert_rowid(),
        author_id: post.author_id,
        title: post.title.clone(),
        content: post.content.clone(),
        images: post.images.clone(),
        visibility: post.visibility,
        created_at: post.created_at,
        updated_at: post.created_at,
    })
}

pub fn get_post(conn: &Connection, post_id: i64) -> Result<Option<Post>> {
    let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1");
    let post = conn
        .query_row(&sql, params![post_id], post_from_row)
        .optional()?;
    Ok(post)
}

pub fn get_posts_by_author(
    conn: &Connection,
    author_id: i64,
    offset: u32,
    limit: u32,
) -> Result<Vec<Post>> {
    let sql = format!(
        "SELECT {POST_COLUMNS} FROM posts WHERE author_id = ?1 ORDER BY id LIMIT ?2 OFFSET ?3"
    );
    let mut stmt = conn.prepare(&sql)?;
    let posts = stmt
        .query_map(params![author_id, limit, offset], post_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(posts)
}

pub fn count_posts_by_author(conn: &Connection, author_id: i64) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM posts WHERE author_id = ?1",
        params![author_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn get_posts_created_since(conn: &Connection, since: &DateTime<Utc>) -> Result<Vec<Post>> {
    let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE created_at >= ?1 ORDER BY id");
    let mut stmt = conn.prepare(&sql)?;
    let posts = stmt
        .query_map(params![to_ts(since)], post_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(posts)
}

/// Case-sensitive title search. `instr` is used rather than LIKE because
/// SQLite's LIKE folds ASCII case.
pub fn get_posts_by_title_substring(
    conn: &Connection,
    query: &str,
    offset: u32,
    limit: u32,
) -> Result<Vec<Post>> {
    let sql = format!(
        "SELECT {POST_COLUMNS} FROM posts WHERE instr(title, ?1) > 0
         ORDER BY id LIMIT ?2 OFFSET ?3"
    );
    let mut stmt = conn.prepare(&sql)?;
    let posts = stmt
        .query_map(params![query, limit, offset], post_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(posts)
}

pub fn get_recent_posts(conn: &Connection, offset: u32, limit: u32) -> Result<Vec<Post>> {
    let sql = format!(
        "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2"
    );
    let mut stmt = conn.prepare(&sql)?;
    let posts = stmt
        .query_map(params![limit, offset], post_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(posts)
}

// --- Interactions ---

pub fn count_interactions(conn: &Connection, kind: InteractionKind, post_id: i64) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {} WHERE post_id = ?1", kind.table());
    let count = conn.query_row(&sql, params![post_id], |row| row.get(0))?;
    Ok(count)
}

/// Grouped counts for many posts. Posts without rows are left out.
pub fn count_interactions_batch(
    conn: &Connection,
    kind: InteractionKind,
    post_ids: &[i64],
) -> Result<HashMap<i64, i64>> {
    let mut counts = HashMap::new();
    if post_ids.is_empty() {
        return Ok(counts);
    }

    for chunk in post_ids.chunks(BATCH_CHUNK) {
        let sql = format!(
            "SELECT post_id, COUNT(*) FROM {} WHERE post_id IN ({}) GROUP BY post_id",
            kind.table(),
            placeholders(chunk.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (post_id, count) = row?;
            counts.insert(post_id, count);
        }
    }

    Ok(counts)
}

fn toggle_table(kind: InteractionKind) -> Result<&'static str> {
    match kind {
        InteractionKind::Like | InteractionKind::Share => Ok(kind.table()),
        other => bail!("{other} records are not toggled per (user, post)"),
    }
}

fn get_interaction(
    conn: &Connection,
    table: &str,
    user_id: i64,
    post_id: i64,
) -> Result<Option<Interaction>> {
    let sql = format!(
        "SELECT id, user_id, post_id, created_at FROM {table} WHERE user_id = ?1 AND post_id = ?2"
    );
    let found = conn
        .query_row(&sql, params![user_id, post_id], interaction_from_row)
        .optional()?;
    Ok(found)
}

/// Insert a like or share, returning the existing row if there already is one.
pub fn insert_interaction(
    conn: &Connection,
    kind: InteractionKind,
    user_id: i64,
    post_id: i64,
) -> Result<(Interaction, bool)> {
    let table = toggle_table(kind)?;
    if let Some(existing) = get_interaction(conn, table, user_id, post_id)? {
        return Ok((existing, false));
    }

    let now = Utc::now();
    let sql = format!("INSERT INTO {table} (user_id, post_id, created_at) VALUES (?1, ?2, ?3)");
    conn.execute(&sql, params![user_id, post_id, to_ts(&now)])
        .with_context(|| format!("Failed to record {kind} on post {post_id}"))?;
    Ok((
        Interaction {
            id: conn.last_insert_rowid(),
            user_id,
            post_id,
            created_at: now,
        },
        true,
    ))
}

pub fn delete_interaction(
    conn: &Connection,
    kind: InteractionKind,
    user_id: i64,
    post_id: i64,
) -> Result<bool> {
    let table = toggle_table(kind)?;
    let sql = format!("DELETE FROM {table} WHERE user_id = ?1 AND post_id = ?2");
    let deleted = conn.execute(&sql, params![user_id, post_id])?;
    Ok(deleted > 0)
}

pub fn insert_comment(
    conn: &Connection,
    author_id: i64,
    post_id: i64,
    content: &str,
) -> Result<Comment> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO comments (author_id, post_id, content, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![author_id, post_id, content, to_ts(&now)],
    )
    .context("Failed to insert comment")?;
    Ok(Comment {
        id: conn.last_insert_rowid(),
        author_id,
        post_id,
        content: content.to_string(),
        created_at: now,
    })
}

// --- Ratings ---

pub fn get_rating(conn: &Connection, user_id: i64, post_id: i64) -> Result<Option<Rating>> {
    let rating = conn
        .query_row(
            "SELECT id, user_id, post_id, score, created_at, updated_at
             FROM ratings WHERE user_id = ?1 AND post_id = ?2",
            params![user_id, post_id],
            rating_from_row,
        )
        .optional()?;
    Ok(rating)
}

/// Returns None when (user, post) already has a rating; the stored score is
/// left as it was.
pub fn insert_rating(
    conn: &Connection,
    user_id: i64,
    post_id: i64,
    score: f64,
) -> Result<Option<Rating>> {
    let now = Utc::now();
    let inserted = conn
        .execute(
            "INSERT INTO ratings (user_id, post_id, score, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT (user_id, post_id) DO NOTHING",
            params![user_id, post_id, score, to_ts(&now)],
        )
        .with_context(|| format!("Failed to insert rating for post {post_id}"))?;
    if inserted == 0 {
        return Ok(None);
    }
    Ok(Some(Rating {
        id: conn.last_insert_rowid(),
        user_id,
        post_id,
        score,
        created_at: now,
        updated_at: now,
    }))
}

pub fn update_rating(
    conn: &Connection,
    user_id: i64,
    post_id: i64,
    score: f64,
) -> Result<Option<Rating>> {
    let updated = conn.execute(
        "UPDATE ratings SET score = ?3, updated_at = ?4 WHERE user_id = ?1 AND post_id = ?2",
        params![user_id, post_id, score, to_ts(&Utc::now())],
    )?;
    if updated == 0 {
        return Ok(None);
    }
    get_rating(conn, user_id, post_id)
}

pub fn delete_rating(conn: &Connection, user_id: i64, post_id: i64) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM ratings WHERE user_id = ?1 AND post_id = ?2",
        params![user_id, post_id],
    )?;
    Ok(deleted > 0)
}

pub fn rating_tally(conn: &Connection, post_id: i64) -> Result<RatingTally> {
    let tally = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(CAST(ROUND(score * 10) AS INTEGER)), 0)
         FROM ratings WHERE post_id = ?1",
        params![post_id],
        |row| {
            Ok(RatingTally {
                count: row.get(0)?,
                sum_tenths: row.get(1)?,
            })
        },
    )?;
    Ok(tally)
}

pub fn rating_tally_batch(conn: &Connection, post_ids: &[i64]) -> Result<HashMap<i64, RatingTally>> {
    let mut tallies = HashMap::new();
    if post_ids.is_empty() {
        return Ok(tallies);
    }

    for chunk in post_ids.chunks(BATCH_CHUNK) {
        let sql = format!(
            "SELECT post_id, COUNT(*), SUM(CAST(ROUND(score * 10) AS INTEGER))
             FROM ratings WHERE post_id IN ({}) GROUP BY post_id",
            placeholders(chunk.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                RatingTally {
                    count: row.get(1)?,
                    sum_tenths: row.get(2)?,
                },
            ))
        })?;
        for row in rows {
            let (post_id, tally) = row?;
            tallies.insert(post_id, tally);
        }
    }

    Ok(tallies)
}

// --- Collections ---

pub fn get_collections_by_user(conn: &Connection, user_id: i64) -> Result<Vec<Collection>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, is_default, created_at, updated_at
         FROM collections WHERE user_id = ?1 ORDER BY created_at, id",
    )?;
    let collections = stmt
        .query_map(params![user_id], collection_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(collections)
}

pub fn create_collection(
    conn: &Connection,
    user_id: i64,
    name: &str,
    is_default: bool,
) -> Result<Collection> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO collections (user_id, name, is_default, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![user_id, name, is_default, to_ts(&now)],
    )
    .with_context(|| format!("Failed to create collection {name}"))?;
    Ok(Collection {
        id: conn.last_insert_rowid(),
        user_id,
        name: name.to_string(),
        is_default,
        created_at: now,
        updated_at: now,
    })
}

pub fn ensure_default_collection(conn: &Connection, user_id: i64, name: &str) -> Result<Collection> {
    let now = Utc::now();
    // The partial unique index on (user_id) WHERE is_default absorbs a
    // second default.
    conn.execute(
        "INSERT INTO collections (user_id, name, is_default, created_at, updated_at)
         VALUES (?1, ?2, 1, ?3, ?3)
         ON CONFLICT DO NOTHING",
        params![user_id, name, to_ts(&now)],
    )
    .context("Failed to create default collection")?;
    let collection = conn.query_row(
        "SELECT id, user_id, name, is_default, created_at, updated_at
         FROM collections WHERE user_id = ?1 AND is_default = 1",
        params![user_id],
        collection_from_row,
    )?;
    Ok(collection)
}

pub fn insert_collection_item(
    conn: &Connection,
    user_id: i64,
    post_id: i64,
    collection_id: i64,
) -> Result<(CollectionItem, bool)> {
    let existing = conn
        .query_row(
            "SELECT id, user_id, post_id, collection_id, created_at
             FROM collection_items WHERE user_id = ?1 AND post_id = ?2",
            params![user_id, post_id],
            collection_item_from_row,
        )
        .optional()?;
    if let Some(item) = existing {
        return Ok((item, false));
    }

    let now = Utc::now();
    conn.execute(
        "INSERT INTO collection_items (user_id, post_id, collection_id, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![user_id, post_id, collection_id, to_ts(&now)],
    )
    .context("Failed to insert collection item")?;
    Ok((
        CollectionItem {
            id: conn.last_insert_rowid(),
            user_id,
            post_id,
            collection_id,
            created_at: now,
        },
        true,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::create_tables;
    use chrono::{Duration, TimeZone};

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    fn seed_post(conn: &Connection, author: i64, title: &str) -> Post {
        create_post(conn, &NewPost::new(author, title, "")).unwrap()
    }

    #[test]
    fn test_timestamp_format_is_fixed_width() {
        let a = Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 0).unwrap();
        let b = a + Duration::microseconds(1);
        assert_eq!(to_ts(&a), "2024-03-01T09:05:00.000000Z");
        assert_eq!(to_ts(&a).len(), to_ts(&b).len());
        assert!(to_ts(&a) < to_ts(&b));
    }

    #[test]
    fn test_post_roundtrip_keeps_images() {
        let conn = test_conn();
        let user = create_user(&conn, "ansel").unwrap();
        let new = NewPost::new(user.id, "Moonrise", "Hernandez, NM")
            .images(vec!["a.jpg".to_string(), "b.jpg".to_string()]);
        let created = create_post(&conn, &new).unwrap();
        let loaded = get_post(&conn, created.id).unwrap().unwrap();
        assert_eq!(loaded.images, vec!["a.jpg", "b.jpg"]);
        assert_eq!(loaded.title, "Moonrise");
        assert!(get_post(&conn, 999).unwrap().is_none());
    }

    #[test]
    fn test_count_batch_omits_posts_without_rows() {
        let conn = test_conn();
        let u1 = create_user(&conn, "u1").unwrap();
        let u2 = create_user(&conn, "u2").unwrap();
        let p1 = seed_post(&conn, u1.id, "one");
        let p2 = seed_post(&conn, u1.id, "two");
        insert_interaction(&conn, InteractionKind::Like, u1.id, p1.id).unwrap();
        insert_interaction(&conn, InteractionKind::Like, u2.id, p1.id).unwrap();

        let counts =
            count_interactions_batch(&conn, InteractionKind::Like, &[p1.id, p2.id]).unwrap();
        assert_eq!(counts.get(&p1.id), Some(&2));
        assert!(!counts.contains_key(&p2.id));
    }

    #[test]
    fn test_count_batch_empty_input() {
        let conn = test_conn();
        let counts = count_interactions_batch(&conn, InteractionKind::Share, &[]).unwrap();
        assert!(counts.is_empty());
    }

    #[test]
    fn test_count_batch_spans_chunks() {
        let conn = test_conn();
        let user = create_user(&conn, "bulk").unwrap();
        let posts: Vec<i64> = (0..BATCH_CHUNK + 3)
            .map(|i| seed_post(&conn, user.id, &format!("p{i}")).id)
            .collect();
        let last = *posts.last().unwrap();
        insert_comment(&conn, user.id, last, "nice").unwrap();
        insert_comment(&conn, user.id, last, "again").unwrap();

        let counts = count_interactions_batch(&conn, InteractionKind::Comment, &posts).unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[&last], 2);
    }

    #[test]
    fn test_insert_interaction_is_idempotent() {
        let conn = test_conn();
        let user = create_user(&conn, "u").unwrap();
        let post = seed_post(&conn, user.id, "t");
        let (first, created) =
            insert_interaction(&conn, InteractionKind::Share, user.id, post.id).unwrap();
        assert!(created);
        let (second, created_again) =
            insert_interaction(&conn, InteractionKind::Share, user.id, post.id).unwrap();
        assert!(!created_again);
        assert_eq!(first.id, second.id);
        assert_eq!(count_interactions(&conn, InteractionKind::Share, post.id).unwrap(), 1);
    }

    #[test]
    fn test_comment_kind_cannot_be_toggled() {
        let conn = test_conn();
        let user = create_user(&conn, "u").unwrap();
        let post = seed_post(&conn, user.id, "t");
        assert!(insert_interaction(&conn, InteractionKind::Comment, user.id, post.id).is_err());
    }

    #[test]
    fn test_rating_tally_sums_tenths() {
        let conn = test_conn();
        let author = create_user(&conn, "author").unwrap();
        let a = create_user(&conn, "a").unwrap();
        let b = create_user(&conn, "b").unwrap();
        let post = seed_post(&conn, author.id, "t");
        insert_rating(&conn, a.id, post.id, 7.3).unwrap();
        insert_rating(&conn, b.id, post.id, 0.1).unwrap();

        let tally = rating_tally(&conn, post.id).unwrap();
        assert_eq!(tally, RatingTally { count: 2, sum_tenths: 74 });

        let empty = rating_tally(&conn, 12345).unwrap();
        assert_eq!(empty, RatingTally::default());
    }

    #[test]
    fn test_duplicate_rating_insert_is_ignored() {
        let conn = test_conn();
        let author = create_user(&conn, "author").unwrap();
        let rater = create_user(&conn, "rater").unwrap();
        let post = seed_post(&conn, author.id, "t");
        assert!(insert_rating(&conn, rater.id, post.id, 4.0).unwrap().is_some());
        assert!(insert_rating(&conn, rater.id, post.id, 9.0).unwrap().is_none());

        let stored = get_rating(&conn, rater.id, post.id).unwrap().unwrap();
        assert!((stored.score - 4.0).abs() < f64::EPSILON);
        assert_eq!(rating_tally(&conn, post.id).unwrap().count, 1);
    }

    #[test]
    fn test_ensure_default_collection_reuses_existing_default() {
        let conn = test_conn();
        let user = create_user(&conn, "u").unwrap();
        let first = ensure_default_collection(&conn, user.id, "Favorites").unwrap();
        let again = ensure_default_collection(&conn, user.id, "Other").unwrap();
        assert_eq!(first.id, again.id);
        assert_eq!(again.name, "Favorites");
        assert!(again.is_default);

        create_collection(&conn, user.id, "Extra", false).unwrap();
        assert!(create_collection(&conn, user.id, "Second default", true).is_err());
        assert_eq!(get_collections_by_user(&conn, user.id).unwrap().len(), 2);
    }

    #[test]
    fn test_update_rating_missing_returns_none() {
        let conn = test_conn();
        assert!(update_rating(&conn, 1, 1, 5.0).unwrap().is_none());
    }

    #[test]
    fn test_title_search_is_case_sensitive() {
        let conn = test_conn();
        let user = create_user(&conn, "u").unwrap();
        seed_post(&conn, user.id, "Sunset over Lake");
        seed_post(&conn, user.id, "sunset at dawn");
        let hits = get_posts_by_title_substring(&conn, "Sunset", 0, 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Sunset over Lake");
    }

    #[test]
    fn test_posts_created_since_filters_window() {
        let conn = test_conn();
        let user = create_user(&conn, "u").unwrap();
        let now = Utc::now();
        let old = NewPost::new(user.id, "old", "").created_at(now - Duration::days(10));
        let fresh = NewPost::new(user.id, "fresh", "").created_at(now - Duration::days(1));
        create_post(&conn, &old).unwrap();
        create_post(&conn, &fresh).unwrap();

        let posts = get_posts_created_since(&conn, &(now - Duration::days(7))).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "fresh");
    }

    #[test]
    fn test_collection_item_unique_per_user_and_post() {
        let conn = test_conn();
        let user = create_user(&conn, "u").unwrap();
        let author = create_user(&conn, "author").unwrap();
        let post = seed_post(&conn, author.id, "t");
        let first = create_collection(&conn, user.id, "A", true).unwrap();
        let second = create_collection(&conn, user.id, "B", false).unwrap();

        let (item, created) = insert_collection_item(&conn, user.id, post.id, first.id).unwrap();
        assert!(created);
        let (again, created_again) =
            insert_collection_item(&conn, user.id, post.id, second.id).unwrap();
        assert!(!created_again);
        assert_eq!(again.id, item.id);
        assert_eq!(again.collection_id, first.id);
    }

    #[test]
    fn test_likes_received_counts_only_authored_posts() {
        let conn = test_conn();
        let author = create_user(&conn, "author").unwrap();
        let other = create_user(&conn, "other").unwrap();
        let mine = seed_post(&conn, author.id, "mine");
        let theirs = seed_post(&conn, other.id, "theirs");
        insert_interaction(&conn, InteractionKind::Like, other.id, mine.id).unwrap();
        insert_interaction(&conn, InteractionKind::Like, author.id, theirs.id).unwrap();
        assert_eq!(count_likes_received(&conn, author.id).unwrap(), 1);
    }
}
