// Database layer: storage for users, posts, and per-post engagement records.
//
// SQLite (rusqlite, bundled) is the default backend. The file lives wherever
// FORUM_DB_PATH points (defaults to ./photoforum.db). Building with the
// `postgres` feature adds a PostgreSQL backend selected via DATABASE_URL.
//
// Everything above this module talks to `Arc<dyn Database>`.

pub mod models;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod queries;
#[cfg(feature = "sqlite")]
pub mod schema;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use traits::Database;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

#[cfg(feature = "sqlite")]
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
#[cfg(feature = "sqlite")]
use anyhow::Context;
#[cfg(feature = "sqlite")]
use rusqlite::Connection;

/// Open (or create) the SQLite database and run migrations.
///
/// Called by `photoforum init`. Creates parent directories as needed.
#[cfg(feature = "sqlite")]
pub fn initialize_sqlite(db_path: &str) -> Result<Arc<dyn Database>> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory for database: {}", db_path))?;
        }
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path))?;

    // WAL for concurrent readers
    conn.pragma_update(None, "journal_mode", "WAL")?;

    schema::create_tables(&conn)?;

    Ok(Arc::new(SqliteDatabase::new(conn)))
}

/// Open an existing SQLite database (fails if it doesn't exist yet).
///
/// Migrations still run so an older file picks up new columns.
#[cfg(feature = "sqlite")]
pub fn open_sqlite(db_path: &str) -> Result<Arc<dyn Database>> {
    if !Path::new(db_path).exists() {
        anyhow::bail!(
            "Database not found at {}. Run `photoforum init` first.",
            db_path
        );
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    schema::create_tables(&conn)?;

    Ok(Arc::new(SqliteDatabase::new(conn)))
}

/// Connect to PostgreSQL and run pending migrations.
#[cfg(feature = "postgres")]
pub async fn connect_postgres(database_url: &str) -> Result<Arc<dyn Database>> {
    let db = postgres::PgDatabase::connect(database_url).await?;
    Ok(Arc::new(db))
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_missing_file_fails() {
        let dir = std::env::temp_dir().join(format!("photoforum-missing-{}", std::process::id()));
        let path = dir.join("nope.db");
        let err = match open_sqlite(path.to_str().unwrap()) {
            Ok(_) => panic!("expected missing database to fail"),
            Err(e) => e,
        };
        assert!(err.to_string().contains("photoforum init"));
    }

    #[tokio::test]
    async fn test_initialize_then_open() {
        let dir = std::env::temp_dir().join(format!("photoforum-init-{}", std::process::id()));
        let path = dir.join("forum.db");
        let path = path.to_str().unwrap();

        let db = initialize_sqlite(path).unwrap();
        let user = db.create_user("imogen").await.unwrap();
        drop(db);

        let db = open_sqlite(path).unwrap();
        assert_eq!(db.table_count().await.unwrap(), 10);
        assert_eq!(db.get_user(user.id).await.unwrap().unwrap().username, "imogen");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
