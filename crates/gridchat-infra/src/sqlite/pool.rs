//! Database pool with split reader/writer connections, WAL mode, and
//! quarantine-based corruption recovery.
//!
//! SQLite allows only one writer at a time. This module provides a
//! `DatabasePool` with a multi-connection reader pool for concurrent reads
//! and a single-connection writer pool for serialized writes.
//!
//! On open, the backing file's structural integrity is verified with
//! `PRAGMA integrity_check`. A file that fails to open or verify is renamed
//! aside to `<path>.corrupt` (preserved for forensic recovery, a previous
//! quarantine at that path is overwritten) and a fresh empty store is
//! initialized in its place, so `open` never fails solely due to corruption.

use std::path::{Path, PathBuf};
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::warn;

use gridchat_types::error::StorageError;

/// Schema applied on every open. `IF NOT EXISTS` keeps re-opens cheap.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS chats (
        chat_id    TEXT PRIMARY KEY,
        created_at TEXT NOT NULL,
        title      TEXT
    )",
    "CREATE TABLE IF NOT EXISTS messages (
        msg_id     INTEGER PRIMARY KEY AUTOINCREMENT,
        chat_id    TEXT NOT NULL REFERENCES chats(chat_id),
        role       TEXT NOT NULL,
        content    TEXT NOT NULL,
        timestamp  TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_messages_chat_order ON messages(chat_id, msg_id)",
];

/// Split read/write pool for SQLite with WAL mode.
///
/// - `reader`: Multi-connection pool (up to 8) for concurrent SELECT queries.
/// - `writer`: Single-connection pool for serialized INSERT/UPDATE.
#[derive(Clone)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open (or create) the chat store at `db_path`, self-healing on
    /// corruption.
    pub async fn open(db_path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StorageError::Connection(e.to_string()))?;
            }
        }

        match Self::try_open(db_path).await {
            Ok(pool) => Ok(pool),
            Err(err) => {
                warn!(path = %db_path.display(), %err, "store failed to open, quarantining");
                quarantine(db_path)?;
                Self::try_open(db_path).await
            }
        }
    }

    async fn try_open(db_path: &Path) -> Result<Self, StorageError> {
        let base_opts = SqliteConnectOptions::new()
            .filename(db_path)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(base_opts.clone())
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        if let Err(err) = verify_and_init(&writer).await {
            writer.close().await;
            return Err(err);
        }

        let reader = match SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(base_opts.read_only(true))
            .await
        {
            Ok(pool) => pool,
            Err(e) => {
                writer.close().await;
                return Err(StorageError::Connection(e.to_string()));
            }
        };

        Ok(Self { reader, writer })
    }
}

/// Run the integrity check, then apply the schema.
async fn verify_and_init(writer: &SqlitePool) -> Result<(), StorageError> {
    let (check,): (String,) = sqlx::query_as("PRAGMA integrity_check")
        .fetch_one(writer)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;
    if check != "ok" {
        return Err(StorageError::Connection(format!(
            "integrity check failed: {check}"
        )));
    }

    for stmt in SCHEMA {
        sqlx::query(stmt)
            .execute(writer)
            .await
            .map_err(|e| StorageError::Query(e.to_string()))?;
    }
    Ok(())
}

/// Rename the store file aside to `<path>.corrupt` and drop stale WAL
/// siblings so the fresh store starts clean.
fn quarantine(db_path: &Path) -> Result<(), StorageError> {
    if db_path.exists() {
        let corrupt = quarantine_path(db_path);
        // Overwrite an earlier quarantine rather than accumulating them.
        let _ = std::fs::remove_file(&corrupt);
        std::fs::rename(db_path, &corrupt)
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        warn!(quarantined = %corrupt.display(), "corrupted store preserved");
    }
    for suffix in ["-wal", "-shm"] {
        let mut sibling = db_path.as_os_str().to_owned();
        sibling.push(suffix);
        let _ = std::fs::remove_file(PathBuf::from(sibling));
    }
    Ok(())
}

/// Quarantine destination for a store file: `<path>.corrupt`.
pub fn quarantine_path(db_path: &Path) -> PathBuf {
    let mut name = db_path.as_os_str().to_owned();
    name.push(".corrupt");
    PathBuf::from(name)
}

/// Default store location: `CHAT_DB_PATH` env var, falling back to
/// `~/.gridchat/chat_history.db`.
pub fn default_db_path() -> PathBuf {
    if let Ok(path) = std::env::var("CHAT_DB_PATH") {
        return PathBuf::from(path);
    }
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".gridchat").join("chat_history.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_creates_tables() {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::open(&dir.path().join("test.db")).await.unwrap();

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&pool.reader)
        .await
        .unwrap();

        let names: Vec<&str> = tables.iter().map(|t| t.0.as_str()).collect();
        assert!(names.contains(&"chats"), "chats table missing");
        assert!(names.contains(&"messages"), "messages table missing");
    }

    #[tokio::test]
    async fn test_open_wal_mode() {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::open(&dir.path().join("test_wal.db")).await.unwrap();

        let result: (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(&pool.writer)
            .await
            .unwrap();
        assert_eq!(result.0.to_lowercase(), "wal");
    }

    #[tokio::test]
    async fn test_open_foreign_keys_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::open(&dir.path().join("test_fk.db")).await.unwrap();

        let result: (i32,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool.writer)
            .await
            .unwrap();
        assert_eq!(result.0, 1, "foreign keys should be enabled");
    }

    #[tokio::test]
    async fn test_corrupted_file_is_quarantined_and_store_reinitialized() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("broken.db");
        std::fs::write(&db_path, b"this is definitely not a sqlite database").unwrap();

        let pool = DatabasePool::open(&db_path).await.unwrap();

        // The garbage was preserved aside, not destroyed.
        let corrupt = quarantine_path(&db_path);
        assert!(corrupt.exists(), "quarantine file missing");
        assert_eq!(
            std::fs::read(&corrupt).unwrap(),
            b"this is definitely not a sqlite database"
        );

        // The fresh store is empty and fully functional.
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chats")
            .fetch_one(&pool.reader)
            .await
            .unwrap();
        assert_eq!(count, 0);

        sqlx::query("INSERT INTO chats (chat_id, created_at) VALUES ('c1', '2026-01-01T00:00:00Z')")
            .execute(&pool.writer)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_quarantine_overwrites_previous_quarantine() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("twice.db");
        let corrupt = quarantine_path(&db_path);

        std::fs::write(&corrupt, b"old quarantine").unwrap();
        std::fs::write(&db_path, b"new garbage").unwrap();

        DatabasePool::open(&db_path).await.unwrap();
        assert_eq!(std::fs::read(&corrupt).unwrap(), b"new garbage");
    }

    #[tokio::test]
    async fn test_reopen_preserves_data() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("persist.db");

        {
            let pool = DatabasePool::open(&db_path).await.unwrap();
            sqlx::query("INSERT INTO chats (chat_id, created_at) VALUES ('c1', '2026-01-01T00:00:00Z')")
                .execute(&pool.writer)
                .await
                .unwrap();
            pool.writer.close().await;
            pool.reader.close().await;
        }

        let pool = DatabasePool::open(&db_path).await.unwrap();
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chats")
            .fetch_one(&pool.reader)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_default_db_path_filename() {
        let path = default_db_path();
        assert!(path.to_string_lossy().ends_with("chat_history.db") || path.is_absolute());
    }
}
