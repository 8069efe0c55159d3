//! SQLite-backed implementation of the `ChatStore` trait.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use gridchat_core::chat::ChatStore;
use gridchat_types::chat::{ChatRole, SessionSummary, TurnRecord};
use gridchat_types::error::StorageError;

use super::pool::DatabasePool;

/// SQLite chat store backed by the split reader/writer pool.
#[derive(Clone)]
pub struct SqliteChatStore {
    pool: DatabasePool,
}

impl SqliteChatStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Database row for the chats table.
#[derive(FromRow)]
struct ChatRow {
    chat_id: String,
    created_at: String,
    title: Option<String>,
}

impl ChatRow {
    fn into_summary(self) -> Result<SessionSummary, StorageError> {
        Ok(SessionSummary {
            chat_id: self.chat_id,
            created_at: parse_datetime(&self.created_at)?,
            title: self.title.filter(|t| !t.is_empty()),
        })
    }
}

/// Database row for the messages table.
#[derive(FromRow)]
struct MessageRow {
    role: String,
    content: String,
}

impl MessageRow {
    fn into_record(self) -> Result<TurnRecord, StorageError> {
        Ok(TurnRecord {
            role: ChatRole::from_str(&self.role)
                .map_err(|e| StorageError::Query(e.to_string()))?,
            content: self.content,
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Query(format!("invalid timestamp '{s}': {e}")))
}

fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

impl ChatStore for SqliteChatStore {
    async fn create_session(&self, chat_id: &str) -> Result<(), StorageError> {
        sqlx::query("INSERT OR IGNORE INTO chats (chat_id, created_at) VALUES (?, ?)")
            .bind(chat_id)
            .bind(format_datetime(Utc::now()))
            .execute(&self.pool.writer)
            .await
            .map_err(|e| StorageError::Query(e.to_string()))?;
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, StorageError> {
        let rows: Vec<ChatRow> = sqlx::query_as(
            "SELECT chat_id, created_at, title FROM chats ORDER BY created_at DESC, rowid ASC",
        )
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;

        rows.into_iter().map(ChatRow::into_summary).collect()
    }

    async fn get_title(&self, chat_id: &str) -> Result<Option<String>, StorageError> {
        let title: Option<Option<String>> =
            sqlx::query_scalar("SELECT title FROM chats WHERE chat_id = ?")
                .bind(chat_id)
                .fetch_optional(&self.pool.reader)
                .await
                .map_err(|e| StorageError::Query(e.to_string()))?;

        Ok(title.flatten().filter(|t| !t.is_empty()))
    }

    async fn set_title(&self, chat_id: &str, title: &str) -> Result<(), StorageError> {
        // Zero rows affected means an unknown chat id, which is fine here.
        sqlx::query("UPDATE chats SET title = ? WHERE chat_id = ?")
            .bind(title)
            .bind(chat_id)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| StorageError::Query(e.to_string()))?;
        Ok(())
    }

    async fn append_message(
        &self,
        chat_id: &str,
        role: ChatRole,
        content: &str,
    ) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO messages (chat_id, role, content, timestamp) VALUES (?, ?, ?, ?)",
        )
        .bind(chat_id)
        .bind(role.to_string())
        .bind(content)
        .bind(format_datetime(Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;
        Ok(())
    }

    async fn fetch_history(&self, chat_id: &str) -> Result<Vec<TurnRecord>, StorageError> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            "SELECT role, content FROM messages WHERE chat_id = ? ORDER BY msg_id ASC",
        )
        .bind(chat_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;

        rows.into_iter().map(MessageRow::into_record).collect()
    }

    async fn fetch_reasoning(&self, chat_id: &str) -> Result<Vec<String>, StorageError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT content FROM messages
             WHERE chat_id = ? AND role = 'assistant_think'
             ORDER BY msg_id ASC",
        )
        .bind(chat_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;

        Ok(rows.into_iter().map(|(content,)| content).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> (SqliteChatStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::open(&dir.path().join("test.db")).await.unwrap();
        (SqliteChatStore::new(pool), dir)
    }

    #[tokio::test]
    async fn test_append_and_fetch_preserves_order() {
        let (store, _dir) = store().await;
        store.create_session("c1").await.unwrap();

        store.append_message("c1", ChatRole::User, "hello").await.unwrap();
        store
            .append_message("c1", ChatRole::AssistantThink, "pondering")
            .await
            .unwrap();
        store.append_message("c1", ChatRole::Assistant, "hi there").await.unwrap();

        let history = store.fetch_history("c1").await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].role, ChatRole::User);
        assert_eq!(history[0].content, "hello");
        assert_eq!(history[1].role, ChatRole::AssistantThink);
        assert_eq!(history[2].role, ChatRole::Assistant);
        assert_eq!(history[2].content, "hi there");
    }

    #[tokio::test]
    async fn test_create_session_is_idempotent() {
        let (store, _dir) = store().await;
        store.create_session("c1").await.unwrap();

        let before = store.list_sessions().await.unwrap();
        store.create_session("c1").await.unwrap();
        let after = store.list_sessions().await.unwrap();

        assert_eq!(after.len(), 1);
        assert_eq!(before[0].created_at, after[0].created_at);
    }

    #[tokio::test]
    async fn test_list_sessions_newest_first() {
        let (store, _dir) = store().await;
        // Same-timestamp ties fall back to insertion order, so force
        // distinct timestamps directly.
        for (id, ts) in [
            ("old", "2026-01-01T00:00:00+00:00"),
            ("new", "2026-02-01T00:00:00+00:00"),
            ("mid", "2026-01-15T00:00:00+00:00"),
        ] {
            sqlx::query("INSERT INTO chats (chat_id, created_at) VALUES (?, ?)")
                .bind(id)
                .bind(ts)
                .execute(&store.pool.writer)
                .await
                .unwrap();
        }

        let sessions = store.list_sessions().await.unwrap();
        let ids: Vec<&str> = sessions.iter().map(|s| s.chat_id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn test_title_roundtrip() {
        let (store, _dir) = store().await;
        store.create_session("c1").await.unwrap();

        assert_eq!(store.get_title("c1").await.unwrap(), None);
        store.set_title("c1", "Rust Questions").await.unwrap();
        assert_eq!(
            store.get_title("c1").await.unwrap(),
            Some("Rust Questions".to_string())
        );
    }

    #[tokio::test]
    async fn test_empty_title_reads_as_none() {
        let (store, _dir) = store().await;
        store.create_session("c1").await.unwrap();
        store.set_title("c1", "").await.unwrap();
        assert_eq!(store.get_title("c1").await.unwrap(), None);

        let sessions = store.list_sessions().await.unwrap();
        assert_eq!(sessions[0].title, None);
    }

    #[tokio::test]
    async fn test_set_title_unknown_chat_is_noop() {
        let (store, _dir) = store().await;
        store.set_title("ghost", "whatever").await.unwrap();
        assert_eq!(store.get_title("ghost").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unknown_chat_history_is_empty() {
        let (store, _dir) = store().await;
        assert!(store.fetch_history("ghost").await.unwrap().is_empty());
        assert!(store.fetch_reasoning("ghost").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_reasoning_filters_roles() {
        let (store, _dir) = store().await;
        store.create_session("c1").await.unwrap();
        store.append_message("c1", ChatRole::User, "q").await.unwrap();
        store
            .append_message("c1", ChatRole::AssistantThink, "first thought")
            .await
            .unwrap();
        store.append_message("c1", ChatRole::Assistant, "a").await.unwrap();
        store
            .append_message("c1", ChatRole::AssistantThink, "second thought")
            .await
            .unwrap();

        let reasoning = store.fetch_reasoning("c1").await.unwrap();
        assert_eq!(reasoning, vec!["first thought", "second thought"]);
    }

    #[tokio::test]
    async fn test_interleaved_chats_keep_per_chat_order() {
        let (store, _dir) = store().await;
        store.create_session("a").await.unwrap();
        store.create_session("b").await.unwrap();

        store.append_message("a", ChatRole::User, "a1").await.unwrap();
        store.append_message("b", ChatRole::User, "b1").await.unwrap();
        store.append_message("a", ChatRole::Assistant, "a2").await.unwrap();
        store.append_message("b", ChatRole::Assistant, "b2").await.unwrap();

        let a: Vec<String> = store
            .fetch_history("a")
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(a, vec!["a1", "a2"]);

        let b: Vec<String> = store
            .fetch_history("b")
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(b, vec!["b1", "b2"]);
    }
}
