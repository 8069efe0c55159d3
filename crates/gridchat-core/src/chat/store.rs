//! ChatStore trait definition.
//!
//! The durable-store port: session registry plus append-only message log.
//! Implementations must serialize writers; readers may run concurrently but
//! never observe a write in progress. The `msg_id` ordering contract is
//! global and monotonic across the whole store, not per chat.
//!
//! Implementations live in `gridchat-infra` (e.g. `SqliteChatStore`).
//! Uses native async fn in traits (RPITIT, Rust 2024 edition).

use gridchat_types::chat::{ChatRole, SessionSummary, TurnRecord};
use gridchat_types::error::StorageError;

/// Repository trait for chat sessions and their append-only message logs.
pub trait ChatStore: Send + Sync {
    /// Create a session if it does not already exist.
    ///
    /// Idempotent: re-creating an existing chat id is a no-op and never
    /// alters the recorded creation timestamp.
    fn create_session(
        &self,
        chat_id: &str,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// List all sessions, most recently created first. Ties on the creation
    /// timestamp keep insertion order.
    fn list_sessions(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<SessionSummary>, StorageError>> + Send;

    /// Get a session's title. `None` when the session is unknown or the
    /// title was never set (or set to empty).
    fn get_title(
        &self,
        chat_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Set a session's title. Silent no-op when the chat id does not exist:
    /// title updates are best-effort and must never abort a turn.
    fn set_title(
        &self,
        chat_id: &str,
        title: &str,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// Append a message to a session's log. The store assigns the next
    /// global `msg_id` and the timestamp. The session must already exist.
    fn append_message(
        &self,
        chat_id: &str,
        role: ChatRole,
        content: &str,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// All messages for a chat in strict `msg_id` order, reasoning entries
    /// included. Empty for an unknown chat id (not an error).
    fn fetch_history(
        &self,
        chat_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<TurnRecord>, StorageError>> + Send;

    /// Contents of `assistant_think` messages only, same ordering as
    /// `fetch_history`.
    fn fetch_reasoning(
        &self,
        chat_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>, StorageError>> + Send;
}
