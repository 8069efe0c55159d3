use thiserror::Error;

/// Errors from the durable chat store.
///
/// Corruption detected while opening the store is self-healed (quarantine
/// and re-init) and never surfaces through this type; these variants cover
/// failures after a successful open.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Query(String),
}

/// Errors talking to the inference backend.
///
/// A backend failure aborts the current turn only; session state stays
/// consistent and the user's prompt remains persisted.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("http error: {0}")]
    Http(String),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("backend request timed out")]
    Timeout,

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("remote process error: {0}")]
    Process(String),
}

/// Errors from a single orchestrated chat turn.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::Query("no such table: messages".to_string());
        assert_eq!(err.to_string(), "query error: no such table: messages");
    }

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::Provider {
            message: "model not loaded".to_string(),
        };
        assert!(err.to_string().contains("model not loaded"));
        assert_eq!(BackendError::Timeout.to_string(), "backend request timed out");
    }

    #[test]
    fn test_turn_error_from() {
        let err: TurnError = StorageError::Connection("locked".to_string()).into();
        assert!(matches!(err, TurnError::Storage(_)));

        let err: TurnError = BackendError::Timeout.into();
        assert!(matches!(err, TurnError::Backend(_)));
    }
}
