//! Application error types and result alias.

use thiserror::Error;

/// Application result type alias
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Not found error
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Conflict error (e.g., duplicate document path)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Validation error — rejected before any I/O
    #[error("Validation error: {0}")]
    Validation(String),

    /// Storage backend error (transport, auth, quota)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Operation cancelled by the caller
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error is the normalized not-found condition.
    ///
    /// Adapters map their backend's native missing-object errors into
    /// `NotFound` so callers can apply uniform fallback logic.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}

/// Map a sqlx error into the application taxonomy, surfacing unique-index
/// violations as conflicts instead of opaque database failures.
pub fn map_db_error(err: sqlx::Error, context: &str) -> AppError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.kind() == sqlx::error::ErrorKind::UniqueViolation {
            return AppError::Conflict(context.to_string());
        }
    }
    AppError::Database(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_recognizable() {
        assert!(AppError::NotFound("x".into()).is_not_found());
        assert!(!AppError::Storage("x".into()).is_not_found());
    }

    #[test]
    fn error_display_includes_detail() {
        let err = AppError::Validation("file name is empty".into());
        assert_eq!(err.to_string(), "Validation error: file name is empty");
    }
}
