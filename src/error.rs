//! Error taxonomy for the corpus store.
//!
//! [`StoreError`] carries every failure the store can surface; [`ErrorKind`]
//! buckets them so callers (and the retry executor) can branch on
//! validation / transient / fatal without looking at messages.

use std::time::Duration;

use thiserror::Error;

/// Coarse classification of a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller handed us something malformed. Never retried.
    Validation,
    /// Contention or a momentary resource shortage. Safe to retry.
    Transient,
    /// Anything else. Surfaced as-is.
    Fatal,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid tenant id: {0:?}")]
    InvalidId(String),

    #[error("unknown setting field: {0:?} (expected talk, genMode, speed or lang)")]
    InvalidField(String),

    #[error("invalid value {value:?} for setting {field}")]
    InvalidValue { field: &'static str, value: String },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("timed out after {0:?} waiting for a database connection")]
    PoolTimeout(Duration),

    #[error("connection pool is closed")]
    PoolClosed,

    #[error("database task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidId(_) | Self::InvalidField(_) | Self::InvalidValue { .. } => {
                ErrorKind::Validation
            }
            Self::PoolTimeout(_) => ErrorKind::Transient,
            Self::Storage(err) if is_busy_error(err) => ErrorKind::Transient,
            Self::Storage(_) | Self::PoolClosed | Self::Task(_) | Self::Io(_) => {
                ErrorKind::Fatal
            }
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

/// SQLite busy/locked errors clear up on their own once the other writer finishes.
fn is_busy_error(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, _) => matches!(
            code.code,
            rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
        ),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_failure(code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(code), None)
    }

    #[test]
    fn validation_errors_are_not_transient() {
        assert_eq!(StoreError::InvalidId("x".into()).kind(), ErrorKind::Validation);
        assert_eq!(StoreError::InvalidField("name".into()).kind(), ErrorKind::Validation);
        assert!(!StoreError::InvalidValue { field: "speed", value: "11".into() }.is_transient());
    }

    #[test]
    fn busy_and_locked_are_transient() {
        assert!(StoreError::Storage(sqlite_failure(rusqlite::ffi::SQLITE_BUSY)).is_transient());
        assert!(StoreError::Storage(sqlite_failure(rusqlite::ffi::SQLITE_LOCKED)).is_transient());
        assert!(StoreError::PoolTimeout(Duration::from_millis(5)).is_transient());
    }

    #[test]
    fn other_storage_errors_are_fatal() {
        let err = StoreError::Storage(sqlite_failure(rusqlite::ffi::SQLITE_CONSTRAINT));
        assert_eq!(err.kind(), ErrorKind::Fatal);
        assert_eq!(StoreError::Storage(rusqlite::Error::QueryReturnedNoRows).kind(), ErrorKind::Fatal);
    }
}
