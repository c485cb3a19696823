//! Scoped counter interface.

use async_trait::async_trait;

use crate::model::{DocumentId, ScopeKey};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
///
/// `Conflict` is the only retryable kind: the record changed between the
/// read and the conditional write.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Document already exists: {0}")]
    Duplicate(DocumentId),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[cfg(any(feature = "sqlite", feature = "postgres"))]
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl StorageError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StorageError::Conflict(_))
    }
}

#[cfg(any(feature = "sqlite", feature = "postgres"))]
impl From<sqlx::Error> for StorageError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::Database(db) => {
                if db.is_unique_violation() || is_contention(db.as_ref()) {
                    StorageError::Conflict(db.message().to_string())
                } else {
                    StorageError::Database(error)
                }
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StorageError::Unavailable(error.to_string()),
            _ => StorageError::Database(error),
        }
    }
}

/// Lock and serialization failures that a fresh attempt can get past.
#[cfg(any(feature = "sqlite", feature = "postgres"))]
fn is_contention(db: &dyn sqlx::error::DatabaseError) -> bool {
    #[cfg(feature = "sqlite")]
    if db.try_downcast_ref::<sqlx::sqlite::SqliteError>().is_some() {
        // SQLITE_BUSY (5) and SQLITE_LOCKED (6), including extended codes.
        return db
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .map(|code| matches!(code & 0xff, 5 | 6))
            .unwrap_or(false);
    }

    #[cfg(feature = "postgres")]
    if db.try_downcast_ref::<sqlx::postgres::PgDatabaseError>().is_some() {
        // serialization_failure, deadlock_detected
        return matches!(db.code().as_deref(), Some("40001") | Some("40P01"));
    }

    false
}

/// Interface for per-scope sequence counters.
///
/// A counter that was never incremented reads as 0. Counters are never
/// deleted, so a number once issued is never issued again in its scope.
///
/// Implementations:
/// - `MemoryStore`: in-process storage
/// - `SqliteNumberingStore`: SQLite storage
/// - `PostgresNumberingStore`: PostgreSQL storage
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Issue the next number for a scope.
    ///
    /// Reads `last_issued`, then writes `last_issued + 1` only if the record
    /// is unchanged since the read. Returns `StorageError::Conflict` if
    /// another writer got there first; does not retry.
    async fn increment(&self, scope: &ScopeKey) -> Result<u64>;

    /// Highest number issued so far in a scope (0 if none).
    async fn last_issued(&self, scope: &ScopeKey) -> Result<u64>;
}
