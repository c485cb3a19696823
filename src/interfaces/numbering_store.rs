//! Transactional finalization interface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::counter_store::{CounterStore, Result};
use super::document_store::DocumentStore;
use crate::model::{DocumentId, Numbering, ScopeKey};

/// Storage able to finalize a document as one all-or-nothing unit.
#[async_trait]
pub trait NumberingStore: CounterStore + DocumentStore {
    /// Increment the scope counter and stamp the document with the result.
    ///
    /// Both writes commit together or not at all. The document must still be
    /// a draft at write time; if it was finalized or deleted since the caller
    /// read it, or the counter moved under the increment, the unit is
    /// rejected with `StorageError::Conflict` and nothing is written.
    async fn commit_finalization(
        &self,
        id: DocumentId,
        scope: &ScopeKey,
        finalized_at: DateTime<Utc>,
    ) -> Result<Numbering>;
}
