//! Document record interface.

use async_trait::async_trait;

use super::counter_store::Result;
use crate::model::{Document, DocumentId, ScopeKey};

/// Interface for document persistence.
///
/// Finalization is not part of this trait; it goes through
/// [`NumberingStore::commit_finalization`](super::NumberingStore) so that the
/// counter and the document change together.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store a new document.
    ///
    /// Returns `StorageError::Duplicate` if the id is taken.
    async fn insert(&self, document: &Document) -> Result<()>;

    /// Load a document by id.
    async fn load(&self, id: DocumentId) -> Result<Option<Document>>;

    /// Resolve an issued number back to its document.
    async fn find_by_number(&self, scope: &ScopeKey, sequence_number: u64)
        -> Result<Option<Document>>;

    /// Delete a document. Returns whether it existed.
    ///
    /// Counters are left untouched; a deleted document's number stays spent.
    async fn delete(&self, id: DocumentId) -> Result<bool>;
}
