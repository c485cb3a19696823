//! Finalization failure taxonomy.

use crate::interfaces::StorageError;
use crate::model::{DocumentId, DocumentStatus};

/// Why a finalize call did not produce a number.
///
/// `NotFound` and `InvalidState` mean the document cannot be finalized.
/// `AllocationExhausted` and `StoreUnavailable` are transient; the caller may
/// try again later. `Conflict` is retried inside the allocator and only
/// reaches callers of the individual store operations.
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    #[error("Document not found: {id}")]
    NotFound { id: DocumentId },

    #[error("Document {id} cannot be finalized: status is {status}")]
    InvalidState {
        id: DocumentId,
        status: DocumentStatus,
    },

    #[error("Numbering conflict: {reason}")]
    Conflict { reason: String },

    #[error("Numbering for document {id} still conflicting after {attempts} attempts")]
    AllocationExhausted { id: DocumentId, attempts: u32 },

    #[error("Numbering store unavailable: {0}")]
    StoreUnavailable(#[source] StorageError),
}

impl AllocationError {
    /// Whether trying the whole finalize again later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AllocationError::AllocationExhausted { .. } | AllocationError::StoreUnavailable(_)
        )
    }
}

impl From<StorageError> for AllocationError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::Conflict(reason) => AllocationError::Conflict { reason },
            other => AllocationError::StoreUnavailable(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_conflict_maps_to_conflict() {
        let error: AllocationError = StorageError::Conflict("counter moved".to_string()).into();
        assert!(matches!(error, AllocationError::Conflict { reason } if reason == "counter moved"));
    }

    #[test]
    fn test_other_storage_errors_map_to_unavailable() {
        let error: AllocationError = StorageError::Unavailable("pool closed".to_string()).into();
        assert!(matches!(error, AllocationError::StoreUnavailable(_)));

        let error: AllocationError = StorageError::Corrupt("bad row".to_string()).into();
        assert!(matches!(error, AllocationError::StoreUnavailable(_)));
    }

    #[test]
    fn test_transient_classification() {
        let id = DocumentId::new();
        assert!(AllocationError::AllocationExhausted { id, attempts: 8 }.is_transient());
        assert!(
            AllocationError::StoreUnavailable(StorageError::Unavailable("down".to_string()))
                .is_transient()
        );
        assert!(!AllocationError::NotFound { id }.is_transient());
        assert!(!AllocationError::InvalidState {
            id,
            status: DocumentStatus::Finalized
        }
        .is_transient());
    }

    #[test]
    fn test_invalid_state_message_names_status() {
        let id = DocumentId::new();
        let error = AllocationError::InvalidState {
            id,
            status: DocumentStatus::Finalized,
        };
        assert!(error.to_string().contains("finalized"));
    }
}
