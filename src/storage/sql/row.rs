//! Conversion between document rows and [`Document`].

use chrono::{DateTime, Utc};

use crate::interfaces::{Result, StorageError};
use crate::model::{Document, DocumentId, DocumentState, DocumentStatus, Numbering, ScopeKey};

/// Raw column values of a `documents` row.
pub(super) struct DocumentRow {
    pub id: String,
    pub subject: String,
    pub status: String,
    pub scope_key: Option<String>,
    pub sequence_number: Option<i64>,
    pub finalized_at: Option<String>,
    pub created_at: String,
}

impl DocumentRow {
    pub fn into_document(self) -> Result<Document> {
        let id: DocumentId = self
            .id
            .parse()
            .map_err(|e| StorageError::Corrupt(format!("document id {}: {}", self.id, e)))?;

        let status = DocumentStatus::parse(&self.status).ok_or_else(|| {
            StorageError::Corrupt(format!("document {} has status {}", id, self.status))
        })?;

        let state = match status {
            DocumentStatus::Draft => DocumentState::Draft,
            DocumentStatus::Finalized => {
                match (self.scope_key, self.sequence_number, self.finalized_at) {
                    (Some(scope_key), Some(sequence_number), Some(finalized_at)) => {
                        DocumentState::Finalized(Numbering {
                            scope_key: ScopeKey::new(scope_key).map_err(|e| {
                                StorageError::Corrupt(format!("document {}: {}", id, e))
                            })?,
                            sequence_number: to_sequence(sequence_number)?,
                            finalized_at: parse_timestamp(&finalized_at)?,
                        })
                    }
                    _ => {
                        return Err(StorageError::Corrupt(format!(
                            "finalized document {} is missing its number",
                            id
                        )))
                    }
                }
            }
        };

        Ok(Document {
            id,
            subject: self.subject,
            created_at: parse_timestamp(&self.created_at)?,
            state,
        })
    }
}

/// Convert a stored counter or sequence value.
pub(super) fn to_sequence(value: i64) -> Result<u64> {
    u64::try_from(value)
        .map_err(|_| StorageError::Corrupt(format!("negative sequence value {}", value)))
}

/// Convert a sequence value for storage.
pub(super) fn from_sequence(value: u64) -> Result<i64> {
    i64::try_from(value)
        .map_err(|_| StorageError::Corrupt(format!("sequence value {} out of range", value)))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Corrupt(format!("timestamp {}: {}", value, e)))
}
