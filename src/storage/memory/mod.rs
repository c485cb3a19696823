//! In-memory numbering storage.
//!
//! Optimistic like the SQL backends: each atomic write observes the records
//! under a read lock, then applies under the write lock only if nothing moved
//! in between. Also carries fault hooks for exercising the allocator's retry
//! and failure paths.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::interfaces::{CounterStore, DocumentStore, NumberingStore, Result, StorageError};
use crate::model::{Document, DocumentId, DocumentState, Numbering, ScopeKey};

#[derive(Default)]
struct State {
    counters: HashMap<ScopeKey, u64>,
    documents: HashMap<DocumentId, Document>,
}

/// Numbering store that keeps counters and documents in memory.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    injected_conflicts: RwLock<u32>,
    unavailable: RwLock<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` atomic writes fail with `StorageError::Conflict`.
    pub async fn inject_conflicts(&self, count: u32) {
        *self.injected_conflicts.write().await = count;
    }

    /// Make every operation fail with `StorageError::Unavailable`.
    pub async fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write().await = unavailable;
    }

    /// Seed a counter, as if `last_issued` numbers had already been handed out.
    pub async fn set_last_issued(&self, scope: &ScopeKey, last_issued: u64) {
        self.state
            .write()
            .await
            .counters
            .insert(scope.clone(), last_issued);
    }

    async fn check_available(&self) -> Result<()> {
        if *self.unavailable.read().await {
            return Err(StorageError::Unavailable(
                "memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }

    async fn take_injected_conflict(&self) -> Result<()> {
        let mut remaining = self.injected_conflicts.write().await;
        if *remaining > 0 {
            *remaining -= 1;
            return Err(StorageError::Conflict("injected conflict".to_string()));
        }
        Ok(())
    }

    async fn observe_counter(&self, scope: &ScopeKey) -> u64 {
        self.state
            .read()
            .await
            .counters
            .get(scope)
            .copied()
            .unwrap_or(0)
    }
}

fn counter_moved(scope: &ScopeKey, observed: u64, current: u64) -> StorageError {
    StorageError::Conflict(format!(
        "counter for scope {} moved from {} to {}",
        scope, observed, current
    ))
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn increment(&self, scope: &ScopeKey) -> Result<u64> {
        self.check_available().await?;
        self.take_injected_conflict().await?;

        let observed = self.observe_counter(scope).await;

        let mut state = self.state.write().await;
        let current = state.counters.get(scope).copied().unwrap_or(0);
        if current != observed {
            return Err(counter_moved(scope, observed, current));
        }

        let next = observed + 1;
        state.counters.insert(scope.clone(), next);
        Ok(next)
    }

    async fn last_issued(&self, scope: &ScopeKey) -> Result<u64> {
        self.check_available().await?;
        Ok(self.observe_counter(scope).await)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, document: &Document) -> Result<()> {
        self.check_available().await?;
        let mut state = self.state.write().await;
        if state.documents.contains_key(&document.id) {
            return Err(StorageError::Duplicate(document.id));
        }
        state.documents.insert(document.id, document.clone());
        Ok(())
    }

    async fn load(&self, id: DocumentId) -> Result<Option<Document>> {
        self.check_available().await?;
        Ok(self.state.read().await.documents.get(&id).cloned())
    }

    async fn find_by_number(
        &self,
        scope: &ScopeKey,
        sequence_number: u64,
    ) -> Result<Option<Document>> {
        self.check_available().await?;
        let state = self.state.read().await;
        Ok(state
            .documents
            .values()
            .find(|doc| {
                doc.numbering().is_some_and(|n| {
                    &n.scope_key == scope && n.sequence_number == sequence_number
                })
            })
            .cloned())
    }

    async fn delete(&self, id: DocumentId) -> Result<bool> {
        self.check_available().await?;
        Ok(self.state.write().await.documents.remove(&id).is_some())
    }
}

#[async_trait]
impl NumberingStore for MemoryStore {
    async fn commit_finalization(
        &self,
        id: DocumentId,
        scope: &ScopeKey,
        finalized_at: DateTime<Utc>,
    ) -> Result<Numbering> {
        self.check_available().await?;
        self.take_injected_conflict().await?;

        let observed = self.observe_counter(scope).await;

        let mut state = self.state.write().await;
        let current = state.counters.get(scope).copied().unwrap_or(0);
        if current != observed {
            return Err(counter_moved(scope, observed, current));
        }

        let document = match state.documents.get_mut(&id) {
            Some(doc) if doc.is_draft() => doc,
            Some(_) => {
                return Err(StorageError::Conflict(format!(
                    "document {} is no longer a draft",
                    id
                )))
            }
            None => {
                return Err(StorageError::Conflict(format!(
                    "document {} disappeared",
                    id
                )))
            }
        };

        let numbering = Numbering {
            scope_key: scope.clone(),
            sequence_number: observed + 1,
            finalized_at,
        };
        document.state = DocumentState::Finalized(numbering.clone());
        state.counters.insert(scope.clone(), numbering.sequence_number);

        debug!(%id, %scope, sequence = numbering.sequence_number, "Finalization committed");
        Ok(numbering)
    }
}
