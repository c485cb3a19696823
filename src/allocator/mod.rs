//! Sequence allocation and the draft → finalized transition.
//!
//! `Allocator::finalize` loads the document, checks it is a draft, derives
//! the scope from the clock, and asks the store to bump the scope counter
//! and stamp the document in one atomic unit. A conflict from the store
//! restarts the whole attempt from the load, in a fresh transaction, until
//! the configured attempt bound runs out.

mod error;
mod scope;

pub use error::AllocationError;
pub use scope::{CalendarYear, Clock, ManualClock, ScopePolicy, SystemClock};

use std::sync::Arc;

use backon::BackoffBuilder;
use tracing::{debug, error, info, warn};

use crate::config::{AllocationConfig, Config, ConfigError, NumberingConfig};
use crate::interfaces::NumberingStore;
use crate::model::{Allocation, DisplayNumber, Document, DocumentId};
use crate::utils::retry::{allocation_backoff, is_retryable};

/// Issues numbers to documents as they are finalized.
pub struct Allocator {
    store: Arc<dyn NumberingStore>,
    clock: Arc<dyn Clock>,
    scope_policy: Arc<dyn ScopePolicy>,
    retry: AllocationConfig,
    pad_width: usize,
}

impl Allocator {
    /// Allocator over `store` with the wall clock and a calendar-year scope.
    pub fn new(
        store: Arc<dyn NumberingStore>,
        retry: AllocationConfig,
        numbering: &NumberingConfig,
    ) -> Result<Self, ConfigError> {
        retry.validate()?;
        let scope_policy = CalendarYear::new(numbering.utc_offset()?);

        Ok(Self {
            store,
            clock: Arc::new(SystemClock),
            scope_policy: Arc::new(scope_policy),
            retry,
            pad_width: numbering.pad_width,
        })
    }

    pub fn from_config(store: Arc<dyn NumberingStore>, config: &Config) -> Result<Self, ConfigError> {
        Self::new(store, config.allocation.clone(), &config.numbering)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_scope_policy(mut self, scope_policy: Arc<dyn ScopePolicy>) -> Self {
        self.scope_policy = scope_policy;
        self
    }

    pub fn store(&self) -> &Arc<dyn NumberingStore> {
        &self.store
    }

    /// Create and store a new draft.
    pub async fn create_draft(&self, subject: impl Into<String>) -> Result<Document, AllocationError> {
        let document = Document::draft(subject, self.clock.now());
        self.store.insert(&document).await?;
        debug!(document_id = %document.id, "Draft created");
        Ok(document)
    }

    /// Resolve a display number to the document that holds it.
    pub async fn lookup(&self, number: &DisplayNumber) -> Result<Option<Document>, AllocationError> {
        Ok(self
            .store
            .find_by_number(number.scope_key(), number.sequence_number())
            .await?)
    }

    /// Finalize a draft, assigning it the next number in its scope.
    ///
    /// Not idempotent: finalizing an already finalized document returns
    /// `InvalidState` rather than its existing number. A caller that gave up
    /// waiting should load the document before calling again, since the
    /// earlier call may have committed.
    #[tracing::instrument(name = "allocator.finalize", skip_all, fields(document_id = %id))]
    pub async fn finalize(&self, id: DocumentId) -> Result<Allocation, AllocationError> {
        let mut delays = allocation_backoff(&self.retry).build();
        let mut attempt = 1u32;

        loop {
            match self.attempt(id).await {
                Ok(allocation) => {
                    info!(
                        number = %allocation.display_number,
                        attempt,
                        "Document finalized"
                    );
                    return Ok(allocation);
                }
                Err(e) if is_retryable(&e) => match delays.next() {
                    Some(delay) => {
                        warn!(
                            attempt,
                            error = %e,
                            retry_in = ?delay,
                            "Numbering conflict, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => {
                        error!(attempts = attempt, error = %e, "Numbering retries exhausted");
                        return Err(AllocationError::AllocationExhausted {
                            id,
                            attempts: attempt,
                        });
                    }
                },
                Err(e) => {
                    if let AllocationError::StoreUnavailable(ref source) = e {
                        error!(error = %source, "Numbering store failed");
                    } else {
                        debug!(error = %e, "Document cannot be finalized");
                    }
                    return Err(e);
                }
            }
        }
    }

    /// One load → check → commit pass.
    async fn attempt(&self, id: DocumentId) -> Result<Allocation, AllocationError> {
        let document = self
            .store
            .load(id)
            .await?
            .ok_or(AllocationError::NotFound { id })?;

        if !document.is_draft() {
            return Err(AllocationError::InvalidState {
                id,
                status: document.status(),
            });
        }

        let now = self.clock.now();
        let scope = self.scope_policy.scope_for(now);
        debug!(%scope, "Committing finalization");

        let numbering = self.store.commit_finalization(id, &scope, now).await?;

        Ok(Allocation {
            document_id: id,
            sequence_number: numbering.sequence_number,
            display_number: numbering.display_number(self.pad_width),
            scope_key: numbering.scope_key,
            finalized_at: numbering.finalized_at,
        })
    }
}
