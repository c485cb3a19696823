//! Abstract interfaces for numbering storage.
//!
//! These traits define the contracts for:
//! - Scoped counters (atomic next-number issuance)
//! - Document records (load, insert, lookup by number)
//! - The finalization unit spanning both

pub mod counter_store;
pub mod document_store;
pub mod numbering_store;

pub use counter_store::{CounterStore, Result, StorageError};
pub use document_store::DocumentStore;
pub use numbering_store::NumberingStore;
