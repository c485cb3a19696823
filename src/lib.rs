//! Docnum - sequential document numbering
//!
//! Issues gapless, scope-partitioned sequence numbers to documents at the
//! moment they leave draft. A number is drawn and the document stamped in a
//! single atomic commit, so a number is never issued twice and never lost
//! to a failed finalization.

pub mod allocator;
pub mod config;
pub mod interfaces;
pub mod model;
pub mod storage;
pub mod utils;

pub use allocator::{Allocator, AllocationError};
pub use config::Config;
pub use interfaces::{CounterStore, DocumentStore, NumberingStore, StorageError};
pub use model::{
    Allocation, DisplayNumber, Document, DocumentId, DocumentState, DocumentStatus, Numbering,
    ScopeKey,
};
