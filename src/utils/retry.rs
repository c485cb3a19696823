//! Retry utilities: backoff builders and retryable error classification.
//!
//! Uses `backon` for exponential backoff with jitter. The allocator retries
//! a whole finalize attempt when the numbering store reports a conflict.

use backon::ExponentialBuilder;

use crate::allocator::AllocationError;
use crate::config::AllocationConfig;

/// Backoff between finalize attempts.
///
/// Yields `max_attempts - 1` delays, so the initial attempt plus the retries
/// never exceed `max_attempts`.
pub fn allocation_backoff(config: &AllocationConfig) -> ExponentialBuilder {
    let builder = ExponentialBuilder::default()
        .with_min_delay(config.min_delay())
        .with_max_delay(config.max_delay())
        .with_max_times(config.max_attempts.saturating_sub(1) as usize);

    if config.jitter {
        builder.with_jitter()
    } else {
        builder
    }
}

/// Determines if a finalize failure is worth another attempt (conflict only).
///
/// Non-retryable:
/// - `NotFound` / `InvalidState`: the document will not become finalizable.
/// - `StoreUnavailable`: retrying would hammer a dependency that is down.
/// - `AllocationExhausted`: already the outcome of retrying.
pub fn is_retryable(error: &AllocationError) -> bool {
    matches!(error, AllocationError::Conflict { .. })
}
