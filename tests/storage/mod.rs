//! Shared storage integration tests.
//!
//! Tests the NumberingStore interface against all implementations.
//! Each implementation module imports these test functions and runs them.

pub mod numbering_store_tests;
