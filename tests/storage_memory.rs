//! In-memory storage contract tests.
//!
//! Run with: cargo test --test storage_memory

mod storage;

use docnum::storage::MemoryStore;

#[tokio::test]
async fn test_memory_numbering_store() {
    println!("=== Memory NumberingStore Tests ===");

    let store = MemoryStore::new();
    run_numbering_store_tests!(&store);

    println!("=== All Memory NumberingStore tests PASSED ===");
}
