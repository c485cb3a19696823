//! NumberingStore interface tests.
//!
//! These tests verify the contract of the CounterStore, DocumentStore and
//! NumberingStore traits. Each storage implementation should run these tests.
//! Every test works in its own scope so they can share one store.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use docnum::interfaces::{NumberingStore, StorageError};
use docnum::model::{Document, DocumentId, DocumentState, Numbering, ScopeKey};

fn scope(name: &str) -> ScopeKey {
    ScopeKey::new(format!("{}-{}", name, uuid::Uuid::new_v4().simple())).unwrap()
}

fn instant() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap()
}

async fn insert_draft<S: NumberingStore>(store: &S, subject: &str) -> Document {
    let doc = Document::draft(subject, instant());
    store.insert(&doc).await.expect("insert should succeed");
    doc
}

// =============================================================================
// CounterStore tests
// =============================================================================

pub async fn test_last_issued_unknown_scope<S: NumberingStore>(store: &S) {
    let scope = scope("test_unknown");
    let last = store
        .last_issued(&scope)
        .await
        .expect("last_issued should succeed");
    assert_eq!(last, 0, "unknown scope should report 0");
}

pub async fn test_increment_sequence<S: NumberingStore>(store: &S) {
    let scope = scope("test_increment");

    for expected in 1..=3 {
        let next = store
            .increment(&scope)
            .await
            .expect("increment should succeed");
        assert_eq!(next, expected, "increment should count up from 1");
    }

    assert_eq!(store.last_issued(&scope).await.unwrap(), 3);
}

pub async fn test_scope_isolation<S: NumberingStore>(store: &S) {
    let a = scope("test_iso_a");
    let b = scope("test_iso_b");

    store.increment(&a).await.unwrap();
    store.increment(&a).await.unwrap();
    let first_b = store.increment(&b).await.unwrap();

    assert_eq!(first_b, 1, "scope b should start from its own counter");
    assert_eq!(store.last_issued(&a).await.unwrap(), 2);
    assert_eq!(store.last_issued(&b).await.unwrap(), 1);
}

// =============================================================================
// DocumentStore tests
// =============================================================================

pub async fn test_insert_and_load<S: NumberingStore>(store: &S) {
    let doc = insert_draft(store, "Procurement notice").await;

    let loaded = store
        .load(doc.id)
        .await
        .expect("load should succeed")
        .expect("document should exist");

    assert_eq!(loaded, doc);
    assert!(loaded.is_draft());
}

pub async fn test_load_missing<S: NumberingStore>(store: &S) {
    let loaded = store.load(DocumentId::new()).await.unwrap();
    assert!(loaded.is_none(), "missing document should be None");
}

pub async fn test_insert_duplicate<S: NumberingStore>(store: &S) {
    let doc = insert_draft(store, "Original").await;

    let result = store.insert(&doc).await;
    assert!(
        matches!(result, Err(StorageError::Duplicate(id)) if id == doc.id),
        "second insert should be rejected"
    );
}

pub async fn test_insert_finalized_document<S: NumberingStore>(store: &S) {
    let scope = scope("test_import");
    let doc = Document {
        id: DocumentId::new(),
        subject: "Imported".to_string(),
        created_at: instant(),
        state: DocumentState::Finalized(Numbering {
            scope_key: scope.clone(),
            sequence_number: 41,
            finalized_at: instant(),
        }),
    };
    store.insert(&doc).await.unwrap();

    let found = store.find_by_number(&scope, 41).await.unwrap();
    assert_eq!(found, Some(doc));
}

pub async fn test_delete<S: NumberingStore>(store: &S) {
    let scope = scope("test_delete");
    let doc = insert_draft(store, "Short lived").await;
    store
        .commit_finalization(doc.id, &scope, instant())
        .await
        .unwrap();

    assert!(store.delete(doc.id).await.unwrap(), "first delete removes");
    assert!(!store.delete(doc.id).await.unwrap(), "second delete is a no-op");
    assert!(store.load(doc.id).await.unwrap().is_none());

    assert_eq!(
        store.last_issued(&scope).await.unwrap(),
        1,
        "deleting a document must not give its number back"
    );
}

// =============================================================================
// NumberingStore::commit_finalization tests
// =============================================================================

pub async fn test_commit_stamps_document<S: NumberingStore>(store: &S) {
    let scope = scope("test_commit");
    let doc = insert_draft(store, "Tender").await;

    let numbering = store
        .commit_finalization(doc.id, &scope, instant())
        .await
        .expect("commit should succeed");

    assert_eq!(numbering.sequence_number, 1);
    assert_eq!(numbering.scope_key, scope);
    assert_eq!(numbering.finalized_at, instant());

    let loaded = store.load(doc.id).await.unwrap().unwrap();
    assert_eq!(loaded.numbering(), Some(&numbering));
    assert_eq!(loaded.subject, "Tender");
    assert_eq!(store.last_issued(&scope).await.unwrap(), 1);

    let found = store.find_by_number(&scope, 1).await.unwrap();
    assert_eq!(found.map(|d| d.id), Some(doc.id));
    assert!(store.find_by_number(&scope, 2).await.unwrap().is_none());
}

pub async fn test_commit_continues_counter<S: NumberingStore>(store: &S) {
    let scope = scope("test_continue");
    for _ in 0..7 {
        store.increment(&scope).await.unwrap();
    }
    let doc = insert_draft(store, "Eighth").await;

    let numbering = store
        .commit_finalization(doc.id, &scope, instant())
        .await
        .unwrap();

    assert_eq!(numbering.sequence_number, 8);
    assert_eq!(numbering.display_number(3).to_string(), format!("008/{}", scope));
}

pub async fn test_commit_rejects_finalized<S: NumberingStore>(store: &S) {
    let scope = scope("test_refinalize");
    let doc = insert_draft(store, "Once only").await;
    store
        .commit_finalization(doc.id, &scope, instant())
        .await
        .unwrap();

    let result = store.commit_finalization(doc.id, &scope, instant()).await;

    assert!(
        matches!(result, Err(StorageError::Conflict(_))),
        "finalized document cannot be stamped again"
    );
    assert_eq!(
        store.last_issued(&scope).await.unwrap(),
        1,
        "rejected commit must not consume a number"
    );
    let loaded = store.load(doc.id).await.unwrap().unwrap();
    assert_eq!(loaded.numbering().unwrap().sequence_number, 1);
}

pub async fn test_commit_missing_document<S: NumberingStore>(store: &S) {
    let scope = scope("test_missing");

    let result = store
        .commit_finalization(DocumentId::new(), &scope, instant())
        .await;

    assert!(matches!(result, Err(StorageError::Conflict(_))));
    assert_eq!(
        store.last_issued(&scope).await.unwrap(),
        0,
        "counter bump must roll back with the failed stamp"
    );
}

pub async fn test_concurrent_commits_are_gapless<S: NumberingStore>(store: &S) {
    const DOCUMENTS: u64 = 12;
    let scope = scope("test_concurrent");

    let mut ids = Vec::new();
    for i in 0..DOCUMENTS {
        ids.push(insert_draft(store, &format!("Concurrent {}", i)).await.id);
    }

    let commits = ids.iter().map(|&id| {
        let scope = scope.clone();
        async move {
            loop {
                match store.commit_finalization(id, &scope, instant()).await {
                    Ok(numbering) => return numbering.sequence_number,
                    Err(e) if e.is_conflict() => {
                        tokio::time::sleep(Duration::from_millis(2)).await;
                    }
                    Err(e) => panic!("commit failed: {}", e),
                }
            }
        }
    });
    let numbers = futures::future::join_all(commits).await;

    let issued: HashSet<u64> = numbers.iter().copied().collect();
    let expected: HashSet<u64> = (1..=DOCUMENTS).collect();
    assert_eq!(issued.len(), numbers.len(), "no number issued twice");
    assert_eq!(issued, expected, "numbers are gapless");
    assert_eq!(store.last_issued(&scope).await.unwrap(), DOCUMENTS);

    for (id, number) in ids.iter().zip(&numbers) {
        let doc = store.load(*id).await.unwrap().unwrap();
        assert_eq!(doc.numbering().unwrap().sequence_number, *number);
    }
}

/// Run every NumberingStore contract test against a store.
#[macro_export]
macro_rules! run_numbering_store_tests {
    ($store:expr) => {
        use $crate::storage::numbering_store_tests::*;

        // counter tests
        test_last_issued_unknown_scope($store).await;
        println!("  test_last_issued_unknown_scope: PASSED");

        test_increment_sequence($store).await;
        println!("  test_increment_sequence: PASSED");

        test_scope_isolation($store).await;
        println!("  test_scope_isolation: PASSED");

        // document tests
        test_insert_and_load($store).await;
        println!("  test_insert_and_load: PASSED");

        test_load_missing($store).await;
        println!("  test_load_missing: PASSED");

        test_insert_duplicate($store).await;
        println!("  test_insert_duplicate: PASSED");

        test_insert_finalized_document($store).await;
        println!("  test_insert_finalized_document: PASSED");

        test_delete($store).await;
        println!("  test_delete: PASSED");

        // finalization tests
        test_commit_stamps_document($store).await;
        println!("  test_commit_stamps_document: PASSED");

        test_commit_continues_counter($store).await;
        println!("  test_commit_continues_counter: PASSED");

        test_commit_rejects_finalized($store).await;
        println!("  test_commit_rejects_finalized: PASSED");

        test_commit_missing_document($store).await;
        println!("  test_commit_missing_document: PASSED");

        test_concurrent_commits_are_gapless($store).await;
        println!("  test_concurrent_commits_are_gapless: PASSED");
    };
}
