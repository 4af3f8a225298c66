// Integration tests for create_many
//
// Rows are inserted one at a time and stamped individually; a failure
// partway reports the identifiers that were already committed.

#[path = "../helpers/mod.rs"]
mod helpers;

use helpers::{row, widget_store};
use record_store::{DriverError, StoreConfig, StoreError};
use serde_json::json;

#[tokio::test]
async fn test_ids_follow_input_order() {
    let (store, _) = widget_store(StoreConfig::new("widgets"));
    let ids = store
        .create_many(vec![
            row([("name", json!("a"))]),
            row([("name", json!("b"))]),
            row([("name", json!("c"))]),
        ])
        .await
        .unwrap();

    assert_eq!(ids, vec![1, 2, 3]);
    for (id, name) in ids.iter().zip(["a", "b", "c"]) {
        assert_eq!(store.get(*id).await.unwrap().unwrap()["name"], json!(name));
    }
}

#[tokio::test]
async fn test_every_row_is_stamped() {
    let (store, _) = widget_store(StoreConfig::new("widgets").timestamps(true));
    let ids = store
        .create_many(vec![row([("name", json!("a"))]), row([("name", json!("b"))])])
        .await
        .unwrap();

    for id in ids {
        let record = store.get(id).await.unwrap().unwrap();
        assert_eq!(record["Created"], json!("2025-01-01 00:00:00"));
        assert_eq!(record["Modified"], record["Created"]);
    }
}

#[tokio::test]
async fn test_empty_batch() {
    let (store, _) = widget_store(StoreConfig::new("widgets").timestamps(true));
    assert!(store.create_many(Vec::new()).await.unwrap().is_empty());
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_partial_failure_reports_committed_ids() {
    let (store, _) = widget_store(StoreConfig::new("widgets"));
    let err = store
        .create_many(vec![
            row([("name", json!("a"))]),
            row([("name", json!("b"))]),
            row([("id", json!(1)), ("name", json!("duplicate"))]),
            row([("name", json!("never"))]),
        ])
        .await
        .unwrap_err();

    match &err {
        StoreError::PartialBatch {
            table,
            inserted,
            source,
        } => {
            assert_eq!(table, "widgets");
            assert_eq!(inserted, &vec![1, 2]);
            assert!(matches!(source, DriverError::Constraint(_)));
        }
        other => panic!("expected PartialBatch, got {:?}", other),
    }
    assert_eq!(err.inserted_ids(), &[1, 2]);

    // Earlier rows stay committed, later rows never ran
    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_first_row_failure_is_plain_insert_error() {
    let (store, _) = widget_store(StoreConfig::new("widgets"));
    let err = store
        .create_many(vec![row([("colour", json!("red"))]), row([("name", json!("b"))])])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StoreError::Insert {
            source: DriverError::UnknownColumn(_),
            ..
        }
    ));
    assert_eq!(store.count().await.unwrap(), 0);
}
