// Integration tests for soft delete and restore
//
// Soft-deleted rows stay visible to reads and counts; callers filter on the
// deleted column themselves.

#[path = "../helpers/mod.rs"]
mod helpers;

use helpers::{row, widget_store};
use record_store::{Filters, StoreConfig};
use serde_json::{json, Value};

#[tokio::test]
async fn test_soft_delete_then_restore_only_touches_bookkeeping() {
    let (store, clock) = widget_store(StoreConfig::new("widgets").timestamps(true));
    let id = store
        .create(row([("name", json!("a")), ("qty", json!(4))]))
        .await
        .unwrap();
    let before = store.get(id).await.unwrap().unwrap();

    clock.tick();
    assert!(store.delete(id, Some(true)).await.unwrap());
    let deleted = store.get(id).await.unwrap().unwrap();
    assert_eq!(deleted["Deleted"], json!("2025-01-01 00:00:01"));
    assert_eq!(deleted["Modified"], deleted["Deleted"]);

    clock.tick();
    assert!(store.restore(id).await.unwrap());
    let after = store.get(id).await.unwrap().unwrap();

    assert_eq!(after["Deleted"], Value::Null);
    assert_eq!(after["Modified"], json!("2025-01-01 00:00:02"));
    for column in ["id", "name", "qty", "Created"] {
        assert_eq!(after[column], before[column], "column {}", column);
    }
}

#[tokio::test]
async fn test_configured_default_mode() {
    let (soft, _) = widget_store(StoreConfig::new("widgets").soft_delete(true));
    let id = soft.create(row([("name", json!("a"))])).await.unwrap();
    assert!(soft.delete(id, None).await.unwrap());
    assert_eq!(soft.count().await.unwrap(), 1);

    // An explicit flag overrides the default
    assert!(soft.delete(id, Some(false)).await.unwrap());
    assert_eq!(soft.count().await.unwrap(), 0);

    let (hard, _) = widget_store(StoreConfig::new("widgets"));
    let id = hard.create(row([("name", json!("a"))])).await.unwrap();
    assert!(hard.delete(id, None).await.unwrap());
    assert_eq!(hard.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_soft_delete_without_timestamps_leaves_modified_alone() {
    let (store, _) = widget_store(StoreConfig::new("widgets").soft_delete(true));
    let id = store.create(row([("name", json!("a"))])).await.unwrap();

    store.delete(id, None).await.unwrap();
    let record = store.get(id).await.unwrap().unwrap();
    assert_eq!(record["Deleted"], json!("2025-01-01 00:00:00"));
    assert_eq!(record["Modified"], Value::Null);
}

#[tokio::test]
async fn test_restore_without_timestamps_still_stamps_modified() {
    let (store, clock) = widget_store(StoreConfig::new("widgets").soft_delete(true));
    let id = store.create(row([("name", json!("a"))])).await.unwrap();
    store.delete(id, None).await.unwrap();

    clock.tick();
    assert!(store.restore(id).await.unwrap());
    let record = store.get(id).await.unwrap().unwrap();
    assert_eq!(record["Deleted"], Value::Null);
    assert_eq!(record["Modified"], json!("2025-01-01 00:00:01"));
    assert_eq!(record["Created"], Value::Null);

    store.delete(id, None).await.unwrap();
    clock.tick();
    assert!(store.restore_many(&Filters::new().eq("name", "a")).await.unwrap());
    let record = store.get(id).await.unwrap().unwrap();
    assert_eq!(record["Modified"], json!("2025-01-01 00:00:02"));
}

#[tokio::test]
async fn test_soft_deleted_rows_remain_visible() {
    let (store, _) = widget_store(StoreConfig::new("widgets").soft_delete(true));
    for name in ["a", "b", "c"] {
        store.create(row([("name", json!(name))])).await.unwrap();
    }
    store.delete(2, None).await.unwrap();

    assert_eq!(store.count().await.unwrap(), 3);
    assert_eq!(store.get_all().await.unwrap().len(), 3);
    assert!(store.get(2).await.unwrap().is_some());

    let live = Filters::new().is_null("Deleted");
    assert_eq!(store.count_many(&live).await.unwrap(), 2);
    let names: Vec<_> = store
        .get_many(&live, None, None)
        .await
        .unwrap()
        .iter()
        .map(|r| r["name"].clone())
        .collect();
    assert_eq!(names, vec![json!("a"), json!("c")]);
}

#[tokio::test]
async fn test_restore_requires_a_deleted_row() {
    let (store, _) = widget_store(StoreConfig::new("widgets").timestamps(true));
    let id = store.create(row([("name", json!("a"))])).await.unwrap();

    assert!(!store.restore(id).await.unwrap());
    assert!(!store.restore(99).await.unwrap());
}

#[tokio::test]
async fn test_delete_many_and_restore_many() {
    let (store, clock) = widget_store(StoreConfig::new("widgets").timestamps(true));
    for (name, status) in [("a", "old"), ("b", "old"), ("c", "new")] {
        store
            .create(row([("name", json!(name)), ("status", json!(status))]))
            .await
            .unwrap();
    }
    let old = Filters::new().eq("status", "old");

    clock.tick();
    assert!(store.delete_many(&old, Some(true)).await.unwrap());
    let deleted = Filters::new().not_null("Deleted");
    assert_eq!(store.count_many(&deleted).await.unwrap(), 2);

    clock.tick();
    assert!(store.restore_many(&old).await.unwrap());
    assert_eq!(store.count_many(&deleted).await.unwrap(), 0);

    let restored = store.get(1).await.unwrap().unwrap();
    assert_eq!(restored["Modified"], json!("2025-01-01 00:00:02"));

    // Rows that were never deleted are not touched by restore
    let untouched = store.get(3).await.unwrap().unwrap();
    assert_eq!(untouched["Modified"], json!("2025-01-01 00:00:00"));

    // Nothing left to restore
    assert!(!store.restore_many(&old).await.unwrap());

    assert!(store.delete_many(&old, Some(false)).await.unwrap());
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_custom_field_names() {
    let config = StoreConfig::new("gadgets")
        .primary_key("gadget_id")
        .timestamps(true)
        .created_field("born")
        .modified_field("touched")
        .deleted_field("gone");

    let driver = record_store::MemoryDriver::new();
    driver.create_table("gadgets", "gadget_id", &["gadget_id", "label", "born", "touched", "gone"]);
    let clock = std::sync::Arc::new(helpers::ManualClock::new());
    let store = record_store::RecordStore::new(std::sync::Arc::new(driver), config)
        .unwrap()
        .with_clock(clock.clone());

    let id = store.create(row([("label", json!("x"))])).await.unwrap();
    clock.tick();
    store.delete(id, Some(true)).await.unwrap();

    let record = store.get(id).await.unwrap().unwrap();
    assert_eq!(record["born"], json!("2025-01-01 00:00:00"));
    assert_eq!(record["touched"], json!("2025-01-01 00:00:01"));
    assert_eq!(record["gone"], json!("2025-01-01 00:00:01"));
}
