// Property-based tests for filtered reads and counts
//
// get_many returns exactly the rows equal on every filtered column, and
// count_many agrees with it.

use std::sync::Arc;

use proptest::prelude::*;
use record_store::{Filters, MemoryDriver, Record, RecordStore, StoreConfig};
use serde_json::json;

fn status() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("active"), Just("retired"), Just("draft")]
}

fn widget() -> impl Strategy<Value = (&'static str, u8)> {
    (status(), 0u8..3)
}

fn store() -> RecordStore {
    let driver = MemoryDriver::new();
    driver.create_table("widgets", "id", &["id", "status", "qty"]);
    RecordStore::new(Arc::new(driver), StoreConfig::new("widgets")).unwrap()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn test_get_many_is_exact_match(
        rows in prop::collection::vec(widget(), 0..20),
        wanted_status in prop::option::of(status()),
        wanted_qty in prop::option::of(0u8..3),
    ) {
        let rt = runtime();
        let store = store();

        let records: Vec<Record> = rows
            .iter()
            .map(|(s, q)| {
                let mut r = Record::new();
                r.insert("status".to_string(), json!(s));
                r.insert("qty".to_string(), json!(q));
                r
            })
            .collect();
        rt.block_on(store.create_many(records)).unwrap();

        let mut filters = Filters::new();
        if let Some(s) = wanted_status {
            filters = filters.eq("status", s);
        }
        if let Some(q) = wanted_qty {
            filters = filters.eq("qty", q);
        }

        let found = rt.block_on(store.get_many(&filters, None, None)).unwrap();
        let expected: Vec<u64> = rows
            .iter()
            .enumerate()
            .filter(|(_, (s, q))| {
                wanted_status.map_or(true, |w| w == *s) && wanted_qty.map_or(true, |w| w == *q)
            })
            .map(|(i, _)| i as u64 + 1)
            .collect();
        let ids: Vec<u64> = found.iter().map(|r| r["id"].as_u64().unwrap()).collect();
        prop_assert_eq!(&ids, &expected);

        let counted = rt.block_on(store.count_many(&filters)).unwrap();
        prop_assert_eq!(counted, found.len() as u64);
    }

    #[test]
    fn test_paging_partitions_results(
        total in 0usize..25,
        page_size in 1u64..6,
    ) {
        let rt = runtime();
        let store = store();
        let records: Vec<Record> = (0..total)
            .map(|_| {
                let mut r = Record::new();
                r.insert("status".to_string(), json!("active"));
                r
            })
            .collect();
        rt.block_on(store.create_many(records)).unwrap();

        let all = Filters::new();
        let mut seen = Vec::new();
        let mut offset = 0;
        loop {
            let page = rt
                .block_on(store.get_many(&all, Some(page_size), Some(offset)))
                .unwrap();
            prop_assert!(page.len() as u64 <= page_size);
            if page.is_empty() {
                break;
            }
            seen.extend(page.iter().map(|r| r["id"].as_u64().unwrap()));
            offset += page_size;
        }

        let expected: Vec<u64> = (1..=total as u64).collect();
        prop_assert_eq!(seen, expected);
        prop_assert_eq!(rt.block_on(store.count()).unwrap(), total as u64);
    }
}
