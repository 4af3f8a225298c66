// Test helpers for record store tests
//
// Stores are backed by the in-process driver and a manual clock so that
// timestamps are deterministic.
//
// Usage:
//   #[path = "../helpers/mod.rs"]
//   mod helpers;
//
//   let (store, clock) = helpers::widget_store(StoreConfig::new("widgets").timestamps(true));

#![allow(dead_code)]


pub use test_clock::*;
pub use test_store::*;
