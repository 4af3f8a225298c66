//! Active-record style table access
//!
//! A [`RecordStore`] wraps one table and offers CRUD, soft delete,
//! timestamping, counting and schema introspection on top of any
//! [`DatabaseDriver`]. [`MySqlDriver`] talks to MySQL through sqlx;
//! [`MemoryDriver`] keeps tables in process.

pub mod config;
pub mod core;
pub mod drivers;
pub mod store;

// Re-export commonly used types
pub use crate::core::{
    Clock, DatabaseDriver, DriverError, Filters, OrderBy, Record, RecordId, Result, StoreError,
};
pub use drivers::{MemoryDriver, MySqlDriver};
pub use store::{RecordStore, StoreConfig};
