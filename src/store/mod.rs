pub mod config;
pub mod record_store;

pub use config::StoreConfig;
pub use record_store::RecordStore;
