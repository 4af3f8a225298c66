use async_trait::async_trait;

use crate::core::error::DriverError;
use crate::core::filter::{Filters, Select};
use crate::core::record::{Record, RecordId};

pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// Storage capability a record store is built on
///
/// Implementations own connections, transactions and SQL dialect. Every
/// method is scoped to one table and must be safe to call concurrently.
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Rows matching `select`, sorted and sliced as requested
    async fn query(&self, table: &str, select: &Select) -> DriverResult<Vec<Record>>;

    /// First row matching `filters`
    async fn query_one(&self, table: &str, filters: &Filters) -> DriverResult<Option<Record>>;

    /// Insert one row and return its generated identifier
    async fn insert(&self, table: &str, record: Record) -> DriverResult<RecordId>;

    /// Apply `patch` to at most `limit` matching rows; returns rows affected
    async fn update(
        &self,
        table: &str,
        filters: &Filters,
        limit: Option<u64>,
        patch: Record,
    ) -> DriverResult<u64>;

    /// Remove at most `limit` matching rows; returns rows affected
    async fn delete(&self, table: &str, filters: &Filters, limit: Option<u64>)
        -> DriverResult<u64>;

    /// Remove every row, keeping identifier sequences
    async fn empty_table(&self, table: &str) -> DriverResult<bool>;

    /// Remove every row and reset identifier sequences
    async fn truncate(&self, table: &str) -> DriverResult<bool>;

    async fn count_all(&self, table: &str) -> DriverResult<u64>;

    async fn count_where(&self, table: &str, filters: &Filters) -> DriverResult<u64>;

    /// Column names in schema order
    async fn list_fields(&self, table: &str) -> DriverResult<Vec<String>>;
}
