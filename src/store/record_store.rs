use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::core::filter::{Filters, Select};
use crate::core::record::{self, Record, RecordId};
use crate::core::timestamp::{Clock, SystemClock, Timestamper};
use crate::core::traits::{DatabaseDriver, DriverResult};
use crate::core::{DriverError, Result, StoreError};
use crate::store::config::StoreConfig;

/// CRUD access to one table through a [`DatabaseDriver`]
///
/// A store holds only its fixed configuration and shared handles, so one
/// instance can be cloned or shared across tasks freely. Whether concurrent
/// writes to the same rows are safe is up to the driver.
///
/// Reads and counts never hide soft-deleted rows. Add
/// `Filters::is_null(deleted_field)` to exclude them.
#[derive(Clone)]
pub struct RecordStore {
    driver: Arc<dyn DatabaseDriver>,
    config: StoreConfig,
    stamper: Timestamper,
    clock: Arc<dyn Clock>,
}

impl RecordStore {
    /// Bind a store to `config.table`, validating the configuration
    pub fn new(driver: Arc<dyn DatabaseDriver>, config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let stamper = Timestamper::new(&config.time_format, config.timezone.as_deref())?;

        debug!(
            table = %config.table,
            primary_key = %config.primary_key,
            timestamps = config.timestamps,
            soft_delete = config.soft_delete,
            "Record store bound"
        );

        Ok(Self {
            driver,
            config,
            stamper,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the clock used for timestamp columns
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Name of the backing table
    pub fn table(&self) -> &str {
        &self.config.table
    }

    /// Column names as reported by the driver
    pub async fn fields(&self) -> Result<Vec<String>> {
        self.driver
            .list_fields(self.table())
            .await
            .map_err(|source| StoreError::Schema {
                table: self.table().to_string(),
                source,
            })
    }

    /// Retrieve a single record by primary key
    pub async fn get(&self, key: impl Into<Value>) -> Result<Option<Record>> {
        let key = key.into();
        debug!(table = %self.table(), key = %key, "Fetching record");

        self.driver
            .query_one(self.table(), &self.key_filter(key))
            .await
            .map_err(|source| self.query_error(source))
    }

    /// Retrieve a single record as `T`
    pub async fn get_as<T: DeserializeOwned>(&self, key: impl Into<Value>) -> Result<Option<T>> {
        self.get(key).await?.map(record::decode).transpose()
    }

    /// Retrieve records matching `filters`
    ///
    /// `limit: None` is unlimited and `Some(0)` yields nothing. `offset`
    /// applies with or without a limit.
    pub async fn get_many(
        &self,
        filters: &Filters,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<Vec<Record>> {
        let select = Select {
            filters: filters.clone(),
            order_by: Some(self.config.effective_order()),
            limit,
            offset: offset.unwrap_or(0),
        };
        debug!(
            table = %self.table(),
            conditions = filters.len(),
            ?limit,
            offset = select.offset,
            "Fetching records"
        );

        self.driver
            .query(self.table(), &select)
            .await
            .map_err(|source| self.query_error(source))
    }

    pub async fn get_many_as<T: DeserializeOwned>(
        &self,
        filters: &Filters,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<Vec<T>> {
        record::decode_all(self.get_many(filters, limit, offset).await?)
    }

    /// Retrieve every record in the table
    pub async fn get_all(&self) -> Result<Vec<Record>> {
        self.get_many(&Filters::new(), None, None).await
    }

    pub async fn get_all_as<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        record::decode_all(self.get_all().await?)
    }

    /// Insert one record and return its generated identifier
    pub async fn create(&self, data: Record) -> Result<RecordId> {
        let now = self.now();
        let id = self.insert_stamped(data, &now).await.map_err(|source| {
            StoreError::Insert {
                table: self.table().to_string(),
                source,
            }
        })?;

        info!(table = %self.table(), id, "Record created");
        Ok(id)
    }

    /// Insert rows one at a time, returning identifiers in input order
    ///
    /// Every row is stamped with the same "now". Inserts are not atomic: if
    /// a row fails after earlier rows went in, the error is
    /// [`StoreError::PartialBatch`] carrying the identifiers already
    /// committed. A failure on the first row is a plain
    /// [`StoreError::Insert`].
    pub async fn create_many(&self, rows: Vec<Record>) -> Result<Vec<RecordId>> {
        let now = self.now();
        let total = rows.len();
        let mut ids = Vec::with_capacity(total);

        for row in rows {
            match self.insert_stamped(row, &now).await {
                Ok(id) => ids.push(id),
                Err(source) if ids.is_empty() => {
                    return Err(StoreError::Insert {
                        table: self.table().to_string(),
                        source,
                    });
                }
                Err(source) => {
                    warn!(
                        table = %self.table(),
                        inserted = ids.len(),
                        total,
                        error = %source,
                        "Batch insert stopped partway"
                    );
                    return Err(StoreError::PartialBatch {
                        table: self.table().to_string(),
                        inserted: ids,
                        source,
                    });
                }
            }
        }

        info!(table = %self.table(), count = ids.len(), "Records created");
        Ok(ids)
    }

    /// Update the record with primary key `key`
    ///
    /// Returns `false` when no row matched.
    pub async fn update(&self, key: impl Into<Value>, data: Record) -> Result<bool> {
        let filters = self.key_filter(key.into());
        let now = self.now();
        self.apply_update(&filters, Some(1), data, &now).await
    }

    /// Update every record matching `filters`
    ///
    /// Returns whether any row was affected.
    pub async fn update_many(&self, filters: &Filters, data: Record) -> Result<bool> {
        let now = self.now();
        self.apply_update(filters, None, data, &now).await
    }

    /// Delete the record with primary key `key`
    ///
    /// `soft: None` falls back to the configured default. A soft delete
    /// stamps the deleted column (and modified column when timestamps are
    /// on) instead of removing the row.
    pub async fn delete(&self, key: impl Into<Value>, soft: Option<bool>) -> Result<bool> {
        let filters = self.key_filter(key.into());
        self.delete_where(&filters, Some(1), soft).await
    }

    /// Delete every record matching `filters`, soft or hard as in [`delete`](Self::delete)
    pub async fn delete_many(&self, filters: &Filters, soft: Option<bool>) -> Result<bool> {
        self.delete_where(filters, None, soft).await
    }

    /// Remove every row, leaving identifier sequences untouched
    pub async fn delete_all(&self) -> Result<bool> {
        let done = self
            .driver
            .empty_table(self.table())
            .await
            .map_err(|source| self.delete_error(source))?;

        info!(table = %self.table(), "Table emptied");
        Ok(done)
    }

    /// Remove every row and reset identifier sequences
    pub async fn truncate(&self) -> Result<bool> {
        let done = self
            .driver
            .truncate(self.table())
            .await
            .map_err(|source| self.delete_error(source))?;

        info!(table = %self.table(), "Table truncated");
        Ok(done)
    }

    /// Undo a soft delete of the record with primary key `key`
    ///
    /// Clears the deleted column and stamps the modified column.
    /// Returns `false` when the record is missing or not soft-deleted.
    pub async fn restore(&self, key: impl Into<Value>) -> Result<bool> {
        let filters = self
            .key_filter(key.into())
            .not_null(self.config.deleted_field.clone());
        self.restore_where(&filters, Some(1)).await
    }

    /// Undo soft deletes on every deleted record matching `filters`
    pub async fn restore_many(&self, filters: &Filters) -> Result<bool> {
        let filters = filters.clone().not_null(self.config.deleted_field.clone());
        self.restore_where(&filters, None).await
    }

    /// Number of rows in the table, soft-deleted rows included
    pub async fn count(&self) -> Result<u64> {
        self.driver
            .count_all(self.table())
            .await
            .map_err(|source| self.count_error(source))
    }

    /// Number of rows matching `filters`
    pub async fn count_many(&self, filters: &Filters) -> Result<u64> {
        self.driver
            .count_where(self.table(), filters)
            .await
            .map_err(|source| self.count_error(source))
    }

    fn now(&self) -> Value {
        Value::String(self.stamper.render(self.clock.now()))
    }

    fn key_filter(&self, key: Value) -> Filters {
        Filters::new().eq(self.config.primary_key.clone(), key)
    }

    async fn insert_stamped(
        &self,
        mut data: Record,
        now: &Value,
    ) -> DriverResult<RecordId> {
        if self.config.timestamps {
            data.insert(self.config.created_field.clone(), now.clone());
            data.insert(self.config.modified_field.clone(), now.clone());
        }
        self.driver.insert(self.table(), data).await
    }

    async fn apply_update(
        &self,
        filters: &Filters,
        limit: Option<u64>,
        mut data: Record,
        now: &Value,
    ) -> Result<bool> {
        if self.config.timestamps {
            data.insert(self.config.modified_field.clone(), now.clone());
        }

        let affected = self
            .driver
            .update(self.table(), filters, limit, data)
            .await
            .map_err(|source| StoreError::Update {
                table: self.table().to_string(),
                source,
            })?;

        info!(table = %self.table(), affected, "Records updated");
        Ok(affected > 0)
    }

    async fn delete_where(
        &self,
        filters: &Filters,
        limit: Option<u64>,
        soft: Option<bool>,
    ) -> Result<bool> {
        if soft.unwrap_or(self.config.soft_delete) {
            let now = self.now();
            let mut patch = Record::new();
            patch.insert(self.config.deleted_field.clone(), now.clone());
            return self.apply_update(filters, limit, patch, &now).await;
        }

        let affected = self
            .driver
            .delete(self.table(), filters, limit)
            .await
            .map_err(|source| self.delete_error(source))?;

        info!(table = %self.table(), affected, "Records deleted");
        Ok(affected > 0)
    }

    async fn restore_where(&self, filters: &Filters, limit: Option<u64>) -> Result<bool> {
        // Restore always refreshes the modified column, timestamps or not.
        let now = self.now();
        let mut patch = Record::new();
        patch.insert(self.config.deleted_field.clone(), Value::Null);
        patch.insert(self.config.modified_field.clone(), now.clone());
        self.apply_update(filters, limit, patch, &now).await
    }

    fn query_error(&self, source: DriverError) -> StoreError {
        StoreError::Query {
            table: self.table().to_string(),
            source,
        }
    }

    fn delete_error(&self, source: DriverError) -> StoreError {
        StoreError::Delete {
            table: self.table().to_string(),
            source,
        }
    }

    fn count_error(&self, source: DriverError) -> StoreError {
        StoreError::Count {
            table: self.table().to_string(),
            source,
        }
    }
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
