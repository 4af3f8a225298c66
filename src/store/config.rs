use serde::Deserialize;

use crate::core::filter::OrderBy;
use crate::core::{Result, StoreError};

pub const DEFAULT_PRIMARY_KEY: &str = "id";
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DEFAULT_CREATED_FIELD: &str = "Created";
pub const DEFAULT_MODIFIED_FIELD: &str = "Modified";
pub const DEFAULT_DELETED_FIELD: &str = "Deleted";

/// Table binding for a [`RecordStore`](crate::store::RecordStore)
///
/// Fixed once the store is built. Can be deserialized from YAML with every
/// field except `table` optional:
///
/// ```yaml
/// - table: widgets
///   timestamps: true
///   soft_delete: true
///   timezone: Asia/Jakarta
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    pub table: String,
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    /// Sort applied to multi-row reads, primary key ascending when unset
    #[serde(default)]
    pub order_by: Option<OrderBy>,
    /// IANA zone used to render timestamps, UTC when unset
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub timestamps: bool,
    /// strftime format for timestamp columns
    #[serde(default = "default_time_format")]
    pub time_format: String,
    /// Default for `delete`/`delete_many` when no mode is passed
    #[serde(default)]
    pub soft_delete: bool,
    #[serde(default = "default_created_field")]
    pub created_field: String,
    #[serde(default = "default_modified_field")]
    pub modified_field: String,
    #[serde(default = "default_deleted_field")]
    pub deleted_field: String,
}

fn default_primary_key() -> String {
    DEFAULT_PRIMARY_KEY.to_string()
}

fn default_time_format() -> String {
    DEFAULT_TIME_FORMAT.to_string()
}

fn default_created_field() -> String {
    DEFAULT_CREATED_FIELD.to_string()
}

fn default_modified_field() -> String {
    DEFAULT_MODIFIED_FIELD.to_string()
}

fn default_deleted_field() -> String {
    DEFAULT_DELETED_FIELD.to_string()
}

impl StoreConfig {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            primary_key: default_primary_key(),
            order_by: None,
            timezone: None,
            timestamps: false,
            time_format: default_time_format(),
            soft_delete: false,
            created_field: default_created_field(),
            modified_field: default_modified_field(),
            deleted_field: default_deleted_field(),
        }
    }

    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = column.into();
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by = Some(order);
        self
    }

    pub fn timezone(mut self, zone: impl Into<String>) -> Self {
        self.timezone = Some(zone.into());
        self
    }

    pub fn timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }

    pub fn time_format(mut self, format: impl Into<String>) -> Self {
        self.time_format = format.into();
        self
    }

    pub fn soft_delete(mut self, enabled: bool) -> Self {
        self.soft_delete = enabled;
        self
    }

    pub fn created_field(mut self, column: impl Into<String>) -> Self {
        self.created_field = column.into();
        self
    }

    pub fn modified_field(mut self, column: impl Into<String>) -> Self {
        self.modified_field = column.into();
        self
    }

    pub fn deleted_field(mut self, column: impl Into<String>) -> Self {
        self.deleted_field = column.into();
        self
    }

    /// Sort actually applied to reads
    pub fn effective_order(&self) -> OrderBy {
        self.order_by
            .clone()
            .unwrap_or_else(|| OrderBy::asc(self.primary_key.clone()))
    }

    /// Parse a YAML list of store bindings
    pub fn list_from_yaml(source: &str) -> Result<Vec<Self>> {
        let configs: Vec<Self> = serde_yaml::from_str(source)
            .map_err(|e| StoreError::Configuration(format!("Invalid store file: {}", e)))?;
        for config in &configs {
            config.validate()?;
        }
        Ok(configs)
    }

    /// Validate configuration
    ///
    /// Timestamp formatting and timezone are checked when the store builds
    /// its [`Timestamper`](crate::core::Timestamper).
    pub fn validate(&self) -> Result<()> {
        if self.table.trim().is_empty() {
            return Err(StoreError::configuration("table name must not be empty"));
        }

        // Soft delete can be requested per call and restore stamps the
        // modified column, so both are always checked.
        let mut columns = vec![
            ("primary_key", &self.primary_key),
            ("modified_field", &self.modified_field),
            ("deleted_field", &self.deleted_field),
        ];
        if self.timestamps {
            columns.push(("created_field", &self.created_field));
        }

        for (name, column) in &columns {
            if column.trim().is_empty() {
                return Err(StoreError::Configuration(format!(
                    "{} must not be empty for table {}",
                    name, self.table
                )));
            }
        }

        for (i, (name, column)) in columns.iter().enumerate() {
            if let Some((other, _)) = columns[i + 1..].iter().find(|(_, c)| c == column) {
                return Err(StoreError::Configuration(format!(
                    "{} and {} both use column `{}` in table {}",
                    name, other, column, self.table
                )));
            }
        }

        if let Some(order) = &self.order_by {
            if order.column.trim().is_empty() {
                return Err(StoreError::configuration("order_by column must not be empty"));
            }
        }

        Ok(())
    }
}
