use crate::core::record::RecordId;

/// Result type returned by every record store operation
pub type Result<T> = std::result::Result<T, StoreError>;

/// Failure reported by a database driver
#[derive(thiserror::Error, Debug)]
pub enum DriverError {
    /// Errors raised by the underlying SQL connection
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The table is not known to the driver
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// A column referenced by a filter or a record does not exist
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// Unique key or other integrity constraint violated
    #[error("Constraint violation: {0}")]
    Constraint(String),
}

/// Main record store error type
///
/// Driver failures are wrapped once with the operation and table they came
/// from and are never retried.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Invalid store or process configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Query on `{table}` failed: {source}")]
    Query {
        table: String,
        #[source]
        source: DriverError,
    },

    #[error("Insert into `{table}` failed: {source}")]
    Insert {
        table: String,
        #[source]
        source: DriverError,
    },

    #[error("Update of `{table}` failed: {source}")]
    Update {
        table: String,
        #[source]
        source: DriverError,
    },

    #[error("Delete from `{table}` failed: {source}")]
    Delete {
        table: String,
        #[source]
        source: DriverError,
    },

    #[error("Count on `{table}` failed: {source}")]
    Count {
        table: String,
        #[source]
        source: DriverError,
    },

    #[error("Schema inspection of `{table}` failed: {source}")]
    Schema {
        table: String,
        #[source]
        source: DriverError,
    },

    /// A batch insert stopped partway; `inserted` rows remain committed
    #[error("Batch insert into `{table}` stopped after {} row(s): {source}", .inserted.len())]
    PartialBatch {
        table: String,
        inserted: Vec<RecordId>,
        #[source]
        source: DriverError,
    },

    /// A record could not be converted into the requested type
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

// Helper functions for common error scenarios
impl StoreError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        StoreError::Configuration(msg.into())
    }

    /// Identifiers committed before a batch failure, empty for other errors
    pub fn inserted_ids(&self) -> &[RecordId] {
        match self {
            StoreError::PartialBatch { inserted, .. } => inserted,
            _ => &[],
        }
    }

    /// Underlying driver failure, if this error wraps one
    pub fn driver_error(&self) -> Option<&DriverError> {
        match self {
            StoreError::Query { source, .. }
            | StoreError::Insert { source, .. }
            | StoreError::Update { source, .. }
            | StoreError::Delete { source, .. }
            | StoreError::Count { source, .. }
            | StoreError::Schema { source, .. }
            | StoreError::PartialBatch { source, .. } => Some(source),
            StoreError::Configuration(_) | StoreError::Decode(_) => None,
        }
    }
}
