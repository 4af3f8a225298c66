use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::error::Result;

/// One row: column name to value, in column order
pub type Record = serde_json::Map<String, Value>;

/// Identifier generated by the driver for an inserted row
pub type RecordId = u64;

/// Deserialize a record into a caller-defined row type
pub fn decode<T: DeserializeOwned>(record: Record) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(record))?)
}

/// Deserialize a list of records, failing on the first mismatch
pub fn decode_all<T: DeserializeOwned>(records: Vec<Record>) -> Result<Vec<T>> {
    records.into_iter().map(decode).collect()
}

/// Build a record from `(column, value)` pairs
///
/// ```
/// use record_store::core::record::record;
///
/// let row = record([("name", "a".into()), ("qty", 3.into())]);
/// assert_eq!(row["qty"], 3);
/// ```
pub fn record<K, I>(pairs: I) -> Record
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Value)>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}
