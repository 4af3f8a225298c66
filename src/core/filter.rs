use serde::Deserialize;
use serde_json::Value;

use crate::core::record::Record;

/// A single column condition
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Exact match; `Value::Null` matches a NULL or missing column
    Eq(Value),
    /// Column holds any non-NULL value
    NotNull,
}

impl Condition {
    /// Evaluate against a column value, `None` meaning the column is absent
    pub fn matches(&self, value: Option<&Value>) -> bool {
        match (self, value) {
            (Condition::Eq(Value::Null), None | Some(Value::Null)) => true,
            (Condition::Eq(expected), Some(actual)) => values_equal(expected, actual),
            (Condition::Eq(_), None) => false,
            (Condition::NotNull, Some(v)) => !v.is_null(),
            (Condition::NotNull, None) => false,
        }
    }
}

// Numbers compare by value so that 1 and 1.0 match the way SQL does.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => x.as_f64() == y.as_f64(),
        },
        _ => a == b,
    }
}

/// AND-combined set of column conditions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    conditions: Vec<(String, Condition)>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `column = value`
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions
            .push((column.into(), Condition::Eq(value.into())));
        self
    }

    /// Require `column IS NULL`
    pub fn is_null(self, column: impl Into<String>) -> Self {
        self.eq(column, Value::Null)
    }

    /// Require `column IS NOT NULL`
    pub fn not_null(mut self, column: impl Into<String>) -> Self {
        self.conditions.push((column.into(), Condition::NotNull));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Condition)> {
        self.conditions.iter().map(|(c, cond)| (c.as_str(), cond))
    }

    /// True when every condition holds for `record`
    pub fn matches(&self, record: &Record) -> bool {
        self.conditions
            .iter()
            .all(|(column, cond)| cond.matches(record.get(column)))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Filters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Filters::new(), |filters, (k, v)| filters.eq(k, v))
    }
}

impl From<Record> for Filters {
    fn from(record: Record) -> Self {
        record.into_iter().collect()
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// Sort clause applied to multi-row reads
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderBy {
    pub column: String,
    #[serde(default)]
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Desc,
        }
    }
}

/// Everything a driver needs to run a multi-row read
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Select {
    pub filters: Filters,
    pub order_by: Option<OrderBy>,
    /// `None` means unlimited; `Some(0)` returns no rows
    pub limit: Option<u64>,
    pub offset: u64,
}
