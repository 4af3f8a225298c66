//! In-process driver
//!
//! Tables live in a `parking_lot::RwLock`; guards are never held across an
//! await point. Each table keeps an auto-increment sequence for its primary
//! key the way MySQL does: explicit numeric keys advance it, `empty_table`
//! keeps it and `truncate` resets it.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::core::filter::{Direction, Filters, OrderBy, Select};
use crate::core::record::{Record, RecordId};
use crate::core::traits::{DatabaseDriver, DriverResult};
use crate::core::DriverError;

#[derive(Debug)]
struct Table {
    columns: Vec<String>,
    primary_key: String,
    next_id: RecordId,
    rows: Vec<Record>,
}

impl Table {
    fn check_column(&self, column: &str) -> DriverResult<()> {
        if self.columns.iter().any(|c| c == column) {
            Ok(())
        } else {
            Err(DriverError::UnknownColumn(column.to_string()))
        }
    }

    fn check_filters(&self, filters: &Filters) -> DriverResult<()> {
        filters.iter().try_for_each(|(column, _)| self.check_column(column))
    }

    fn check_record(&self, record: &Record) -> DriverResult<()> {
        record.keys().try_for_each(|column| self.check_column(column))
    }

    /// Indexes of rows matching `filters`, at most `limit` of them
    fn matching(&self, filters: &Filters, limit: Option<u64>) -> Vec<usize> {
        let limit = limit.map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| filters.matches(row))
            .map(|(i, _)| i)
            .take(limit)
            .collect()
    }

    fn key_taken(&self, key: &Value, skip: Option<usize>) -> bool {
        self.rows
            .iter()
            .enumerate()
            .any(|(i, row)| Some(i) != skip && row.get(&self.primary_key) == Some(key))
    }

    /// Fill every column so rows look like fetched SQL rows
    fn materialize(&self, mut record: Record) -> Record {
        let mut row = Record::new();
        for column in &self.columns {
            row.insert(column.clone(), record.remove(column).unwrap_or(Value::Null));
        }
        row
    }
}

/// Driver backed by process memory
#[derive(Debug, Default)]
pub struct MemoryDriver {
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table, replacing any existing one of the same name
    pub fn create_table(&self, table: &str, primary_key: &str, columns: &[&str]) {
        let mut columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        if !columns.iter().any(|c| c == primary_key) {
            columns.insert(0, primary_key.to_string());
        }

        self.tables.write().insert(
            table.to_string(),
            Table {
                columns,
                primary_key: primary_key.to_string(),
                next_id: 1,
                rows: Vec::new(),
            },
        );
    }

    fn read<T>(&self, table: &str, f: impl FnOnce(&Table) -> DriverResult<T>) -> DriverResult<T> {
        let tables = self.tables.read();
        let table = tables
            .get(table)
            .ok_or_else(|| DriverError::UnknownTable(table.to_string()))?;
        f(table)
    }

    fn write<T>(
        &self,
        table: &str,
        f: impl FnOnce(&mut Table) -> DriverResult<T>,
    ) -> DriverResult<T> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(table)
            .ok_or_else(|| DriverError::UnknownTable(table.to_string()))?;
        f(table)
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        // NULL sorts first, as in MySQL
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

fn sort_rows(rows: &mut [Record], order: &OrderBy) {
    rows.sort_by(|a, b| {
        let ord = compare_values(a.get(&order.column), b.get(&order.column));
        match order.direction {
            Direction::Asc => ord,
            Direction::Desc => ord.reverse(),
        }
    });
}

#[async_trait]
impl DatabaseDriver for MemoryDriver {
    async fn query(&self, table: &str, select: &Select) -> DriverResult<Vec<Record>> {
        self.read(table, |t| {
            t.check_filters(&select.filters)?;
            let mut rows: Vec<Record> = t
                .rows
                .iter()
                .filter(|row| select.filters.matches(row))
                .cloned()
                .collect();

            if let Some(order) = &select.order_by {
                t.check_column(&order.column)?;
                sort_rows(&mut rows, order);
            }

            let offset = usize::try_from(select.offset).unwrap_or(usize::MAX);
            let limit = select
                .limit
                .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
            Ok(rows.into_iter().skip(offset).take(limit).collect())
        })
    }

    async fn query_one(&self, table: &str, filters: &Filters) -> DriverResult<Option<Record>> {
        self.read(table, |t| {
            t.check_filters(filters)?;
            Ok(t.rows.iter().find(|row| filters.matches(row)).cloned())
        })
    }

    async fn insert(&self, table: &str, record: Record) -> DriverResult<RecordId> {
        self.write(table, |t| {
            t.check_record(&record)?;
            let mut row = t.materialize(record);

            let key = row.get(&t.primary_key).cloned().unwrap_or(Value::Null);
            if key.is_null() {
                let id = t.next_id;
                row.insert(t.primary_key.clone(), Value::from(id));
                t.next_id += 1;
                t.rows.push(row);
                return Ok(id);
            }

            if t.key_taken(&key, None) {
                return Err(DriverError::Constraint(format!(
                    "duplicate entry {} for key {}",
                    key, t.primary_key
                )));
            }

            // Non-numeric keys are stored as given and report 0, like LAST_INSERT_ID().
            let id = key.as_u64().unwrap_or(0);
            if id > 0 {
                t.next_id = t.next_id.max(id + 1);
            }
            t.rows.push(row);
            Ok(id)
        })
    }

    async fn update(
        &self,
        table: &str,
        filters: &Filters,
        limit: Option<u64>,
        patch: Record,
    ) -> DriverResult<u64> {
        self.write(table, |t| {
            t.check_filters(filters)?;
            t.check_record(&patch)?;

            let targets = t.matching(filters, limit);
            if let Some(key) = patch.get(&t.primary_key) {
                if targets.len() > 1 || targets.iter().any(|&i| t.key_taken(key, Some(i))) {
                    return Err(DriverError::Constraint(format!(
                        "duplicate entry {} for key {}",
                        key, t.primary_key
                    )));
                }
            }

            for &i in &targets {
                for (column, value) in &patch {
                    t.rows[i].insert(column.clone(), value.clone());
                }
            }
            Ok(targets.len() as u64)
        })
    }

    async fn delete(
        &self,
        table: &str,
        filters: &Filters,
        limit: Option<u64>,
    ) -> DriverResult<u64> {
        self.write(table, |t| {
            t.check_filters(filters)?;
            let targets = t.matching(filters, limit);
            // Remove back to front so earlier indexes stay valid.
            for &i in targets.iter().rev() {
                t.rows.remove(i);
            }
            Ok(targets.len() as u64)
        })
    }

    async fn empty_table(&self, table: &str) -> DriverResult<bool> {
        self.write(table, |t| {
            t.rows.clear();
            Ok(true)
        })
    }

    async fn truncate(&self, table: &str) -> DriverResult<bool> {
        self.write(table, |t| {
            t.rows.clear();
            t.next_id = 1;
            Ok(true)
        })
    }

    async fn count_all(&self, table: &str) -> DriverResult<u64> {
        self.read(table, |t| Ok(t.rows.len() as u64))
    }

    async fn count_where(&self, table: &str, filters: &Filters) -> DriverResult<u64> {
        self.read(table, |t| {
            t.check_filters(filters)?;
            Ok(t.rows.iter().filter(|row| filters.matches(row)).count() as u64)
        })
    }

    async fn list_fields(&self, table: &str) -> DriverResult<Vec<String>> {
        self.read(table, |t| Ok(t.columns.clone()))
    }
}
