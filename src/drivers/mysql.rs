use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::mysql::MySqlRow;
use sqlx::{Column, MySql, MySqlPool, QueryBuilder, Row, TypeInfo};

use crate::core::filter::{Condition, Direction, Filters, Select};
use crate::core::record::{Record, RecordId};
use crate::core::traits::{DatabaseDriver, DriverResult};
use crate::core::DriverError;

/// MySQL's largest row count, used for an offset without a limit
const MAX_ROWS: u64 = u64::MAX;

/// Driver over a MySQL connection pool
///
/// Statements are built per call; identifiers are backtick-quoted and every
/// value is sent as a bound parameter.
#[derive(Clone)]
pub struct MySqlDriver {
    pool: MySqlPool,
}

impl MySqlDriver {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

/// Quote an identifier, doubling embedded backticks
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn push_value(qb: &mut QueryBuilder<'static, MySql>, value: &Value) {
    match value {
        Value::Null => qb.push_bind(None::<String>),
        Value::Bool(b) => qb.push_bind(*b),
        Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => qb.push_bind(i),
            (None, Some(u)) => qb.push_bind(u),
            (None, None) => qb.push_bind(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => qb.push_bind(s.clone()),
        // Arrays and objects go to JSON/text columns as their JSON text.
        other => qb.push_bind(other.to_string()),
    };
}

fn push_where(qb: &mut QueryBuilder<'static, MySql>, filters: &Filters) {
    for (i, (column, condition)) in filters.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        qb.push(quote_ident(column));
        match condition {
            Condition::Eq(Value::Null) => {
                qb.push(" IS NULL");
            }
            Condition::Eq(value) => {
                qb.push(" = ");
                push_value(qb, value);
            }
            Condition::NotNull => {
                qb.push(" IS NOT NULL");
            }
        }
    }
}

fn push_limit(qb: &mut QueryBuilder<'static, MySql>, limit: Option<u64>) {
    if let Some(limit) = limit {
        qb.push(" LIMIT ");
        qb.push(limit);
    }
}

pub(crate) fn build_select(table: &str, select: &Select) -> QueryBuilder<'static, MySql> {
    let mut qb = QueryBuilder::new(format!("SELECT * FROM {}", quote_ident(table)));
    push_where(&mut qb, &select.filters);

    if let Some(order) = &select.order_by {
        qb.push(" ORDER BY ");
        qb.push(quote_ident(&order.column));
        qb.push(match order.direction {
            Direction::Asc => " ASC",
            Direction::Desc => " DESC",
        });
    }

    match (select.limit, select.offset) {
        (limit, 0) => push_limit(&mut qb, limit),
        (limit, offset) => {
            push_limit(&mut qb, Some(limit.unwrap_or(MAX_ROWS)));
            qb.push(" OFFSET ");
            qb.push(offset);
        }
    }
    qb
}

pub(crate) fn build_insert(table: &str, record: &Record) -> QueryBuilder<'static, MySql> {
    let columns: Vec<String> = record.keys().map(|c| quote_ident(c)).collect();
    let mut qb = QueryBuilder::new(format!(
        "INSERT INTO {} ({}) VALUES (",
        quote_ident(table),
        columns.join(", ")
    ));
    for (i, value) in record.values().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        push_value(&mut qb, value);
    }
    qb.push(")");
    qb
}

pub(crate) fn build_update(
    table: &str,
    filters: &Filters,
    limit: Option<u64>,
    patch: &Record,
) -> QueryBuilder<'static, MySql> {
    let mut qb = QueryBuilder::new(format!("UPDATE {} SET ", quote_ident(table)));
    for (i, (column, value)) in patch.iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        qb.push(quote_ident(column));
        qb.push(" = ");
        push_value(&mut qb, value);
    }
    push_where(&mut qb, filters);
    push_limit(&mut qb, limit);
    qb
}

pub(crate) fn build_delete(
    table: &str,
    filters: &Filters,
    limit: Option<u64>,
) -> QueryBuilder<'static, MySql> {
    let mut qb = QueryBuilder::new(format!("DELETE FROM {}", quote_ident(table)));
    push_where(&mut qb, filters);
    push_limit(&mut qb, limit);
    qb
}

pub(crate) fn build_count(table: &str, filters: &Filters) -> QueryBuilder<'static, MySql> {
    let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", quote_ident(table)));
    push_where(&mut qb, filters);
    qb
}

/// Map SQLSTATE classes onto driver errors
fn classify(err: sqlx::Error) -> DriverError {
    if let Some(db_err) = err.as_database_error() {
        let message = db_err.message().to_string();
        match db_err.code().as_deref() {
            Some("42S02") => return DriverError::UnknownTable(message),
            Some("42S22") => return DriverError::UnknownColumn(message),
            Some("23000") => return DriverError::Constraint(message),
            _ => {}
        }
    }
    DriverError::Database(err)
}

fn decode_column(row: &MySqlRow, index: usize, type_name: &str) -> Result<Value, sqlx::Error> {
    let value = match type_name {
        "BOOLEAN" => row.try_get::<Option<bool>, _>(index)?.map(Value::from),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            row.try_get::<Option<i64>, _>(index)?.map(Value::from)
        }
        t if t.ends_with(" UNSIGNED") => row.try_get::<Option<u64>, _>(index)?.map(Value::from),
        "FLOAT" => row
            .try_get::<Option<f32>, _>(index)?
            .map(|f| Value::from(f64::from(f))),
        "DOUBLE" => row.try_get::<Option<f64>, _>(index)?.map(Value::from),
        "DECIMAL" => row
            .try_get::<Option<Decimal>, _>(index)?
            .map(|d| Value::String(d.to_string())),
        "DATETIME" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(index)?
            .map(|dt| Value::String(dt.format("%Y-%m-%d %H:%M:%S").to_string())),
        "TIMESTAMP" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(index)?
            .map(|dt| Value::String(dt.format("%Y-%m-%d %H:%M:%S").to_string())),
        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(index)?
            .map(|d| Value::String(d.to_string())),
        "TIME" => row
            .try_get::<Option<chrono::NaiveTime>, _>(index)?
            .map(|t| Value::String(t.to_string())),
        "JSON" => row.try_get::<Option<Value>, _>(index)?,
        "NULL" => None,
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => row
            .try_get::<Option<Vec<u8>>, _>(index)?
            .map(|bytes| Value::String(String::from_utf8_lossy(&bytes).into_owned())),
        _ => row.try_get_unchecked::<Option<String>, _>(index)?.map(Value::String),
    };
    Ok(value.unwrap_or(Value::Null))
}

fn row_to_record(row: &MySqlRow) -> DriverResult<Record> {
    let mut record = Record::new();
    for column in row.columns() {
        let value = decode_column(row, column.ordinal(), column.type_info().name())?;
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

#[async_trait]
impl DatabaseDriver for MySqlDriver {
    async fn query(&self, table: &str, select: &Select) -> DriverResult<Vec<Record>> {
        let rows = build_select(table, select)
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(classify)?;

        rows.iter().map(row_to_record).collect()
    }

    async fn query_one(&self, table: &str, filters: &Filters) -> DriverResult<Option<Record>> {
        let select = Select {
            filters: filters.clone(),
            limit: Some(1),
            ..Select::default()
        };
        let row = build_select(table, &select)
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn insert(&self, table: &str, record: Record) -> DriverResult<RecordId> {
        let result = build_insert(table, &record)
            .build()
            .execute(&self.pool)
            .await
            .map_err(classify)?;

        Ok(result.last_insert_id())
    }

    async fn update(
        &self,
        table: &str,
        filters: &Filters,
        limit: Option<u64>,
        patch: Record,
    ) -> DriverResult<u64> {
        // `UPDATE ... SET` with nothing to set is not valid SQL.
        if patch.is_empty() {
            return Ok(0);
        }

        let result = build_update(table, filters, limit, &patch)
            .build()
            .execute(&self.pool)
            .await
            .map_err(classify)?;

        Ok(result.rows_affected())
    }

    async fn delete(
        &self,
        table: &str,
        filters: &Filters,
        limit: Option<u64>,
    ) -> DriverResult<u64> {
        let result = build_delete(table, filters, limit)
            .build()
            .execute(&self.pool)
            .await
            .map_err(classify)?;

        Ok(result.rows_affected())
    }

    async fn empty_table(&self, table: &str) -> DriverResult<bool> {
        sqlx::query(&format!("DELETE FROM {}", quote_ident(table)))
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(true)
    }

    async fn truncate(&self, table: &str) -> DriverResult<bool> {
        sqlx::query(&format!("TRUNCATE TABLE {}", quote_ident(table)))
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(true)
    }

    async fn count_all(&self, table: &str) -> DriverResult<u64> {
        self.count_where(table, &Filters::new()).await
    }

    async fn count_where(&self, table: &str, filters: &Filters) -> DriverResult<u64> {
        let count: i64 = build_count(table, filters)
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(classify)?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn list_fields(&self, table: &str) -> DriverResult<Vec<String>> {
        let fields: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT CAST(COLUMN_NAME AS CHAR)
            FROM information_schema.COLUMNS
            WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
            ORDER BY ORDINAL_POSITION
            "#,
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;

        if fields.is_empty() {
            return Err(DriverError::UnknownTable(table.to_string()));
        }
        Ok(fields)
    }
}
