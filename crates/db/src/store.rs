use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row as _, TypeInfo, ValueRef};

use stocky_core::errors::QueryError;
use stocky_core::rows::{QueryResultSet, Row};
use stocky_core::safety::SafeSql;
use stocky_core::schema::ColumnInfo;
use stocky_core::store::{QueryExecutor, SchemaInspector};

use crate::DbPool;

/// Store capability backed by the sqlite pool.
///
/// Introspection reads `sqlite_master` and `PRAGMA table_info` at call time so
/// snapshots always reflect the live schema.
pub struct SqlInventoryStore {
    pool: DbPool,
}

impl SqlInventoryStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SchemaInspector for SqlInventoryStore {
    async fn list_tables(&self) -> Result<Vec<String>, QueryError> {
        sqlx::query_scalar::<_, String>(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| QueryError::SchemaFetch(error.to_string()))
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<ColumnInfo>, QueryError> {
        // PRAGMA arguments cannot be bound; quote the identifier instead.
        let pragma = format!("PRAGMA table_info(\"{}\")", table.replace('"', "\"\""));
        let rows = sqlx::query(&pragma)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| QueryError::SchemaFetch(error.to_string()))?;

        rows.iter()
            .map(|row| {
                let name: String = row
                    .try_get("name")
                    .map_err(|error| QueryError::SchemaFetch(error.to_string()))?;
                let data_type: String = row
                    .try_get("type")
                    .map_err(|error| QueryError::SchemaFetch(error.to_string()))?;
                Ok(ColumnInfo { name, data_type: data_type.to_lowercase() })
            })
            .collect()
    }
}

#[async_trait]
impl QueryExecutor for SqlInventoryStore {
    async fn execute(&self, sql: &SafeSql) -> Result<QueryResultSet, QueryError> {
        let rows = sqlx::query(sql.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|error| QueryError::Execution(error.to_string()))?;

        Ok(QueryResultSet::new(rows.iter().map(decode_row).collect()))
    }
}

fn decode_row(row: &SqliteRow) -> Row {
    let fields = row
        .columns()
        .iter()
        .map(|column| (column.name().to_string(), decode_value(row, column.ordinal())))
        .collect();
    Row::new(fields)
}

/// Decodes one cell into a JSON value by its sqlite type. Statements here are
/// arbitrary gated SELECTs, so column types are only known at runtime.
fn decode_value(row: &SqliteRow, index: usize) -> Value {
    let raw = match row.try_get_raw(index) {
        Ok(raw) => raw,
        Err(_) => return Value::Null,
    };
    if raw.is_null() {
        return Value::Null;
    }

    match raw.type_info().name() {
        "INTEGER" | "INT4" | "INT8" | "NUMERIC" => {
            row.try_get::<i64, _>(index).map(Value::from).unwrap_or(Value::Null)
        }
        "BOOLEAN" => row.try_get::<bool, _>(index).map(Value::from).unwrap_or(Value::Null),
        "REAL" => row.try_get::<f64, _>(index).map(Value::from).unwrap_or(Value::Null),
        "BLOB" => Value::String("<binary>".to_string()),
        _ => row.try_get::<String, _>(index).map(Value::String).unwrap_or(Value::Null),
    }
}
