use async_trait::async_trait;

use crate::errors::QueryError;
use crate::rows::QueryResultSet;
use crate::safety::SafeSql;
use crate::schema::ColumnInfo;

/// Read access to the store's public schema.
///
/// Implementations map driver failures to [`QueryError::SchemaFetch`].
#[async_trait]
pub trait SchemaInspector: Send + Sync {
    async fn list_tables(&self) -> Result<Vec<String>, QueryError>;
    async fn list_columns(&self, table: &str) -> Result<Vec<ColumnInfo>, QueryError>;
}

/// Executes gated SQL against the store.
///
/// Accepting only [`SafeSql`] keeps ungated completer output away from the
/// database. Implementations map driver failures to [`QueryError::Execution`]
/// and never retry.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, sql: &SafeSql) -> Result<QueryResultSet, QueryError>;
}
