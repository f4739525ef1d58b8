use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use stocky_core::errors::QueryError;
use stocky_core::rows::QueryResultSet;
use stocky_core::safety::SafeSql;
use stocky_core::schema::{ColumnInfo, TableInfo};
use stocky_core::store::{QueryExecutor, SchemaInspector};

/// In-memory store double with a scripted schema and canned query results.
///
/// Used by pipeline and monitor tests that exercise the critical path without
/// a database file.
#[derive(Default)]
pub struct InMemoryInventoryStore {
    tables: Vec<TableInfo>,
    responses: RwLock<HashMap<String, QueryResultSet>>,
    default_response: Option<QueryResultSet>,
    executed: RwLock<Vec<String>>,
    schema_failure: Option<String>,
    execution_failure: Option<String>,
}

impl InMemoryInventoryStore {
    pub fn with_tables(tables: Vec<TableInfo>) -> Self {
        Self { tables, ..Self::default() }
    }

    /// A store whose introspection always fails, for degrade-path tests.
    pub fn with_schema_failure(message: impl Into<String>) -> Self {
        Self { schema_failure: Some(message.into()), ..Self::default() }
    }

    pub fn failing_execution(mut self, message: impl Into<String>) -> Self {
        self.execution_failure = Some(message.into());
        self
    }

    pub fn responding(mut self, sql: impl Into<String>, result: QueryResultSet) -> Self {
        self.responses.get_mut().insert(sql.into(), result);
        self
    }

    pub fn with_default_response(mut self, result: QueryResultSet) -> Self {
        self.default_response = Some(result);
        self
    }

    /// Every statement executed, in order.
    pub async fn executed_sql(&self) -> Vec<String> {
        self.executed.read().await.clone()
    }
}

#[async_trait]
impl SchemaInspector for InMemoryInventoryStore {
    async fn list_tables(&self) -> Result<Vec<String>, QueryError> {
        if let Some(message) = &self.schema_failure {
            return Err(QueryError::SchemaFetch(message.clone()));
        }
        Ok(self.tables.iter().map(|table| table.name.clone()).collect())
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<ColumnInfo>, QueryError> {
        if let Some(message) = &self.schema_failure {
            return Err(QueryError::SchemaFetch(message.clone()));
        }
        Ok(self
            .tables
            .iter()
            .find(|candidate| candidate.name == table)
            .map(|table| table.columns.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl QueryExecutor for InMemoryInventoryStore {
    async fn execute(&self, sql: &SafeSql) -> Result<QueryResultSet, QueryError> {
        self.executed.write().await.push(sql.as_str().to_string());

        if let Some(message) = &self.execution_failure {
            return Err(QueryError::Execution(message.clone()));
        }

        if let Some(result) = self.responses.read().await.get(sql.as_str()) {
            return Ok(result.clone());
        }
        Ok(self.default_response.clone().unwrap_or_default())
    }
}
