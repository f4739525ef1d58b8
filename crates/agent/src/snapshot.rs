use std::sync::Arc;

use tracing::warn;

use stocky_core::errors::QueryError;
use stocky_core::schema::{SchemaDescription, TableInfo};
use stocky_core::store::SchemaInspector;

/// Builds a fresh schema description per query.
///
/// Introspection failure degrades to the sentinel description instead of
/// aborting the pipeline; the prompt then carries the "schema unavailable"
/// text and the completer does its best.
pub struct SchemaSnapshotter {
    inspector: Arc<dyn SchemaInspector>,
}

impl SchemaSnapshotter {
    pub fn new(inspector: Arc<dyn SchemaInspector>) -> Self {
        Self { inspector }
    }

    pub async fn snapshot(&self) -> SchemaDescription {
        match self.try_snapshot().await {
            Ok(schema) => schema,
            Err(error) => {
                warn!(error = %error, "schema introspection failed; degrading to sentinel");
                SchemaDescription::unavailable()
            }
        }
    }

    async fn try_snapshot(&self) -> Result<SchemaDescription, QueryError> {
        let names = self.inspector.list_tables().await?;

        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let columns = self.inspector.list_columns(&name).await?;
            tables.push(TableInfo { name, columns });
        }

        Ok(SchemaDescription::new(tables))
    }
}
