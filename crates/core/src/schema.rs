use serde::{Deserialize, Serialize};

/// A point-in-time description of the store's public tables.
///
/// Built fresh for every query so the prompt always reflects the live schema;
/// nothing here is cached. Table and column order follow discovery order so
/// the rendered text is stable within one snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescription {
    pub tables: Vec<TableInfo>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

const UNAVAILABLE_TEXT: &str = "Error fetching database schema";

impl SchemaDescription {
    pub fn new(tables: Vec<TableInfo>) -> Self {
        Self { tables }
    }

    /// Sentinel returned when introspection fails. Callers degrade to a
    /// schema-less prompt instead of aborting the pipeline.
    pub fn unavailable() -> Self {
        Self { tables: Vec::new() }
    }

    pub fn is_unavailable(&self) -> bool {
        self.tables.is_empty()
    }

    /// Renders the schema as prompt text, one block per table.
    pub fn render(&self) -> String {
        if self.tables.is_empty() {
            return UNAVAILABLE_TEXT.to_string();
        }

        let mut text = String::new();
        for table in &self.tables {
            text.push_str(&format!("Table: {}\nColumns:\n", table.name));
            for column in &table.columns {
                text.push_str(&format!("- {} ({})\n", column.name, column.data_type));
            }
            text.push('\n');
        }
        text
    }
}
