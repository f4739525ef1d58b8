use serde_json::Value;

/// One result row: column/value pairs in the statement's column order.
///
/// Lookups by name are linear; result sets here are chat-sized.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Row {
    pub fn new(fields: Vec<(String, Value)>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.iter().find(|(name, _)| name == column).map(|(_, value)| value)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }
}

/// Ordered rows returned by a gated query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryResultSet {
    pub rows: Vec<Row>,
}

impl QueryResultSet {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Renders a single cell for chat output. Strings print bare, `NULL` for SQL
/// nulls, everything else falls back to compact JSON.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{render_value, Row};

    #[test]
    fn get_finds_column_by_name() {
        let row = Row::new(vec![
            ("name".to_string(), json!("Bolt")),
            ("stock_quantity".to_string(), json!(50)),
        ]);

        assert_eq!(row.get("stock_quantity"), Some(&json!(50)));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn values_render_without_json_quoting_for_strings() {
        assert_eq!(render_value(&json!("Bolt")), "Bolt");
        assert_eq!(render_value(&json!(42)), "42");
        assert_eq!(render_value(&json!(null)), "NULL");
        assert_eq!(render_value(&json!(true)), "true");
    }
}
