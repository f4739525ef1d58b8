use thiserror::Error;

/// Failure taxonomy of the query pipeline.
///
/// Every variant bubbles to the pipeline's single catch boundary and is
/// rendered as a plain-text apology. Rejection messages never echo the
/// candidate SQL back to the user.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("could not read the database schema: {0}")]
    SchemaFetch(String),
    #[error("failed to generate SQL: {0}")]
    Translation(String),
    #[error("{0}")]
    UnsafeQuery(&'static str),
    #[error("database query error: {0}")]
    Execution(String),
}

impl QueryError {
    /// The user-facing reply produced at the pipeline's catch boundary.
    pub fn apology(&self) -> String {
        format!("Sorry, I couldn't process your request: {self}")
    }
}

#[cfg(test)]
mod tests {
    use super::QueryError;

    #[test]
    fn apology_wraps_the_error_message() {
        let error = QueryError::Execution("no such table: parts".to_string());
        assert_eq!(
            error.apology(),
            "Sorry, I couldn't process your request: database query error: no such table: parts"
        );
    }

    #[test]
    fn unsafe_query_message_does_not_leak_sql() {
        let error = QueryError::UnsafeQuery("Only SELECT queries are allowed");
        assert_eq!(error.to_string(), "Only SELECT queries are allowed");
    }
}
