use std::sync::Arc;

use tracing::debug;

use stocky_core::errors::QueryError;
use stocky_core::safety::CandidateSql;
use stocky_core::schema::SchemaDescription;

use crate::llm::TextCompleter;

/// Turns a natural-language question into one candidate SQL statement.
///
/// The prompt is deterministic for a given schema snapshot and question.
/// Correctness and safety of the output are not judged here; that is the
/// safety gate's job.
pub struct SqlTranslator {
    completer: Arc<dyn TextCompleter>,
}

impl SqlTranslator {
    pub fn new(completer: Arc<dyn TextCompleter>) -> Self {
        Self { completer }
    }

    pub async fn translate(
        &self,
        user_query: &str,
        schema: &SchemaDescription,
    ) -> Result<CandidateSql, QueryError> {
        let prompt = build_prompt(&schema.render(), user_query);

        let response = self
            .completer
            .complete(&prompt)
            .await
            .map_err(|error| QueryError::Translation(error.to_string()))?;

        let sql = strip_code_fences(response.trim()).trim().to_string();
        debug!(sql = %sql, "candidate SQL generated");
        Ok(CandidateSql::new(sql))
    }
}

pub fn build_prompt(schema_text: &str, user_query: &str) -> String {
    format!(
        "Given the following database schema:\n\
         {schema_text}\n\
         \n\
         Convert this natural language question to a SQL query:\n\
         \"{user_query}\"\n\
         \n\
         Return only the SQL query without any explanation or markdown formatting. \
         The query should start with SELECT and read data only."
    )
}

/// Completers regularly wrap SQL in markdown fences despite the instruction
/// not to; strip one outer fence pair if present.
fn strip_code_fences(response: &str) -> &str {
    let Some(rest) = response.strip_prefix("```") else {
        return response;
    };
    let rest = rest.strip_prefix("sql").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest)
}
