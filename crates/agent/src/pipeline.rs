use std::sync::Arc;

use tracing::{info, warn};

use stocky_core::config::TranslationConfig;
use stocky_core::errors::QueryError;
use stocky_core::format::format_result_set;
use stocky_core::rows::QueryResultSet;
use stocky_core::safety::{SafeSql, SafetyGate};
use stocky_core::store::{QueryExecutor, SchemaInspector};

use crate::llm::TextCompleter;
use crate::localization::ReplyLocalizer;
use crate::snapshot::SchemaSnapshotter;
use crate::translator::SqlTranslator;

/// Executes gated SQL against the store. No retries; a failure surfaces
/// immediately to the pipeline's catch boundary.
pub struct QueryRunner {
    executor: Arc<dyn QueryExecutor>,
}

impl QueryRunner {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor }
    }

    pub async fn run(&self, sql: &SafeSql) -> Result<QueryResultSet, QueryError> {
        let results = self.executor.execute(sql).await?;
        info!(rows = results.len(), "query executed");
        Ok(results)
    }
}

/// One request/response cycle: snapshot → translate → gate → run → format →
/// localize.
///
/// `handle` never fails. Every typed error from the stages below is caught
/// here, logged, and rendered as a plain apology; the transport never sees a
/// stack trace.
pub struct QueryPipeline {
    snapshotter: SchemaSnapshotter,
    translator: SqlTranslator,
    gate: SafetyGate,
    runner: QueryRunner,
    localizer: ReplyLocalizer,
}

impl QueryPipeline {
    pub fn new(
        inspector: Arc<dyn SchemaInspector>,
        executor: Arc<dyn QueryExecutor>,
        completer: Arc<dyn TextCompleter>,
        translation: &TranslationConfig,
    ) -> Self {
        Self {
            snapshotter: SchemaSnapshotter::new(inspector),
            translator: SqlTranslator::new(completer.clone()),
            gate: SafetyGate,
            runner: QueryRunner::new(executor),
            localizer: ReplyLocalizer::new(completer, translation),
        }
    }

    pub async fn handle(&self, user_query: &str) -> String {
        match self.process(user_query).await {
            Ok(reply) => reply,
            Err(error) => {
                warn!(error = %error, "query pipeline failed; replying with apology");
                error.apology()
            }
        }
    }

    async fn process(&self, user_query: &str) -> Result<String, QueryError> {
        let schema = self.snapshotter.snapshot().await;
        let candidate = self.translator.translate(user_query, &schema).await?;
        let safe = self.gate.validate(candidate)?;
        let results = self.runner.run(&safe).await?;
        let reply = format_result_set(&results);
        Ok(self.localizer.localize(&reply).await)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::Mutex;

    use stocky_core::config::TranslationConfig;
    use stocky_core::rows::{QueryResultSet, Row};
    use stocky_core::schema::{ColumnInfo, TableInfo};
    use stocky_db::InMemoryInventoryStore;

    use super::QueryPipeline;
    use crate::llm::TextCompleter;

    const WIDGET_COUNT_SQL: &str =
        "SELECT COUNT(*) AS total FROM inventory WHERE name LIKE '%widget%'";

    struct ScriptedCompleter {
        response: &'static str,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedCompleter {
        fn new(response: &'static str) -> Self {
            Self { response, prompts: Mutex::default() }
        }

        async fn prompts(&self) -> Vec<String> {
            self.prompts.lock().await.clone()
        }
    }

    #[async_trait]
    impl TextCompleter for ScriptedCompleter {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().await.push(prompt.to_string());
            Ok(self.response.to_string())
        }
    }

    fn neutral_translation() -> TranslationConfig {
        TranslationConfig {
            target_language: "English".to_string(),
            neutral_language: "English".to_string(),
        }
    }

    fn inventory_store() -> InMemoryInventoryStore {
        InMemoryInventoryStore::with_tables(vec![TableInfo {
            name: "inventory".to_string(),
            columns: vec![
                ColumnInfo { name: "name".to_string(), data_type: "text".to_string() },
                ColumnInfo { name: "stock_quantity".to_string(), data_type: "int".to_string() },
            ],
        }])
    }

    fn pipeline(
        store: Arc<InMemoryInventoryStore>,
        completer: Arc<ScriptedCompleter>,
    ) -> QueryPipeline {
        QueryPipeline::new(store.clone(), store, completer, &neutral_translation())
    }

    #[tokio::test]
    async fn widget_question_yields_gated_select_and_formatted_reply() {
        let store = Arc::new(inventory_store().responding(
            WIDGET_COUNT_SQL,
            QueryResultSet::new(vec![Row::new(vec![("total".to_string(), json!(3))])]),
        ));
        let completer = Arc::new(ScriptedCompleter::new(WIDGET_COUNT_SQL));
        let pipeline = pipeline(store.clone(), completer.clone());

        let reply = pipeline.handle("how many widgets are in stock").await;

        assert_eq!(store.executed_sql().await, vec![WIDGET_COUNT_SQL.to_string()]);
        assert!(reply.contains("*Row 1*"));
        assert!(reply.contains("total: 3"));

        let prompts = completer.prompts().await;
        assert_eq!(prompts.len(), 1, "neutral target language should skip translation");
        assert!(prompts[0].contains("Table: inventory"));
        assert!(prompts[0].contains("\"how many widgets are in stock\""));
    }

    #[tokio::test]
    async fn unsafe_candidate_is_rejected_before_execution() {
        let store = Arc::new(inventory_store());
        let completer = Arc::new(ScriptedCompleter::new("DROP TABLE inventory"));
        let pipeline = pipeline(store.clone(), completer);

        let reply = pipeline.handle("remove everything").await;

        assert_eq!(
            reply,
            "Sorry, I couldn't process your request: \
             This query appears to modify the database which is not allowed"
        );
        assert!(store.executed_sql().await.is_empty(), "gated SQL must never execute");
    }

    #[tokio::test]
    async fn execution_failure_renders_apology_with_store_message() {
        let store =
            Arc::new(inventory_store().failing_execution("no such column: quantity"));
        let completer = Arc::new(ScriptedCompleter::new("SELECT quantity FROM inventory"));
        let pipeline = pipeline(store, completer);

        let reply = pipeline.handle("stock levels").await;

        assert!(reply.starts_with("Sorry, I couldn't process your request:"));
        assert!(reply.contains("no such column: quantity"));
    }

    #[tokio::test]
    async fn schema_failure_degrades_but_still_answers() {
        let store = Arc::new(
            InMemoryInventoryStore::with_schema_failure("connection refused")
                .with_default_response(QueryResultSet::default()),
        );
        let completer = Arc::new(ScriptedCompleter::new("SELECT 1"));
        let pipeline = pipeline(store, completer.clone());

        let reply = pipeline.handle("anything").await;

        assert_eq!(reply, "No results found for your query.");
        let prompts = completer.prompts().await;
        assert!(
            prompts[0].contains("Error fetching database schema"),
            "degraded prompt should carry the sentinel text"
        );
    }

    #[tokio::test]
    async fn empty_result_set_renders_no_results_message() {
        let store = Arc::new(
            inventory_store().with_default_response(QueryResultSet::default()),
        );
        let completer = Arc::new(ScriptedCompleter::new("SELECT name FROM inventory"));
        let pipeline = pipeline(store, completer);

        assert_eq!(
            pipeline.handle("list unknown things").await,
            "No results found for your query."
        );
    }
}
