use std::sync::Arc;

use stocky_agent::{HttpTextCompleter, QueryPipeline};
use stocky_core::config::{AppConfig, LoadOptions};
use stocky_db::{connect_with_settings, SqlInventoryStore};

use super::CommandResult;

/// Runs one question through the full pipeline, bypassing the chat transport.
pub fn run(question: &str) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::failure("ask", "config", error.to_string(), 1),
    };

    let runtime = match super::runtime() {
        Ok(runtime) => runtime,
        Err(error) => return CommandResult::failure("ask", "runtime", error.to_string(), 1),
    };

    runtime.block_on(async {
        let pool = match connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        {
            Ok(pool) => pool,
            Err(error) => {
                return CommandResult::failure("ask", "database", error.to_string(), 1)
            }
        };

        let completer = match HttpTextCompleter::from_config(&config.llm) {
            Ok(completer) => Arc::new(completer),
            Err(error) => {
                return CommandResult::failure("ask", "completer", error.to_string(), 1)
            }
        };

        let store = Arc::new(SqlInventoryStore::new(pool.clone()));
        let pipeline =
            QueryPipeline::new(store.clone(), store, completer, &config.translation);

        let reply = pipeline.handle(question).await;
        pool.close().await;
        CommandResult::success("ask", reply)
    })
}
