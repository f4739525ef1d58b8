use std::sync::Arc;

use stocky_agent::StockAlertMonitor;
use stocky_chat::TwilioMessageChannel;
use stocky_core::config::{AppConfig, LoadOptions};
use stocky_core::restock::PendingSlot;
use stocky_db::{connect_with_settings, SqlInventoryStore};

use super::CommandResult;

/// Runs one stock check and reports the outcome. Sends a real alert when
/// stock is low, so the pending request lands with the configured approver.
pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::failure("alert", "config", error.to_string(), 1),
    };

    let runtime = match super::runtime() {
        Ok(runtime) => runtime,
        Err(error) => return CommandResult::failure("alert", "runtime", error.to_string(), 1),
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
                return CommandResult::failure("alert", "database", error.to_string(), 1)
            }
        };

        let channel = match TwilioMessageChannel::from_config(&config.chat) {
            Ok(channel) => Arc::new(channel),
            Err(error) => return CommandResult::failure("alert", "channel", error.to_string(), 1),
        };

        let monitor = StockAlertMonitor::new(
            Arc::new(SqlInventoryStore::new(pool.clone())),
            channel,
            Arc::new(PendingSlot::new()),
            config.alerts.clone(),
            config.chat.approver.clone(),
        );

        let outcome = monitor.check_and_alert().await;
        pool.close().await;

        let message = serde_json::to_string(&outcome)
            .unwrap_or_else(|_| format!("{outcome:?}"));
        CommandResult::success("alert", message)
    })
}
