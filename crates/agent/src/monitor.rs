use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use stocky_chat::channel::MessageChannel;
use stocky_core::config::AlertsConfig;
use stocky_core::errors::QueryError;
use stocky_core::restock::{PendingRefillRequest, PendingSlot, RefillLine};
use stocky_core::rows::{render_value, Row};
use stocky_core::safety::{CandidateSql, SafetyGate};
use stocky_core::store::QueryExecutor;

/// Result of one alert check, reported by the trigger endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AlertOutcome {
    StockSufficient,
    AlertDispatched { item_count: usize },
    CheckFailed,
}

/// Polls inventory levels and opens the approval flow when stock runs low.
///
/// Fire-and-forget: every failure is logged and absorbed here, nothing
/// propagates to callers. A fresh alert overwrites an unresolved pending
/// request; last alert wins.
pub struct StockAlertMonitor {
    executor: Arc<dyn QueryExecutor>,
    channel: Arc<dyn MessageChannel>,
    slot: Arc<PendingSlot>,
    config: AlertsConfig,
    approver: String,
}

impl StockAlertMonitor {
    pub fn new(
        executor: Arc<dyn QueryExecutor>,
        channel: Arc<dyn MessageChannel>,
        slot: Arc<PendingSlot>,
        config: AlertsConfig,
        approver: impl Into<String>,
    ) -> Self {
        Self { executor, channel, slot, config, approver: approver.into() }
    }

    pub async fn check_and_alert(&self) -> AlertOutcome {
        match self.check().await {
            Ok(outcome) => outcome,
            Err(error) => {
                error!(error = %error, "stock alert check failed");
                AlertOutcome::CheckFailed
            }
        }
    }

    async fn check(&self) -> Result<AlertOutcome, QueryError> {
        let threshold_query = format!(
            "SELECT name, stock_quantity FROM inventory WHERE stock_quantity <= {}",
            self.config.low_stock_threshold
        );
        // The monitor's own SQL goes through the same gate as completer output.
        let safe = SafetyGate.validate(CandidateSql::new(threshold_query))?;
        let low_stock = self.executor.execute(&safe).await?;

        if low_stock.is_empty() {
            info!("inventory levels are sufficient");
            return Ok(AlertOutcome::StockSufficient);
        }

        let mut alert = String::from("🚨 *Low Stock Alert*\n\n");
        let mut lines = Vec::with_capacity(low_stock.len());
        for row in &low_stock.rows {
            let (name, quantity) = item_fields(row);
            alert.push_str(&format!(
                "*{name}* is low.\nAvailable: {quantity}, Minimum required: {}\n\n",
                self.config.minimum_quantity
            ));
            lines.push(RefillLine {
                item_name: name,
                delta_quantity: self.config.restock_delta,
            });
        }
        alert.push_str("⚠️ Please restock soon. Input 1.Accept 2.Reject");

        let item_count = lines.len();
        if self.slot.replace(PendingRefillRequest::new(lines)).is_some() {
            warn!("unresolved refill request overwritten by a new alert");
        }

        if let Err(send_error) = self.channel.send(&self.approver, &alert).await {
            error!(error = %send_error, "failed to deliver low stock alert");
            return Ok(AlertOutcome::CheckFailed);
        }

        info!(item_count, "low stock alert sent");
        Ok(AlertOutcome::AlertDispatched { item_count })
    }
}

fn item_fields(row: &Row) -> (String, String) {
    let name = row.get("name").map(render_value).unwrap_or_else(|| "unknown item".to_string());
    let quantity = row.get("stock_quantity").map(render_value).unwrap_or_else(|| "?".to_string());
    (name, quantity)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use stocky_chat::channel::{ChannelError, RecordingMessageChannel};
    use stocky_core::config::AlertsConfig;
    use stocky_core::restock::PendingSlot;
    use stocky_core::rows::{QueryResultSet, Row};
    use stocky_db::InMemoryInventoryStore;

    use super::{AlertOutcome, StockAlertMonitor};

    const APPROVER: &str = "whatsapp:+912222222222";

    fn alerts_config() -> AlertsConfig {
        AlertsConfig {
            low_stock_threshold: 101,
            minimum_quantity: 100,
            restock_delta: 100,
            poll_interval_secs: 0,
        }
    }

    fn low_stock_rows() -> QueryResultSet {
        QueryResultSet::new(vec![Row::new(vec![
            ("name".to_string(), json!("Bolt")),
            ("stock_quantity".to_string(), json!(50)),
        ])])
    }

    fn monitor(
        store: Arc<InMemoryInventoryStore>,
        channel: Arc<RecordingMessageChannel>,
        slot: Arc<PendingSlot>,
    ) -> StockAlertMonitor {
        StockAlertMonitor::new(store, channel, slot, alerts_config(), APPROVER)
    }

    #[tokio::test]
    async fn low_stock_sends_one_alert_and_opens_one_pending_request() {
        let store = Arc::new(
            InMemoryInventoryStore::default().with_default_response(low_stock_rows()),
        );
        let channel = Arc::new(RecordingMessageChannel::default());
        let slot = Arc::new(PendingSlot::new());

        let outcome = monitor(store.clone(), channel.clone(), slot.clone())
            .check_and_alert()
            .await;

        assert_eq!(outcome, AlertOutcome::AlertDispatched { item_count: 1 });

        let sent = channel.sent().await;
        assert_eq!(sent.len(), 1, "exactly one alert message");
        assert_eq!(sent[0].0, APPROVER);
        assert!(sent[0].1.contains("*Bolt* is low."));
        assert!(sent[0].1.contains("Available: 50, Minimum required: 100"));
        assert!(sent[0].1.contains("Input 1.Accept 2.Reject"));

        let pending = slot.take().expect("pending request should exist");
        assert_eq!(pending.lines.len(), 1);
        assert_eq!(pending.lines[0].item_name, "Bolt");
        assert_eq!(pending.lines[0].delta_quantity, 100);
    }

    #[tokio::test]
    async fn threshold_is_embedded_in_the_query() {
        let store = Arc::new(InMemoryInventoryStore::default());
        let channel = Arc::new(RecordingMessageChannel::default());

        monitor(store.clone(), channel, Arc::new(PendingSlot::new()))
            .check_and_alert()
            .await;

        assert_eq!(
            store.executed_sql().await,
            vec![
                "SELECT name, stock_quantity FROM inventory WHERE stock_quantity <= 101"
                    .to_string()
            ]
        );
    }

    #[tokio::test]
    async fn sufficient_stock_sends_nothing_and_leaves_no_pending() {
        let store = Arc::new(InMemoryInventoryStore::default());
        let channel = Arc::new(RecordingMessageChannel::default());
        let slot = Arc::new(PendingSlot::new());

        let outcome = monitor(store, channel.clone(), slot.clone()).check_and_alert().await;

        assert_eq!(outcome, AlertOutcome::StockSufficient);
        assert!(channel.sent().await.is_empty());
        assert!(!slot.is_awaiting());
    }

    #[tokio::test]
    async fn query_failure_is_absorbed_without_messages() {
        let store =
            Arc::new(InMemoryInventoryStore::default().failing_execution("database gone"));
        let channel = Arc::new(RecordingMessageChannel::default());
        let slot = Arc::new(PendingSlot::new());

        let outcome = monitor(store, channel.clone(), slot.clone()).check_and_alert().await;

        assert_eq!(outcome, AlertOutcome::CheckFailed);
        assert!(channel.sent().await.is_empty());
        assert!(!slot.is_awaiting());
    }

    #[tokio::test]
    async fn send_failure_is_absorbed_and_logged() {
        let store = Arc::new(
            InMemoryInventoryStore::default().with_default_response(low_stock_rows()),
        );
        let channel = Arc::new(RecordingMessageChannel::failing(ChannelError::Transport(
            "offline".to_string(),
        )));
        let slot = Arc::new(PendingSlot::new());

        let outcome = monitor(store, channel, slot).check_and_alert().await;

        assert_eq!(outcome, AlertOutcome::CheckFailed);
    }

    #[tokio::test]
    async fn new_alert_overwrites_unresolved_pending_request() {
        let store = Arc::new(
            InMemoryInventoryStore::default().with_default_response(low_stock_rows()),
        );
        let channel = Arc::new(RecordingMessageChannel::default());
        let slot = Arc::new(PendingSlot::new());
        let monitor = monitor(store, channel, slot.clone());

        monitor.check_and_alert().await;
        monitor.check_and_alert().await;

        assert!(slot.take().is_some());
        assert!(slot.take().is_none(), "only the latest request lives in the slot");
    }
}
