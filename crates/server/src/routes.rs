use std::sync::Arc;

use axum::{
    extract::{Form, State},
    http::header,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use tracing::info;
use uuid::Uuid;

use stocky_agent::{AlertOutcome, ApprovalController, ApprovalOutcome, QueryPipeline, StockAlertMonitor};
use stocky_chat::webhook::{empty_reply, message_reply, InboundMessage};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<QueryPipeline>,
    pub monitor: Arc<StockAlertMonitor>,
    pub controller: Arc<ApprovalController>,
    /// One chat event is processed end-to-end before the next starts.
    pub inbound_serial: Arc<tokio::sync::Mutex<()>>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook/inbound", post(inbound_message))
        .route("/alerts/check", post(check_alerts))
        .with_state(state)
}

/// One inbound chat message. The approval controller gets first refusal;
/// anything it does not consume runs through the query pipeline. The reply is
/// synchronous TwiML either way.
pub async fn inbound_message(
    State(state): State<AppState>,
    Form(message): Form<InboundMessage>,
) -> impl IntoResponse {
    let correlation_id = Uuid::new_v4();
    info!(
        event_name = "ingress.chat.message_received",
        correlation_id = %correlation_id,
        from = %message.from,
        "inbound chat message"
    );

    let _serial = state.inbound_serial.lock().await;

    let twiml = match state.controller.handle(&message.body).await {
        ApprovalOutcome::Resolved(decision) => {
            info!(
                event_name = "ingress.chat.approval_resolved",
                correlation_id = %correlation_id,
                decision = decision.label(),
                "approval short code consumed"
            );
            empty_reply()
        }
        ApprovalOutcome::NotConsumed => {
            let reply = state.pipeline.handle(&message.body).await;
            message_reply(&reply)
        }
    };

    ([(header::CONTENT_TYPE, "text/xml")], twiml)
}

/// Direct trigger for the stock check. Always answers with the explicit
/// outcome; monitor failures are absorbed and reported as `check_failed`.
pub async fn check_alerts(State(state): State<AppState>) -> Json<AlertOutcome> {
    Json(state.monitor.check_and_alert().await)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use async_trait::async_trait;
    use axum::extract::{Form, State};
    use axum::response::IntoResponse;
    use axum::Json;
    use serde_json::json;

    use stocky_agent::{
        ApprovalController, QueryPipeline, StockAlertMonitor, TextCompleter,
    };
    use stocky_chat::channel::RecordingMessageChannel;
    use stocky_chat::webhook::InboundMessage;
    use stocky_core::config::{AlertsConfig, TranslationConfig};
    use stocky_core::restock::{PendingRefillRequest, PendingSlot, RefillLine};
    use stocky_core::rows::{QueryResultSet, Row};
    use stocky_core::schema::{ColumnInfo, TableInfo};
    use stocky_db::InMemoryInventoryStore;

    use super::{check_alerts, inbound_message, AppState};

    struct StaticCompleter(&'static str);

    #[async_trait]
    impl TextCompleter for StaticCompleter {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn state(
        store: Arc<InMemoryInventoryStore>,
        channel: Arc<RecordingMessageChannel>,
        slot: Arc<PendingSlot>,
        completer_sql: &'static str,
    ) -> AppState {
        let translation = TranslationConfig {
            target_language: "English".to_string(),
            neutral_language: "English".to_string(),
        };
        let alerts = AlertsConfig {
            low_stock_threshold: 101,
            minimum_quantity: 100,
            restock_delta: 100,
            poll_interval_secs: 0,
        };

        AppState {
            pipeline: Arc::new(QueryPipeline::new(
                store.clone(),
                store.clone(),
                Arc::new(StaticCompleter(completer_sql)),
                &translation,
            )),
            monitor: Arc::new(StockAlertMonitor::new(
                store,
                channel.clone(),
                slot.clone(),
                alerts,
                "whatsapp:+912222222222",
            )),
            controller: Arc::new(ApprovalController::new(
                slot,
                channel,
                "whatsapp:+911111111111",
                "whatsapp:+913333333333",
            )),
            inbound_serial: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    fn inventory_store() -> InMemoryInventoryStore {
        InMemoryInventoryStore::with_tables(vec![TableInfo {
            name: "inventory".to_string(),
            columns: vec![ColumnInfo {
                name: "name".to_string(),
                data_type: "text".to_string(),
            }],
        }])
    }

    async fn body_text(response: impl IntoResponse) -> String {
        let response = response.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should collect");
        String::from_utf8(bytes.to_vec()).expect("body should be utf-8")
    }

    #[tokio::test]
    async fn ordinary_question_flows_through_the_pipeline() {
        let store = Arc::new(inventory_store().with_default_response(QueryResultSet::new(
            vec![Row::new(vec![("name".to_string(), json!("Widget"))])],
        )));
        let channel = Arc::new(RecordingMessageChannel::default());
        let state = state(store, channel, Arc::new(PendingSlot::new()), "SELECT name FROM inventory");

        let body = body_text(
            inbound_message(
                State(state),
                Form(InboundMessage {
                    from: "whatsapp:+911111111111".to_string(),
                    body: "what is in stock".to_string(),
                }),
            )
            .await,
        )
        .await;

        assert!(body.contains("<Message>"));
        assert!(body.contains("name: Widget"));
    }

    #[tokio::test]
    async fn approval_code_with_pending_request_returns_empty_twiml() {
        let store = Arc::new(inventory_store());
        let channel = Arc::new(RecordingMessageChannel::default());
        let slot = Arc::new(PendingSlot::new());
        slot.replace(PendingRefillRequest::new(vec![RefillLine {
            item_name: "Widget".to_string(),
            delta_quantity: 100,
        }]));
        let state = state(store, channel.clone(), slot, "SELECT name FROM inventory");

        let body = body_text(
            inbound_message(
                State(state),
                Form(InboundMessage {
                    from: "whatsapp:+912222222222".to_string(),
                    body: "1".to_string(),
                }),
            )
            .await,
        )
        .await;

        assert!(!body.contains("<Message>"), "consumed code answers with empty TwiML");
        assert_eq!(channel.sent().await.len(), 2, "confirmation and forward were sent");
    }

    #[tokio::test]
    async fn approval_code_without_pending_request_is_answered_by_the_pipeline() {
        let store = Arc::new(
            inventory_store().with_default_response(QueryResultSet::default()),
        );
        let channel = Arc::new(RecordingMessageChannel::default());
        let state = state(store, channel.clone(), Arc::new(PendingSlot::new()), "SELECT 1");

        let body = body_text(
            inbound_message(
                State(state),
                Form(InboundMessage {
                    from: "whatsapp:+911111111111".to_string(),
                    body: "1".to_string(),
                }),
            )
            .await,
        )
        .await;

        assert!(body.contains("<Message>"), "stale code falls through to the pipeline");
        assert!(channel.sent().await.is_empty());
    }

    #[tokio::test]
    async fn alert_trigger_reports_explicit_outcome() {
        let store = Arc::new(inventory_store().with_default_response(QueryResultSet::new(
            vec![Row::new(vec![
                ("name".to_string(), json!("Bolt")),
                ("stock_quantity".to_string(), json!(50)),
            ])],
        )));
        let channel = Arc::new(RecordingMessageChannel::default());
        let state = state(store, channel, Arc::new(PendingSlot::new()), "SELECT 1");

        let Json(outcome) = check_alerts(State(state)).await;

        assert_eq!(
            serde_json::to_value(outcome).expect("serialize"),
            json!({ "status": "alert_dispatched", "item_count": 1 })
        );
    }
}
