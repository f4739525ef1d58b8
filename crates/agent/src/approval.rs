use std::sync::Arc;

use tracing::{error, info};

use stocky_chat::channel::MessageChannel;
use stocky_core::restock::{ApprovalDecision, PendingSlot};

/// What the controller did with an inbound message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// A short code resolved the pending request.
    Resolved(ApprovalDecision),
    /// Not an approval reply; the message falls through to the query
    /// pipeline. Short codes are only reserved while a decision is awaited,
    /// so a user can still literally ask "1" when nothing is pending.
    NotConsumed,
}

/// Resolves the pending refill request from inbound short codes.
///
/// "1" accepts: the requester gets a confirmation and the rendered request
/// body is forwarded to the fulfillment channel. "2" rejects. Taking the
/// request out of the slot is atomic, so a concurrent monitor overwrite
/// either lands before the take (and is resolved) or installs a fresh
/// request afterwards.
pub struct ApprovalController {
    slot: Arc<PendingSlot>,
    channel: Arc<dyn MessageChannel>,
    requester: String,
    fulfillment: String,
}

impl ApprovalController {
    pub fn new(
        slot: Arc<PendingSlot>,
        channel: Arc<dyn MessageChannel>,
        requester: impl Into<String>,
        fulfillment: impl Into<String>,
    ) -> Self {
        Self {
            slot,
            channel,
            requester: requester.into(),
            fulfillment: fulfillment.into(),
        }
    }

    pub async fn handle(&self, text: &str) -> ApprovalOutcome {
        let Some(decision) = ApprovalDecision::from_short_code(text) else {
            return ApprovalOutcome::NotConsumed;
        };

        let Some(pending) = self.slot.take() else {
            return ApprovalOutcome::NotConsumed;
        };

        self.notify(&self.requester, decision.label()).await;
        if decision == ApprovalDecision::Accepted {
            self.notify(&self.fulfillment, &pending.body).await;
        }

        info!(decision = decision.label(), "refill request resolved");
        ApprovalOutcome::Resolved(decision)
    }

    /// Confirmation sends must not crash the process; failures are logged.
    async fn notify(&self, to: &str, body: &str) {
        if let Err(send_error) = self.channel.send(to, body).await {
            error!(error = %send_error, to, "failed to send approval notification");
        }
    }
}
