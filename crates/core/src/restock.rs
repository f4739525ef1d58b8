use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

/// One requested replenishment line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefillLine {
    pub item_name: String,
    pub delta_quantity: i64,
}

/// The refill request awaiting an approve/reject decision.
///
/// At most one lives at a time. A new alert overwrites an unresolved request;
/// last alert wins.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRefillRequest {
    pub lines: Vec<RefillLine>,
    pub body: String,
}

impl PendingRefillRequest {
    pub fn new(lines: Vec<RefillLine>) -> Self {
        let mut body = String::from("Refill Request\n");
        for line in &lines {
            body.push_str(&format!("*{} quantity +{}*\n", line.item_name, line.delta_quantity));
        }
        Self { lines, body }
    }
}

/// Outcome of an inbound approval short code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    Accepted,
    Rejected,
}

impl ApprovalDecision {
    /// Parses the reserved one-character reply codes.
    pub fn from_short_code(text: &str) -> Option<Self> {
        match text.trim() {
            "1" => Some(Self::Accepted),
            "2" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Accepted => "Accepted",
            Self::Rejected => "Rejected",
        }
    }
}

/// Process-wide single slot for the pending refill request.
///
/// The alert monitor and the approval controller run concurrently; `replace`
/// and `take` are atomic swap-and-check operations so a monitor overwrite
/// cannot interleave with a controller mid-resolution.
#[derive(Debug, Default)]
pub struct PendingSlot {
    inner: Mutex<Option<PendingRefillRequest>>,
}

impl PendingSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a new pending request, returning any displaced one.
    pub fn replace(&self, request: PendingRefillRequest) -> Option<PendingRefillRequest> {
        self.guard().replace(request)
    }

    /// Consumes the pending request, if any. The caller that receives
    /// `Some` owns the resolution.
    pub fn take(&self) -> Option<PendingRefillRequest> {
        self.guard().take()
    }

    /// True while a decision is awaited.
    pub fn is_awaiting(&self) -> bool {
        self.guard().is_some()
    }

    fn guard(&self) -> MutexGuard<'_, Option<PendingRefillRequest>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            // A panic while holding the lock cannot corrupt an Option swap.
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
