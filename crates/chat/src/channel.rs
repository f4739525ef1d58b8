use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("message transport failed: {0}")]
    Transport(String),
    #[error("message API rejected the send with status {status}: {detail}")]
    Api { status: u16, detail: String },
}

/// Outbound messaging capability.
///
/// `to` is a full channel address (for example `whatsapp:+14155238886`).
#[async_trait]
pub trait MessageChannel: Send + Sync {
    async fn send(&self, to: &str, body: &str) -> Result<(), ChannelError>;
}

/// Discards every send. Default wiring until real credentials exist.
#[derive(Default)]
pub struct NoopMessageChannel;

#[async_trait]
impl MessageChannel for NoopMessageChannel {
    async fn send(&self, _to: &str, _body: &str) -> Result<(), ChannelError> {
        Ok(())
    }
}

/// Records every send for assertions. Optionally fails each send to exercise
/// the swallow-and-log paths of the alert and approval flows.
#[derive(Default)]
pub struct RecordingMessageChannel {
    sent: Mutex<Vec<(String, String)>>,
    failure: Option<ChannelError>,
}

impl RecordingMessageChannel {
    pub fn failing(error: ChannelError) -> Self {
        Self { sent: Mutex::default(), failure: Some(error) }
    }

    /// Messages sent so far as `(to, body)` pairs, in send order.
    pub async fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl MessageChannel for RecordingMessageChannel {
    async fn send(&self, to: &str, body: &str) -> Result<(), ChannelError> {
        self.sent.lock().await.push((to.to_string(), body.to_string()));
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}
