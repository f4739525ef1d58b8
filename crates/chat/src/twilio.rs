use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use stocky_core::config::ChatConfig;

use crate::channel::{ChannelError, MessageChannel};

const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Twilio Messages API sender.
pub struct TwilioMessageChannel {
    client: reqwest::Client,
    api_base_url: String,
    account_sid: String,
    auth_token: SecretString,
    sender: String,
}

impl TwilioMessageChannel {
    pub fn from_config(config: &ChatConfig) -> Result<Self, ChannelError> {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(|error| ChannelError::Transport(error.to_string()))?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            sender: config.sender.clone(),
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/2010-04-01/Accounts/{}/Messages.json", self.api_base_url, self.account_sid)
    }
}

#[async_trait]
impl MessageChannel for TwilioMessageChannel {
    async fn send(&self, to: &str, body: &str) -> Result<(), ChannelError> {
        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&[("From", self.sender.as_str()), ("To", to), ("Body", body)])
            .send()
            .await
            .map_err(|error| ChannelError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ChannelError::Api { status: status.as_u16(), detail });
        }

        debug!(to, bytes = body.len(), "chat message sent");
        Ok(())
    }
}
