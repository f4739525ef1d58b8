use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

use stocky_core::config::{LlmConfig, LlmProvider};

#[async_trait]
pub trait TextCompleter: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

const GEMINI_DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Single-shot completion client over the configured provider's REST API.
pub struct HttpTextCompleter {
    client: reqwest::Client,
    provider: LlmProvider,
    api_key: Option<SecretString>,
    base_url: String,
    model: String,
}

impl HttpTextCompleter {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build completer HTTP client")?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| GEMINI_DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            provider: config.provider,
            api_key: config.api_key.clone(),
            base_url,
            model: config.model.clone(),
        })
    }

    async fn complete_gemini(&self, prompt: &str) -> Result<String> {
        #[derive(Deserialize)]
        struct GenerateResponse {
            #[serde(default)]
            candidates: Vec<Candidate>,
        }
        #[derive(Deserialize)]
        struct Candidate {
            content: CandidateContent,
        }
        #[derive(Deserialize)]
        struct CandidateContent {
            #[serde(default)]
            parts: Vec<CandidatePart>,
        }
        #[derive(Deserialize)]
        struct CandidatePart {
            #[serde(default)]
            text: String,
        }

        let api_key = self.api_key.as_ref().context("gemini provider requires an api key")?;
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key.expose_secret())
            .json(&json!({ "contents": [{ "parts": [{ "text": prompt }] }] }))
            .send()
            .await
            .context("completer request failed")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            bail!("completer returned status {status}: {detail}");
        }

        let payload: GenerateResponse =
            response.json().await.context("completer response was not valid JSON")?;
        let text: String = payload
            .candidates
            .first()
            .map(|candidate| {
                candidate.content.parts.iter().map(|part| part.text.as_str()).collect()
            })
            .unwrap_or_default();

        if text.is_empty() {
            bail!("completer returned no candidates");
        }
        Ok(text)
    }

    async fn complete_ollama(&self, prompt: &str) -> Result<String> {
        #[derive(Deserialize)]
        struct GenerateResponse {
            #[serde(default)]
            response: String,
        }

        let url = format!("{}/api/generate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "model": self.model, "prompt": prompt, "stream": false }))
            .send()
            .await
            .context("completer request failed")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            bail!("completer returned status {status}: {detail}");
        }

        let payload: GenerateResponse =
            response.json().await.context("completer response was not valid JSON")?;
        Ok(payload.response)
    }
}

#[async_trait]
impl TextCompleter for HttpTextCompleter {
    async fn complete(&self, prompt: &str) -> Result<String> {
        match self.provider {
            LlmProvider::Gemini => self.complete_gemini(prompt).await,
            LlmProvider::Ollama => self.complete_ollama(prompt).await,
        }
    }
}
