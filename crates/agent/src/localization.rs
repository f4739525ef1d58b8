use std::sync::Arc;

use tracing::warn;

use stocky_core::config::TranslationConfig;

use crate::llm::TextCompleter;

/// Rewrites final reply text into the configured target language.
///
/// When the target equals the neutral language the text passes through
/// untouched. A completer failure falls back to the untranslated text: a
/// reply in the wrong language beats no reply.
pub struct ReplyLocalizer {
    completer: Arc<dyn TextCompleter>,
    target_language: String,
    neutral_language: String,
}

impl ReplyLocalizer {
    pub fn new(completer: Arc<dyn TextCompleter>, config: &TranslationConfig) -> Self {
        Self {
            completer,
            target_language: config.target_language.clone(),
            neutral_language: config.neutral_language.clone(),
        }
    }

    pub async fn localize(&self, text: &str) -> String {
        if self.is_passthrough() {
            return text.to_string();
        }

        let prompt = build_prompt(&self.target_language, text);
        match self.completer.complete(&prompt).await {
            Ok(translated) => translated.trim().to_string(),
            Err(error) => {
                warn!(
                    error = %error,
                    target_language = %self.target_language,
                    "translation failed; replying untranslated"
                );
                text.to_string()
            }
        }
    }

    fn is_passthrough(&self) -> bool {
        self.target_language.trim().eq_ignore_ascii_case(self.neutral_language.trim())
    }
}

fn build_prompt(target_language: &str, text: &str) -> String {
    format!(
        "Translate the following message into {target_language}:\n\
         \n\
         \"{text}\"\n\
         \n\
         Return only the translated text without any extra comments or formatting."
    )
}
