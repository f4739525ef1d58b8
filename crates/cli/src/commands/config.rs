use secrecy::ExposeSecret;
use stocky_core::config::{AppConfig, LoadOptions};

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let lines = vec![
        "effective config (source precedence: overrides > env > file > default):".to_string(),
        format!("database.url = {}", config.database.url),
        format!("database.max_connections = {}", config.database.max_connections),
        format!("database.timeout_secs = {}", config.database.timeout_secs),
        format!("chat.account_sid = {}", redact(&config.chat.account_sid)),
        format!("chat.auth_token = {}", redact(config.chat.auth_token.expose_secret())),
        format!("chat.api_base_url = {}", config.chat.api_base_url),
        format!("chat.sender = {}", config.chat.sender),
        format!("chat.requester = {}", config.chat.requester),
        format!("chat.approver = {}", config.chat.approver),
        format!("chat.fulfillment = {}", config.chat.fulfillment),
        format!("llm.provider = {:?}", config.llm.provider),
        format!(
            "llm.api_key = {}",
            config
                .llm
                .api_key
                .as_ref()
                .map(|key| redact(key.expose_secret()))
                .unwrap_or_else(|| "(unset)".to_string())
        ),
        format!(
            "llm.base_url = {}",
            config.llm.base_url.as_deref().unwrap_or("(unset)")
        ),
        format!("llm.model = {}", config.llm.model),
        format!("llm.timeout_secs = {}", config.llm.timeout_secs),
        format!("translation.target_language = {}", config.translation.target_language),
        format!("translation.neutral_language = {}", config.translation.neutral_language),
        format!("alerts.low_stock_threshold = {}", config.alerts.low_stock_threshold),
        format!("alerts.minimum_quantity = {}", config.alerts.minimum_quantity),
        format!("alerts.restock_delta = {}", config.alerts.restock_delta),
        format!("alerts.poll_interval_secs = {}", config.alerts.poll_interval_secs),
        format!("server.bind_address = {}", config.server.bind_address),
        format!("server.port = {}", config.server.port),
        format!("logging.level = {}", config.logging.level),
        format!("logging.format = {:?}", config.logging.format),
    ];

    lines.join("\n")
}

fn redact(value: &str) -> String {
    if value.is_empty() {
        return "(unset)".to_string();
    }
    let visible: String = value.chars().take(4).collect();
    format!("{visible}****")
}

#[cfg(test)]
mod tests {
    use super::redact;

    #[test]
    fn redaction_keeps_a_short_prefix_only() {
        assert_eq!(redact("ACsecretsecret"), "ACse****");
        assert_eq!(redact(""), "(unset)");
    }
}
