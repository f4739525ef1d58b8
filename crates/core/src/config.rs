use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub chat: ChatConfig,
    pub llm: LlmConfig,
    pub translation: TranslationConfig,
    pub alerts: AlertsConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

/// Messaging credentials and the three channel identities the restock flow
/// talks to: the requester who gets confirmations, the approver who receives
/// alerts and replies with a short code, and the fulfillment channel that
/// receives accepted refill requests.
#[derive(Clone, Debug)]
pub struct ChatConfig {
    pub account_sid: String,
    pub auth_token: SecretString,
    pub api_base_url: String,
    pub sender: String,
    pub requester: String,
    pub approver: String,
    pub fulfillment: String,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct TranslationConfig {
    /// Language replies are rewritten into.
    pub target_language: String,
    /// When the target equals this value, translation is skipped entirely.
    pub neutral_language: String,
}

#[derive(Clone, Debug)]
pub struct AlertsConfig {
    /// Rows with stock_quantity at or below this mark trigger an alert.
    pub low_stock_threshold: i64,
    /// Quoted to the approver as the minimum required quantity.
    pub minimum_quantity: i64,
    /// Fixed replenishment delta requested per low item.
    pub restock_delta: i64,
    /// Seconds between background checks; 0 disables the poller.
    pub poll_interval_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    Gemini,
    Ollama,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub llm_provider: Option<LlmProvider>,
    pub llm_model: Option<String>,
    pub chat_account_sid: Option<String>,
    pub chat_auth_token: Option<String>,
    pub chat_requester: Option<String>,
    pub chat_approver: Option<String>,
    pub chat_fulfillment: Option<String>,
    pub target_language: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://stocky.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            chat: ChatConfig {
                account_sid: String::new(),
                auth_token: String::new().into(),
                api_base_url: "https://api.twilio.com".to_string(),
                sender: "whatsapp:+14155238886".to_string(),
                requester: String::new(),
                approver: String::new(),
                fulfillment: String::new(),
            },
            llm: LlmConfig {
                provider: LlmProvider::Ollama,
                api_key: None,
                base_url: Some("http://localhost:11434".to_string()),
                model: "llama3.1".to_string(),
                timeout_secs: 30,
            },
            translation: TranslationConfig {
                target_language: "English".to_string(),
                neutral_language: "English".to_string(),
            },
            alerts: AlertsConfig {
                low_stock_threshold: 101,
                minimum_quantity: 100,
                restock_delta: 100,
                poll_interval_secs: 0,
            },
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), port: 3000 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected gemini|ollama)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("stocky.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(chat) = patch.chat {
            if let Some(account_sid) = chat.account_sid {
                self.chat.account_sid = account_sid;
            }
            if let Some(auth_token_value) = chat.auth_token {
                self.chat.auth_token = secret_value(auth_token_value);
            }
            if let Some(api_base_url) = chat.api_base_url {
                self.chat.api_base_url = api_base_url;
            }
            if let Some(sender) = chat.sender {
                self.chat.sender = sender;
            }
            if let Some(requester) = chat.requester {
                self.chat.requester = requester;
            }
            if let Some(approver) = chat.approver {
                self.chat.approver = approver;
            }
            if let Some(fulfillment) = chat.fulfillment {
                self.chat.fulfillment = fulfillment;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(translation) = patch.translation {
            if let Some(target_language) = translation.target_language {
                self.translation.target_language = target_language;
            }
            if let Some(neutral_language) = translation.neutral_language {
                self.translation.neutral_language = neutral_language;
            }
        }

        if let Some(alerts) = patch.alerts {
            if let Some(low_stock_threshold) = alerts.low_stock_threshold {
                self.alerts.low_stock_threshold = low_stock_threshold;
            }
            if let Some(minimum_quantity) = alerts.minimum_quantity {
                self.alerts.minimum_quantity = minimum_quantity;
            }
            if let Some(restock_delta) = alerts.restock_delta {
                self.alerts.restock_delta = restock_delta;
            }
            if let Some(poll_interval_secs) = alerts.poll_interval_secs {
                self.alerts.poll_interval_secs = poll_interval_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("STOCKY_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("STOCKY_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("STOCKY_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("STOCKY_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("STOCKY_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("STOCKY_CHAT_ACCOUNT_SID") {
            self.chat.account_sid = value;
        }
        if let Some(value) = read_env("STOCKY_CHAT_AUTH_TOKEN") {
            self.chat.auth_token = secret_value(value);
        }
        if let Some(value) = read_env("STOCKY_CHAT_API_BASE_URL") {
            self.chat.api_base_url = value;
        }
        if let Some(value) = read_env("STOCKY_CHAT_SENDER") {
            self.chat.sender = value;
        }
        if let Some(value) = read_env("STOCKY_CHAT_REQUESTER") {
            self.chat.requester = value;
        }
        if let Some(value) = read_env("STOCKY_CHAT_APPROVER") {
            self.chat.approver = value;
        }
        if let Some(value) = read_env("STOCKY_CHAT_FULFILLMENT") {
            self.chat.fulfillment = value;
        }

        if let Some(value) = read_env("STOCKY_LLM_PROVIDER") {
            self.llm.provider = value.parse()?;
        }
        if let Some(value) = read_env("STOCKY_LLM_API_KEY") {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("STOCKY_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = read_env("STOCKY_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("STOCKY_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("STOCKY_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("STOCKY_TRANSLATION_TARGET_LANGUAGE") {
            self.translation.target_language = value;
        }
        if let Some(value) = read_env("STOCKY_TRANSLATION_NEUTRAL_LANGUAGE") {
            self.translation.neutral_language = value;
        }

        if let Some(value) = read_env("STOCKY_ALERTS_LOW_STOCK_THRESHOLD") {
            self.alerts.low_stock_threshold =
                parse_i64("STOCKY_ALERTS_LOW_STOCK_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("STOCKY_ALERTS_MINIMUM_QUANTITY") {
            self.alerts.minimum_quantity = parse_i64("STOCKY_ALERTS_MINIMUM_QUANTITY", &value)?;
        }
        if let Some(value) = read_env("STOCKY_ALERTS_RESTOCK_DELTA") {
            self.alerts.restock_delta = parse_i64("STOCKY_ALERTS_RESTOCK_DELTA", &value)?;
        }
        if let Some(value) = read_env("STOCKY_ALERTS_POLL_INTERVAL_SECS") {
            self.alerts.poll_interval_secs =
                parse_u64("STOCKY_ALERTS_POLL_INTERVAL_SECS", &value)?;
        }

        if let Some(value) = read_env("STOCKY_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("STOCKY_SERVER_PORT") {
            self.server.port = parse_u16("STOCKY_SERVER_PORT", &value)?;
        }

        let log_level = read_env("STOCKY_LOGGING_LEVEL").or_else(|| read_env("STOCKY_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("STOCKY_LOGGING_FORMAT").or_else(|| read_env("STOCKY_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(llm_provider) = overrides.llm_provider {
            self.llm.provider = llm_provider;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(account_sid) = overrides.chat_account_sid {
            self.chat.account_sid = account_sid;
        }
        if let Some(auth_token) = overrides.chat_auth_token {
            self.chat.auth_token = secret_value(auth_token);
        }
        if let Some(requester) = overrides.chat_requester {
            self.chat.requester = requester;
        }
        if let Some(approver) = overrides.chat_approver {
            self.chat.approver = approver;
        }
        if let Some(fulfillment) = overrides.chat_fulfillment {
            self.chat.fulfillment = fulfillment;
        }
        if let Some(target_language) = overrides.target_language {
            self.translation.target_language = target_language;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_chat(&self.chat)?;
        validate_llm(&self.llm)?;
        validate_translation(&self.translation)?;
        validate_alerts(&self.alerts)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("stocky.toml"), PathBuf::from("config/stocky.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_chat(chat: &ChatConfig) -> Result<(), ConfigError> {
    if chat.account_sid.is_empty() {
        return Err(ConfigError::Validation(
            "chat.account_sid is required. Get it from the Twilio console".to_string(),
        ));
    }
    if !chat.account_sid.starts_with("AC") {
        return Err(ConfigError::Validation(
            "chat.account_sid must start with `AC`. Get it from the Twilio console".to_string(),
        ));
    }

    if chat.auth_token.expose_secret().is_empty() {
        return Err(ConfigError::Validation(
            "chat.auth_token is required. Get it from the Twilio console".to_string(),
        ));
    }

    if !chat.api_base_url.starts_with("http://") && !chat.api_base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "chat.api_base_url must start with http:// or https://".to_string(),
        ));
    }

    for (field, value) in [
        ("chat.sender", &chat.sender),
        ("chat.requester", &chat.requester),
        ("chat.approver", &chat.approver),
        ("chat.fulfillment", &chat.fulfillment),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{field} is required")));
        }
        if !value.starts_with("whatsapp:") {
            return Err(ConfigError::Validation(format!(
                "{field} must be a full channel address like `whatsapp:+14155238886`"
            )));
        }
    }

    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    match llm.provider {
        LlmProvider::Gemini => {
            let missing = llm
                .api_key
                .as_ref()
                .map(|value| value.expose_secret().trim().is_empty())
                .unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "llm.api_key is required for the gemini provider".to_string(),
                ));
            }
        }
        LlmProvider::Ollama => {
            let missing =
                llm.base_url.as_ref().map(|value| value.trim().is_empty()).unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "llm.base_url is required for the ollama provider".to_string(),
                ));
            }
        }
    }

    Ok(())
}

fn validate_translation(translation: &TranslationConfig) -> Result<(), ConfigError> {
    if translation.target_language.trim().is_empty() {
        return Err(ConfigError::Validation(
            "translation.target_language must not be empty".to_string(),
        ));
    }
    if translation.neutral_language.trim().is_empty() {
        return Err(ConfigError::Validation(
            "translation.neutral_language must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_alerts(alerts: &AlertsConfig) -> Result<(), ConfigError> {
    if alerts.low_stock_threshold < 0 {
        return Err(ConfigError::Validation(
            "alerts.low_stock_threshold must not be negative".to_string(),
        ));
    }
    if alerts.minimum_quantity <= 0 {
        return Err(ConfigError::Validation(
            "alerts.minimum_quantity must be greater than zero".to_string(),
        ));
    }
    if alerts.restock_delta <= 0 {
        return Err(ConfigError::Validation(
            "alerts.restock_delta must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation(
            "server.port must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_i64(key: &str, value: &str) -> Result<i64, ConfigError> {
    value.parse::<i64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    chat: Option<ChatPatch>,
    llm: Option<LlmPatch>,
    translation: Option<TranslationPatch>,
    alerts: Option<AlertsPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatPatch {
    account_sid: Option<String>,
    auth_token: Option<String>,
    api_base_url: Option<String>,
    sender: Option<String>,
    requester: Option<String>,
    approver: Option<String>,
    fulfillment: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct TranslationPatch {
    target_language: Option<String>,
    neutral_language: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AlertsPatch {
    low_stock_threshold: Option<i64>,
    minimum_quantity: Option<i64>,
    restock_delta: Option<i64>,
    poll_interval_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
