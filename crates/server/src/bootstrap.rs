use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use stocky_agent::{ApprovalController, HttpTextCompleter, QueryPipeline, StockAlertMonitor};
use stocky_chat::channel::ChannelError;
use stocky_chat::TwilioMessageChannel;
use stocky_core::config::{AppConfig, ConfigError, LoadOptions};
use stocky_core::restock::PendingSlot;
use stocky_db::{connect_with_settings, DbPool, SqlInventoryStore};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub pipeline: Arc<QueryPipeline>,
    pub monitor: Arc<StockAlertMonitor>,
    pub controller: Arc<ApprovalController>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("completer client setup failed: {0}")]
    Completer(String),
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    let store = Arc::new(SqlInventoryStore::new(db_pool.clone()));
    let completer = Arc::new(
        HttpTextCompleter::from_config(&config.llm)
            .map_err(|error| BootstrapError::Completer(error.to_string()))?,
    );
    let channel = Arc::new(TwilioMessageChannel::from_config(&config.chat)?);
    let slot = Arc::new(PendingSlot::new());

    let pipeline = Arc::new(QueryPipeline::new(
        store.clone(),
        store.clone(),
        completer,
        &config.translation,
    ));
    let monitor = Arc::new(StockAlertMonitor::new(
        store,
        channel.clone(),
        slot.clone(),
        config.alerts.clone(),
        config.chat.approver.clone(),
    ));
    let controller = Arc::new(ApprovalController::new(
        slot,
        channel,
        config.chat.requester.clone(),
        config.chat.fulfillment.clone(),
    ));

    info!(event_name = "system.bootstrap.ready", "application wiring complete");
    Ok(Application { config, db_pool, pipeline, monitor, controller })
}
