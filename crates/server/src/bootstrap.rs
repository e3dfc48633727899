use std::sync::Arc;

use axum::Router;
use leavebot_core::config::{AppConfig, ConfigError};
use leavebot_slack::{
    api::{MessageSender, SlackApiError, SlackWebClient},
    events::default_dispatcher,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::{health, webhook};

pub struct Application {
    pub config: AppConfig,
    pub sender: Arc<dyn MessageSender>,
    pub webhook: webhook::WebhookState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("slack http client setup failed: {0}")]
    SlackClient(#[source] SlackApiError),
}

impl Application {
    /// Webhook and health routes on a single listener.
    pub fn router(&self) -> Router {
        webhook::router(self.webhook.clone()).merge(health::router(self.sender.clone()))
    }
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let client = SlackWebClient::from_config(&config.slack).map_err(BootstrapError::SlackClient)?;
    if !client.is_configured() {
        warn!(
            event_name = "system.bootstrap.bot_token_missing",
            correlation_id = "bootstrap",
            "slack bot token not configured; events will be acknowledged without replies"
        );
    }
    if config.slack.signing_secret.is_none() {
        info!(
            event_name = "system.bootstrap.signature_check_disabled",
            correlation_id = "bootstrap",
            "no signing secret configured; request signatures are not verified"
        );
    }

    let sender: Arc<dyn MessageSender> = Arc::new(client);
    let dispatcher = default_dispatcher(config.forms.link.clone());
    info!(
        event_name = "system.bootstrap.dispatcher_ready",
        correlation_id = "bootstrap",
        handlers = dispatcher.handler_count(),
        form_link = %config.forms.link,
        "event dispatcher initialized"
    );

    let webhook =
        webhook::WebhookState::new(dispatcher, sender.clone(), config.slack.signing_secret.clone());

    Ok(Application { config, sender, webhook })
}
