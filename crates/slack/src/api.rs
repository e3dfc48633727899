use std::time::Duration;

use async_trait::async_trait;
use leavebot_core::config::SlackConfig;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::events::Reply;

#[derive(Debug, Error)]
pub enum SlackApiError {
    #[error("slack bot token is not configured")]
    MissingToken,
    #[error("slack api request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("slack api `{method}` returned http status {status}")]
    Status { method: &'static str, status: u16 },
    #[error("slack api `{method}` rejected the call: {error}")]
    Api { method: &'static str, error: String },
}

impl SlackApiError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::MissingToken => "missing_token",
            Self::Transport(_) => "transport",
            Self::Status { .. } => "http_status",
            Self::Api { .. } => "api",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PostMessageRequest<'a> {
    pub channel: &'a str,
    pub text: &'a str,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostedMessage {
    pub channel: Option<String>,
    pub ts: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    ts: Option<String>,
}

/// Outbound side of the bot: anything that can post a message to a channel.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn post_message(&self, channel: &str, text: &str)
        -> Result<PostedMessage, SlackApiError>;

    /// Whether a send can be attempted at all (credentials present).
    fn is_configured(&self) -> bool {
        true
    }
}

pub struct SlackWebClient {
    http: Client,
    base_url: String,
    bot_token: Option<SecretString>,
}

impl SlackWebClient {
    pub const POST_MESSAGE: &'static str = "chat.postMessage";

    pub fn new(
        base_url: impl Into<String>,
        bot_token: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, SlackApiError> {
        let http = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Ok(Self { http, base_url, bot_token })
    }

    pub fn from_config(config: &SlackConfig) -> Result<Self, SlackApiError> {
        Self::new(
            config.api_base_url.clone(),
            config.bot_token.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn token(&self) -> Option<&str> {
        self.bot_token
            .as_ref()
            .map(|token| token.expose_secret())
            .filter(|token| !token.trim().is_empty())
    }
}

#[async_trait]
impl MessageSender for SlackWebClient {
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
    ) -> Result<PostedMessage, SlackApiError> {
        let token = self.token().ok_or(SlackApiError::MissingToken)?;
        let method = Self::POST_MESSAGE;

        let response = self
            .http
            .post(format!("{}/{method}", self.base_url))
            .bearer_auth(token)
            .json(&PostMessageRequest { channel, text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SlackApiError::Status { method, status: status.as_u16() });
        }

        let body: ApiResponse = response.json().await?;
        if !body.ok {
            return Err(SlackApiError::Api {
                method,
                error: body.error.unwrap_or_else(|| "unknown_error".to_owned()),
            });
        }

        Ok(PostedMessage { channel: body.channel, ts: body.ts })
    }

    fn is_configured(&self) -> bool {
        self.token().is_some()
    }
}

/// Posts `reply` and logs the outcome. Failures are not retried.
pub async fn deliver_reply(sender: &dyn MessageSender, reply: &Reply, correlation_id: &str) -> bool {
    match sender.post_message(&reply.channel_id, &reply.text).await {
        Ok(posted) => {
            info!(
                event_name = "egress.slack.reply_sent",
                correlation_id,
                channel = %reply.channel_id,
                category = %reply.category,
                ts = posted.ts.as_deref().unwrap_or("unknown"),
                "reply posted"
            );
            true
        }
        Err(SlackApiError::MissingToken) => {
            error!(
                event_name = "egress.slack.reply_skipped",
                correlation_id,
                channel = %reply.channel_id,
                "slack bot token not configured; reply not sent"
            );
            false
        }
        Err(failure) => {
            warn!(
                event_name = "egress.slack.reply_failed",
                correlation_id,
                channel = %reply.channel_id,
                error_class = failure.error_class(),
                error = %failure,
                "failed to post reply"
            );
            false
        }
    }
}
