use std::env;
use std::fs;
use std::path::Path;

use leavebot_core::config::{resolve_config_path, AppConfig, LoadOptions};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

use crate::commands::CommandResult;

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            )
        }
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "slack.bot_token",
        &redact_secret(config.slack.bot_token.as_ref()),
        source("slack.bot_token", &["LEAVEBOT_SLACK_BOT_TOKEN", "SLACK_BOT_TOKEN"]),
    ));
    let signing_secret =
        if config.slack.signing_secret.is_some() { "<redacted>" } else { "<unset>" };
    lines.push(render_line(
        "slack.signing_secret",
        signing_secret,
        source("slack.signing_secret", &["LEAVEBOT_SLACK_SIGNING_SECRET", "SLACK_SIGNING_SECRET"]),
    ));
    lines.push(render_line(
        "slack.api_base_url",
        &config.slack.api_base_url,
        source("slack.api_base_url", &["LEAVEBOT_SLACK_API_BASE_URL"]),
    ));
    lines.push(render_line(
        "slack.timeout_secs",
        &config.slack.timeout_secs.to_string(),
        source("slack.timeout_secs", &["LEAVEBOT_SLACK_TIMEOUT_SECS"]),
    ));

    lines.push(render_line(
        "forms.link",
        &config.forms.link,
        source("forms.link", &["LEAVEBOT_FORM_LINK", "FORM_LINK"]),
    ));

    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        source("server.bind_address", &["LEAVEBOT_SERVER_BIND_ADDRESS"]),
    ));
    lines.push(render_line(
        "server.port",
        &config.server.port.to_string(),
        source("server.port", &["LEAVEBOT_SERVER_PORT", "PORT"]),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["LEAVEBOT_LOGGING_LEVEL", "LEAVEBOT_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["LEAVEBOT_LOGGING_FORMAT", "LEAVEBOT_LOG_FORMAT"]),
    ));

    CommandResult::success("config", lines.join("\n"))
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let from_env = env_keys
        .iter()
        .find(|key| env::var(key).is_ok_and(|value| !value.trim().is_empty()));
    if let Some(env_key) = from_env {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_secret(secret: Option<&SecretString>) -> String {
    match secret {
        Some(secret) => redact_token(secret.expose_secret()),
        None => "<unset>".to_string(),
    }
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
