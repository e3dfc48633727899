use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use leavebot_slack::api::MessageSender;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    sender: Arc<dyn MessageSender>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub outbound: HealthCheck,
    pub checked_at: String,
}

pub fn router(sender: Arc<dyn MessageSender>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { sender })
}

/// Always answers 200: without a bot token the webhook still acknowledges
/// events, it just cannot reply.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let outbound = outbound_check(state.sender.as_ref());
    let ready = outbound.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "leavebot-server accepting events".to_string(),
        },
        outbound,
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}

fn outbound_check(sender: &dyn MessageSender) -> HealthCheck {
    if sender.is_configured() {
        HealthCheck { status: "ready", detail: "slack bot token configured".to_string() }
    } else {
        HealthCheck {
            status: "degraded",
            detail: "slack bot token missing; replies will be skipped".to_string(),
        }
    }
}
