//! Events API endpoint.
//!
//! - `GET  /` - liveness text
//! - `POST /` - URL verification challenge or event delivery
//!
//! Event deliveries are acknowledged with an empty 200 before the reply is
//! posted; the outbound call runs on its own task.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use leavebot_core::errors::InterfaceError;
use leavebot_slack::{
    api::{deliver_reply, MessageSender},
    events::{EventContext, EventDispatcher, EventEnvelope, HandlerResult},
    signature::{self, SIGNATURE_HEADER, TIMESTAMP_HEADER},
};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const LIVENESS_TEXT: &str = "Slack Leave Bot is running!";

#[derive(Clone)]
pub struct WebhookState {
    dispatcher: Arc<EventDispatcher>,
    sender: Arc<dyn MessageSender>,
    signing_secret: Option<SecretString>,
}

impl WebhookState {
    pub fn new(
        dispatcher: EventDispatcher,
        sender: Arc<dyn MessageSender>,
        signing_secret: Option<SecretString>,
    ) -> Self {
        Self { dispatcher: Arc::new(dispatcher), sender, signing_secret }
    }

    pub fn has_signing_secret(&self) -> bool {
        self.signing_secret.is_some()
    }
}

pub fn router(state: WebhookState) -> Router {
    Router::new().route("/", get(liveness).post(receive_event)).with_state(state)
}

pub async fn liveness() -> &'static str {
    LIVENESS_TEXT
}

pub async fn receive_event(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request_id = format!("req-{}", Uuid::new_v4().simple());

    if let Some(secret) = &state.signing_secret {
        if let Err(rejection) = check_signature(secret, &headers, &body, &request_id) {
            return reject(rejection);
        }
    }

    let envelope = match EventEnvelope::parse(&body) {
        Ok(envelope) => envelope,
        Err(error) => {
            return reject(InterfaceError::bad_request(
                format!("request body is not valid json: {error}"),
                request_id,
            ));
        }
    };

    if let Some(challenge) = envelope.challenge {
        info!(
            event_name = "ingress.slack.url_verification",
            correlation_id = %request_id,
            "answering url verification challenge"
        );
        return (StatusCode::OK, Json(json!({ "challenge": challenge }))).into_response();
    }

    let Some(event) = envelope.event else {
        debug!(
            event_name = "ingress.slack.no_event",
            correlation_id = %request_id,
            "request carried neither challenge nor event"
        );
        return StatusCode::OK.into_response();
    };

    let context = EventContext { correlation_id: envelope.event_id.unwrap_or(request_id) };
    info!(
        event_name = "ingress.slack.event_received",
        correlation_id = %context.correlation_id,
        event_type = event.event_type.as_deref().unwrap_or("unknown"),
        channel = event.channel.as_deref().unwrap_or("unknown"),
        ts = event.ts.as_deref(),
        thread_ts = event.thread_ts.as_deref(),
        "received slack event"
    );

    match state.dispatcher.dispatch(&event, &context) {
        HandlerResult::Responded(reply) => {
            let sender = state.sender.clone();
            tokio::spawn(async move {
                deliver_reply(sender.as_ref(), &reply, &context.correlation_id).await;
            });
        }
        HandlerResult::Ignored(reason) => {
            debug!(
                event_name = "ingress.slack.event_ignored",
                correlation_id = %context.correlation_id,
                reason = reason.label(),
                "event does not need a reply"
            );
        }
    }

    StatusCode::OK.into_response()
}

fn check_signature(
    secret: &SecretString,
    headers: &HeaderMap,
    body: &[u8],
    request_id: &str,
) -> Result<(), InterfaceError> {
    let header = |name: &str| headers.get(name).and_then(|value| value.to_str().ok());

    signature::verify(
        secret.expose_secret(),
        header(TIMESTAMP_HEADER),
        header(SIGNATURE_HEADER),
        body,
        Utc::now().timestamp(),
    )
    .map_err(|error| InterfaceError::unauthorized(error.to_string(), request_id))
}

fn reject(error: InterfaceError) -> Response {
    warn!(
        event_name = "ingress.slack.rejected",
        correlation_id = %error.correlation_id(),
        error_class = error.error_class(),
        error = %error,
        "rejecting inbound request"
    );

    let status = match error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
    };
    status.into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use chrono::Utc;
    use leavebot_slack::{
        api::{MessageSender, PostedMessage, SlackApiError},
        events::default_dispatcher,
        signature::{sign, SIGNATURE_HEADER, TIMESTAMP_HEADER},
    };
    use serde_json::{json, Value};
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    use super::{router, WebhookState, LIVENESS_TEXT};

    const FORM: &str = "https://forms.example.com/hr";
    const SECRET: &str = "test-signing-secret";

    struct RecordingSender {
        sent: mpsc::UnboundedSender<(String, String)>,
        fail: bool,
    }

    #[async_trait]
    impl MessageSender for RecordingSender {
        async fn post_message(
            &self,
            channel: &str,
            text: &str,
        ) -> Result<PostedMessage, SlackApiError> {
            let _ = self.sent.send((channel.to_owned(), text.to_owned()));
            if self.fail {
                return Err(SlackApiError::Api {
                    method: "chat.postMessage",
                    error: "channel_not_found".to_owned(),
                });
            }
            Ok(PostedMessage { channel: Some(channel.to_owned()), ts: Some("1.0".to_owned()) })
        }
    }

    fn app(
        signing_secret: Option<&str>,
        fail: bool,
    ) -> (Router, mpsc::UnboundedReceiver<(String, String)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = WebhookState::new(
            default_dispatcher(FORM),
            Arc::new(RecordingSender { sent: tx, fail }),
            signing_secret.map(|secret| secret.to_owned().into()),
        );
        (router(state), rx)
    }

    fn post(body: impl Into<Body>) -> Request<Body> {
        Request::post("/")
            .header("content-type", "application/json")
            .body(body.into())
            .expect("request should build")
    }

    fn message_event(event: Value) -> String {
        json!({ "type": "event_callback", "event_id": "Ev123", "event": event }).to_string()
    }

    async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX).await.expect("body should read").to_vec()
    }

    async fn next_send(
        rx: &mut mpsc::UnboundedReceiver<(String, String)>,
    ) -> Option<(String, String)> {
        tokio::time::timeout(Duration::from_secs(2), rx.recv()).await.ok().flatten()
    }

    /// A closed channel counts as "nothing sent": `oneshot` drops the router,
    /// and with it the sender, once no delivery task holds a clone.
    async fn no_send(rx: &mut mpsc::UnboundedReceiver<(String, String)>) -> bool {
        !matches!(tokio::time::timeout(Duration::from_millis(100), rx.recv()).await, Ok(Some(_)))
    }

    #[tokio::test]
    async fn challenge_is_echoed_back() {
        let (app, _rx) = app(None, false);

        let response = app
            .oneshot(post(r#"{"token":"t","challenge":"abc","type":"url_verification"}"#))
            .await
            .expect("router should respond");

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(&body_bytes(response).await).expect("json body");
        assert_eq!(body, json!({"challenge": "abc"}));
    }

    #[tokio::test]
    async fn challenge_takes_precedence_over_a_matching_event() {
        let (app, mut rx) = app(None, false);
        let body = json!({
            "challenge": "abc",
            "event_id": "Ev9",
            "event": {
                "type": "message",
                "user": "U1",
                "channel": "C1",
                "text": "taking leave tomorrow"
            }
        })
        .to_string();

        let response = app.oneshot(post(body)).await.expect("router should respond");

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(&body_bytes(response).await).expect("json body");
        assert_eq!(body, json!({"challenge": "abc"}));
        assert!(no_send(&mut rx).await, "challenge requests must not be classified");
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request_with_empty_body() {
        let (app, mut rx) = app(None, false);

        let response = app.oneshot(post("{not json")).await.expect("router should respond");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_bytes(response).await.is_empty());
        assert!(no_send(&mut rx).await);
    }

    #[tokio::test]
    async fn liveness_returns_plain_text() {
        let (app, _rx) = app(None, false);

        let response = app
            .oneshot(Request::get("/").body(Body::empty()).expect("request should build"))
            .await
            .expect("router should respond");

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        assert!(content_type.starts_with("text/plain"));
        assert_eq!(body_bytes(response).await, LIVENESS_TEXT.as_bytes());
    }

    #[tokio::test]
    async fn leave_message_is_acknowledged_and_reply_forwarded() {
        let (app, mut rx) = app(None, false);
        let body = message_event(json!({
            "type": "message",
            "user": "U1",
            "channel": "C1",
            "text": "I'm taking leave tomorrow"
        }));

        let response = app.oneshot(post(body)).await.expect("router should respond");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_bytes(response).await.is_empty());
        let (channel, text) = next_send(&mut rx).await.expect("reply should be sent");
        assert_eq!(channel, "C1");
        assert!(text.contains("<@U1>"));
        assert!(text.contains(FORM));
        assert!(text.contains("Leave Request Form"));
    }

    #[tokio::test]
    async fn unmatched_message_gets_no_reply() {
        let (app, mut rx) = app(None, false);
        let body = message_event(json!({
            "type": "message",
            "user": "U1",
            "channel": "C1",
            "text": "Meeting at 3pm"
        }));

        let response = app.oneshot(post(body)).await.expect("router should respond");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(no_send(&mut rx).await);
    }

    #[tokio::test]
    async fn bot_messages_are_acknowledged_without_reply() {
        let (app, mut rx) = app(None, false);
        let body = message_event(json!({
            "type": "message",
            "bot_id": "B1",
            "channel": "C1",
            "text": "leave form posted"
        }));

        let response = app.oneshot(post(body)).await.expect("router should respond");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(no_send(&mut rx).await);
    }

    #[tokio::test]
    async fn outbound_failure_does_not_change_acknowledgement() {
        let (app, mut rx) = app(None, true);
        let body = message_event(json!({
            "type": "app_mention",
            "user": "U2",
            "channel": "C2",
            "text": "<@UBOT> wfh today"
        }));

        let response = app.oneshot(post(body)).await.expect("router should respond");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(next_send(&mut rx).await.is_some(), "send should still be attempted");
    }

    #[tokio::test]
    async fn unsigned_request_is_rejected_when_secret_configured() {
        let (app, _rx) = app(Some(SECRET), false);

        let response =
            app.oneshot(post(r#"{"challenge":"abc"}"#)).await.expect("router should respond");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn signed_request_is_accepted_when_secret_configured() {
        let (app, _rx) = app(Some(SECRET), false);
        let body = r#"{"challenge":"abc"}"#;
        let timestamp = Utc::now().timestamp().to_string();
        let request = Request::post("/")
            .header("content-type", "application/json")
            .header(TIMESTAMP_HEADER, &timestamp)
            .header(SIGNATURE_HEADER, sign(SECRET, &timestamp, body.as_bytes()))
            .body(Body::from(body))
            .expect("request should build");

        let response = app.oneshot(request).await.expect("router should respond");

        assert_eq!(response.status(), StatusCode::OK);
    }
}
