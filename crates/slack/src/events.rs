use std::{collections::HashMap, sync::Arc};

use leavebot_core::intent::{matched_keyword, IntentCategory};
use leavebot_core::responder::render;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Top-level body of an Events API delivery.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventEnvelope {
    /// URL verification token, echoed back unchanged.
    pub challenge: Option<Value>,
    pub event: Option<InboundEvent>,
    pub event_id: Option<String>,
    pub team_id: Option<String>,
}

impl EventEnvelope {
    /// Parses a raw request body. Only invalid JSON is an error; an `event`
    /// member with an unexpected shape is dropped so the delivery is ignored.
    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(body)?;
        let Value::Object(mut fields) = value else {
            return Ok(Self::default());
        };

        let event = match fields.remove("event") {
            Some(raw) => match serde_json::from_value::<InboundEvent>(raw) {
                Ok(event) => Some(event),
                Err(error) => {
                    debug!(
                        event_name = "ingress.slack.event_malformed",
                        error = %error,
                        "dropping event with unexpected shape"
                    );
                    None
                }
            },
            None => None,
        };

        Ok(Self {
            challenge: fields.remove("challenge"),
            event,
            event_id: string_field(&fields, "event_id"),
            team_id: string_field(&fields, "team_id"),
        })
    }
}

fn string_field(fields: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(str::to_owned)
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct InboundEvent {
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub thread_ts: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlackEventType {
    Message,
    AppMention,
    Unsupported,
}

impl SlackEventType {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "message" => Self::Message,
            "app_mention" => Self::AppMention,
            _ => Self::Unsupported,
        }
    }
}

/// A user message that passed the envelope-level filters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageEvent {
    pub event_type: SlackEventType,
    pub user_id: String,
    pub channel_id: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub channel_id: String,
    pub user_id: String,
    pub category: IntentCategory,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    BotMessage,
    MessageSubtype(String),
    UnsupportedEventType(String),
    MissingUser,
    MissingChannel,
    NoIntent,
}

impl SkipReason {
    pub fn label(&self) -> &'static str {
        match self {
            Self::BotMessage => "bot_message",
            Self::MessageSubtype(_) => "message_subtype",
            Self::UnsupportedEventType(_) => "unsupported_event_type",
            Self::MissingUser => "missing_user",
            Self::MissingChannel => "missing_channel",
            Self::NoIntent => "no_intent",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Responded(Reply),
    Ignored(SkipReason),
}

pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> SlackEventType;
    fn handle(&self, event: &MessageEvent, ctx: &EventContext) -> HandlerResult;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<SlackEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub fn dispatch(&self, event: &InboundEvent, ctx: &EventContext) -> HandlerResult {
        // Replies from bots (including ourselves) would loop forever.
        if is_present(&event.bot_id) {
            return HandlerResult::Ignored(SkipReason::BotMessage);
        }
        if let Some(subtype) = event.subtype.as_deref().filter(|value| !value.is_empty()) {
            return HandlerResult::Ignored(SkipReason::MessageSubtype(subtype.to_owned()));
        }

        let wire_type = event.event_type.as_deref().unwrap_or_default();
        let event_type = SlackEventType::from_wire(wire_type);
        let Some(handler) = self.handlers.get(&event_type) else {
            return HandlerResult::Ignored(SkipReason::UnsupportedEventType(wire_type.to_owned()));
        };

        let Some(user_id) = event.user.as_deref().filter(|value| !value.is_empty()) else {
            return HandlerResult::Ignored(SkipReason::MissingUser);
        };
        let Some(channel_id) = event.channel.as_deref().filter(|value| !value.is_empty()) else {
            return HandlerResult::Ignored(SkipReason::MissingChannel);
        };

        let message = MessageEvent {
            event_type,
            user_id: user_id.to_owned(),
            channel_id: channel_id.to_owned(),
            text: event.text.clone().unwrap_or_default(),
        };
        handler.handle(&message, ctx)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

fn is_present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|value| !value.is_empty())
}

/// Registers the intent reply handler for plain messages and app mentions.
pub fn default_dispatcher(form_link: impl Into<String>) -> EventDispatcher {
    let form_link: Arc<str> = Arc::from(form_link.into());
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(IntentReplyHandler::new(SlackEventType::Message, form_link.clone()));
    dispatcher.register(IntentReplyHandler::new(SlackEventType::AppMention, form_link));
    dispatcher
}

/// Classifies the message text and renders the matching form reply.
pub struct IntentReplyHandler {
    event_type: SlackEventType,
    form_link: Arc<str>,
}

impl IntentReplyHandler {
    pub fn new(event_type: SlackEventType, form_link: Arc<str>) -> Self {
        Self { event_type, form_link }
    }
}

impl EventHandler for IntentReplyHandler {
    fn event_type(&self) -> SlackEventType {
        self.event_type
    }

    fn handle(&self, event: &MessageEvent, ctx: &EventContext) -> HandlerResult {
        let Some((category, keyword)) = matched_keyword(&event.text) else {
            debug!(
                event_name = "slack.intent.unmatched",
                correlation_id = %ctx.correlation_id,
                channel = %event.channel_id,
                "no leave or wfh keyword found"
            );
            return HandlerResult::Ignored(SkipReason::NoIntent);
        };

        debug!(
            event_name = "slack.intent.classified",
            correlation_id = %ctx.correlation_id,
            channel = %event.channel_id,
            category = %category,
            keyword,
            "message classified"
        );

        HandlerResult::Responded(Reply {
            channel_id: event.channel_id.clone(),
            user_id: event.user_id.clone(),
            category,
            text: render(category, &event.user_id, &self.form_link),
        })
    }
}
