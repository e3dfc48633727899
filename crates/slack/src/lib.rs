//! Slack integration for the leave / WFH request bot.
//!
//! - **Events** (`events`) - Events API envelope parsing and the dispatcher
//!   that turns a user message into a form reply
//! - **Web API** (`api`) - `chat.postMessage` client behind the `MessageSender` trait
//! - **Signatures** (`signature`) - optional `X-Slack-Signature` verification
//!
//! # Architecture
//!
//! ```text
//! Events API POST → EventEnvelope → EventDispatcher → IntentReplyHandler
//!                                                          ↓
//!                             chat.postMessage ← MessageSender ← Reply
//! ```

pub mod api;
pub mod events;
pub mod signature;
