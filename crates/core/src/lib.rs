//! Leave / WFH request bot core: intent classification, reply templates and
//! configuration shared by the Slack adapter, the HTTP server and the CLI.

pub mod config;
pub mod errors;
pub mod intent;
pub mod responder;

pub use config::{AppConfig, ConfigError, LoadOptions};
pub use errors::InterfaceError;
pub use intent::{classify, matched_keyword, IntentCategory};
pub use responder::{mention, render};
