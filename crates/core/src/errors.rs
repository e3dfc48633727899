use thiserror::Error;

/// Errors surfaced at the HTTP boundary. The body sent back to Slack stays
/// empty; `message` and `correlation_id` exist for logs.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("unauthorized: {message}")]
    Unauthorized { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn bad_request(message: impl Into<String>, correlation_id: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into(), correlation_id: correlation_id.into() }
    }

    pub fn unauthorized(message: impl Into<String>, correlation_id: impl Into<String>) -> Self {
        Self::Unauthorized { message: message.into(), correlation_id: correlation_id.into() }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. } | Self::Unauthorized { correlation_id, .. } => {
                correlation_id
            }
        }
    }

    /// Stable label used as the `error_class` log field.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "bad_request",
            Self::Unauthorized { .. } => "unauthorized",
        }
    }
}
