// ABOUTME: Defines all error types for the relay using thiserror.
// ABOUTME: Each concern has its own error enum, unified under RelayError.

use std::time::Duration;

/// Top-level error type for the relay.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("MCP error: {0}")]
    Mcp(#[from] McpError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Handler panicked: {0}")]
    Panic(String),
}

/// Errors raised while decoding an inbound WebSocket frame.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("{0}")]
    Parse(#[from] serde_json::Error),

    #[error("message has no string `type` field")]
    MissingType,

    #[error("unknown message type: {0}")]
    UnknownType(String),

    #[error("invalid {kind} message: {reason}")]
    InvalidPayload { kind: String, reason: String },

    #[error("binary frames are not supported")]
    UnsupportedFrame,
}

/// Errors from MCP server operations.
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    #[error("not connected to MCP server")]
    NotConnected,

    #[error("MCP server not available: HTTP {status}")]
    Http { status: u16 },

    #[error("HTTP request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("MCP server timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl McpError {
    /// Classify a reqwest failure, reporting client-side timeouts separately.
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::Transport(err)
        }
    }
}

/// Errors from LLM client operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error! status: {status}")]
    Http { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("LLM request timed out after {0:?}")]
    Timeout(Duration),

    #[error("unrecognized response format")]
    UnrecognizedFormat,

    #[error("Deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl LlmError {
    /// Classify a reqwest failure, reporting client-side timeouts separately.
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::Transport(err)
        }
    }
}

/// Coarse classification of a relay error, sent to clients as the `kind`
/// field of an error frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Parse,
    UnknownMessageType,
    InvalidPayload,
    NotConnected,
    Http,
    UpstreamFormat,
    UpstreamTimeout,
    Transport,
    Internal,
}

impl RelayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RelayError::Protocol(err) => match err {
                ProtocolError::Parse(_) | ProtocolError::MissingType => ErrorKind::Parse,
                ProtocolError::UnknownType(_) => ErrorKind::UnknownMessageType,
                ProtocolError::InvalidPayload { .. } | ProtocolError::UnsupportedFrame => {
                    ErrorKind::InvalidPayload
                }
            },
            RelayError::Mcp(err) => match err {
                McpError::NotConnected => ErrorKind::NotConnected,
                McpError::Http { .. } => ErrorKind::Http,
                McpError::Timeout(_) => ErrorKind::UpstreamTimeout,
                McpError::Transport(_) | McpError::InvalidUrl(_) => ErrorKind::Transport,
                McpError::Json(_) => ErrorKind::UpstreamFormat,
            },
            RelayError::Llm(err) => match err {
                LlmError::Http { .. } => ErrorKind::Http,
                LlmError::Timeout(_) => ErrorKind::UpstreamTimeout,
                LlmError::Transport(_) => ErrorKind::Transport,
                LlmError::UnrecognizedFormat | LlmError::Deserialize(_) => {
                    ErrorKind::UpstreamFormat
                }
                LlmError::Configuration(_) => ErrorKind::Internal,
            },
            RelayError::Io(_)
            | RelayError::Json(_)
            | RelayError::Config(_)
            | RelayError::Panic(_) => ErrorKind::Internal,
        }
    }
}
