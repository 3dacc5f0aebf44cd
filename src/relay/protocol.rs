// ABOUTME: WebSocket wire protocol - the closed set of client messages and
// ABOUTME: the server replies, both tagged by a `type` field.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ErrorKind, ProtocolError, RelayError};

/// Every `type` tag a client may send.
pub const CLIENT_MESSAGE_TYPES: [&str; 5] = [
    "connect",
    "disconnect",
    "readResource",
    "callTool",
    "processQuery",
];

/// Messages sent by the browser client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    Connect {},
    Disconnect {},
    ReadResource {
        uri: String,
    },
    CallTool {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        params: Option<Value>,
    },
    ProcessQuery {
        query: String,
    },
}

impl ClientMessage {
    /// Decode one text frame.
    ///
    /// Malformed JSON, a missing tag, an unknown tag and a known tag with the
    /// wrong payload are each reported as a distinct [`ProtocolError`].
    pub fn parse(frame: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(frame)?;

        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(ProtocolError::MissingType)?;

        if !CLIENT_MESSAGE_TYPES.contains(&kind) {
            return Err(ProtocolError::UnknownType(kind.to_string()));
        }

        Self::deserialize(&value).map_err(|e| ProtocolError::InvalidPayload {
            kind: kind.to_string(),
            reason: e.to_string(),
        })
    }

    /// The wire tag of this message.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::Connect {} => "connect",
            ClientMessage::Disconnect {} => "disconnect",
            ClientMessage::ReadResource { .. } => "readResource",
            ClientMessage::CallTool { .. } => "callTool",
            ClientMessage::ProcessQuery { .. } => "processQuery",
        }
    }
}

/// Replies sent back to the client, one per inbound frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    Connected {
        message: String,
    },
    Disconnected {
        message: String,
    },
    ResourceRead {
        data: Value,
    },
    ToolCalled {
        data: Value,
    },
    QueryProcessed {
        data: Value,
    },
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<ErrorKind>,
    },
}

impl ServerMessage {
    /// The error frame for a failed message.
    pub fn error(err: &RelayError) -> Self {
        ServerMessage::Error {
            message: err.to_string(),
            kind: Some(err.kind()),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ServerMessage::Error { .. })
    }
}

impl From<RelayError> for ServerMessage {
    fn from(err: RelayError) -> Self {
        ServerMessage::error(&err)
    }
}
