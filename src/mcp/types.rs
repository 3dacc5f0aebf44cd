// ABOUTME: Defines MCP server payload types - the in-band result envelope,
// ABOUTME: resource and tool content blocks, and the adapted McpResponse.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The MCP server's in-band result wrapper. Failures arrive with HTTP 200
/// and `success: false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamEnvelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl UpstreamEnvelope {
    /// A failure envelope stamped with the current time in milliseconds.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            timestamp: Some(chrono::Utc::now().timestamp_millis()),
        }
    }

    /// Interpret a payload as an envelope, if it carries a boolean `success`.
    ///
    /// The other fields are read leniently: a structured `error` becomes its
    /// JSON text and a `timestamp` that is not integer milliseconds is dropped.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let success = payload.get("success")?.as_bool()?;
        Some(Self {
            success,
            data: payload.get("data").filter(|d| !d.is_null()).cloned(),
            error: payload.get("error").filter(|e| !e.is_null()).map(value_text),
            timestamp: payload.get("timestamp").and_then(Value::as_i64),
        })
    }
}

/// One entry of a resource read result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceContent {
    pub uri: String,
    pub text: String,
    #[serde(rename = "mimeType", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Result of reading a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceReadResult {
    pub contents: Vec<ResourceContent>,
}

/// Content block in a tool result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image")]
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

/// Result of calling a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub content: Vec<ToolContent>,
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

/// Body of `POST /tool`.
#[derive(Debug, Serialize)]
pub struct ToolCallBody<'a> {
    pub tool: &'a str,
    pub params: &'a Value,
}

/// Body of `POST /query`.
#[derive(Debug, Serialize)]
pub struct QueryBody<'a> {
    pub query: &'a str,
}

/// Which operation an [`McpResponse`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum McpResponseKind {
    Resource,
    Tool,
}

/// A resource or tool result flattened to a single string.
///
/// Invariant: when `error` is set, `content` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpResponse {
    #[serde(rename = "type")]
    pub kind: McpResponseKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl McpResponse {
    pub fn content(kind: McpResponseKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            error: None,
        }
    }

    pub fn error(kind: McpResponseKind, error: impl Into<String>) -> Self {
        Self {
            kind,
            content: String::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Adapt a resource read payload (MCP-native `{contents}` or a server
    /// envelope) into the first content's text.
    pub fn from_resource_payload(payload: &Value) -> Self {
        Self::adapt(McpResponseKind::Resource, payload, "contents")
    }

    /// Adapt a tool call payload (MCP-native `{content}` or a server envelope)
    /// into the first content block's text.
    pub fn from_tool_payload(payload: &Value) -> Self {
        Self::adapt(McpResponseKind::Tool, payload, "content")
    }

    fn adapt(kind: McpResponseKind, payload: &Value, list_key: &str) -> Self {
        let body = match UpstreamEnvelope::from_payload(payload) {
            Some(envelope) if !envelope.success => {
                let error = envelope
                    .error
                    .unwrap_or_else(|| "MCP server reported a failure".to_string());
                return Self::error(kind, error);
            }
            Some(UpstreamEnvelope {
                data: Some(data), ..
            }) => data,
            _ => payload.clone(),
        };

        if let Some(text) = body
            .get(list_key)
            .and_then(Value::as_array)
            .and_then(|items| items.first())
            .and_then(|item| item.get("text"))
        {
            return Self::content(kind, value_text(text));
        }

        match body.get("content").or_else(|| body.get("result")) {
            Some(value) => Self::content(kind, value_text(value)),
            None => Self::content(kind, value_text(&body)),
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
