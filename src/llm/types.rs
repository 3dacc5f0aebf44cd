// ABOUTME: Core types for LLM communication - chat messages, provider
// ABOUTME: configuration, request bodies, and normalized responses.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Role of a chat message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message in the `{role, content}` shape every provider accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Connection settings for one chat-completion endpoint.
///
/// Built once from a provider preset or [`LlmConfig::custom`] and never
/// mutated afterwards; the builder methods consume and return `self`.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub endpoint_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub extra_headers: HashMap<String, String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    /// Send system messages as a top-level `system` string instead of
    /// inline in `messages`.
    pub system_field: bool,
}

impl LlmConfig {
    /// Configuration for an arbitrary endpoint speaking the chat-completion protocol.
    pub fn custom(endpoint_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            model: model.into(),
            api_key: None,
            extra_headers: HashMap::new(),
            temperature: None,
            max_tokens: None,
            system_field: false,
        }
    }

    /// Set the bearer token sent in the `Authorization` header.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Replace the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Add a provider-specific header (e.g. `anthropic-version`).
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(name.into(), value.into());
        self
    }

    /// Set sampling temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set max tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Hoist system messages into a top-level `system` field.
    pub fn with_system_field(mut self) -> Self {
        self.system_field = true;
        self
    }
}

/// Body of a non-streaming chat-completion request.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<&'a ChatMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl<'a> ChatRequest<'a> {
    pub fn new(config: &'a LlmConfig, messages: &'a [ChatMessage]) -> Self {
        let (system, messages) = if config.system_field {
            let (system, rest): (Vec<&ChatMessage>, Vec<&ChatMessage>) =
                messages.iter().partition(|m| m.role == Role::System);
            let system: Vec<&str> = system.iter().map(|m| m.content.as_str()).collect();
            let system = (!system.is_empty()).then(|| system.join("\n\n"));
            (system, rest)
        } else {
            (None, messages.iter().collect())
        };

        Self {
            model: &config.model,
            system,
            messages,
            stream: false,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// Provider-independent chat response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl LlmResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
        }
    }
}
