// ABOUTME: Defines the LlmClient trait and ChatClient, the single REST client
// ABOUTME: that talks to any chat-completion endpoint described by an LlmConfig.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

use super::{ChatMessage, ChatRequest, LlmConfig, LlmResponse, normalize};
use crate::error::LlmError;

/// Default bound on a single chat call.
pub const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait for LLM client implementations.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Model name requests are sent with.
    fn model(&self) -> &str;

    /// Send one non-streaming chat request and return the provider's raw payload.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<Value, LlmError>;

    /// Send a chat request and normalize whatever shape comes back.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<LlmResponse, LlmError> {
        let raw = self.chat(messages).await?;
        Ok(normalize(&raw))
    }
}

/// REST client for OpenAI, Anthropic, Ollama and compatible endpoints.
#[derive(Debug, Clone)]
pub struct ChatClient {
    config: LlmConfig,
    headers: HeaderMap,
    http: reqwest::Client,
    timeout: Duration,
}

impl ChatClient {
    /// Create a client with the default 30 second timeout.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        Self::with_timeout(config, DEFAULT_LLM_TIMEOUT)
    }

    /// Create a client whose requests give up after `timeout`.
    pub fn with_timeout(config: LlmConfig, timeout: Duration) -> Result<Self, LlmError> {
        reqwest::Url::parse(&config.endpoint_url)
            .map_err(|e| LlmError::Configuration(format!("invalid endpoint URL: {}", e)))?;

        let headers = build_headers(&config)?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(format!("mcp-relay/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LlmError::Configuration(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            headers,
            http,
            timeout,
        })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }
}

/// Request headers: JSON content type, then caller-supplied extras, then the
/// bearer token when an API key is configured.
pub fn build_headers(config: &LlmConfig) -> Result<HeaderMap, LlmError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    for (name, value) in &config.extra_headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| LlmError::Configuration(format!("invalid header name {:?}: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| LlmError::Configuration(format!("invalid value for header {}: {}", name, e)))?;
        headers.insert(name, value);
    }

    if let Some(api_key) = &config.api_key {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| LlmError::Configuration(format!("invalid API key: {}", e)))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(headers)
}

#[async_trait]
impl LlmClient for ChatClient {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<Value, LlmError> {
        let body = ChatRequest::new(&self.config, messages);

        tracing::debug!(
            endpoint = %self.config.endpoint_url,
            model = %self.config.model,
            messages = messages.len(),
            "sending chat request"
        );

        let response = self
            .http
            .post(&self.config.endpoint_url)
            .headers(self.headers.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::from_reqwest(e, self.timeout))?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "LLM endpoint returned an error status");
            return Err(LlmError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        // Non-JSON bodies are kept as a plain string for the normalizer.
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}
