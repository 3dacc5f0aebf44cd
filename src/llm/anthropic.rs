// ABOUTME: Anthropic Messages API preset and response shape.
// ABOUTME: Adds the anthropic-version header the API requires.

use serde::Deserialize;

use super::LlmConfig;

pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Default model when none is specified.
pub const ANTHROPIC_DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// The Messages API rejects requests without `max_tokens`.
pub const ANTHROPIC_DEFAULT_MAX_TOKENS: u32 = 1024;

impl LlmConfig {
    /// Preset for the Anthropic Messages API.
    pub fn anthropic(api_key: impl Into<String>) -> Self {
        Self::custom(ANTHROPIC_API_URL, ANTHROPIC_DEFAULT_MODEL)
            .with_api_key(api_key)
            .with_header("anthropic-version", ANTHROPIC_VERSION)
            .with_max_tokens(ANTHROPIC_DEFAULT_MAX_TOKENS)
            .with_system_field()
    }
}

/// Anthropic API response format, reduced to the text blocks.
#[derive(Debug, Deserialize)]
pub struct AnthropicResponse {
    pub content: Vec<AnthropicContent>,
}

/// Anthropic content block. Only text blocks carry content the relay forwards.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnthropicContent {
    Text { text: String },
    #[serde(other)]
    Other,
}

impl AnthropicResponse {
    /// Concatenated text of all text blocks, or `None` if there are none.
    pub fn text(&self) -> Option<String> {
        let texts: Vec<&str> = self
            .content
            .iter()
            .filter_map(|block| match block {
                AnthropicContent::Text { text } => Some(text.as_str()),
                AnthropicContent::Other => None,
            })
            .collect();

        if texts.is_empty() {
            None
        } else {
            Some(texts.join(""))
        }
    }
}
