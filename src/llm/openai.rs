// ABOUTME: OpenAI chat-completions preset.
// ABOUTME: Also covers OpenAI-compatible servers that answer with `choices`.

use super::LlmConfig;

pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default model when none is specified.
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-3.5-turbo";

impl LlmConfig {
    /// Preset for the OpenAI API.
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::custom(OPENAI_API_URL, OPENAI_DEFAULT_MODEL).with_api_key(api_key)
    }
}
