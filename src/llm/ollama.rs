// ABOUTME: Ollama native chat API preset.
// ABOUTME: Targets a local server (default localhost:11434) with no API key.

use super::LlmConfig;

/// Ollama's native non-streaming chat endpoint.
pub const OLLAMA_API_URL: &str = "http://localhost:11434/api/chat";

/// Default model when none is specified.
pub const OLLAMA_DEFAULT_MODEL: &str = "llama3.2:3b";

impl LlmConfig {
    /// Preset for a local Ollama server.
    pub fn ollama(model: &str) -> Self {
        let model = if model.is_empty() {
            OLLAMA_DEFAULT_MODEL
        } else {
            model
        };
        Self::custom(OLLAMA_API_URL, model)
    }

    /// Preset for an Ollama server on another host, e.g. `http://gpu-box:11434`.
    pub fn ollama_at(host: &str, model: &str) -> Self {
        let endpoint = format!("{}/api/chat", host.trim_end_matches('/'));
        Self {
            endpoint_url: endpoint,
            ..Self::ollama(model)
        }
    }
}
