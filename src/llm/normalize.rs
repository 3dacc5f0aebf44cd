// ABOUTME: Response normalizer - reduces any provider payload to an LlmResponse.
// ABOUTME: One pure parser per known shape, composed first-match-wins.

use serde::Deserialize;
use serde_json::Value;

use super::{AnthropicResponse, LlmResponse, Usage};

/// The provider shape a payload was recognized as.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderShape {
    /// `choices[0].message.content` (OpenAI and compatible servers).
    OpenAI(String),
    /// `message.content` (Ollama native API).
    Ollama(String),
    /// `content: [{type: "text", text}]` (Anthropic Messages API).
    Anthropic(String),
    /// The body itself is a string.
    RawString(String),
    /// Nothing matched; the whole payload serialized as JSON.
    Opaque(String),
}

impl ProviderShape {
    /// Classify a payload. Never fails: unknown payloads become `Opaque`.
    pub fn detect(payload: &Value) -> Self {
        parse_openai(payload)
            .map(ProviderShape::OpenAI)
            .or_else(|| parse_ollama(payload).map(ProviderShape::Ollama))
            .or_else(|| parse_anthropic(payload).map(ProviderShape::Anthropic))
            .or_else(|| parse_raw_string(payload).map(ProviderShape::RawString))
            .unwrap_or_else(|| ProviderShape::Opaque(payload.to_string()))
    }

    pub fn into_content(self) -> String {
        match self {
            ProviderShape::OpenAI(c)
            | ProviderShape::Ollama(c)
            | ProviderShape::Anthropic(c)
            | ProviderShape::RawString(c)
            | ProviderShape::Opaque(c) => c,
        }
    }
}

/// Normalize a raw provider payload.
pub fn normalize(payload: &Value) -> LlmResponse {
    LlmResponse {
        content: ProviderShape::detect(payload).into_content(),
        usage: extract_usage(payload),
    }
}

/// OpenAI shape: a non-empty `choices` array whose first element has
/// `message.content`. Other fields, and later choices, are never inspected.
pub fn parse_openai(payload: &Value) -> Option<String> {
    let content = payload
        .get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?;
    present(content).map(content_to_string)
}

/// Ollama shape: `message` is an object carrying a `content` field. Falsy
/// values such as `""` or `0` still count as present.
pub fn parse_ollama(payload: &Value) -> Option<String> {
    let content = payload.get("message")?.as_object()?.get("content")?;
    present(content).map(content_to_string)
}

/// Anthropic shape: an array of content blocks with at least one text block.
pub fn parse_anthropic(payload: &Value) -> Option<String> {
    AnthropicResponse::deserialize(payload).ok()?.text()
}

/// A bare string body is used verbatim.
pub fn parse_raw_string(payload: &Value) -> Option<String> {
    payload.as_str().map(str::to_owned)
}

/// Token usage from whichever convention the payload follows. Each counter
/// is read on its own; missing or non-integer counters default to zero. A
/// payload without any usage data yields `None`.
pub fn extract_usage(payload: &Value) -> Option<Usage> {
    if let Some(usage) = payload.get("usage").filter(|u| u.is_object()) {
        return Some(Usage {
            prompt_tokens: counter(usage, &["prompt_tokens", "input_tokens"]),
            completion_tokens: counter(usage, &["completion_tokens", "output_tokens"]),
        });
    }

    // Ollama reports counts at the top level.
    if payload.get("prompt_eval_count").is_none() && payload.get("eval_count").is_none() {
        return None;
    }
    Some(Usage {
        prompt_tokens: counter(payload, &["prompt_eval_count"]),
        completion_tokens: counter(payload, &["eval_count"]),
    })
}

/// First of `names` holding an unsigned integer, else 0.
fn counter(object: &Value, names: &[&str]) -> u64 {
    names
        .iter()
        .find_map(|name| object.get(*name).and_then(Value::as_u64))
        .unwrap_or(0)
}

fn present(content: &Value) -> Option<&Value> {
    (!content.is_null()).then_some(content)
}

/// Strings pass through untouched; anything else becomes canonical JSON text.
fn content_to_string(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
