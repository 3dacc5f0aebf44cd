// ABOUTME: LLM module - REST client, provider presets and response normalizer.
// ABOUTME: Every provider is reached through ChatClient; presets only differ in config.

mod anthropic;
mod client;
mod normalize;
mod ollama;
mod openai;
mod types;

pub use anthropic::*;
pub use client::*;
pub use normalize::*;
pub use ollama::*;
pub use openai::*;
pub use types::*;
