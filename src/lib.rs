// ABOUTME: Root module for mcp-relay - WebSocket relay to MCP servers and LLM APIs.
// ABOUTME: Re-exports all public types from submodules.

pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod mcp;
pub mod prelude;
pub mod relay;

pub use error::RelayError;
