// ABOUTME: MCP module - HTTP gateway to the resource/tool server.
// ABOUTME: Defines the upstream trait, its reqwest implementation and payload types.

mod gateway;
mod types;

pub use gateway::{DEFAULT_MCP_TIMEOUT, HttpGateway, McpUpstream};
pub use types::*;
