// ABOUTME: Prelude module - convenient imports for common use cases.
// ABOUTME: Use `use mcp_relay::prelude::*;` to get started quickly.

pub use crate::agent::{AgentConfig, QueryAgent};
pub use crate::config::RelayConfig;
pub use crate::error::{ErrorKind, LlmError, McpError, ProtocolError, RelayError};
pub use crate::llm::{ChatClient, ChatMessage, LlmClient, LlmConfig, LlmResponse, Role, Usage};
pub use crate::mcp::{HttpGateway, McpResponse, McpResponseKind, McpUpstream, UpstreamEnvelope};
pub use crate::relay::{
    ClientMessage, Connection, ConnectionRegistry, Dispatcher, Relay, RelayHandle, ServerMessage,
};
