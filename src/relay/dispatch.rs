// ABOUTME: Dispatcher - turns one inbound text frame into exactly one reply,
// ABOUTME: routing the five client messages to the MCP gateway or the agent.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use super::protocol::{ClientMessage, ServerMessage};
use super::registry::Connection;
use crate::agent::QueryAgent;
use crate::error::RelayError;
use crate::mcp::McpUpstream;

/// Routes client messages for every session of a relay.
///
/// Holds no per-connection state; each call receives the session's own
/// [`Connection`].
pub struct Dispatcher {
    upstream: Arc<dyn McpUpstream>,
    agent: Option<QueryAgent>,
}

impl Dispatcher {
    pub fn new(upstream: Arc<dyn McpUpstream>) -> Self {
        Self {
            upstream,
            agent: None,
        }
    }

    /// Answer `processQuery` through the LLM instead of the MCP server's `/query`.
    pub fn with_agent(mut self, agent: QueryAgent) -> Self {
        self.agent = Some(agent);
        self
    }

    pub fn upstream(&self) -> &dyn McpUpstream {
        self.upstream.as_ref()
    }

    pub fn agent(&self) -> Option<&QueryAgent> {
        self.agent.as_ref()
    }

    /// Decode and handle one text frame. Never fails: every error becomes an
    /// error frame.
    pub async fn dispatch(&self, conn: &mut Connection, frame: &str) -> ServerMessage {
        match ClientMessage::parse(frame) {
            Ok(message) => self.handle(conn, message).await,
            Err(e) => {
                tracing::warn!(connection = %conn.id(), error = %e, "rejected client frame");
                ServerMessage::error(&e.into())
            }
        }
    }

    /// Handle a decoded message, converting handler errors and panics into
    /// error frames.
    pub async fn handle(&self, conn: &mut Connection, message: ClientMessage) -> ServerMessage {
        let kind = message.kind();
        let id = conn.id();
        tracing::debug!(connection = %id, kind, "handling client message");

        conn.set_loading(true);
        let outcome = AssertUnwindSafe(self.route(conn, message))
            .catch_unwind()
            .await;
        conn.set_loading(false);

        match outcome {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                tracing::warn!(connection = %id, kind, error = %e, "message failed");
                ServerMessage::error(&e)
            }
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                tracing::error!(connection = %id, kind, reason = %reason, "handler panicked");
                ServerMessage::error(&RelayError::Panic(reason))
            }
        }
    }

    async fn route(
        &self,
        conn: &mut Connection,
        message: ClientMessage,
    ) -> Result<ServerMessage, RelayError> {
        match message {
            ClientMessage::Connect {} => match self.upstream.probe().await {
                Ok(()) => {
                    conn.mark_connected();
                    tracing::info!(connection = %conn.id(), url = %self.upstream.base_url(), "connected to MCP server");
                    Ok(ServerMessage::Connected {
                        message: format!("Connected to MCP server at {}", self.upstream.base_url()),
                    })
                }
                Err(e) => {
                    conn.mark_disconnected();
                    Err(e.into())
                }
            },

            ClientMessage::Disconnect {} => {
                conn.mark_disconnected();
                tracing::info!(connection = %conn.id(), "disconnected from MCP server");
                Ok(ServerMessage::Disconnected {
                    message: "Disconnected from MCP server".to_string(),
                })
            }

            ClientMessage::ReadResource { uri } => {
                conn.require_connected()?;
                let data = self.upstream.read_resource(&uri).await?;
                Ok(ServerMessage::ResourceRead { data })
            }

            ClientMessage::CallTool { name, params } => {
                conn.require_connected()?;
                let data = self.upstream.call_tool(&name, params).await?;
                Ok(ServerMessage::ToolCalled { data })
            }

            ClientMessage::ProcessQuery { query } => match &self.agent {
                Some(agent) => {
                    let upstream = conn.is_connected().then(|| self.upstream.as_ref());
                    let response = agent.process(&query, upstream).await?;
                    Ok(ServerMessage::QueryProcessed {
                        data: serde_json::to_value(response)?,
                    })
                }
                None => {
                    conn.require_connected()?;
                    let data = self.upstream.process_query(&query).await?;
                    Ok(ServerMessage::QueryProcessed { data })
                }
            },
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
