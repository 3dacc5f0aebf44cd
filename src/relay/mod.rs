// ABOUTME: Relay module - WebSocket protocol, per-connection state, dispatcher
// ABOUTME: and the axum server that ties them to the MCP gateway and LLM agent.

mod dispatch;
mod protocol;
mod registry;
mod server;
mod session;

pub use dispatch::Dispatcher;
pub use protocol::{CLIENT_MESSAGE_TYPES, ClientMessage, ServerMessage};
pub use registry::{Connection, ConnectionRegistry, ConnectionSnapshot, ConnectionState};
pub use server::{PageSource, Relay, RelayHandle, RelayState, router};
pub use session::run_session;

#[cfg(test)]
mod dispatch_test;
