// ABOUTME: Connection state for each WebSocket session and a thread-safe
// ABOUTME: registry of snapshots used by the health endpoint.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::McpError;

/// Whether a session has completed the `connect` handshake with the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

/// Per-socket context. Owned by the session task that serves the socket, so
/// frames from one client mutate it sequentially without locking.
#[derive(Debug, Clone)]
pub struct Connection {
    id: Uuid,
    state: ConnectionState,
    loading: bool,
}

impl Connection {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: ConnectionState::Disconnected,
            loading: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn mark_connected(&mut self) {
        self.state = ConnectionState::Connected;
    }

    pub fn mark_disconnected(&mut self) {
        self.state = ConnectionState::Disconnected;
    }

    /// Fail fast with [`McpError::NotConnected`] unless `connect` succeeded.
    pub fn require_connected(&self) -> Result<(), McpError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(McpError::NotConnected)
        }
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn snapshot(&self) -> ConnectionSnapshot {
        ConnectionSnapshot {
            id: self.id,
            is_connected: self.is_connected(),
            loading: self.loading,
        }
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of a connection, as published to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSnapshot {
    pub id: Uuid,
    pub is_connected: bool,
    pub loading: bool,
}

/// A thread-safe registry of live connections.
///
/// Each entry is written only by the session that owns the connection;
/// everyone else reads snapshots.
#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    entries: Arc<RwLock<HashMap<Uuid, ConnectionSnapshot>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh disconnected connection and record it.
    pub async fn register(&self) -> Connection {
        let conn = Connection::new();
        self.publish(&conn).await;
        conn
    }

    /// Store the current state of `conn`.
    pub async fn publish(&self, conn: &Connection) {
        let mut entries = self.entries.write().await;
        entries.insert(conn.id(), conn.snapshot());
    }

    /// Forget a connection once its socket has closed.
    pub async fn remove(&self, id: Uuid) -> Option<ConnectionSnapshot> {
        let mut entries = self.entries.write().await;
        entries.remove(&id)
    }

    pub async fn get(&self, id: Uuid) -> Option<ConnectionSnapshot> {
        let entries = self.entries.read().await;
        entries.get(&id).copied()
    }

    pub async fn snapshot(&self) -> Vec<ConnectionSnapshot> {
        let entries = self.entries.read().await;
        entries.values().copied().collect()
    }

    pub async fn count(&self) -> usize {
        let entries = self.entries.read().await;
        entries.len()
    }

    pub async fn connected_count(&self) -> usize {
        let entries = self.entries.read().await;
        entries.values().filter(|e| e.is_connected).count()
    }

    /// Connections with a message in flight.
    pub async fn loading_count(&self) -> usize {
        let entries = self.entries.read().await;
        entries.values().filter(|e| e.loading).count()
    }
}
