// ABOUTME: Shared integration-test harness - a reference MCP resource/tool
// ABOUTME: server and helpers to run a relay on ephemeral ports.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use mcp_relay::prelude::*;

pub const HELLO_URI: &str = "file:///hello.txt";
pub const HELLO_TEXT: &str = "Hello, World!";
pub const PELUSEAR_TEXT: &str = "¡Has sido peluseado! 🐶\n";

/// A running reference MCP server.
pub struct McpFixture {
    pub addr: SocketAddr,
    token: CancellationToken,
}

impl McpFixture {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for McpFixture {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Start the reference MCP server on an ephemeral port.
///
/// `file:///broken` answers HTTP 500 and `file:///slow` sleeps for two
/// seconds, so error and timeout paths can be exercised.
pub async fn start_mcp_fixture() -> McpFixture {
    let app = Router::new()
        .route("/", get(|| async { Json(json!({"name": "reference-mcp", "status": "ok"})) }))
        .route("/resource", get(read_resource))
        .route("/tool", post(call_tool))
        .route("/query", post(process_query));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let token = CancellationToken::new();

    let shutdown = token.clone();
    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await
            .unwrap();
    });

    McpFixture { addr, token }
}

async fn read_resource(Query(params): Query<HashMap<String, String>>) -> Response {
    let uri = params.get("uri").cloned().unwrap_or_default();
    match uri.as_str() {
        HELLO_URI => Json(json!({
            "contents": [{"uri": uri, "text": HELLO_TEXT, "mimeType": "text/plain"}]
        }))
        .into_response(),
        "file:///broken" => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        "file:///slow" => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!({"contents": []})).into_response()
        }
        _ => Json(json!({
            "success": false,
            "error": format!("Resource not found: {}", uri),
            "timestamp": 0
        }))
        .into_response(),
    }
}

async fn call_tool(Json(body): Json<Value>) -> Json<Value> {
    let tool = body["tool"].as_str().unwrap_or_default();
    match tool {
        "tool-pelusear" => Json(json!({"content": [{"type": "text", "text": PELUSEAR_TEXT}]})),
        "echo" => Json(json!({"success": true, "data": {"result": body["params"].clone()}})),
        other => Json(json!({
            "success": false,
            "error": format!("Tool not found: {}", other),
            "timestamp": 0
        })),
    }
}

async fn process_query(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {"query": body["query"].clone(), "answer": "processed"},
        "timestamp": 0
    }))
}

/// A relay serving on an ephemeral port.
pub struct RelayFixture {
    pub addr: SocketAddr,
    pub handle: RelayHandle,
    pub task: JoinHandle<Result<(), RelayError>>,
}

impl RelayFixture {
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub fn relay_config(mcp_url: &str) -> RelayConfig {
    RelayConfig::default()
        .with_bind("127.0.0.1:0".parse().unwrap())
        .with_mcp_url(mcp_url)
        .with_request_timeout(Duration::from_secs(1))
        .with_shutdown_grace(Duration::from_secs(2))
}

pub async fn start_relay(config: RelayConfig) -> RelayFixture {
    let relay = Relay::bind(config).await.unwrap();
    let addr = relay.local_addr().unwrap();
    let handle = relay.handle();
    let task = tokio::spawn(relay.serve());
    RelayFixture { addr, handle, task }
}

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub async fn connect_client(url: &str) -> Client {
    let (socket, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    socket
}

/// Send a JSON frame and wait for the next text reply.
pub async fn request(client: &mut Client, message: Value) -> Value {
    send_text(client, &message.to_string()).await
}

pub async fn send_text(client: &mut Client, text: &str) -> Value {
    client.send(Message::text(text)).await.unwrap();
    next_json(client).await
}

pub async fn next_json(client: &mut Client) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for a reply")
            .expect("socket closed")
            .unwrap();
        match msg {
            Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {:?}", other),
        }
    }
}
