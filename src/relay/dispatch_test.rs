// ABOUTME: Tests for the Dispatcher - routing, the connection guard, error
// ABOUTME: frames for bad input, and panic recovery. Uses a counting MCP fake.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};

use super::*;
use crate::agent::{AgentConfig, QueryAgent};
use crate::error::{ErrorKind, LlmError, McpError};
use crate::llm::{ChatMessage, LlmClient};
use crate::mcp::McpUpstream;

const PELUSEAR: &str = "¡Has sido peluseado! 🐶\n";

/// MCP server stand-in that counts every request it receives.
#[derive(Default)]
struct CountingMcp {
    requests: AtomicUsize,
    probe_fails: bool,
    panic_on_read: bool,
}

impl CountingMcp {
    fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl McpUpstream for CountingMcp {
    fn base_url(&self) -> &str {
        "http://localhost:3001"
    }

    async fn probe(&self) -> Result<(), McpError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.probe_fails {
            Err(McpError::Http { status: 503 })
        } else {
            Ok(())
        }
    }

    async fn read_resource(&self, uri: &str) -> Result<Value, McpError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.panic_on_read {
            panic!("resource handler exploded");
        }
        Ok(json!({
            "contents": [{"uri": uri, "text": "Hello, World!", "mimeType": "text/plain"}]
        }))
    }

    async fn call_tool(&self, name: &str, _params: Option<Value>) -> Result<Value, McpError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if name == "tool-pelusear" {
            Ok(json!({"content": [{"type": "text", "text": PELUSEAR}]}))
        } else {
            Ok(json!({"success": false, "error": format!("Tool not found: {}", name)}))
        }
    }

    async fn process_query(&self, query: &str) -> Result<Value, McpError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(json!({"success": true, "data": {"echo": query}}))
    }
}

/// LLM stand-in that always answers with the same text.
struct EchoLlm;

#[async_trait]
impl LlmClient for EchoLlm {
    fn model(&self) -> &str {
        "echo"
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<Value, LlmError> {
        let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        Ok(json!({"message": {"content": format!("echo: {}", last)}, "eval_count": 2}))
    }
}

fn setup() -> (Arc<CountingMcp>, Dispatcher) {
    setup_with(CountingMcp::default())
}

fn setup_with(mcp: CountingMcp) -> (Arc<CountingMcp>, Dispatcher) {
    let mcp = Arc::new(mcp);
    let dispatcher = Dispatcher::new(mcp.clone());
    (mcp, dispatcher)
}

fn error_kind(reply: &ServerMessage) -> Option<ErrorKind> {
    match reply {
        ServerMessage::Error { kind, .. } => *kind,
        _ => None,
    }
}

#[tokio::test]
async fn test_connect_then_read_resource() {
    let (_mcp, dispatcher) = setup();
    let mut conn = Connection::new();

    let reply = dispatcher.dispatch(&mut conn, r#"{"type":"connect"}"#).await;
    assert_eq!(
        reply,
        ServerMessage::Connected {
            message: "Connected to MCP server at http://localhost:3001".into()
        }
    );
    assert!(conn.is_connected());

    let reply = dispatcher
        .dispatch(&mut conn, r#"{"type":"readResource","uri":"file:///hello.txt"}"#)
        .await;
    match reply {
        ServerMessage::ResourceRead { data } => {
            assert_eq!(data["contents"][0]["text"], "Hello, World!");
        }
        other => panic!("unexpected reply: {:?}", other),
    }
    assert!(!conn.is_loading());
}

#[tokio::test]
async fn test_not_connected_makes_no_upstream_request() {
    let (mcp, dispatcher) = setup();
    let mut conn = Connection::new();

    for frame in [
        r#"{"type":"readResource","uri":"file:///hello.txt"}"#,
        r#"{"type":"callTool","name":"tool-pelusear"}"#,
        r#"{"type":"processQuery","query":"hola"}"#,
    ] {
        let reply = dispatcher.dispatch(&mut conn, frame).await;
        assert_eq!(error_kind(&reply), Some(ErrorKind::NotConnected), "{}", frame);
    }
    assert_eq!(mcp.requests(), 0);
}

#[tokio::test]
async fn test_unknown_types_each_get_an_error() {
    let (mcp, dispatcher) = setup();
    let mut conn = Connection::new();

    for i in 0..5 {
        let frame = format!(r#"{{"type":"mystery{}"}}"#, i);
        let reply = dispatcher.dispatch(&mut conn, &frame).await;
        match reply {
            ServerMessage::Error { message, kind } => {
                assert!(message.contains(&format!("mystery{}", i)));
                assert_eq!(kind, Some(ErrorKind::UnknownMessageType));
            }
            other => panic!("unexpected reply: {:?}", other),
        }
    }
    assert_eq!(mcp.requests(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_parse_error() {
    let (_mcp, dispatcher) = setup();
    let mut conn = Connection::new();

    let reply = dispatcher.dispatch(&mut conn, "{oops").await;
    assert_eq!(error_kind(&reply), Some(ErrorKind::Parse));
}

#[tokio::test]
async fn test_missing_field_is_invalid_payload() {
    let (mcp, dispatcher) = setup();
    let mut conn = Connection::new();
    dispatcher.dispatch(&mut conn, r#"{"type":"connect"}"#).await;

    let reply = dispatcher.dispatch(&mut conn, r#"{"type":"readResource"}"#).await;
    assert_eq!(error_kind(&reply), Some(ErrorKind::InvalidPayload));
    assert_eq!(mcp.requests(), 1);
}

#[tokio::test]
async fn test_failed_connect_leaves_disconnected() {
    let (_mcp, dispatcher) = setup_with(CountingMcp {
        probe_fails: true,
        ..Default::default()
    });
    let mut conn = Connection::new();
    conn.mark_connected();

    let reply = dispatcher.dispatch(&mut conn, r#"{"type":"connect"}"#).await;
    assert_eq!(error_kind(&reply), Some(ErrorKind::Http));
    assert!(!conn.is_connected());
}

#[tokio::test]
async fn test_disconnect_blocks_further_calls() {
    let (_mcp, dispatcher) = setup();
    let mut conn = Connection::new();
    dispatcher.dispatch(&mut conn, r#"{"type":"connect"}"#).await;

    let reply = dispatcher.dispatch(&mut conn, r#"{"type":"disconnect"}"#).await;
    assert_eq!(
        reply,
        ServerMessage::Disconnected {
            message: "Disconnected from MCP server".into()
        }
    );

    let reply = dispatcher
        .dispatch(&mut conn, r#"{"type":"callTool","name":"tool-pelusear"}"#)
        .await;
    assert_eq!(error_kind(&reply), Some(ErrorKind::NotConnected));
}

#[tokio::test]
async fn test_call_tool_returns_text_verbatim() {
    let (_mcp, dispatcher) = setup();
    let mut conn = Connection::new();
    dispatcher.dispatch(&mut conn, r#"{"type":"connect"}"#).await;

    let reply = dispatcher
        .dispatch(&mut conn, r#"{"type":"callTool","name":"tool-pelusear"}"#)
        .await;
    match reply {
        ServerMessage::ToolCalled { data } => {
            assert_eq!(data["content"][0]["text"], PELUSEAR);
        }
        other => panic!("unexpected reply: {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_tool_is_in_band_failure() {
    let (_mcp, dispatcher) = setup();
    let mut conn = Connection::new();
    dispatcher.dispatch(&mut conn, r#"{"type":"connect"}"#).await;

    let reply = dispatcher
        .dispatch(&mut conn, r#"{"type":"callTool","name":"nonexistent-tool"}"#)
        .await;
    match reply {
        ServerMessage::ToolCalled { data } => {
            assert_eq!(data["success"], false);
            assert_eq!(data["error"], "Tool not found: nonexistent-tool");
        }
        other => panic!("unexpected reply: {:?}", other),
    }
}

#[tokio::test]
async fn test_process_query_without_llm_uses_upstream() {
    let (mcp, dispatcher) = setup();
    let mut conn = Connection::new();
    dispatcher.dispatch(&mut conn, r#"{"type":"connect"}"#).await;

    let reply = dispatcher
        .dispatch(&mut conn, r#"{"type":"processQuery","query":"hola"}"#)
        .await;
    assert_eq!(
        reply,
        ServerMessage::QueryProcessed {
            data: json!({"success": true, "data": {"echo": "hola"}})
        }
    );
    assert_eq!(mcp.requests(), 2);
}

#[tokio::test]
async fn test_process_query_with_llm_while_disconnected() {
    let mcp = Arc::new(CountingMcp::default());
    let agent = QueryAgent::new(Arc::new(EchoLlm), AgentConfig::default());
    let dispatcher = Dispatcher::new(mcp.clone()).with_agent(agent);
    let mut conn = Connection::new();

    let reply = dispatcher
        .dispatch(&mut conn, r#"{"type":"processQuery","query":"hola"}"#)
        .await;
    assert_eq!(
        reply,
        ServerMessage::QueryProcessed {
            data: json!({"content": "echo: hola", "usage": {"promptTokens": 0, "completionTokens": 2}})
        }
    );
    assert_eq!(mcp.requests(), 0);
}

#[tokio::test]
async fn test_process_query_with_llm_runs_actions_when_connected() {
    let mcp = Arc::new(CountingMcp::default());
    let agent = QueryAgent::new(Arc::new(EchoLlm), AgentConfig::default());
    let dispatcher = Dispatcher::new(mcp.clone()).with_agent(agent);
    let mut conn = Connection::new();
    dispatcher.dispatch(&mut conn, r#"{"type":"connect"}"#).await;

    let reply = dispatcher
        .dispatch(&mut conn, r#"{"type":"processQuery","query":"hola"}"#)
        .await;
    match reply {
        ServerMessage::QueryProcessed { data } => {
            let content = data["content"].as_str().unwrap();
            assert!(content.contains("Hello, World!"));
            assert!(content.contains(PELUSEAR));
            assert_eq!(data["usage"]["completionTokens"], 4);
        }
        other => panic!("unexpected reply: {:?}", other),
    }
    // probe + read + tool
    assert_eq!(mcp.requests(), 3);
}

#[tokio::test]
async fn test_handler_panic_becomes_error_frame() {
    let (_mcp, dispatcher) = setup_with(CountingMcp {
        panic_on_read: true,
        ..Default::default()
    });
    let mut conn = Connection::new();
    dispatcher.dispatch(&mut conn, r#"{"type":"connect"}"#).await;

    let reply = dispatcher
        .dispatch(&mut conn, r#"{"type":"readResource","uri":"file:///hello.txt"}"#)
        .await;
    match reply {
        ServerMessage::Error { message, kind } => {
            assert!(message.contains("resource handler exploded"));
            assert_eq!(kind, Some(ErrorKind::Internal));
        }
        other => panic!("unexpected reply: {:?}", other),
    }
    assert!(!conn.is_loading());
    assert!(conn.is_connected());

    let reply = dispatcher.dispatch(&mut conn, r#"{"type":"disconnect"}"#).await;
    assert!(!reply.is_error());
}
