// ABOUTME: HTTP gateway to the MCP resource/tool server.
// ABOUTME: Non-2xx statuses become in-band failure envelopes, never Rust errors.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{QueryBody, ToolCallBody, UpstreamEnvelope};
use crate::error::McpError;

/// Default bound on a single MCP server call.
pub const DEFAULT_MCP_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait for the upstream MCP server as seen by the relay.
#[async_trait]
pub trait McpUpstream: Send + Sync {
    /// Base URL of the server, without a trailing slash.
    fn base_url(&self) -> &str;

    /// Check that the server answers at all (`GET /`).
    async fn probe(&self) -> Result<(), McpError>;

    /// Read a resource by URI (`GET /resource?uri=`).
    async fn read_resource(&self, uri: &str) -> Result<Value, McpError>;

    /// Invoke a named tool (`POST /tool`). Missing params are sent as `{}`.
    async fn call_tool(&self, name: &str, params: Option<Value>) -> Result<Value, McpError>;

    /// Forward a free-form query (`POST /query`).
    async fn process_query(&self, query: &str) -> Result<Value, McpError>;
}

/// reqwest-backed [`McpUpstream`].
#[derive(Debug, Clone)]
pub struct HttpGateway {
    base_url: String,
    http: reqwest::Client,
    timeout: Duration,
}

impl HttpGateway {
    /// Create a gateway with the default 30 second timeout.
    pub fn new(base_url: &str) -> Result<Self, McpError> {
        Self::with_timeout(base_url, DEFAULT_MCP_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, McpError> {
        reqwest::Url::parse(base_url).map_err(|e| McpError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(format!("mcp-relay/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(McpError::Transport)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a response into a JSON payload, synthesizing a failure envelope
    /// for non-2xx statuses.
    async fn read_payload(&self, response: reqwest::Response) -> Result<Value, McpError> {
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "MCP server returned an error status");
            let reason = status.canonical_reason().unwrap_or("Unknown status");
            let envelope = UpstreamEnvelope::failure(format!("HTTP {}: {}", status.as_u16(), reason));
            return Ok(serde_json::to_value(envelope)?);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| McpError::from_reqwest(e, self.timeout))?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl McpUpstream for HttpGateway {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn probe(&self) -> Result<(), McpError> {
        let response = self
            .http
            .get(self.url("/"))
            .send()
            .await
            .map_err(|e| McpError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(McpError::Http {
                status: status.as_u16(),
            })
        }
    }

    async fn read_resource(&self, uri: &str) -> Result<Value, McpError> {
        tracing::debug!(uri, "reading resource");
        let url = self.url(&format!("/resource?uri={}", urlencoding::encode(uri)));
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| McpError::from_reqwest(e, self.timeout))?;
        self.read_payload(response).await
    }

    async fn call_tool(&self, name: &str, params: Option<Value>) -> Result<Value, McpError> {
        tracing::debug!(tool = name, "calling tool");
        let params = params.unwrap_or_else(|| Value::Object(Default::default()));
        let response = self
            .http
            .post(self.url("/tool"))
            .json(&ToolCallBody {
                tool: name,
                params: &params,
            })
            .send()
            .await
            .map_err(|e| McpError::from_reqwest(e, self.timeout))?;
        self.read_payload(response).await
    }

    async fn process_query(&self, query: &str) -> Result<Value, McpError> {
        tracing::debug!(query, "forwarding query");
        let response = self
            .http
            .post(self.url("/query"))
            .json(&QueryBody { query })
            .send()
            .await
            .map_err(|e| McpError::from_reqwest(e, self.timeout))?;
        self.read_payload(response).await
    }
}
