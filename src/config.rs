// ABOUTME: Relay configuration - listener, MCP target, timeouts, HTML page,
// ABOUTME: and selecting an LLM provider from environment variables.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::agent::AgentConfig;
use crate::error::LlmError;
use crate::llm::LlmConfig;

pub const DEFAULT_BIND: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000);
pub const DEFAULT_MCP_URL: &str = "http://localhost:3001";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Everything needed to start a relay.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind: SocketAddr,
    pub mcp_url: String,
    /// Bound on every outbound HTTP call, MCP and LLM alike.
    pub request_timeout: Duration,
    pub shutdown_grace: Duration,
    /// Serve this file instead of the embedded page.
    pub html_path: Option<PathBuf>,
    /// `None` sends `processQuery` to the MCP server's `/query`.
    pub llm: Option<LlmConfig>,
    pub agent: AgentConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND,
            mcp_url: DEFAULT_MCP_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            html_path: None,
            llm: None,
            agent: AgentConfig::default(),
        }
    }
}

impl RelayConfig {
    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    pub fn with_mcp_url(mut self, url: impl Into<String>) -> Self {
        self.mcp_url = url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub fn with_html_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.html_path = Some(path.into());
        self
    }

    pub fn with_llm(mut self, llm: LlmConfig) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn with_agent(mut self, agent: AgentConfig) -> Self {
        self.agent = agent;
        self
    }
}

impl LlmConfig {
    /// Pick a provider from the process environment. See [`LlmConfig::from_lookup`].
    pub fn from_env() -> Result<Self, LlmError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Pick a provider from variables returned by `lookup`.
    ///
    /// Checked in order: `LLM_API_URL` (custom endpoint, needs `LLM_MODEL`,
    /// optional `LLM_API_KEY`), `ANTHROPIC_API_KEY`, `OPENAI_API_KEY`,
    /// `OLLAMA_HOST`. `LLM_MODEL` overrides the preset's model. Empty values
    /// count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LlmError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let model = var("LLM_MODEL");

        if let Some(url) = var("LLM_API_URL") {
            let model = model.ok_or_else(|| {
                LlmError::Configuration("LLM_API_URL is set but LLM_MODEL is not".to_string())
            })?;
            let mut config = LlmConfig::custom(url, model);
            if let Some(key) = var("LLM_API_KEY") {
                config = config.with_api_key(key);
            }
            return Ok(config);
        }

        let preset = if let Some(key) = var("ANTHROPIC_API_KEY") {
            LlmConfig::anthropic(key)
        } else if let Some(key) = var("OPENAI_API_KEY") {
            LlmConfig::openai(key)
        } else if let Some(host) = var("OLLAMA_HOST") {
            LlmConfig::ollama_at(&host, model.as_deref().unwrap_or(""))
        } else {
            return Err(LlmError::Configuration(
                "no LLM configured: set LLM_API_URL and LLM_MODEL, ANTHROPIC_API_KEY, OPENAI_API_KEY, or OLLAMA_HOST"
                    .to_string(),
            ));
        };

        Ok(match model {
            Some(model) => preset.with_model(model),
            None => preset,
        })
    }
}
