// ABOUTME: relay-server binary - loads configuration from flags, environment
// ABOUTME: and .env, then serves the relay until SIGINT or SIGTERM.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use mcp_relay::prelude::*;

/// WebSocket relay between a browser client, an MCP server and an LLM API.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "RELAY_BIND", default_value = "127.0.0.1:3000")]
    bind: SocketAddr,

    /// Base URL of the MCP resource/tool server
    #[arg(long, env = "MCP_SERVER_URL", default_value = "http://localhost:3001")]
    mcp_url: String,

    /// Timeout for every outbound HTTP request, in seconds
    #[arg(long, env = "RELAY_REQUEST_TIMEOUT", default_value_t = 30)]
    request_timeout: u64,

    /// How long to wait for open sessions on shutdown, in seconds
    #[arg(long, env = "RELAY_SHUTDOWN_GRACE", default_value_t = 5)]
    shutdown_grace: u64,

    /// Serve this HTML file instead of the built-in client
    #[arg(long, env = "RELAY_HTML_PATH")]
    html: Option<PathBuf>,

    /// Never use an LLM; forward processQuery to the MCP server
    #[arg(long)]
    no_llm: bool,

    /// Resource the query agent reads
    #[arg(long, env = "AGENT_RESOURCE_URI", default_value = mcp_relay::agent::DEFAULT_RESOURCE_URI)]
    resource_uri: String,

    /// Tool the query agent runs
    #[arg(long, env = "AGENT_TOOL_NAME", default_value = mcp_relay::agent::DEFAULT_TOOL_NAME)]
    tool_name: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = RelayConfig::default()
        .with_bind(cli.bind)
        .with_mcp_url(cli.mcp_url)
        .with_request_timeout(Duration::from_secs(cli.request_timeout))
        .with_shutdown_grace(Duration::from_secs(cli.shutdown_grace))
        .with_agent(
            AgentConfig::default()
                .with_resource_uri(cli.resource_uri)
                .with_tool_name(cli.tool_name),
        );

    if let Some(path) = cli.html {
        config = config.with_html_path(path);
    }

    if !cli.no_llm {
        match LlmConfig::from_env() {
            Ok(llm) => config = config.with_llm(llm),
            Err(e) => info!("{}; processQuery will be forwarded to the MCP server", e),
        }
    }

    info!("mcp-relay starting");
    info!("  mcp server: {}", config.mcp_url);
    if let Some(llm) = &config.llm {
        info!("  llm: {} ({})", llm.model, llm.endpoint_url);
    }

    let relay = Relay::bind(config).await.context("Failed to start relay")?;
    let handle = relay.handle();

    tokio::spawn(async move {
        shutdown_signal().await;
        handle.shutdown();
    });

    relay.serve().await.context("Relay error")?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT, shutting down...");
        }
        _ = async {
            #[cfg(unix)]
            {
                use tokio::signal::unix::{SignalKind, signal};
                match signal(SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        sigterm.recv().await;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to install SIGTERM handler: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
            }
        } => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}
