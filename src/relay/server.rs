// ABOUTME: axum server hosting the WebSocket endpoint, the HTML client, health
// ABOUTME: and a 404 fallback, with an explicit graceful shutdown entry point.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::dispatch::Dispatcher;
use super::registry::ConnectionRegistry;
use super::session::run_session;
use crate::agent::QueryAgent;
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::llm::ChatClient;
use crate::mcp::HttpGateway;

const INDEX_HTML: &str = include_str!("index.html");

/// Where the HTML client comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSource {
    Embedded,
    File(PathBuf),
}

/// Shared state for the relay's handlers.
#[derive(Clone)]
pub struct RelayState {
    pub dispatcher: Arc<Dispatcher>,
    pub registry: ConnectionRegistry,
    pub shutdown: CancellationToken,
    pub sessions: TaskTracker,
    pub page: PageSource,
}

impl RelayState {
    pub fn new(dispatcher: Dispatcher, page: PageSource) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            registry: ConnectionRegistry::new(),
            shutdown: CancellationToken::new(),
            sessions: TaskTracker::new(),
            page,
        }
    }
}

pub fn router(state: RelayState) -> Router {
    Router::new()
        .route("/", get(serve_root))
        .route("/index.html", get(serve_index))
        .route("/ws", get(serve_ws))
        .route("/health", get(serve_health))
        .fallback(not_found)
        .with_state(state)
}

/// `/` upgrades WebSocket requests and serves the page to everything else.
async fn serve_root(
    State(state): State<RelayState>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    match ws {
        Ok(ws) => upgrade(state, ws),
        Err(_) => serve_page(&state.page).await,
    }
}

async fn serve_index(State(state): State<RelayState>) -> Response {
    serve_page(&state.page).await
}

async fn serve_ws(State(state): State<RelayState>, ws: WebSocketUpgrade) -> Response {
    upgrade(state, ws)
}

fn upgrade(state: RelayState, ws: WebSocketUpgrade) -> Response {
    if state.shutdown.is_cancelled() {
        return (StatusCode::SERVICE_UNAVAILABLE, "Relay is shutting down").into_response();
    }

    let sessions = state.sessions.clone();
    ws.on_upgrade(move |socket| {
        sessions.track_future(run_session(
            socket,
            state.dispatcher,
            state.registry,
            state.shutdown,
        ))
    })
}

async fn serve_page(page: &PageSource) -> Response {
    match page {
        PageSource::Embedded => Html(INDEX_HTML).into_response(),
        PageSource::File(path) => match tokio::fs::read_to_string(path).await {
            Ok(html) => Html(html).into_response(),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to read HTML file");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                    "Error loading HTML file",
                )
                    .into_response()
            }
        },
    }
}

async fn serve_health(State(state): State<RelayState>) -> impl IntoResponse {
    let dispatcher = &state.dispatcher;
    Json(serde_json::json!({
        "status": if state.shutdown.is_cancelled() { "shutting_down" } else { "ok" },
        "version": env!("CARGO_PKG_VERSION"),
        "mcpUrl": dispatcher.upstream().base_url(),
        "llmModel": dispatcher.agent().map(|a| a.model()),
        "connections": state.registry.count().await,
        "connected": state.registry.connected_count().await,
        "loading": state.registry.loading_count().await,
    }))
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}

/// Stops a running [`Relay`] from another task.
#[derive(Debug, Clone)]
pub struct RelayHandle {
    shutdown: CancellationToken,
}

impl RelayHandle {
    /// Stop accepting connections and ask every session to close.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

/// A bound, not yet serving relay.
pub struct Relay {
    listener: TcpListener,
    state: RelayState,
    grace: Duration,
}

impl Relay {
    /// Build the gateway, optional LLM agent and listener from `config`.
    pub async fn bind(config: RelayConfig) -> Result<Self, RelayError> {
        let gateway = HttpGateway::with_timeout(&config.mcp_url, config.request_timeout)?;
        let mut dispatcher = Dispatcher::new(Arc::new(gateway));

        if let Some(llm) = config.llm.clone() {
            let client = ChatClient::with_timeout(llm, config.request_timeout)?;
            tracing::info!(model = %client.config().model, endpoint = %client.config().endpoint_url, "LLM enabled");
            dispatcher = dispatcher.with_agent(QueryAgent::new(Arc::new(client), config.agent.clone()));
        }

        Self::bind_with(config, dispatcher).await
    }

    /// Bind with a caller-built dispatcher.
    pub async fn bind_with(config: RelayConfig, dispatcher: Dispatcher) -> Result<Self, RelayError> {
        let listener = TcpListener::bind(config.bind).await?;
        let page = match config.html_path {
            Some(path) => PageSource::File(path),
            None => PageSource::Embedded,
        };

        Ok(Self {
            listener,
            state: RelayState::new(dispatcher, page),
            grace: config.shutdown_grace,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, RelayError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn handle(&self) -> RelayHandle {
        RelayHandle {
            shutdown: self.state.shutdown.clone(),
        }
    }

    pub fn registry(&self) -> ConnectionRegistry {
        self.state.registry.clone()
    }

    /// Serve until [`RelayHandle::shutdown`] is called, then wait up to the
    /// grace period for open sessions to finish.
    pub async fn serve(self) -> Result<(), RelayError> {
        let Relay {
            listener,
            state,
            grace,
        } = self;

        let addr = listener.local_addr()?;
        let shutdown = state.shutdown.clone();
        let sessions = state.sessions.clone();
        let app = router(state);

        tracing::info!(%addr, "relay listening");
        tracing::info!("   WebSocket: ws://{}/ws", addr);
        tracing::info!("   Health: GET http://{}/health", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await?;

        sessions.close();
        if tokio::time::timeout(grace, sessions.wait()).await.is_err() {
            tracing::warn!(remaining = sessions.len(), ?grace, "sessions still open after grace period");
        }

        tracing::info!("relay stopped");
        Ok(())
    }
}
