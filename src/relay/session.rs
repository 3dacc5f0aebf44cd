// ABOUTME: One task per WebSocket - reads frames sequentially, dispatches them,
// ABOUTME: and closes with "going away" when the relay shuts down.

use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket, close_code};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio_util::sync::CancellationToken;

use super::dispatch::Dispatcher;
use super::protocol::ServerMessage;
use super::registry::ConnectionRegistry;
use crate::error::ProtocolError;

/// Serve one client until it disconnects or `shutdown` fires.
///
/// A message already being handled when shutdown starts is finished and
/// answered before the close frame goes out.
pub async fn run_session(
    socket: WebSocket,
    dispatcher: Arc<Dispatcher>,
    registry: ConnectionRegistry,
    shutdown: CancellationToken,
) {
    let mut conn = registry.register().await;
    let id = conn.id();
    tracing::info!(connection = %id, "client connected");

    let (mut sender, mut receiver) = socket.split();

    loop {
        let frame = tokio::select! {
            _ = shutdown.cancelled() => {
                let close = CloseFrame {
                    code: close_code::AWAY,
                    reason: "relay shutting down".into(),
                };
                if let Err(e) = sender.send(Message::Close(Some(close))).await {
                    tracing::debug!(connection = %id, error = %e, "failed to send close frame");
                }
                break;
            }
            frame = receiver.next() => frame,
        };

        let reply = match frame {
            Some(Ok(Message::Text(text))) => {
                conn.set_loading(true);
                registry.publish(&conn).await;
                dispatcher.dispatch(&mut conn, text.as_str()).await
            }
            Some(Ok(Message::Binary(_))) => ServerMessage::error(&ProtocolError::UnsupportedFrame.into()),
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
            Some(Ok(Message::Close(_))) | None => break,
            Some(Err(e)) => {
                tracing::debug!(connection = %id, error = %e, "socket error");
                break;
            }
        };

        registry.publish(&conn).await;

        if let Err(e) = send_reply(&mut sender, &reply).await {
            tracing::debug!(connection = %id, error = %e, "failed to send reply");
            break;
        }
    }

    registry.remove(id).await;
    tracing::info!(connection = %id, "client disconnected");
}

async fn send_reply(
    sender: &mut SplitSink<WebSocket, Message>,
    reply: &ServerMessage,
) -> Result<(), axum::Error> {
    let text = serde_json::to_string(reply).map_err(axum::Error::new)?;
    sender.send(Message::Text(text.into())).await
}
