//! WebSocket handlers for the real-time hub
//!
//! Each socket is registered with the [`Hub`](crate::hub::Hub) as one
//! connection. Client frames are decoded into [`ClientEvent`]s and dispatched;
//! server events queued by the hub are forwarded to the socket. Supports
//! ping/pong for connection keepalive.

use crate::hub::{ClientEvent, ConnectionId, Hub, ServerEvent};
use crate::state::SharedState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// WebSocket upgrade handler
///
/// Upgrades the request and hands the socket to the hub for its lifetime.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> Response {
    let hub = state.hub.clone();
    let ping_interval = state.config.hub.ping_interval;
    ws.on_upgrade(move |socket| handle_socket(socket, hub, ping_interval))
}

// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, hub: Hub, ping_interval: Duration) {
    let (mut sender, mut receiver) = socket.split();

    // Hub events for this connection
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ServerEvent>();
    // Raw frames (pings) that bypass the hub
    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<Message>();

    let connection_id = hub.connect(event_tx.clone()).await;
    info!(connection_id = %connection_id, "WebSocket client connected");

    // Task to forward hub events and control frames to the socket
    let mut send_task = tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                Some(event) = event_rx.recv() => match serde_json::to_string(&event) {
                    Ok(text) => Some(Message::Text(text)),
                    Err(e) => {
                        error!("Failed to serialize hub event: {}", e);
                        None
                    }
                },
                Some(frame) = frame_rx.recv() => Some(frame),
                else => break,
            };
            let Some(msg) = msg else { continue };
            if let Err(e) = sender.send(msg).await {
                debug!("Failed to send message: {}", e);
                break;
            }
        }
    });

    // Task to send periodic pings
    let ping_tx = frame_tx.clone();
    let mut ping_task = tokio::spawn(async move {
        loop {
            tokio::time::sleep(ping_interval).await;
            if ping_tx.send(Message::Ping(vec![])).is_err() {
                break;
            }
        }
    });

    // Receive messages
    let recv_hub = hub.clone();
    let recv_id = connection_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => dispatch(&recv_hub, &recv_id, event, &event_tx).await,
                    Err(e) => {
                        warn!(connection_id = %recv_id, error = %e, "Ignoring malformed frame");
                    }
                },
                Ok(Message::Close(_)) => {
                    info!(connection_id = %recv_id, "WebSocket client disconnected");
                    break;
                }
                Ok(Message::Pong(_)) => {
                    // Client responded to ping
                }
                Err(e) => {
                    debug!(connection_id = %recv_id, "WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    // Wait for any task to complete
    tokio::select! {
        _ = &mut send_task => {
            ping_task.abort();
            recv_task.abort();
        }
        _ = &mut ping_task => {
            send_task.abort();
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
            ping_task.abort();
        }
    }

    hub.disconnect(&connection_id).await;
    info!(connection_id = %connection_id, "WebSocket connection closed");
}

/// Apply one client event to the hub on behalf of `connection_id`
async fn dispatch(
    hub: &Hub,
    connection_id: &ConnectionId,
    event: ClientEvent,
    own_tx: &mpsc::UnboundedSender<ServerEvent>,
) {
    match event {
        ClientEvent::Identify(req) => {
            if hub
                .identify(connection_id, &req.agent_id, req.agent_name.as_deref())
                .await
                .is_none()
            {
                warn!(connection_id = %connection_id, "Identify ignored: blank agent id");
            }
        }
        ClientEvent::Message(req) => {
            let delivery = hub
                .send_message(
                    connection_id,
                    &req.content,
                    req.to.as_deref(),
                    req.kind.as_deref(),
                )
                .await;
            debug!(connection_id = %connection_id, ?delivery, "Message routed");
        }
        ClientEvent::Typing(req) => {
            hub.typing(connection_id, req.to.as_deref(), req.is_typing)
                .await;
        }
        ClientEvent::Ping => {
            let _ = own_tx.send(ServerEvent::Pong);
        }
    }
}
