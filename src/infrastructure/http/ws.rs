use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::domain::price::PriceTracker;
use crate::infrastructure::broadcast::{ChannelBroadcaster, SnapshotMessage};

use super::AppState;

pub(super) async fn websocket_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> Response {
    let Some(hub) = state.hub.clone() else {
        return (StatusCode::NOT_FOUND, "push channel is disabled").into_response();
    };
    let tracker = state.tracker.clone();

    ws.on_upgrade(move |socket| async move {
        if let Err(e) = forward_updates_to_client(socket, hub, tracker).await {
            warn!("⚠️  WebSocket client ended with error: {:#}", e);
        }
    })
}

async fn forward_updates_to_client(
    socket: WebSocket,
    hub: ChannelBroadcaster,
    tracker: Arc<PriceTracker>,
) -> Result<()> {
    // subscribe before the snapshot so no change slips between the two
    let mut receiver = hub.subscribe();
    info!("🔌 A user connected ({} subscriber(s))", hub.subscriber_count());
    let (mut ws_sender, mut ws_receiver) = socket.split();

    if let Some(reading) = tracker.current_price() {
        let snapshot = SnapshotMessage {
            event: "snapshot",
            payload: &reading,
        };
        let text = serde_json::to_string(&snapshot).context("serialize snapshot")?;
        ws_sender.send(Message::Text(text)).await.context("send snapshot")?;
    }

    loop {
        tokio::select! {
            update = receiver.recv() => match update {
                Ok(message) => {
                    let text = serde_json::to_string(&message).context("serialize update")?;
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("⚠️  WebSocket client lagged, skipped {} update(s)", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = ws_receiver.next() => match incoming {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
                Some(Ok(_)) => {}
            },
        }
    }

    info!("🔌 User disconnected");
    Ok(())
}
