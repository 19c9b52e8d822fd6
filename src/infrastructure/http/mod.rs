//! HTTP front end: latest price, history export, on-demand cycle, push channel

mod routes;
mod ws;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use crate::domain::price::PriceTracker;
use crate::infrastructure::broadcast::ChannelBroadcaster;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<PriceTracker>,
    pub hub: Option<ChannelBroadcaster>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/goldprice", get(routes::current_price))
        .route("/api/goldprice/refresh", post(routes::refresh))
        .route("/api/goldpricedata", get(routes::history_json))
        .route("/api/goldpricedata/csv", get(routes::history_csv))
        .route("/api/status", get(routes::status))
        .route("/ws", get(ws::websocket_upgrade))
        .with_state(state)
}

/// Serve until `shutdown` flips to `true`
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let addr = listener.local_addr().context("listener has no local address")?;
    info!("🌐 Server running on http://{}", addr);

    let shutdown_signal = async move {
        while shutdown.changed().await.is_ok() {
            if *shutdown.borrow() {
                break;
            }
        }
    };

    axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal)
        .await
        .context("HTTP server terminated with error")?;

    info!("🛑 HTTP server stopped");
    Ok(())
}
