//! In-process push hub backed by `tokio::sync::broadcast`

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::notification::{BroadcastPayload, Broadcaster};
use crate::shared::errors::DeliveryError;
use crate::shared::types::PriceReading;

/// Wire envelope forwarded to WebSocket clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BroadcastMessage {
    pub channel: String,
    pub event: String,
    pub payload: BroadcastPayload,
}

/// Sent once to a client right after it connects
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotMessage<'a> {
    pub event: &'static str,
    pub payload: &'a PriceReading,
}

#[derive(Debug, Clone)]
pub struct ChannelBroadcaster {
    sender: broadcast::Sender<BroadcastMessage>,
}

impl ChannelBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastMessage> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl Broadcaster for ChannelBroadcaster {
    async fn publish(
        &self,
        channel: &str,
        event: &str,
        payload: &BroadcastPayload,
    ) -> Result<(), DeliveryError> {
        let message = BroadcastMessage {
            channel: channel.to_string(),
            event: event.to_string(),
            payload: payload.clone(),
        };

        // No subscribers is not a delivery failure: nobody was listening
        match self.sender.send(message) {
            Ok(receivers) => debug!("📡 {} on {} sent to {} subscriber(s)", event, channel, receivers),
            Err(_) => debug!("📡 {} on {} had no subscribers", event, channel),
        }
        Ok(())
    }
}
