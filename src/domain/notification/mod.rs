//! Notification domain - change alerts by mail and push broadcast

mod dispatcher;
mod message;

pub use dispatcher::{DispatchReport, NotificationDispatcher};
pub use message::MessageTemplate;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::shared::errors::DeliveryError;
use crate::shared::types::PriceReading;

/// A detected change, alive only for one dispatch
#[derive(Debug, Clone)]
pub struct NotificationEvent {
    pub previous: PriceReading,
    pub current: PriceReading,
    pub occurred_at: DateTime<FixedOffset>,
}

/// Rendered alert, identical for every recipient
#[derive(Debug, Clone)]
pub struct AlertMessage {
    pub subject: String,
    pub html: String,
    pub text: String,
    pub previous: PriceReading,
    pub current: PriceReading,
}

/// Structured payload published to push subscribers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BroadcastPayload {
    pub previous: PriceReading,
    pub current: PriceReading,
    pub timestamp: String,
}

/// Per-recipient message transport (mail and friends)
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, recipient: &str, message: &AlertMessage) -> Result<(), DeliveryError>;
}

/// Named-channel push transport
#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn publish(
        &self,
        channel: &str,
        event: &str,
        payload: &BroadcastPayload,
    ) -> Result<(), DeliveryError>;
}
