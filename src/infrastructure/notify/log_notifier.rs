//! Dry-run notifier

use async_trait::async_trait;
use tracing::info;

use crate::domain::notification::{AlertMessage, Notifier};
use crate::shared::errors::DeliveryError;

/// Writes alerts to the log instead of sending them
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, recipient: &str, message: &AlertMessage) -> Result<(), DeliveryError> {
        info!(
            "📝 [dry-run] {} to {}: {} -> {}",
            message.subject, recipient, message.previous, message.current
        );
        Ok(())
    }
}
