//! Fan-out of change alerts to recipients and the broadcast channel

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::shared::errors::DeliveryError;

use super::{Broadcaster, BroadcastPayload, MessageTemplate, NotificationEvent, Notifier};

/// Outcome of one dispatch. Failures are collected here, never raised.
#[derive(Debug, Default, Clone)]
pub struct DispatchReport {
    pub delivered: Vec<String>,
    pub failures: Vec<DeliveryError>,
}

impl DispatchReport {
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

struct MailTarget {
    notifier: Arc<dyn Notifier>,
    recipients: Vec<String>,
}

struct BroadcastTarget {
    broadcaster: Arc<dyn Broadcaster>,
    channel: String,
    event: String,
}

/// Sends one alert per recipient and publishes one broadcast event per change
pub struct NotificationDispatcher {
    template: MessageTemplate,
    mail: Option<MailTarget>,
    broadcast: Option<BroadcastTarget>,
}

impl NotificationDispatcher {
    pub fn new(template: MessageTemplate) -> Self {
        Self {
            template,
            mail: None,
            broadcast: None,
        }
    }

    /// Dispatcher that only logs; used when nothing is configured
    pub fn disabled() -> Self {
        Self::new(MessageTemplate::default())
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>, recipients: Vec<String>) -> Self {
        self.mail = Some(MailTarget { notifier, recipients });
        self
    }

    pub fn with_broadcaster(
        mut self,
        broadcaster: Arc<dyn Broadcaster>,
        channel: impl Into<String>,
        event: impl Into<String>,
    ) -> Self {
        self.broadcast = Some(BroadcastTarget {
            broadcaster,
            channel: channel.into(),
            event: event.into(),
        });
        self
    }

    pub fn recipients(&self) -> &[String] {
        self.mail.as_ref().map(|m| m.recipients.as_slice()).unwrap_or(&[])
    }

    /// Deliver `event` everywhere. Sends run concurrently and independently:
    /// a failing recipient neither blocks nor cancels the others.
    pub async fn dispatch(&self, event: &NotificationEvent) -> DispatchReport {
        let mail_sends = async {
            let Some(mail) = &self.mail else {
                return Vec::new();
            };
            let message = self.template.render(event);
            let sends = mail.recipients.iter().map(|recipient| {
                let message = &message;
                let notifier = &mail.notifier;
                async move {
                    notifier
                        .send(recipient, message)
                        .await
                        .map(|_| recipient.clone())
                }
            });
            join_all(sends).await
        };

        let publish = async {
            let Some(target) = &self.broadcast else {
                return None;
            };
            let payload = BroadcastPayload {
                previous: event.previous.clone(),
                current: event.current.clone(),
                timestamp: event.occurred_at.to_rfc3339(),
            };
            let result = target
                .broadcaster
                .publish(&target.channel, &target.event, &payload)
                .await
                .map(|_| format!("channel:{}", target.channel));
            Some(result)
        };

        let (mail_results, publish_result) = tokio::join!(mail_sends, publish);

        let mut report = DispatchReport::default();
        for result in mail_results.into_iter().chain(publish_result) {
            match result {
                Ok(target) => {
                    debug!("📨 Alert delivered to {}", target);
                    report.delivered.push(target);
                }
                Err(e) => {
                    warn!("⚠️  {}", e);
                    report.failures.push(e);
                }
            }
        }

        if report.attempted() == 0 {
            info!("🔕 Price changed ({} -> {}) but no notification target is configured", event.previous, event.current);
        } else if report.is_clean() {
            info!(
                "📨 Dispatched price change {} -> {} to {} target(s)",
                event.previous,
                event.current,
                report.delivered.len()
            );
        } else {
            warn!(
                "📨 Dispatched price change {} -> {}: {} delivered, {} failed",
                event.previous,
                event.current,
                report.delivered.len(),
                report.failures.len()
            );
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::notification::AlertMessage;
    use crate::shared::types::PriceReading;
    use async_trait::async_trait;
    use chrono::{FixedOffset, Utc};
    use parking_lot::Mutex;
    use rust_decimal_macros::dec;

    #[derive(Default)]
    struct RecordingNotifier {
        fail_for: Vec<String>,
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        fn name(&self) -> &str {
            "recording"
        }

        async fn send(&self, recipient: &str, message: &AlertMessage) -> Result<(), DeliveryError> {
            self.sent.lock().push((recipient.to_string(), message.html.clone()));
            if self.fail_for.iter().any(|r| r == recipient) {
                return Err(DeliveryError::new(recipient, "mailbox unavailable"));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingBroadcaster {
        fail: bool,
        published: Mutex<Vec<(String, String, BroadcastPayload)>>,
    }

    #[async_trait]
    impl Broadcaster for RecordingBroadcaster {
        async fn publish(
            &self,
            channel: &str,
            event: &str,
            payload: &BroadcastPayload,
        ) -> Result<(), DeliveryError> {
            self.published
                .lock()
                .push((channel.to_string(), event.to_string(), payload.clone()));
            if self.fail {
                return Err(DeliveryError::new(channel, "hub closed"));
            }
            Ok(())
        }
    }

    fn event() -> NotificationEvent {
        NotificationEvent {
            previous: PriceReading::single(dec!(100)).unwrap(),
            current: PriceReading::single(dec!(105)).unwrap(),
            occurred_at: Utc::now().with_timezone(&FixedOffset::east_opt(19800).unwrap()),
        }
    }

    #[tokio::test]
    async fn test_failing_recipient_does_not_stop_others() {
        let notifier = Arc::new(RecordingNotifier {
            fail_for: vec!["a@example.com".to_string()],
            ..Default::default()
        });
        let dispatcher = NotificationDispatcher::new(MessageTemplate::default()).with_notifier(
            notifier.clone(),
            vec!["a@example.com".to_string(), "b@example.com".to_string()],
        );

        let report = dispatcher.dispatch(&event()).await;

        assert_eq!(report.attempted(), 2);
        assert_eq!(report.delivered, vec!["b@example.com".to_string()]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].target(), "a@example.com");

        let sent = notifier.sent.lock();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].1, sent[1].1, "all recipients get identical content");
    }

    #[tokio::test]
    async fn test_broadcast_payload_carries_both_readings() {
        let broadcaster = Arc::new(RecordingBroadcaster::default());
        let dispatcher = NotificationDispatcher::new(MessageTemplate::default()).with_broadcaster(
            broadcaster.clone(),
            "gold-price",
            "goldPriceUpdate",
        );

        let report = dispatcher.dispatch(&event()).await;
        assert!(report.is_clean());
        assert_eq!(report.delivered, vec!["channel:gold-price".to_string()]);

        let published = broadcaster.published.lock();
        assert_eq!(published.len(), 1);
        let (channel, name, payload) = &published[0];
        assert_eq!(channel, "gold-price");
        assert_eq!(name, "goldPriceUpdate");
        assert_eq!(payload.previous.get("price"), Some(dec!(100)));
        assert_eq!(payload.current.get("price"), Some(dec!(105)));
    }

    #[tokio::test]
    async fn test_broadcast_failure_is_collected() {
        let notifier = Arc::new(RecordingNotifier::default());
        let broadcaster = Arc::new(RecordingBroadcaster {
            fail: true,
            ..Default::default()
        });
        let dispatcher = NotificationDispatcher::new(MessageTemplate::default())
            .with_notifier(notifier.clone(), vec!["a@example.com".to_string()])
            .with_broadcaster(broadcaster, "gold-price", "goldPriceUpdate");

        let report = dispatcher.dispatch(&event()).await;
        assert_eq!(report.delivered, vec!["a@example.com".to_string()]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].target(), "gold-price");
    }

    #[tokio::test]
    async fn test_disabled_dispatcher_attempts_nothing() {
        let report = NotificationDispatcher::disabled().dispatch(&event()).await;
        assert_eq!(report.attempted(), 0);
        assert!(report.is_clean());
    }
}
