#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::FixedOffset;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use goldwatch::domain::notification::{AlertMessage, MessageTemplate, NotificationDispatcher, Notifier};
use goldwatch::{DeliveryError, PriceError, PriceReading, PriceSource, PriceTracker};

pub fn price(value: Decimal) -> PriceReading {
    PriceReading::single(value).unwrap()
}

pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap()
}

/// Replays a fixed list of fetch results, then fails
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<PriceReading, PriceError>>>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Option<Decimal>>) -> Self {
        let script = script
            .into_iter()
            .map(|step| match step {
                Some(value) => Ok(price(value)),
                None => Err(PriceError::fetch_failed("upstream unreachable")),
            })
            .collect();
        Self {
            script: Mutex::new(script),
        }
    }

    /// Replays arbitrary readings, e.g. ones of differing shape
    pub fn from_readings(readings: Vec<PriceReading>) -> Self {
        Self {
            script: Mutex::new(readings.into_iter().map(Ok).collect()),
        }
    }
}

#[async_trait]
impl PriceSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch(&self) -> Result<PriceReading, PriceError> {
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(PriceError::fetch_failed("script exhausted")))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub fail_for: Vec<String>,
    pub sent: Mutex<Vec<(String, PriceReading, PriceReading)>>,
}

impl RecordingNotifier {
    pub fn failing_for(recipient: &str) -> Self {
        Self {
            fail_for: vec![recipient.to_string()],
            ..Self::default()
        }
    }

    /// `(previous, current)` pairs as seen by the first recipient
    pub fn pairs_for(&self, recipient: &str) -> Vec<(Decimal, Decimal)> {
        self.sent
            .lock()
            .iter()
            .filter(|(to, _, _)| to == recipient)
            .map(|(_, prev, cur)| (prev.get("price").unwrap(), cur.get("price").unwrap()))
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, recipient: &str, message: &AlertMessage) -> Result<(), DeliveryError> {
        self.sent.lock().push((
            recipient.to_string(),
            message.previous.clone(),
            message.current.clone(),
        ));
        if self.fail_for.iter().any(|r| r == recipient) {
            return Err(DeliveryError::new(recipient, "SMTP relay refused"));
        }
        Ok(())
    }
}

pub fn tracker_with(
    source: ScriptedSource,
    notifier: Arc<RecordingNotifier>,
    recipients: &[&str],
) -> PriceTracker {
    let dispatcher = NotificationDispatcher::new(MessageTemplate::default()).with_notifier(
        notifier,
        recipients.iter().map(|r| r.to_string()).collect(),
    );
    PriceTracker::new(Arc::new(source), dispatcher, ist())
}
