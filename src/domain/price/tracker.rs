//! Poll-compare-record-notify orchestration

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::domain::notification::{NotificationDispatcher, NotificationEvent};
use crate::shared::errors::PriceError;
use crate::shared::types::{HistoryRecord, PriceReading};

use super::{ChangeDetector, PriceHistory, PriceSource};

/// The single "last known price" slot
#[derive(Debug, Default, Clone)]
pub struct TrackerState {
    last_reading: Option<PriceReading>,
}

impl TrackerState {
    pub fn last_reading(&self) -> Option<&PriceReading> {
        self.last_reading.as_ref()
    }

    pub fn phase(&self) -> TrackerPhase {
        if self.last_reading.is_some() {
            TrackerPhase::Idle
        } else {
            TrackerPhase::Uninitialized
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerPhase {
    Uninitialized,
    Idle,
}

/// What one cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// First successful fetch: recorded, not notified
    Baseline(PriceReading),
    Changed {
        previous: PriceReading,
        current: PriceReading,
    },
    Unchanged(PriceReading),
    /// Fetch failed, state untouched
    FetchFailed(String),
    /// Another cycle was in flight; tick dropped
    Skipped,
}

impl CycleOutcome {
    /// The reading this cycle fetched, if any
    pub fn reading(&self) -> Option<&PriceReading> {
        match self {
            CycleOutcome::Baseline(r) | CycleOutcome::Unchanged(r) => Some(r),
            CycleOutcome::Changed { current, .. } => Some(current),
            CycleOutcome::FetchFailed(_) | CycleOutcome::Skipped => None,
        }
    }
}

/// Tracker statistics
#[derive(Debug, Clone, Serialize)]
pub struct TrackerStats {
    pub phase: TrackerPhase,
    pub started_at: String,
    pub last_success_at: Option<String>,
    pub cycles_completed: u64,
    pub fetch_failures: u64,
    pub ticks_skipped: u64,
    pub changes_detected: u64,
    pub notifications_delivered: u64,
    pub notifications_failed: u64,
    pub history_len: usize,
}

#[derive(Debug, Default)]
struct Counters {
    last_success_at: Option<DateTime<FixedOffset>>,
    cycles_completed: u64,
    fetch_failures: u64,
    ticks_skipped: u64,
    changes_detected: u64,
    notifications_delivered: u64,
    notifications_failed: u64,
}

// State and history share one lock so readers never see a reading without
// its history entry or the other way round.
#[derive(Debug, Default)]
struct Inner {
    state: TrackerState,
    history: PriceHistory,
    counters: Counters,
}

/// Owns tracker state and history and runs the cycle.
///
/// Cycles are serialized through a single-slot guard: [`run_cycle`](Self::run_cycle)
/// waits for an in-flight cycle, [`try_run_cycle`](Self::try_run_cycle) drops
/// out with [`CycleOutcome::Skipped`]. The state lock is never held across
/// an await point.
pub struct PriceTracker {
    source: Arc<dyn PriceSource>,
    dispatcher: NotificationDispatcher,
    detector: ChangeDetector,
    reporting_offset: FixedOffset,
    started_at: DateTime<FixedOffset>,
    inner: RwLock<Inner>,
    cycle_guard: Mutex<()>,
}

impl PriceTracker {
    pub fn new(
        source: Arc<dyn PriceSource>,
        dispatcher: NotificationDispatcher,
        reporting_offset: FixedOffset,
    ) -> Self {
        Self {
            source,
            dispatcher,
            detector: ChangeDetector::new(),
            reporting_offset,
            started_at: Utc::now().with_timezone(&reporting_offset),
            inner: RwLock::new(Inner::default()),
            cycle_guard: Mutex::new(()),
        }
    }

    /// Run one cycle, waiting for any in-flight cycle to finish first
    pub async fn run_cycle(&self) -> Result<CycleOutcome, PriceError> {
        let _guard = self.cycle_guard.lock().await;
        self.cycle().await
    }

    /// Run one cycle unless another is in flight
    pub async fn try_run_cycle(&self) -> Result<CycleOutcome, PriceError> {
        let Ok(_guard) = self.cycle_guard.try_lock() else {
            self.inner.write().counters.ticks_skipped += 1;
            debug!("⏭️  Cycle already in flight, dropping tick");
            return Ok(CycleOutcome::Skipped);
        };
        self.cycle().await
    }

    async fn cycle(&self) -> Result<CycleOutcome, PriceError> {
        let current = match self.source.fetch().await {
            Ok(reading) => reading,
            Err(e) => {
                warn!("❌ Failed to fetch gold price from {}: {}", self.source.name(), e);
                self.inner.write().counters.fetch_failures += 1;
                return Ok(CycleOutcome::FetchFailed(e.to_string()));
            }
        };
        let now = Utc::now().with_timezone(&self.reporting_offset);

        let outcome = {
            let mut inner = self.inner.write();
            let previous = inner.state.last_reading.clone();

            let changed = match self.detector.is_changed(previous.as_ref(), &current) {
                Ok(changed) => changed,
                Err(e) => {
                    error!("🚨 {} (source {}); reading rejected", e, self.source.name());
                    return Err(e);
                }
            };

            if previous.is_none() || changed {
                inner.history.append(HistoryRecord::new(current.clone(), now));
            }
            inner.state.last_reading = Some(current.clone());
            inner.counters.cycles_completed += 1;
            inner.counters.last_success_at = Some(now);

            match previous {
                None => CycleOutcome::Baseline(current),
                Some(previous) if changed => {
                    inner.counters.changes_detected += 1;
                    CycleOutcome::Changed { previous, current }
                }
                Some(_) => CycleOutcome::Unchanged(current),
            }
        };

        match &outcome {
            CycleOutcome::Baseline(reading) => {
                info!("✅ Baseline gold price recorded: {}", reading);
            }
            CycleOutcome::Unchanged(reading) => {
                debug!("Gold price unchanged: {}", reading);
            }
            CycleOutcome::Changed { previous, current } => {
                info!("📈 Gold price changed: {} -> {}", previous, current);
                let event = NotificationEvent {
                    previous: previous.clone(),
                    current: current.clone(),
                    occurred_at: now,
                };
                let report = self.dispatcher.dispatch(&event).await;

                let mut inner = self.inner.write();
                inner.counters.notifications_delivered += report.delivered.len() as u64;
                inner.counters.notifications_failed += report.failures.len() as u64;
            }
            CycleOutcome::FetchFailed(_) | CycleOutcome::Skipped => {}
        }

        Ok(outcome)
    }

    /// Last successfully fetched reading. Never triggers a fetch.
    pub fn current_price(&self) -> Option<PriceReading> {
        self.inner.read().state.last_reading.clone()
    }

    pub fn history_snapshot(&self) -> Vec<HistoryRecord> {
        self.inner.read().history.all().to_vec()
    }

    pub fn phase(&self) -> TrackerPhase {
        self.inner.read().state.phase()
    }

    pub fn is_initialized(&self) -> bool {
        self.phase() == TrackerPhase::Idle
    }

    pub fn reporting_offset(&self) -> FixedOffset {
        self.reporting_offset
    }

    pub fn stats(&self) -> TrackerStats {
        let inner = self.inner.read();
        let counters = &inner.counters;
        TrackerStats {
            phase: inner.state.phase(),
            started_at: self.started_at.to_rfc3339(),
            last_success_at: counters.last_success_at.map(|t| t.to_rfc3339()),
            cycles_completed: counters.cycles_completed,
            fetch_failures: counters.fetch_failures,
            ticks_skipped: counters.ticks_skipped,
            changes_detected: counters.changes_detected,
            notifications_delivered: counters.notifications_delivered,
            notifications_failed: counters.notifications_failed,
            history_len: inner.history.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::collections::VecDeque;
    use tokio::sync::Notify;

    struct ScriptedSource {
        script: parking_lot::Mutex<VecDeque<Result<PriceReading, PriceError>>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<PriceReading, PriceError>>) -> Self {
            Self {
                script: parking_lot::Mutex::new(script.into()),
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

    struct GatedSource {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl PriceSource for GatedSource {
        fn name(&self) -> &str {
            "gated"
        }

        async fn fetch(&self) -> Result<PriceReading, PriceError> {
            self.entered.notify_one();
            self.release.notified().await;
            PriceReading::single(dec!(100))
        }
    }

    fn tracker(source: Arc<dyn PriceSource>) -> PriceTracker {
        PriceTracker::new(
            source,
            NotificationDispatcher::disabled(),
            FixedOffset::east_opt(19800).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_shape_mismatch_leaves_state_unchanged() {
        let dual = PriceReading::new([("sellingPrice", dec!(1)), ("purchasingPrice", dec!(2))]);
        let source = ScriptedSource::new(vec![PriceReading::single(dec!(100)), dual]);
        let tracker = tracker(Arc::new(source));

        tracker.run_cycle().await.unwrap();
        let err = tracker.run_cycle().await.unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(tracker.current_price(), Some(PriceReading::single(dec!(100)).unwrap()));
        assert_eq!(tracker.history_snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_try_run_cycle_skips_while_in_flight() {
        let source = Arc::new(GatedSource {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let tracker = Arc::new(tracker(source.clone()));

        let running = {
            let tracker = tracker.clone();
            tokio::spawn(async move { tracker.run_cycle().await })
        };
        source.entered.notified().await;

        let skipped = tracker.try_run_cycle().await.unwrap();
        assert_eq!(skipped, CycleOutcome::Skipped);

        source.release.notify_one();
        let outcome = running.await.unwrap().unwrap();
        assert!(matches!(outcome, CycleOutcome::Baseline(_)));

        let stats = tracker.stats();
        assert_eq!(stats.ticks_skipped, 1);
        assert_eq!(stats.cycles_completed, 1);
        assert_eq!(stats.phase, TrackerPhase::Idle);
    }

    #[tokio::test]
    async fn test_uninitialized_tracker_reports_nothing() {
        let tracker = tracker(Arc::new(ScriptedSource::new(vec![])));
        assert_eq!(tracker.phase(), TrackerPhase::Uninitialized);
        assert!(tracker.current_price().is_none());

        let outcome = tracker.run_cycle().await.unwrap();
        assert!(matches!(outcome, CycleOutcome::FetchFailed(_)));
        assert!(outcome.reading().is_none());
        assert!(!tracker.is_initialized());
        assert_eq!(tracker.stats().fetch_failures, 1);
    }
}
