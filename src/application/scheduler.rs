//! Periodic trigger for the tracking cycle

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::domain::price::{CycleOutcome, PriceTracker};

/// Fires [`PriceTracker::try_run_cycle`] every `period`.
///
/// Each tick runs on its own task so the loop keeps ticking (and observing
/// shutdown) while a slow fetch is in flight; the tracker's cycle guard drops
/// any tick that lands during an in-flight cycle.
pub struct Scheduler {
    tracker: Arc<PriceTracker>,
    period: Duration,
    run_on_start: bool,
}

impl Scheduler {
    pub fn new(tracker: Arc<PriceTracker>, period: Duration) -> Self {
        Self {
            tracker,
            period,
            run_on_start: true,
        }
    }

    /// Whether the first cycle fires immediately or after one period
    pub fn run_on_start(mut self, run_on_start: bool) -> Self {
        self.run_on_start = run_on_start;
        self
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("⏰ Scheduler started, checking gold price every {:?}", self.period);

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        if !self.run_on_start {
            ticker.reset();
        }

        let mut cycles = JoinSet::new();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    debug!("Checking gold price...");
                    let tracker = Arc::clone(&self.tracker);
                    cycles.spawn(async move {
                        run_tick(&tracker).await;
                    });
                }
                Some(finished) = cycles.join_next(), if !cycles.is_empty() => {
                    if let Err(e) = finished {
                        warn!("⚠️  Cycle task ended abnormally: {}", e);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        if !cycles.is_empty() {
            info!("⏳ Waiting for {} in-flight check(s) to finish", cycles.len());
        }
        while let Some(finished) = cycles.join_next().await {
            if let Err(e) = finished {
                warn!("⚠️  Cycle task ended abnormally: {}", e);
            }
        }
        info!("🛑 Scheduler stopped");
    }
}

async fn run_tick(tracker: &PriceTracker) {
    match tracker.try_run_cycle().await {
        Ok(CycleOutcome::Skipped) => {
            warn!("⏭️  Previous gold price check still running, tick dropped");
        }
        Ok(_) => {}
        Err(e) => {
            error!("🚨 Gold price cycle rejected a reading: {}", e);
        }
    }
}
