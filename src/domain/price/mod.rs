//! Price domain - fetching, change detection, history and the tracking cycle

mod change_detector;
mod price_history;
mod price_source;
mod tracker;

pub use change_detector::ChangeDetector;
pub use price_history::PriceHistory;
pub use price_source::PriceSource;
pub use tracker::{CycleOutcome, PriceTracker, TrackerPhase, TrackerState, TrackerStats};
