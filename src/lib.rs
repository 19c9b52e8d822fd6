//! Goldwatch - gold price tracker
//! Polls a price source, records changes, alerts by mail and pushes over WebSocket

pub mod app;
pub mod application;
pub mod config;
pub mod domain;
pub mod export;
pub mod infrastructure;
pub mod shared;

// Re-export main types for convenience
pub use domain::notification::NotificationDispatcher;
pub use domain::price::{ChangeDetector, CycleOutcome, PriceHistory, PriceSource, PriceTracker};
pub use shared::errors::{DeliveryError, PriceError};
pub use shared::types::{HistoryRecord, PriceReading};
