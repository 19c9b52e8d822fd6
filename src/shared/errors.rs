//! Error handling for the application

use thiserror::Error;

/// Price-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    #[error("Price fetch failed: {0}")]
    FetchFailed(String),

    #[error("Reading shape mismatch: previous fields {previous:?}, current fields {current:?}")]
    ShapeMismatch {
        previous: Vec<String>,
        current: Vec<String>,
    },

    #[error("Invalid price reading: {0}")]
    InvalidReading(String),
}

impl PriceError {
    pub fn fetch_failed(reason: impl Into<String>) -> Self {
        PriceError::FetchFailed(reason.into())
    }

    /// Shape mismatches are integration bugs and must never be swallowed
    pub fn is_fatal(&self) -> bool {
        matches!(self, PriceError::ShapeMismatch { .. })
    }
}

/// Notification delivery errors, one per recipient or channel
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Delivery to {target} failed: {reason}")]
    DeliveryFailed { target: String, reason: String },
}

impl DeliveryError {
    pub fn new(target: impl Into<String>, reason: impl Into<String>) -> Self {
        DeliveryError::DeliveryFailed {
            target: target.into(),
            reason: reason.into(),
        }
    }

    pub fn target(&self) -> &str {
        match self {
            DeliveryError::DeliveryFailed { target, .. } => target,
        }
    }
}

/// Startup errors: bad configuration or an adapter that cannot be built
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_shape_mismatch_is_fatal() {
        assert!(!PriceError::fetch_failed("timeout").is_fatal());
        assert!(!PriceError::InvalidReading("negative".into()).is_fatal());
        assert!(PriceError::ShapeMismatch {
            previous: vec!["price".into()],
            current: vec!["purchasingPrice".into(), "sellingPrice".into()],
        }
        .is_fatal());
    }

    #[test]
    fn test_delivery_error_message() {
        let err = DeliveryError::new("ops@example.com", "status 500");
        assert_eq!(err.target(), "ops@example.com");
        assert_eq!(err.to_string(), "Delivery to ops@example.com failed: status 500");
    }
}
