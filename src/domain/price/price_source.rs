//! Price source interface

use async_trait::async_trait;

use crate::shared::errors::PriceError;
use crate::shared::types::PriceReading;

/// Upstream that produces the current reading.
///
/// Implementations own their transport and timeout; every failure
/// (unreachable, bad status, malformed body, missing field) is reported as
/// [`PriceError::FetchFailed`].
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Short label used in logs
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<PriceReading, PriceError>;
}
