use async_trait::async_trait;

use crate::Result;

/// Abstraction over the market-data provider.
///
/// `TwelveDataClient` in `crates/engine` implements this for production.
/// Tests inject scripted fakes so the poller can be exercised without
/// network access.
#[async_trait]
pub trait IndicatorSource: Send + Sync {
    /// Fetch the most recent RSI value for `symbol`.
    ///
    /// `Ok(None)` means the provider responded but the response carried no
    /// value (e.g. market closed); the symbol is skipped for this tick.
    async fn latest_rsi(&self, symbol: &str) -> Result<Option<f64>>;
}
