use async_trait::async_trait;
use crate::{AnalysisError, Bar, Timeframe};

/// Trait for text polarity engines.
///
/// Implementations return a polarity in [-1, 1] for a single piece of text.
/// Callers treat any error as a neutral polarity for that text.
#[async_trait]
pub trait PolarityScorer: Send + Sync {
    /// Short engine name reported in signal metadata
    fn name(&self) -> &str;

    async fn score(&self, text: &str) -> Result<f64, AnalysisError>;
}

/// Trait for historical market data sources
#[async_trait]
pub trait MarketDataFetcher: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch bars covering the trailing `lookback_days`, oldest first.
    async fn fetch(
        &self,
        symbol: &str,
        lookback_days: u32,
        timeframe: Timeframe,
    ) -> Result<Vec<Bar>, AnalysisError>;
}
