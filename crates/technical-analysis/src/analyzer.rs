use analysis_core::{
    round_to, AnalysisError, Bar, MarketDataFetcher, TechnicalResult, TechnicalSnapshot, Timeframe,
};
use std::sync::Arc;

use crate::indicators::{average_volume, rsi};

/// Lookback and RSI settings for the technical stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TechnicalConfig {
    pub rsi_period: usize,
    pub lookback_days: u32,
    pub timeframe: Timeframe,
}

impl Default for TechnicalConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            lookback_days: 60,
            timeframe: Timeframe::Day1,
        }
    }
}

impl TechnicalConfig {
    pub fn new(rsi_period: usize, lookback_days: u32, timeframe: Timeframe) -> Result<Self, AnalysisError> {
        if rsi_period == 0 {
            return Err(AnalysisError::InvalidConfig(
                "RSI period must be at least 1".to_string(),
            ));
        }
        if lookback_days == 0 {
            return Err(AnalysisError::InvalidConfig(
                "history window must be at least 1 day".to_string(),
            ));
        }
        Ok(Self {
            rsi_period,
            lookback_days,
            timeframe,
        })
    }
}

/// Fetches a price history and derives RSI plus price/volume context.
pub struct TechnicalIndicatorCalculator {
    fetcher: Arc<dyn MarketDataFetcher>,
    config: TechnicalConfig,
}

impl TechnicalIndicatorCalculator {
    pub fn new(fetcher: Arc<dyn MarketDataFetcher>, config: TechnicalConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn rsi_period(&self) -> usize {
        self.config.rsi_period
    }

    pub fn config(&self) -> &TechnicalConfig {
        &self.config
    }

    pub fn source_name(&self) -> &str {
        self.fetcher.name()
    }

    /// Run the technical stage for one ticker. Every failure comes back as
    /// [`TechnicalResult::Failure`] with a readable reason.
    pub async fn analyze(&self, ticker: &str) -> TechnicalResult {
        match self.try_analyze(ticker).await {
            Ok(snapshot) => {
                tracing::info!(
                    "Technical data for {}: RSI {:.2}, price {:.2}, {} bars",
                    ticker,
                    snapshot.rsi,
                    snapshot.current_price,
                    snapshot.sample_count
                );
                TechnicalResult::Success(snapshot)
            }
            Err(e) => {
                let reason = failure_reason(ticker, &e);
                tracing::warn!("Technical analysis failed for {}: {}", ticker, reason);
                TechnicalResult::failure(reason)
            }
        }
    }

    async fn try_analyze(&self, ticker: &str) -> Result<TechnicalSnapshot, AnalysisError> {
        let bars = self
            .fetcher
            .fetch(ticker, self.config.lookback_days, self.config.timeframe)
            .await
            .map_err(|e| match e {
                AnalysisError::FetchFailure(_) => e,
                other => AnalysisError::FetchFailure(other.to_string()),
            })?;

        if bars.is_empty() {
            return Err(AnalysisError::FetchFailure(format!(
                "No data returned for {}",
                ticker
            )));
        }

        tracing::debug!("Fetched {} bars for {} from {}", bars.len(), ticker, self.source_name());
        snapshot(&bars, self.config.rsi_period)
    }
}

/// Indicator snapshot at the most recent bar. `bars` must be non-empty.
pub fn snapshot(bars: &[Bar], period: usize) -> Result<TechnicalSnapshot, AnalysisError> {
    let last = bars
        .last()
        .ok_or_else(|| AnalysisError::InvalidData("empty bar series".to_string()))?;
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let value = rsi(&closes, period)?;

    Ok(TechnicalSnapshot {
        rsi: round_to(value, 2),
        current_price: round_to(last.close, 2),
        current_volume: last.volume.max(0.0) as u64,
        average_volume: average_volume(bars),
        sample_count: bars.len(),
    })
}

fn failure_reason(ticker: &str, err: &AnalysisError) -> String {
    match err {
        AnalysisError::FetchFailure(msg) => format!("Unable to fetch data for ticker {}: {}", ticker, msg),
        other => format!("RSI calculation failed: {}", other),
    }
}
