//! Combines post sentiment with RSI into a BUY / HOLD / NEUTRAL / ERROR signal.

pub mod config;
pub mod decision;

pub use config::{MarketDataProvider, ProviderConfig, ScorerKind, SignalConfig};
pub use decision::decide;

use analysis_core::{
    normalize_ticker, AnalysisError, MarketDataFetcher, PolarityScorer, SentimentDetails,
    SentimentResult, Signal, SignalMetadata, SignalRecord, SignalStatus, StageError,
    StageErrorKind, TechnicalDetails, TechnicalResult, Timeframe,
};
use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use sentiment_analysis::SentimentAggregator;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use technical_analysis::{TechnicalConfig, TechnicalIndicatorCalculator};

const INTERNAL_ERROR_REASON: &str = "Internal error during signal generation";
const CHECK_LOOKBACK_DAYS: u32 = 5;

pub struct SignalGenerator {
    aggregator: SentimentAggregator,
    calculator: TechnicalIndicatorCalculator,
    fetcher: Arc<dyn MarketDataFetcher>,
    config: SignalConfig,
    service_version: String,
}

impl SignalGenerator {
    /// Generator with the default 60-day daily history window.
    pub fn new(
        scorer: Arc<dyn PolarityScorer>,
        fetcher: Arc<dyn MarketDataFetcher>,
        config: SignalConfig,
    ) -> Self {
        let technical = TechnicalConfig {
            rsi_period: config.rsi_period,
            ..TechnicalConfig::default()
        };

        Self {
            aggregator: SentimentAggregator::new(scorer),
            calculator: TechnicalIndicatorCalculator::new(Arc::clone(&fetcher), technical),
            fetcher,
            config,
            service_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn with_history(mut self, lookback_days: u32, timeframe: Timeframe) -> Result<Self, AnalysisError> {
        let technical = TechnicalConfig::new(self.config.rsi_period, lookback_days, timeframe)?;
        self.calculator = TechnicalIndicatorCalculator::new(Arc::clone(&self.fetcher), technical);
        Ok(self)
    }

    pub fn with_service_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    /// Wire a generator from environment variables (thresholds, history
    /// window, market data provider, sentiment scorer).
    pub fn from_env() -> anyhow::Result<Self> {
        let config = SignalConfig::from_env()?;
        let technical = crate::config::technical_config_from_env(config.rsi_period)?;
        let providers = ProviderConfig::from_env()?;
        providers.check_timeframe(technical.timeframe)?;

        let generator = Self::new(providers.build_scorer()?, providers.build_fetcher()?, config)
            .with_history(technical.lookback_days, technical.timeframe)?;

        tracing::info!(
            "Signal generator ready: scorer={}, market data={}, history={}d@{}",
            generator.scorer_name(),
            generator.source_name(),
            technical.lookback_days,
            technical.timeframe
        );
        Ok(generator)
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    pub fn technical_config(&self) -> &TechnicalConfig {
        self.calculator.config()
    }

    pub fn scorer_name(&self) -> &str {
        self.aggregator.scorer_name()
    }

    pub fn source_name(&self) -> &str {
        self.calculator.source_name()
    }

    pub fn service_version(&self) -> &str {
        &self.service_version
    }

    /// Produce a signal record for `ticker`. Never fails: stage failures and
    /// panics come back as an ERROR record.
    pub async fn generate<S>(&self, ticker: &str, posts: &[S]) -> SignalRecord
    where
        S: AsRef<str> + Sync,
    {
        let ticker = normalize_ticker(ticker);
        let timestamp = Utc::now();

        match AssertUnwindSafe(self.run(&ticker, posts, timestamp))
            .catch_unwind()
            .await
        {
            Ok(record) => record,
            Err(panic) => {
                let message = panic_message(&*panic);
                tracing::error!("Signal generation for {} panicked: {}", ticker, message);
                self.internal_error_record(ticker, posts.len(), message, timestamp)
            }
        }
    }

    /// Check that the market data source knows `ticker`, independent of the
    /// signal pipeline. Returns the number of daily bars over the last few
    /// days; zero means the source answered but has nothing recent.
    pub async fn check_ticker(&self, ticker: &str) -> Result<usize, AnalysisError> {
        let ticker = normalize_ticker(ticker);
        let bars = self
            .fetcher
            .fetch(&ticker, CHECK_LOOKBACK_DAYS, Timeframe::Day1)
            .await?;
        tracing::debug!("Ticker check for {} found {} bars", ticker, bars.len());
        Ok(bars.len())
    }

    async fn run<S>(&self, ticker: &str, posts: &[S], timestamp: DateTime<Utc>) -> SignalRecord
    where
        S: AsRef<str> + Sync,
    {
        tracing::info!("Generating signal for {} from {} posts", ticker, posts.len());

        let (sentiment, technical) = tokio::join!(
            self.aggregator.aggregate(posts),
            self.calculator.analyze(ticker)
        );

        tracing::debug!(
            "Sentiment for {}: score {:.4}, {}/{} posts scored",
            ticker,
            sentiment.aggregate_score,
            sentiment.valid_count,
            sentiment.total_count
        );

        let snapshot = match technical {
            TechnicalResult::Success(snapshot) => snapshot,
            TechnicalResult::Failure { failure_reason } => {
                tracing::error!("Technical analysis failed for {}: {}", ticker, failure_reason);
                return SignalRecord {
                    signal: Signal::Error,
                    ticker: ticker.to_string(),
                    sentiment_score: sentiment.aggregate_score,
                    rsi: None,
                    volume: None,
                    price: None,
                    reason: format!("Unable to fetch technical data: {}", failure_reason),
                    timestamp,
                    status: SignalStatus::Error,
                    metadata: self.metadata(&sentiment, None),
                    errors: vec![StageError {
                        kind: StageErrorKind::TechnicalDataError,
                        message: failure_reason,
                    }],
                };
            }
        };

        let (signal, reason) = decide(sentiment.aggregate_score, snapshot.rsi, &self.config);
        tracing::info!("Generated {} signal for {}: {}", signal, ticker, reason);

        let details = TechnicalDetails {
            avg_volume: snapshot.average_volume,
            data_points: snapshot.sample_count,
        };

        SignalRecord {
            signal,
            ticker: ticker.to_string(),
            sentiment_score: sentiment.aggregate_score,
            rsi: Some(snapshot.rsi),
            volume: Some(snapshot.current_volume),
            price: Some(snapshot.current_price),
            reason,
            timestamp,
            status: SignalStatus::Success,
            metadata: self.metadata(&sentiment, Some(details)),
            errors: Vec::new(),
        }
    }

    fn metadata(&self, sentiment: &SentimentResult, technical: Option<TechnicalDetails>) -> SignalMetadata {
        SignalMetadata {
            sentiment_analyzer: self.scorer_name().to_string(),
            market_data_source: self.source_name().to_string(),
            service_version: self.service_version.clone(),
            rsi_period: self.config.rsi_period,
            sentiment_threshold: self.config.sentiment_threshold,
            rsi_buy_threshold: self.config.rsi_buy_threshold,
            sentiment_details: SentimentDetails::from(sentiment),
            technical_details: technical,
        }
    }

    fn internal_error_record(
        &self,
        ticker: String,
        post_count: usize,
        message: String,
        timestamp: DateTime<Utc>,
    ) -> SignalRecord {
        let sentiment = SentimentResult::neutral(post_count);
        SignalRecord {
            signal: Signal::Error,
            ticker,
            sentiment_score: sentiment.aggregate_score,
            rsi: None,
            volume: None,
            price: None,
            reason: INTERNAL_ERROR_REASON.to_string(),
            timestamp,
            status: SignalStatus::Error,
            metadata: self.metadata(&sentiment, None),
            errors: vec![StageError {
                kind: StageErrorKind::InternalError,
                message,
            }],
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
