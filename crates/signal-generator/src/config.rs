use analysis_core::{AnalysisError, MarketDataFetcher, PolarityScorer, Timeframe};
use anyhow::{bail, Context, Result};
use market_data::{PolygonClient, YahooFinanceClient};
use ml_client::MLConfig;
use sentiment_analysis::{FinbertScorer, LexiconScorer};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use technical_analysis::TechnicalConfig;

/// Read `key` through `lookup`, falling back to `default`, and parse it.
fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    raw.trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid {}='{}': {}", key, raw, e))
}

fn env_lookup(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Decision thresholds, fixed for the lifetime of a generator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalConfig {
    pub sentiment_threshold: f64,
    pub rsi_buy_threshold: f64,
    pub rsi_period: usize,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            sentiment_threshold: 0.7,
            rsi_buy_threshold: 30.0,
            rsi_period: 14,
        }
    }
}

impl SignalConfig {
    pub fn new(sentiment_threshold: f64, rsi_buy_threshold: f64, rsi_period: usize) -> Result<Self, AnalysisError> {
        if !(sentiment_threshold > 0.0 && sentiment_threshold < 1.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "sentiment threshold must be in (0, 1), got {}",
                sentiment_threshold
            )));
        }
        if !(rsi_buy_threshold > 0.0 && rsi_buy_threshold < 100.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "RSI buy threshold must be in (0, 100), got {}",
                rsi_buy_threshold
            )));
        }
        if rsi_period == 0 {
            return Err(AnalysisError::InvalidConfig(
                "RSI period must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            sentiment_threshold,
            rsi_buy_threshold,
            rsi_period,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let config = Self::new(
            parse_var(&lookup, "SENTIMENT_BUY_THRESHOLD", "0.7")?,
            parse_var(&lookup, "RSI_BUY_THRESHOLD", "30")?,
            parse_var(&lookup, "RSI_PERIOD", "14")?,
        )?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketDataProvider {
    Yahoo,
    Polygon,
}

impl FromStr for MarketDataProvider {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yahoo" | "yfinance" => Ok(Self::Yahoo),
            "polygon" => Ok(Self::Polygon),
            other => Err(AnalysisError::InvalidConfig(format!(
                "unknown market data provider '{}'",
                other
            ))),
        }
    }
}

impl MarketDataProvider {
    pub fn supports(&self, timeframe: Timeframe) -> bool {
        match self {
            Self::Yahoo => YahooFinanceClient::supports(timeframe),
            Self::Polygon => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScorerKind {
    Lexicon,
    Finbert,
}

impl FromStr for ScorerKind {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lexicon" => Ok(Self::Lexicon),
            "finbert" => Ok(Self::Finbert),
            other => Err(AnalysisError::InvalidConfig(format!(
                "unknown sentiment scorer '{}'",
                other
            ))),
        }
    }
}

/// Which collaborators back the two stages, and how to reach them
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub market_data: MarketDataProvider,
    pub polygon_api_key: Option<String>,
    pub polygon_rate_limit: usize,
    pub market_data_timeout: Duration,
    pub scorer: ScorerKind,
    pub ml: MLConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            market_data: MarketDataProvider::Yahoo,
            polygon_api_key: None,
            polygon_rate_limit: 500,
            market_data_timeout: Duration::from_secs(30),
            scorer: ScorerKind::Lexicon,
            ml: MLConfig::default(),
        }
    }
}

impl ProviderConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let market_data: MarketDataProvider = parse_var(&lookup, "MARKET_DATA_PROVIDER", "yahoo")?;
        let polygon_api_key = lookup("POLYGON_API_KEY").filter(|k| !k.trim().is_empty());
        if market_data == MarketDataProvider::Polygon && polygon_api_key.is_none() {
            bail!("POLYGON_API_KEY must be set when MARKET_DATA_PROVIDER=polygon");
        }

        let polygon_rate_limit: usize = parse_var(&lookup, "POLYGON_RATE_LIMIT", "500")?;
        if polygon_rate_limit == 0 {
            bail!("POLYGON_RATE_LIMIT must be at least 1");
        }

        let ml = MLConfig {
            sentiment_url: lookup("ML_SENTIMENT_URL").unwrap_or_else(|| MLConfig::default().sentiment_url),
            timeout: Duration::from_secs(parse_var(&lookup, "ML_TIMEOUT_SECS", "5")?),
        };

        Ok(Self {
            market_data,
            polygon_api_key,
            polygon_rate_limit,
            market_data_timeout: Duration::from_secs(parse_var(&lookup, "MARKET_DATA_TIMEOUT_SECS", "30")?),
            scorer: parse_var(&lookup, "SENTIMENT_SCORER", "lexicon")?,
            ml,
        })
    }

    /// Reject a history timeframe the selected provider cannot serve.
    pub fn check_timeframe(&self, timeframe: Timeframe) -> Result<()> {
        if !self.market_data.supports(timeframe) {
            bail!(
                "HISTORY_TIMEFRAME={} is not available from MARKET_DATA_PROVIDER={:?}",
                timeframe,
                self.market_data
            );
        }
        Ok(())
    }

    pub fn build_fetcher(&self) -> Result<Arc<dyn MarketDataFetcher>> {
        match self.market_data {
            MarketDataProvider::Yahoo => {
                let client = YahooFinanceClient::new(self.market_data_timeout)
                    .context("Failed to build Yahoo Finance client")?;
                Ok(Arc::new(client))
            }
            MarketDataProvider::Polygon => {
                let key = self
                    .polygon_api_key
                    .clone()
                    .context("POLYGON_API_KEY is not set")?;
                let client = PolygonClient::new(key, self.polygon_rate_limit, self.market_data_timeout)
                    .context("Failed to build Polygon client")?;
                Ok(Arc::new(client))
            }
        }
    }

    pub fn build_scorer(&self) -> Result<Arc<dyn PolarityScorer>> {
        match self.scorer {
            ScorerKind::Lexicon => Ok(Arc::new(LexiconScorer::new())),
            ScorerKind::Finbert => {
                let client = self
                    .ml
                    .sentiment_client()
                    .context("Failed to build FinBERT client")?;
                Ok(Arc::new(FinbertScorer::new(client)))
            }
        }
    }
}

/// Technical-stage settings from `HISTORY_DAYS` and `HISTORY_TIMEFRAME`.
pub fn technical_config_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
    rsi_period: usize,
) -> Result<TechnicalConfig> {
    let lookback_days: u32 = parse_var(&lookup, "HISTORY_DAYS", "60")?;
    let timeframe: Timeframe = parse_var(&lookup, "HISTORY_TIMEFRAME", "1d")?;
    Ok(TechnicalConfig::new(rsi_period, lookback_days, timeframe)?)
}

pub fn technical_config_from_env(rsi_period: usize) -> Result<TechnicalConfig> {
    technical_config_from_lookup(env_lookup, rsi_period)
}
