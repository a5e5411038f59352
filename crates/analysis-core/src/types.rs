use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::AnalysisError;

/// OHLCV bar data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Timeframe for bar granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    Minute1,
    Minute5,
    Minute15,
    Minute30,
    Hour1,
    Hour4,
    Day1,
    Week1,
    Month1,
}

impl Timeframe {
    pub fn to_minutes(&self) -> i64 {
        match self {
            Timeframe::Minute1 => 1,
            Timeframe::Minute5 => 5,
            Timeframe::Minute15 => 15,
            Timeframe::Minute30 => 30,
            Timeframe::Hour1 => 60,
            Timeframe::Hour4 => 240,
            Timeframe::Day1 => 1440,
            Timeframe::Week1 => 10080,
            Timeframe::Month1 => 43200,
        }
    }

    /// Compact label, e.g. "1d"
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Minute1 => "1m",
            Timeframe::Minute5 => "5m",
            Timeframe::Minute15 => "15m",
            Timeframe::Minute30 => "30m",
            Timeframe::Hour1 => "1h",
            Timeframe::Hour4 => "4h",
            Timeframe::Day1 => "1d",
            Timeframe::Week1 => "1wk",
            Timeframe::Month1 => "1mo",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1m" | "1min" => Ok(Timeframe::Minute1),
            "5m" | "5min" => Ok(Timeframe::Minute5),
            "15m" | "15min" => Ok(Timeframe::Minute15),
            "30m" | "30min" => Ok(Timeframe::Minute30),
            "1h" | "60m" | "1hour" => Ok(Timeframe::Hour1),
            "4h" | "4hour" => Ok(Timeframe::Hour4),
            "1d" | "daily" => Ok(Timeframe::Day1),
            "1wk" | "1w" | "weekly" => Ok(Timeframe::Week1),
            "1mo" | "monthly" => Ok(Timeframe::Month1),
            other => Err(AnalysisError::InvalidConfig(format!(
                "unknown timeframe '{}'",
                other
            ))),
        }
    }
}

/// Aggregated sentiment over a batch of posts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    /// Mean polarity remapped to 0.0-1.0 (0.5 = neutral)
    pub aggregate_score: f64,
    /// Mean polarity in -1.0 to 1.0
    pub raw_polarity: f64,
    /// Every input text, blanks included
    pub total_count: usize,
    /// Texts that were non-empty after trimming and got scored
    pub valid_count: usize,
}

impl SentimentResult {
    /// Neutral default used when nothing was scorable
    pub fn neutral(total_count: usize) -> Self {
        Self {
            aggregate_score: 0.5,
            raw_polarity: 0.0,
            total_count,
            valid_count: 0,
        }
    }
}

/// Indicator values derived from a successful fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSnapshot {
    pub rsi: f64,
    pub current_price: f64,
    pub current_volume: u64,
    pub average_volume: u64,
    pub sample_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TechnicalStatus {
    Success,
    Failure,
}

/// Outcome of the technical stage. Failures are values, never panics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TechnicalResult {
    Success(TechnicalSnapshot),
    Failure { failure_reason: String },
}

impl TechnicalResult {
    pub fn failure(reason: impl Into<String>) -> Self {
        TechnicalResult::Failure {
            failure_reason: reason.into(),
        }
    }

    pub fn status(&self) -> TechnicalStatus {
        match self {
            TechnicalResult::Success(_) => TechnicalStatus::Success,
            TechnicalResult::Failure { .. } => TechnicalStatus::Failure,
        }
    }
}

/// Trading recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Hold,
    Neutral,
    Error,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Hold => "HOLD",
            Signal::Neutral => "NEUTRAL",
            Signal::Error => "ERROR",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall record status. `Partial` is accepted on the wire but no current
/// decision path produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalStatus {
    Success,
    Partial,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageErrorKind {
    TechnicalDataError,
    InternalError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageError {
    #[serde(rename = "type")]
    pub kind: StageErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentDetails {
    pub num_posts: usize,
    pub valid_posts: usize,
    pub raw_polarity: f64,
}

impl From<&SentimentResult> for SentimentDetails {
    fn from(result: &SentimentResult) -> Self {
        Self {
            num_posts: result.total_count,
            valid_posts: result.valid_count,
            raw_polarity: result.raw_polarity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalDetails {
    pub avg_volume: u64,
    pub data_points: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalMetadata {
    pub sentiment_analyzer: String,
    pub market_data_source: String,
    pub service_version: String,
    pub rsi_period: usize,
    pub sentiment_threshold: f64,
    pub rsi_buy_threshold: f64,
    pub sentiment_details: SentimentDetails,
    pub technical_details: Option<TechnicalDetails>,
}

/// Final output of a signal generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub signal: Signal,
    pub ticker: String,
    pub sentiment_score: f64,
    pub rsi: Option<f64>,
    pub volume: Option<u64>,
    pub price: Option<f64>,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
    pub status: SignalStatus,
    pub metadata: SignalMetadata,
    pub errors: Vec<StageError>,
}

/// Upper-case and trim a ticker symbol
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframe_round_trips_through_label() {
        for tf in [Timeframe::Minute5, Timeframe::Hour1, Timeframe::Day1, Timeframe::Week1] {
            assert_eq!(tf.as_str().parse::<Timeframe>().unwrap(), tf);
        }
        assert!("3d".parse::<Timeframe>().is_err());
    }

    #[test]
    fn test_signal_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Signal::Buy).unwrap(), "\"BUY\"");
        assert_eq!(serde_json::to_string(&Signal::Neutral).unwrap(), "\"NEUTRAL\"");
        assert_eq!(serde_json::to_string(&SignalStatus::Partial).unwrap(), "\"partial\"");
    }

    #[test]
    fn test_stage_error_uses_type_key() {
        let err = StageError {
            kind: StageErrorKind::TechnicalDataError,
            message: "boom".to_string(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "technical_data_error");
        assert_eq!(json["message"], "boom");
    }

    #[test]
    fn test_technical_result_tagged_by_status() {
        let failed = TechnicalResult::failure("no data");
        assert_eq!(failed.status(), TechnicalStatus::Failure);
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["failure_reason"], "no data");
    }

    #[test]
    fn test_neutral_sentiment_keeps_total_count() {
        let result = SentimentResult::neutral(3);
        assert_eq!(result.aggregate_score, 0.5);
        assert_eq!(result.raw_polarity, 0.0);
        assert_eq!(result.total_count, 3);
        assert_eq!(result.valid_count, 0);
    }

    #[test]
    fn test_normalize_ticker() {
        assert_eq!(normalize_ticker("  aapl "), "AAPL");
        assert_eq!(normalize_ticker("brk.b"), "BRK.B");
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.123456, 4), 0.1235);
        assert_eq!(round_to(187.4449, 2), 187.44);
        assert_eq!(round_to(-0.33335, 2), -0.33);
    }
}
