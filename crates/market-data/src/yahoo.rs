//! Yahoo Finance chart API client.
//!
//! Keyless, so it is the default source. Yahoo accepts a trailing range such as
//! `60d` plus an interval, which maps directly onto a lookback window.

use analysis_core::{AnalysisError, Bar, MarketDataFetcher, Timeframe};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const CHART_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    timestamp: Option<Vec<i64>>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<f64>>>,
}

/// Yahoo uses hyphens instead of dots for share classes (BRK-B, not BRK.B)
fn normalize_yahoo_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase().replace('.', "-")
}

fn yahoo_interval(timeframe: Timeframe) -> Result<&'static str, AnalysisError> {
    match timeframe {
        Timeframe::Minute1 => Ok("1m"),
        Timeframe::Minute5 => Ok("5m"),
        Timeframe::Minute15 => Ok("15m"),
        Timeframe::Minute30 => Ok("30m"),
        Timeframe::Hour1 => Ok("60m"),
        Timeframe::Day1 => Ok("1d"),
        Timeframe::Week1 => Ok("1wk"),
        Timeframe::Month1 => Ok("1mo"),
        Timeframe::Hour4 => Err(AnalysisError::InvalidData(
            "Yahoo Finance has no 4h interval".to_string(),
        )),
    }
}

/// Turn a chart payload into chronological bars, dropping points without a close.
fn parse_chart(symbol: &str, data: YahooChartResponse) -> Result<Vec<Bar>, AnalysisError> {
    if let Some(error) = data.chart.error {
        return Err(AnalysisError::FetchFailure(format!(
            "Yahoo API error for {}: {} - {}",
            symbol, error.code, error.description
        )));
    }

    let result = data
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| AnalysisError::FetchFailure(format!("No chart data for {}", symbol)))?;

    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| AnalysisError::FetchFailure(format!("No quote data for {}", symbol)))?;

    let opens = quote.open.unwrap_or_default();
    let highs = quote.high.unwrap_or_default();
    let lows = quote.low.unwrap_or_default();
    let closes = quote.close.unwrap_or_default();
    let volumes = quote.volume.unwrap_or_default();

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let close = match closes.get(i).copied().flatten() {
            Some(c) if c > 0.0 => c,
            _ => continue,
        };
        let Some(timestamp) = DateTime::<Utc>::from_timestamp(ts, 0) else {
            continue;
        };

        bars.push(Bar {
            timestamp,
            open: opens.get(i).copied().flatten().unwrap_or(close),
            high: highs.get(i).copied().flatten().unwrap_or(close),
            low: lows.get(i).copied().flatten().unwrap_or(close),
            close,
            volume: volumes.get(i).copied().flatten().unwrap_or(0.0),
        });
    }

    bars.sort_by_key(|b| b.timestamp);
    Ok(bars)
}

#[derive(Clone)]
pub struct YahooFinanceClient {
    client: Client,
}

impl YahooFinanceClient {
    pub fn new(timeout: Duration) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        Ok(Self { client })
    }

    /// Whether the chart API has an interval for `timeframe`.
    pub fn supports(timeframe: Timeframe) -> bool {
        yahoo_interval(timeframe).is_ok()
    }

    /// Fetch chart bars for a trailing `range` (e.g. "60d") at `interval` (e.g. "1d")
    pub async fn get_chart(
        &self,
        symbol: &str,
        range: &str,
        interval: &str,
    ) -> Result<Vec<Bar>, AnalysisError> {
        let yahoo_symbol = normalize_yahoo_symbol(symbol);
        let url = format!("{}/{}", CHART_URL, yahoo_symbol);

        tracing::debug!("Fetching Yahoo chart for {} (range={}, interval={})", yahoo_symbol, range, interval);

        let response = self
            .client
            .get(&url)
            .query(&[("range", range), ("interval", interval), ("includePrePost", "false")])
            .send()
            .await
            .map_err(|e| AnalysisError::FetchFailure(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AnalysisError::FetchFailure(format!("Read failed: {}", e)))?;

        // Unknown symbols come back as 404 with a chart.error payload
        match serde_json::from_str::<YahooChartResponse>(&body) {
            Ok(data) => parse_chart(&yahoo_symbol, data),
            Err(_) if !status.is_success() => Err(AnalysisError::FetchFailure(format!(
                "HTTP {} for {}",
                status, yahoo_symbol
            ))),
            Err(e) => Err(AnalysisError::FetchFailure(format!("Parse error: {}", e))),
        }
    }
}

#[async_trait]
impl MarketDataFetcher for YahooFinanceClient {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn fetch(
        &self,
        symbol: &str,
        lookback_days: u32,
        timeframe: Timeframe,
    ) -> Result<Vec<Bar>, AnalysisError> {
        let interval = yahoo_interval(timeframe)?;
        let range = format!("{}d", lookback_days);
        self.get_chart(symbol, &range, interval).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<Vec<Bar>, AnalysisError> {
        let data: YahooChartResponse = serde_json::from_str(body).unwrap();
        parse_chart("TEST", data)
    }

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_yahoo_symbol("brk.b"), "BRK-B");
        assert_eq!(normalize_yahoo_symbol(" aapl "), "AAPL");
    }

    #[test]
    fn test_interval_mapping() {
        assert_eq!(yahoo_interval(Timeframe::Day1).unwrap(), "1d");
        assert_eq!(yahoo_interval(Timeframe::Hour1).unwrap(), "60m");
        assert!(yahoo_interval(Timeframe::Hour4).is_err());
        assert!(YahooFinanceClient::supports(Timeframe::Week1));
        assert!(!YahooFinanceClient::supports(Timeframe::Hour4));
    }

    #[test]
    fn test_parse_chart_skips_missing_closes() {
        let body = r#"{
            "chart": {
                "result": [{
                    "meta": {"symbol": "TEST"},
                    "timestamp": [1700000000, 1700086400, 1700172800],
                    "indicators": {"quote": [{
                        "open":   [10.0, 11.0, 12.0],
                        "high":   [10.5, 11.5, 12.5],
                        "low":    [9.5, 10.5, 11.5],
                        "close":  [10.2, null, 12.3],
                        "volume": [1000, 2000, 3000]
                    }]}
                }],
                "error": null
            }
        }"#;

        let bars = parse(body).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 10.2);
        assert_eq!(bars[1].close, 12.3);
        assert_eq!(bars[1].volume, 3000.0);
        assert!(bars[0].timestamp < bars[1].timestamp);
    }

    #[test]
    fn test_parse_chart_reports_api_error() {
        let body = r#"{
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
            }
        }"#;

        let err = parse(body).unwrap_err();
        assert!(matches!(err, AnalysisError::FetchFailure(_)));
        assert!(err.to_string().contains("delisted"));
    }

    #[test]
    fn test_parse_chart_without_timestamps_is_empty() {
        let body = r#"{
            "chart": {
                "result": [{"meta": {}, "indicators": {"quote": [{}]}}],
                "error": null
            }
        }"#;

        assert!(parse(body).unwrap().is_empty());
    }
}
