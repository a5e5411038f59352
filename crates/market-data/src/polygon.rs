use analysis_core::{AnalysisError, Bar, MarketDataFetcher, Timeframe};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

const BASE_URL: &str = "https://api.polygon.io";
const MAX_ATTEMPTS: u32 = 3;
const RETRY_WAIT_SECS: u64 = 15;

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests: max_requests.max(1),
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            // Remove timestamps outside the window
            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            // Wait until the oldest request falls out of the window
            let sleep_dur = match ts.front() {
                Some(&oldest) => (oldest + self.window).saturating_duration_since(now),
                None => Duration::ZERO,
            } + Duration::from_millis(50);
            drop(ts);
            tracing::debug!("Rate limiter: waiting {:.1}s for Polygon API slot", sleep_dur.as_secs_f64());
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

#[derive(Debug, Deserialize)]
struct AggregateResponse {
    #[serde(default)]
    results: Vec<AggregateBar>,
}

#[derive(Debug, Deserialize)]
struct AggregateBar {
    t: i64,
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    #[serde(default)]
    v: f64,
}

fn polygon_span(timeframe: Timeframe) -> (u32, &'static str) {
    match timeframe {
        Timeframe::Minute1 => (1, "minute"),
        Timeframe::Minute5 => (5, "minute"),
        Timeframe::Minute15 => (15, "minute"),
        Timeframe::Minute30 => (30, "minute"),
        Timeframe::Hour1 => (1, "hour"),
        Timeframe::Hour4 => (4, "hour"),
        Timeframe::Day1 => (1, "day"),
        Timeframe::Week1 => (1, "week"),
        Timeframe::Month1 => (1, "month"),
    }
}

/// Pause before the next attempt after a 429; none once attempts are exhausted.
fn retry_wait(attempt: u32) -> Option<Duration> {
    (attempt < MAX_ATTEMPTS).then(|| Duration::from_secs(RETRY_WAIT_SECS))
}

fn to_bars(response: AggregateResponse) -> Vec<Bar> {
    let mut bars: Vec<Bar> = response
        .results
        .into_iter()
        .filter_map(|r| {
            Some(Bar {
                timestamp: DateTime::from_timestamp_millis(r.t)?,
                open: r.o,
                high: r.h,
                low: r.l,
                close: r.c,
                volume: r.v,
            })
        })
        .collect();
    bars.sort_by_key(|b| b.timestamp);
    bars
}

/// Polygon.io aggregates client. Requires an API key.
#[derive(Clone)]
pub struct PolygonClient {
    api_key: String,
    client: Client,
    rate_limiter: RateLimiter,
}

impl PolygonClient {
    /// `rate_limit` is requests per minute: 5 on the free tier, 500 on Starter.
    pub fn new(api_key: String, rate_limit: usize, timeout: Duration) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        Ok(Self {
            api_key,
            client,
            rate_limiter: RateLimiter::new(rate_limit, Duration::from_secs(60)),
        })
    }

    /// Send a request with rate limiting and automatic 429 retry.
    async fn send_request(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, AnalysisError> {
        let request = builder.build().map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        for attempt in 1..=MAX_ATTEMPTS {
            self.rate_limiter.acquire().await;
            let req_clone = request
                .try_clone()
                .ok_or_else(|| AnalysisError::ApiError("Cannot clone request".to_string()))?;
            let response = self
                .client
                .execute(req_clone)
                .await
                .map_err(|e| AnalysisError::FetchFailure(e.to_string()))?;

            if response.status().as_u16() != 429 {
                return Ok(response);
            }

            match retry_wait(attempt) {
                Some(wait) => {
                    tracing::warn!(
                        "Polygon 429 rate limited, waiting {}s before retry {}/{}",
                        wait.as_secs(),
                        attempt,
                        MAX_ATTEMPTS
                    );
                    tokio::time::sleep(wait).await;
                }
                None => tracing::warn!("Polygon 429 rate limited on final attempt {}", attempt),
            }
        }

        Err(AnalysisError::FetchFailure(format!(
            "Rate limited by Polygon after {} attempts",
            MAX_ATTEMPTS
        )))
    }

    /// Get aggregates (bars) for a symbol
    pub async fn get_aggregates(
        &self,
        symbol: &str,
        multiplier: u32,
        timespan: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Bar>, AnalysisError> {
        let url = format!(
            "{}/v2/aggs/ticker/{}/range/{}/{}/{}/{}",
            BASE_URL,
            symbol,
            multiplier,
            timespan,
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        );

        let response = self
            .send_request(self.client.get(&url).query(&[
                ("apiKey", self.api_key.as_str()),
                ("adjusted", "true"),
                ("sort", "asc"),
                ("limit", "50000"),
            ]))
            .await?;

        if !response.status().is_success() {
            return Err(AnalysisError::FetchFailure(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let agg_response: AggregateResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::FetchFailure(e.to_string()))?;

        Ok(to_bars(agg_response))
    }
}

#[async_trait]
impl MarketDataFetcher for PolygonClient {
    fn name(&self) -> &str {
        "polygon"
    }

    async fn fetch(
        &self,
        symbol: &str,
        lookback_days: u32,
        timeframe: Timeframe,
    ) -> Result<Vec<Bar>, AnalysisError> {
        let (multiplier, timespan) = polygon_span(timeframe);
        let to = Utc::now();
        let from = to - ChronoDuration::days(i64::from(lookback_days));
        self.get_aggregates(&symbol.trim().to_uppercase(), multiplier, timespan, from, to)
            .await
    }
}
