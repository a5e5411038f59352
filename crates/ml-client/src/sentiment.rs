use serde::{Deserialize, Serialize};
use std::time::Duration;
use crate::error::{MLError, MLResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentPrediction {
    pub label: String,
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
    pub confidence: f64,
    pub score: f64,
}

impl SentimentPrediction {
    /// Signed polarity in [-1, 1]: the label's score, negated for negative labels.
    pub fn polarity(&self) -> f64 {
        let sign = match self.label.to_lowercase().as_str() {
            "positive" => 1.0,
            "negative" => -1.0,
            _ => 0.0,
        };
        (self.score * sign).clamp(-1.0, 1.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentResponse {
    pub predictions: Vec<SentimentPrediction>,
    pub processing_time_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
struct SentimentRequest {
    texts: Vec<String>,
    symbol: Option<String>,
    use_cache: bool,
}

#[derive(Clone)]
pub struct SentimentClient {
    client: reqwest::Client,
    base_url: String,
}

impl SentimentClient {
    pub fn new(base_url: String, timeout: Duration) -> MLResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Predict sentiment for text(s)
    pub async fn predict(
        &self,
        texts: Vec<String>,
        symbol: Option<String>,
    ) -> MLResult<SentimentResponse> {
        let expected = texts.len();
        let request = SentimentRequest {
            texts,
            symbol,
            use_cache: true,
        };

        let response = self
            .client
            .post(format!("{}/predict", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MLError::ServiceUnavailable(format!(
                "Status: {}",
                response.status()
            )));
        }

        let result = response.json::<SentimentResponse>().await?;
        if result.predictions.len() != expected {
            return Err(MLError::InvalidResponse(format!(
                "expected {} predictions, got {}",
                expected,
                result.predictions.len()
            )));
        }
        tracing::debug!(
            "Sentiment service scored {} texts in {:.1}ms",
            expected,
            result.processing_time_ms
        );
        Ok(result)
    }

    /// Check service health
    pub async fn health(&self) -> MLResult<bool> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;

        Ok(response.status().is_success())
    }
}
