pub mod sentiment;
pub mod error;

pub use sentiment::{SentimentClient, SentimentPrediction, SentimentResponse};
pub use error::{MLError, MLResult};

use std::time::Duration;

/// Connection settings for the sentiment microservice
#[derive(Debug, Clone)]
pub struct MLConfig {
    pub sentiment_url: String,
    pub timeout: Duration,
}

impl Default for MLConfig {
    fn default() -> Self {
        Self {
            sentiment_url: "http://localhost:8001".to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

impl MLConfig {
    pub fn sentiment_client(&self) -> MLResult<SentimentClient> {
        SentimentClient::new(self.sentiment_url.clone(), self.timeout)
    }
}
