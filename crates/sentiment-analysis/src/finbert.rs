use analysis_core::{AnalysisError, PolarityScorer};
use async_trait::async_trait;
use ml_client::SentimentClient;

/// Polarity scorer backed by the FinBERT sentiment microservice.
pub struct FinbertScorer {
    client: SentimentClient,
}

impl FinbertScorer {
    pub fn new(client: SentimentClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PolarityScorer for FinbertScorer {
    fn name(&self) -> &str {
        "FinBERT"
    }

    async fn score(&self, text: &str) -> Result<f64, AnalysisError> {
        let response = self
            .client
            .predict(vec![text.to_string()], None)
            .await
            .map_err(|e| AnalysisError::Scoring(e.to_string()))?;

        response
            .predictions
            .first()
            .map(|p| p.polarity())
            .ok_or_else(|| AnalysisError::Scoring("empty prediction list".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SentimentAggregator;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_unreachable_service_degrades_to_neutral() {
        let client = SentimentClient::new("http://127.0.0.1:9".to_string(), Duration::from_millis(200))
            .unwrap();
        let scorer = Arc::new(FinbertScorer::new(client));
        assert!(scorer.score("great quarter").await.is_err());

        let result = SentimentAggregator::new(scorer).aggregate(&["great quarter"]).await;
        assert_eq!(result.valid_count, 1);
        assert_eq!(result.raw_polarity, 0.0);
        assert_eq!(result.aggregate_score, 0.5);
    }
}
