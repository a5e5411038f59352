use analysis_core::{round_to, PolarityScorer, SentimentResult};
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;

pub mod finbert;
pub mod lexicon;

pub use finbert::FinbertScorer;
pub use lexicon::LexiconScorer;

/// Posts scored at once; a remote scorer makes one call per post.
const MAX_CONCURRENT_SCORES: usize = 8;

/// Folds per-post polarities into one sentiment score for a batch.
///
/// Blank posts are counted but never scored. A scorer failure on one post
/// degrades that post to neutral and never aborts the batch.
#[derive(Clone)]
pub struct SentimentAggregator {
    scorer: Arc<dyn PolarityScorer>,
}

impl SentimentAggregator {
    pub fn new(scorer: Arc<dyn PolarityScorer>) -> Self {
        Self { scorer }
    }

    pub fn scorer_name(&self) -> &str {
        self.scorer.name()
    }

    /// Map a polarity in [-1, 1] onto [0, 1]
    pub fn normalize_score(polarity: f64) -> f64 {
        (polarity + 1.0) / 2.0
    }

    pub async fn aggregate<S: AsRef<str>>(&self, texts: &[S]) -> SentimentResult {
        if texts.is_empty() {
            tracing::warn!("No texts provided for sentiment analysis");
            return SentimentResult::neutral(0);
        }

        let valid: Vec<&str> = texts
            .iter()
            .map(|text| text.as_ref().trim())
            .filter(|text| !text.is_empty())
            .collect();

        let scores: Vec<_> = valid.into_iter().map(|text| self.score_one(text)).collect();
        let polarities: Vec<f64> = stream::iter(scores)
            .buffered(MAX_CONCURRENT_SCORES)
            .collect()
            .await;

        if polarities.is_empty() {
            tracing::warn!("No valid texts found among {} for sentiment analysis", texts.len());
            return SentimentResult::neutral(texts.len());
        }

        let avg_polarity = polarities.iter().sum::<f64>() / polarities.len() as f64;
        let normalized = Self::normalize_score(avg_polarity);

        tracing::info!(
            "Analyzed {} of {} texts with {}: avg_polarity={:.3}, normalized={:.3}",
            polarities.len(),
            texts.len(),
            self.scorer.name(),
            avg_polarity,
            normalized
        );

        SentimentResult {
            aggregate_score: round_to(normalized, 4),
            raw_polarity: round_to(avg_polarity, 4),
            total_count: texts.len(),
            valid_count: polarities.len(),
        }
    }

    async fn score_one(&self, text: &str) -> f64 {
        match self.scorer.score(text).await {
            Ok(polarity) if polarity.is_finite() => polarity.clamp(-1.0, 1.0),
            Ok(polarity) => {
                tracing::warn!("{} returned non-finite polarity {}, using 0.0", self.scorer.name(), polarity);
                0.0
            }
            Err(e) => {
                tracing::warn!("Error analyzing text sentiment with {}: {}", self.scorer.name(), e);
                0.0
            }
        }
    }
}
