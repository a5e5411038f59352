//! Word-list polarity scoring tuned for retail-investor chatter.

use analysis_core::{AnalysisError, PolarityScorer};
use async_trait::async_trait;
use std::collections::HashSet;

const NEGATION_WORDS: &[&str] = &[
    "not", "no", "never", "don't", "doesn't", "didn't", "isn't", "aren't",
    "wasn't", "weren't", "won't", "wouldn't", "couldn't", "shouldn't", "hardly",
    "barely", "neither", "nor", "without", "dont", "isnt", "cant", "can't",
];

const NEGATION_WINDOW: usize = 3;

const POSITIVE_WORDS: &[&str] = &[
    "bullish", "rally", "surge", "gain", "gains", "profit", "growth", "beat",
    "upgrade", "outperform", "strong", "positive", "rise", "increase",
    "breakthrough", "innovation", "success", "exceed", "momentum",
    "buy", "recommend", "optimistic", "record", "high", "advance",
    // Financial-specific terms
    "dividend", "buyback", "repurchase", "accretive", "upside",
    "recovery", "rebound", "expansion", "robust", "accelerating",
    "overweight", "raised", "upgraded", "outpacing", "tailwind",
    // Forum slang
    "moon", "mooning", "rocket", "calls", "amazing", "great", "love",
    "best", "awesome", "excellent", "crushing", "genius", "undervalued",
    "winning", "good", "happy", "solid", "impressive",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bearish", "decline", "loss", "losses", "fall", "plunge", "crash", "miss",
    "downgrade", "underperform", "weak", "negative", "drop", "decrease",
    "concern", "risk", "fail", "disappoint", "slump", "sell",
    "warning", "pessimistic", "low", "retreat", "fear", "trouble",
    // Financial-specific terms
    "dilution", "dilutive", "headwind", "lawsuit", "litigation",
    "recall", "investigation", "probe", "default", "bankruptcy",
    "restructuring", "layoff", "downside", "overvalued", "bubble",
    "underweight", "lowered", "suspended",
    // Forum slang
    "puts", "dump", "dumping", "bagholder", "bagholding", "scam", "fraud",
    "terrible", "awful", "worse", "worst", "bad", "hate", "issues",
    "overhyped", "tanking", "rekt",
];

/// Lexicon scorer with a short negation window.
///
/// Polarity is `net / (hits + 1)`, where `net` counts positive minus negative
/// hits after negation flips. The result stays strictly inside (-1, 1).
pub struct LexiconScorer {
    positive: HashSet<&'static str>,
    negative: HashSet<&'static str>,
    negation: HashSet<&'static str>,
}

impl LexiconScorer {
    pub fn new() -> Self {
        Self {
            positive: POSITIVE_WORDS.iter().copied().collect(),
            negative: NEGATIVE_WORDS.iter().copied().collect(),
            negation: NEGATION_WORDS.iter().copied().collect(),
        }
    }

    pub fn polarity(&self, text: &str) -> f64 {
        let text_lower = text.to_lowercase();
        let words: Vec<&str> = text_lower
            .split(|c: char| c.is_whitespace() || c == ',' || c == ';' || c == '.' || c == '!' || c == '?')
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\''))
            .filter(|w| !w.is_empty())
            .collect();

        let negation_positions: Vec<usize> = words
            .iter()
            .enumerate()
            .filter(|(_, w)| self.negation.contains(*w))
            .map(|(i, _)| i)
            .collect();

        let mut net: i32 = 0;
        let mut hits: i32 = 0;

        for (i, word) in words.iter().enumerate() {
            let is_positive = self.positive.contains(*word);
            let is_negative = self.negative.contains(*word);
            if !is_positive && !is_negative {
                continue;
            }

            let negated = negation_positions
                .iter()
                .any(|&neg_pos| neg_pos < i && (i - neg_pos) <= NEGATION_WINDOW);

            hits += 1;
            net += match (is_positive, negated) {
                (true, false) | (false, true) => 1,
                (true, true) | (false, false) => -1,
            };
        }

        if hits == 0 {
            return 0.0;
        }
        net as f64 / (hits + 1) as f64
    }
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PolarityScorer for LexiconScorer {
    fn name(&self) -> &str {
        "Lexicon"
    }

    async fn score(&self, text: &str) -> Result<f64, AnalysisError> {
        Ok(self.polarity(text))
    }
}
