use analysis_core::Signal;

use crate::config::SignalConfig;

/// Combine sentiment and RSI into a signal and its explanation.
///
/// Bullish means `sentiment_score > sentiment_threshold`; oversold means
/// `rsi < rsi_buy_threshold`. Both comparisons are strict.
pub fn decide(sentiment_score: f64, rsi: f64, config: &SignalConfig) -> (Signal, String) {
    let sentiment_bullish = sentiment_score > config.sentiment_threshold;
    let rsi_oversold = rsi < config.rsi_buy_threshold;

    match (sentiment_bullish, rsi_oversold) {
        (true, true) => (
            Signal::Buy,
            format!(
                "Strong bullish sentiment ({:.2} > {}) combined with oversold conditions \
                 (RSI {:.2} < {}). Potential buying opportunity.",
                sentiment_score, config.sentiment_threshold, rsi, config.rsi_buy_threshold
            ),
        ),
        (true, false) => (
            Signal::Hold,
            format!(
                "Bullish sentiment ({:.2}) but RSI ({:.2}) not oversold. \
                 Wait for better entry point.",
                sentiment_score, rsi
            ),
        ),
        (false, true) => (
            Signal::Hold,
            format!(
                "RSI oversold ({:.2}) but sentiment weak ({:.2}). \
                 Technical setup present but lacking sentiment confirmation.",
                rsi, sentiment_score
            ),
        ),
        (false, false) => (
            Signal::Neutral,
            format!(
                "Neutral conditions: sentiment={:.2}, RSI={:.2}. No clear trading opportunity.",
                sentiment_score, rsi
            ),
        ),
    }
}
