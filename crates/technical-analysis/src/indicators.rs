use analysis_core::{AnalysisError, Bar};

/// Simple Moving Average
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    let mut result = Vec::with_capacity(data.len() - period + 1);
    for i in period - 1..data.len() {
        let sum: f64 = data[i + 1 - period..=i].iter().sum();
        result.push(sum / period as f64);
    }
    result
}

/// Close-to-close changes split into gains and absolute losses
pub fn gains_and_losses(data: &[f64]) -> (Vec<f64>, Vec<f64>) {
    data.windows(2)
        .map(|w| {
            let change = w[1] - w[0];
            if change > 0.0 {
                (change, 0.0)
            } else {
                (0.0, -change)
            }
        })
        .unzip()
}

/// Relative Strength Index at the most recent close.
///
/// Uses simple (not Wilder-smoothed) averages of gains and losses over the
/// trailing `period` changes, so `period + 1` closes are the minimum input.
/// A zero average loss is reported as [`AnalysisError::DegenerateResult`]
/// instead of producing a non-numeric value.
pub fn rsi(data: &[f64], period: usize) -> Result<f64, AnalysisError> {
    if period == 0 {
        return Err(AnalysisError::InvalidData("RSI period must be at least 1".to_string()));
    }
    if data.len() < period + 1 {
        return Err(AnalysisError::InsufficientData {
            required: period + 1,
            available: data.len(),
        });
    }

    let (gains, losses) = gains_and_losses(data);
    let avg_gain = sma(&gains[gains.len() - period..], period)[0];
    let avg_loss = sma(&losses[losses.len() - period..], period)[0];

    if !avg_gain.is_finite() || !avg_loss.is_finite() {
        return Err(AnalysisError::DegenerateResult(
            "non-finite price change in RSI window".to_string(),
        ));
    }
    if avg_loss == 0.0 {
        return Err(AnalysisError::DegenerateResult(format!(
            "average loss is zero over the last {} periods",
            period
        )));
    }

    let rs = avg_gain / avg_loss;
    Ok(100.0 - (100.0 / (1.0 + rs)))
}

/// Mean volume across all bars, truncated to a whole share count
pub fn average_volume(bars: &[Bar]) -> u64 {
    if bars.is_empty() {
        return 0;
    }
    let total: f64 = bars.iter().map(|b| b.volume.max(0.0)).sum();
    (total / bars.len() as f64) as u64
}
