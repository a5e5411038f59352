#[cfg(test)]
mod tests {
    use super::super::indicators::*;
    use analysis_core::{AnalysisError, Bar};
    use approx::assert_relative_eq;
    use chrono::Utc;

    // Helper function to create sample price data
    fn sample_prices() -> Vec<f64> {
        vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
        ]
    }

    fn bars_with_volumes(volumes: &[f64]) -> Vec<Bar> {
        volumes
            .iter()
            .enumerate()
            .map(|(i, &volume)| Bar {
                timestamp: Utc::now() - chrono::Duration::days((volumes.len() - i) as i64),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.0,
                volume,
            })
            .collect()
    }

    #[test]
    fn test_sma_basic() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = sma(&data, 3);

        assert_eq!(result.len(), 3);
        assert!((result[0] - 2.0).abs() < 0.001); // (1+2+3)/3 = 2
        assert!((result[1] - 3.0).abs() < 0.001); // (2+3+4)/3 = 3
        assert!((result[2] - 4.0).abs() < 0.001); // (3+4+5)/3 = 4
    }

    #[test]
    fn test_sma_insufficient_data() {
        let data = vec![1.0, 2.0];
        let result = sma(&data, 5);

        assert_eq!(result.len(), 0);
    }

    #[test]
    fn test_gains_and_losses() {
        let (gains, losses) = gains_and_losses(&[10.0, 11.0, 10.5, 10.5]);

        assert_eq!(gains, vec![1.0, 0.0, 0.0]);
        assert_eq!(losses, vec![0.0, 0.5, 0.0]);
    }

    #[test]
    fn test_rsi_simple_average() {
        // gains avg 0.5, losses avg 0.25 -> RS 2 -> RSI 66.67
        let value = rsi(&[10.0, 11.0, 10.5], 2).unwrap();
        assert_relative_eq!(value, 200.0 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rsi_uses_trailing_window_only() {
        let prices = sample_prices();

        assert_relative_eq!(rsi(&prices, 14).unwrap(), 59.80629539951578, epsilon = 1e-6);
        assert_relative_eq!(rsi(&prices[..15], 14).unwrap(), 70.46413502109705, epsilon = 1e-6);
    }

    #[test]
    fn test_rsi_in_range() {
        let prices = sample_prices();
        for period in 1..prices.len() {
            if let Ok(value) = rsi(&prices, period) {
                assert!((0.0..=100.0).contains(&value), "period {} gave {}", period, value);
            }
        }
    }

    #[test]
    fn test_rsi_insufficient_data() {
        let prices = sample_prices();
        for len in 0..15 {
            let err = rsi(&prices[..len], 14).unwrap_err();
            assert!(matches!(
                err,
                AnalysisError::InsufficientData { required: 15, available } if available == len
            ));
        }
    }

    #[test]
    fn test_rsi_zero_average_loss_is_degenerate() {
        let rising: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        assert!(matches!(rsi(&rising, 14), Err(AnalysisError::DegenerateResult(_))));

        let flat = vec![50.0; 20];
        assert!(matches!(rsi(&flat, 14), Err(AnalysisError::DegenerateResult(_))));
    }

    #[test]
    fn test_rsi_old_losses_outside_window_do_not_count() {
        // One early drop, then a clean rally for the whole window
        let mut prices = vec![100.0, 90.0];
        prices.extend((1..=14).map(|i| 90.0 + i as f64));
        assert!(matches!(rsi(&prices, 14), Err(AnalysisError::DegenerateResult(_))));
    }

    #[test]
    fn test_rsi_all_losses_is_zero() {
        let falling: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        assert_relative_eq!(rsi(&falling, 14).unwrap(), 0.0);
    }

    #[test]
    fn test_rsi_non_finite_input_is_degenerate() {
        let mut prices = sample_prices();
        prices[18] = f64::NAN;
        assert!(matches!(rsi(&prices, 14), Err(AnalysisError::DegenerateResult(_))));
    }

    #[test]
    fn test_rsi_zero_period_rejected() {
        assert!(matches!(rsi(&sample_prices(), 0), Err(AnalysisError::InvalidData(_))));
    }

    #[test]
    fn test_average_volume_truncates() {
        let bars = bars_with_volumes(&[100.0, 200.0, 250.0]);
        // 550 / 3 = 183.33
        assert_eq!(average_volume(&bars), 183);
        assert_eq!(average_volume(&[]), 0);
    }
}
