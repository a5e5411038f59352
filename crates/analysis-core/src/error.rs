use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Insufficient data: need at least {required} data points, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Degenerate result: {0}")]
    DegenerateResult(String),

    #[error("Fetch failure: {0}")]
    FetchFailure(String),

    #[error("Scoring error: {0}")]
    Scoring(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("API error: {0}")]
    ApiError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_data_message() {
        let err = AnalysisError::InsufficientData { required: 15, available: 3 };
        assert_eq!(
            err.to_string(),
            "Insufficient data: need at least 15 data points, got 3"
        );
    }

    #[test]
    fn test_fetch_failure_message() {
        let err = AnalysisError::FetchFailure("No data returned for ZZZZ".to_string());
        assert_eq!(err.to_string(), "Fetch failure: No data returned for ZZZZ");
    }
}
