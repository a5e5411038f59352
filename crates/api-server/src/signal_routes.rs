//! Signal Routes
//!
//! Signal generation, configuration introspection, ticker checks and
//! health check.

use analysis_core::{normalize_ticker, SignalStatus};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::request_id::RequestId;
use crate::{AppError, AppState};

pub const SERVICE_NAME: &str = "trading-signal-service";

/// Validated body of `POST /api/signal`
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRequest {
    pub ticker: String,
    pub reddit_posts: Vec<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: String,
}

#[derive(Serialize)]
struct ConfigResponse {
    sentiment_threshold: f64,
    rsi_buy_threshold: f64,
    rsi_period: usize,
    history_days: u32,
    history_timeframe: String,
    sentiment_analyzer: String,
    market_data_source: String,
    service_version: String,
}

#[derive(Serialize)]
struct TickerValidation {
    valid: bool,
    ticker: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

pub fn signal_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health).fallback(method_not_allowed))
        .route("/api/signal", post(generate_signal).fallback(method_not_allowed))
        .route("/api/config", get(get_config).fallback(method_not_allowed))
        .route(
            "/api/validate/:ticker",
            get(validate_ticker).fallback(method_not_allowed),
        )
}

/// Check a raw request body against the signal request shape.
///
/// Checks run in a fixed order so the first problem found is the one
/// reported.
pub fn parse_signal_request(body: &[u8]) -> Result<SignalRequest, AppError> {
    let empty = || AppError::BadRequest("Request body is empty".to_string());

    let data: Value = serde_json::from_slice(body).map_err(|_| empty())?;
    let fields: &Map<String, Value> = match &data {
        Value::Object(map) if map.is_empty() => return Err(empty()),
        Value::Object(map) => map,
        Value::Null | Value::Bool(false) => return Err(empty()),
        Value::Array(items) if items.is_empty() => return Err(empty()),
        Value::String(s) if s.is_empty() => return Err(empty()),
        Value::Number(n) if n.as_f64() == Some(0.0) => return Err(empty()),
        _ => {
            return Err(AppError::BadRequest(
                "Missing required field: ticker".to_string(),
            ))
        }
    };

    let ticker = fields
        .get("ticker")
        .ok_or_else(|| AppError::BadRequest("Missing required field: ticker".to_string()))?;
    let posts = fields
        .get("reddit_posts")
        .ok_or_else(|| AppError::BadRequest("Missing required field: reddit_posts".to_string()))?;

    let ticker = ticker
        .as_str()
        .ok_or_else(|| AppError::BadRequest("ticker must be a string".to_string()))?;
    let posts = posts
        .as_array()
        .ok_or_else(|| AppError::BadRequest("reddit_posts must be a list".to_string()))?;

    if ticker.trim().is_empty() {
        return Err(AppError::BadRequest("ticker cannot be empty".to_string()));
    }

    let reddit_posts = posts
        .iter()
        .map(|p| p.as_str().map(str::to_string))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| AppError::BadRequest("reddit_posts must contain only strings".to_string()))?;

    Ok(SignalRequest {
        ticker: normalize_ticker(ticker),
        reddit_posts,
    })
}

fn status_code(status: SignalStatus) -> StatusCode {
    match status {
        SignalStatus::Success => StatusCode::OK,
        SignalStatus::Partial => StatusCode::PARTIAL_CONTENT,
        SignalStatus::Error => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        version: state.generator.service_version().to_string(),
    })
}

async fn generate_signal(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    body: Bytes,
) -> Result<Response, AppError> {
    let request = parse_signal_request(&body)?;

    tracing::info!(
        "Processing signal request {} for {} with {} posts",
        request_id.map(|Extension(id)| id.to_string()).unwrap_or_default(),
        request.ticker,
        request.reddit_posts.len()
    );

    let record = state
        .generator
        .generate(&request.ticker, &request.reddit_posts)
        .await;

    Ok((status_code(record.status), Json(record)).into_response())
}

async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    let generator = &state.generator;
    let config = generator.config();
    let technical = generator.technical_config();

    Json(ConfigResponse {
        sentiment_threshold: config.sentiment_threshold,
        rsi_buy_threshold: config.rsi_buy_threshold,
        rsi_period: config.rsi_period,
        history_days: technical.lookback_days,
        history_timeframe: technical.timeframe.to_string(),
        sentiment_analyzer: generator.scorer_name().to_string(),
        market_data_source: generator.source_name().to_string(),
        service_version: generator.service_version().to_string(),
    })
}

/// Filter endpoint for automation flows: 200 when the market data source
/// has recent bars for the ticker, 404 otherwise.
async fn validate_ticker(State(state): State<AppState>, Path(ticker): Path<String>) -> Response {
    let ticker = normalize_ticker(&ticker);
    tracing::info!("Validating ticker: {}", ticker);

    let (status, validation) = match state.generator.check_ticker(&ticker).await {
        Ok(count) if count > 0 => (
            StatusCode::OK,
            TickerValidation {
                valid: true,
                ticker,
                reason: None,
            },
        ),
        Ok(_) => (
            StatusCode::NOT_FOUND,
            TickerValidation {
                valid: false,
                ticker,
                reason: None,
            },
        ),
        Err(e) => {
            tracing::warn!("Ticker validation failed for {}: {}", ticker, e);
            (
                StatusCode::NOT_FOUND,
                TickerValidation {
                    valid: false,
                    ticker,
                    reason: Some(e.to_string()),
                },
            )
        }
    };

    (status, Json(validation)).into_response()
}

pub async fn not_found() -> AppError {
    AppError::NotFound("Endpoint not found".to_string())
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
