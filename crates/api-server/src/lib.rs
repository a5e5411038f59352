//! HTTP surface of the trading signal service.

pub mod config;
pub mod error;
pub mod request_id;
pub mod signal_routes;

pub use config::ServerConfig;
pub use error::AppError;

use anyhow::Context;
use axum::{extract::Request, middleware, Router};
use signal_generator::SignalGenerator;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<SignalGenerator>,
}

impl AppState {
    pub fn new(generator: SignalGenerator) -> Self {
        Self {
            generator: Arc::new(generator),
        }
    }
}

/// Initialize tracing. JSON output when `RUST_LOG_FORMAT=json`.
pub fn init_tracing() {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter()).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter()).init();
    }
}

pub fn build_router(state: AppState) -> Router {
    // n8n and other automation tools call from arbitrary origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(signal_routes::signal_routes())
        .fallback(signal_routes::not_found)
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections");
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let server = ServerConfig::from_env()?;
    let generator = SignalGenerator::from_env()?.with_service_version(server.service_version.clone());

    tracing::info!(
        "Thresholds: sentiment > {}, RSI < {} (period {})",
        generator.config().sentiment_threshold,
        generator.config().rsi_buy_threshold,
        generator.config().rsi_period
    );

    let app = build_router(AppState::new(generator));

    let addr = server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Starting Trading Signal Service on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::{AnalysisError, Bar, MarketDataFetcher, PolarityScorer, Timeframe};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, StatusCode};
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::Value;
    use signal_generator::SignalConfig;
    use tower::ServiceExt;

    struct FixedScorer;

    #[async_trait]
    impl PolarityScorer for FixedScorer {
        fn name(&self) -> &str {
            "Fixed"
        }

        async fn score(&self, text: &str) -> Result<f64, AnalysisError> {
            Ok(if text.contains("moon") { 0.8 } else { 0.0 })
        }
    }

    /// Serves a falling-then-flat series (RSI 25) for every known ticker.
    struct StubFetcher;

    #[async_trait]
    impl MarketDataFetcher for StubFetcher {
        fn name(&self) -> &str {
            "stub"
        }

        async fn fetch(&self, symbol: &str, days: u32, _tf: Timeframe) -> Result<Vec<Bar>, AnalysisError> {
            match symbol {
                "ZZZZ" => Err(AnalysisError::FetchFailure(format!("No data found for {}", symbol))),
                "EMPTY" => Ok(Vec::new()),
                _ => {
                    let mut closes = vec![100.0, 101.0, 100.0, 99.0, 98.0];
                    closes.extend(std::iter::repeat(98.0).take(10));
                    let closes = &closes[closes.len().saturating_sub(days as usize)..];
                    let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
                    Ok(closes
                        .iter()
                        .enumerate()
                        .map(|(i, &close)| Bar {
                            timestamp: start + Duration::days(i as i64),
                            open: close,
                            high: close,
                            low: close,
                            close,
                            volume: 1_000.0,
                        })
                        .collect())
                }
            }
        }
    }

    fn app() -> Router {
        let generator = SignalGenerator::new(
            Arc::new(FixedScorer),
            Arc::new(StubFetcher),
            SignalConfig::default(),
        )
        .with_service_version("9.9.9");
        build_router(AppState::new(generator))
    }

    async fn send(method: Method, uri: &str, body: &str) -> (StatusCode, Value, axum::http::HeaderMap) {
        let request = axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json, headers)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, json, headers) = send(Method::GET, "/health", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["service"], "trading-signal-service");
        assert_eq!(json["version"], "9.9.9");
        assert!(headers.contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_signal_buy() {
        let (status, json, _) = send(
            Method::POST,
            "/api/signal",
            r#"{"ticker": "aapl", "reddit_posts": ["to the moon", "moon"]}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["signal"], "BUY");
        assert_eq!(json["ticker"], "AAPL");
        assert_eq!(json["status"], "success");
        assert_eq!(json["rsi"], 25.0);
        assert_eq!(json["price"], 98.0);
        assert_eq!(json["metadata"]["sentiment_analyzer"], "Fixed");
        assert_eq!(json["metadata"]["technical_details"]["data_points"], 15);
        assert_eq!(json["errors"], Value::Array(vec![]));
    }

    #[tokio::test]
    async fn test_signal_error_maps_to_500() {
        let (status, json, _) = send(
            Method::POST,
            "/api/signal",
            r#"{"ticker": "ZZZZ", "reddit_posts": ["moon"]}"#,
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["signal"], "ERROR");
        assert_eq!(json["sentiment_score"], 0.9);
        assert!(json["rsi"].is_null());
        assert_eq!(json["errors"][0]["type"], "technical_data_error");
    }

    #[tokio::test]
    async fn test_signal_validation_error() {
        let (status, json, _) = send(Method::POST, "/api/signal", r#"{"ticker": "AAPL"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "Missing required field: reddit_posts");

        let (status, json, _) = send(Method::POST, "/api/signal", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Request body is empty");
    }

    #[tokio::test]
    async fn test_config_endpoint() {
        let (status, json, _) = send(Method::GET, "/api/config", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["sentiment_threshold"], 0.7);
        assert_eq!(json["rsi_buy_threshold"], 30.0);
        assert_eq!(json["rsi_period"], 14);
        assert_eq!(json["history_days"], 60);
        assert_eq!(json["history_timeframe"], "1d");
        assert_eq!(json["market_data_source"], "stub");
        assert_eq!(json["service_version"], "9.9.9");
    }

    #[tokio::test]
    async fn test_validate_ticker() {
        let (status, json, _) = send(Method::GET, "/api/validate/msft", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["valid"], true);
        assert_eq!(json["ticker"], "MSFT");

        let (status, json, _) = send(Method::GET, "/api/validate/empty", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["valid"], false);
        assert!(json.get("reason").is_none());

        let (status, json, _) = send(Method::GET, "/api/validate/zzzz", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["valid"], false);
        assert!(json["reason"].as_str().unwrap().contains("ZZZZ"));
    }

    #[tokio::test]
    async fn test_unknown_path_and_wrong_method() {
        let (status, json, _) = send(Method::GET, "/api/nope", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Endpoint not found");

        let (status, json, _) = send(Method::GET, "/api/signal", "").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(json["error"], "Method not allowed");
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let request = axum::http::Request::builder()
            .uri("/health")
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.headers()["x-request-id"], "abc-123");
    }
}
