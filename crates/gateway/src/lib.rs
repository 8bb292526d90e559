//! HTTP API gateway for Socio.
//!
//! Exposes the moderation engine to the browser extension: text and image
//! analysis, content recovery, history listings, and debug endpoints.
//!
//! Built on Axum for high performance async HTTP.

pub mod api;
pub mod error;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post};
use chrono::{DateTime, Utc};
use socio_config::{AppConfig, GatewayConfig};
use socio_engine::ModerationEngine;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use api::{
    analyze_image_handler, analyze_text_handler, debug_info_handler, encryption_files_handler,
    health_handler, history_handler, recover_content_handler, status_handler,
    test_detection_handler,
};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub engine: Arc<ModerationEngine>,
    pub started_at: DateTime<Utc>,
}

impl GatewayState {
    pub fn new(engine: Arc<ModerationEngine>) -> Self {
        Self {
            engine,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - CORS (any origin unless `allowed_origins` is set)
/// - Request body size limit (`max_body_bytes`)
/// - HTTP trace logging
pub fn build_router(state: SharedState, config: &GatewayConfig) -> Router {
    let mut router = Router::new()
        .route("/health", get(health_handler))
        .route("/api/status", get(status_handler))
        .route("/analyze_text", post(analyze_text_handler))
        .route("/analyze_image", post(analyze_image_handler))
        .route("/recover_content", get(recover_content_handler))
        .route("/history", get(history_handler))
        .route("/encryption_files", get(encryption_files_handler));

    if config.debug_routes {
        router = router
            .route("/debug/info", get(debug_info_handler))
            .route("/debug/test_detection", post(test_detection_handler));
    }

    router
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(cors_layer(&config.allowed_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    if allowed_origins.is_empty() {
        // Extension content scripts run on arbitrary pages.
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let engine = Arc::new(ModerationEngine::from_config(&config)?);
    serve(engine, &config.gateway).await
}

/// Serve an already-built engine.
pub async fn serve(
    engine: Arc<ModerationEngine>,
    config: &GatewayConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.host, config.port);
    let app = build_router(Arc::new(GatewayState::new(engine)), config);

    info!(addr = %addr, debug_routes = config.debug_routes, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use socio_core::{SafeSearchCategory, UpstreamError, VisionAnalyzer, VisionSignals};
    use socio_providers::LexiconDetector;
    use socio_security::CipherVault;
    use socio_store::InMemoryLogStore;
    use tower::ServiceExt;

    struct FixedAnalyzer(VisionSignals);

    #[async_trait]
    impl VisionAnalyzer for FixedAnalyzer {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn analyze(&self, _image_url: &str) -> Result<VisionSignals, UpstreamError> {
            Ok(self.0.clone())
        }
    }

    struct DownAnalyzer;

    #[async_trait]
    impl VisionAnalyzer for DownAnalyzer {
        fn name(&self) -> &str {
            "down"
        }

        async fn analyze(&self, _image_url: &str) -> Result<VisionSignals, UpstreamError> {
            Err(UpstreamError::Network("connection refused".into()))
        }
    }

    fn engine() -> ModerationEngine {
        ModerationEngine::new(
            Arc::new(InMemoryLogStore::new()),
            Arc::new(CipherVault::ephemeral()),
            Arc::new(LexiconDetector::new(&Default::default()).unwrap()),
        )
    }

    fn app_with(engine: ModerationEngine) -> Router {
        build_router(
            Arc::new(GatewayState::new(Arc::new(engine))),
            &GatewayConfig::default(),
        )
    }

    fn app() -> Router {
        app_with(engine())
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (status, body) = send(&app(), get_req("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn api_status_is_active() {
        let (status, body) = send(&app(), get_req("/api/status")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["active"], true);
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn analyze_text_removes_hate_speech() {
        let (status, body) = send(
            &app(),
            post_json("/analyze_text", json!({"text": "I will kill you", "url": "https://x.test"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["action"], "remove");
        assert_eq!(body["processed_text"], "*".repeat(15));
        assert_eq!(body["reasons"], json!(["Hate speech detected"]));
        assert!(
            body["log_reference"]
                .as_str()
                .unwrap()
                .starts_with("processing_log_")
        );
    }

    #[tokio::test]
    async fn encrypted_text_round_trips_through_recovery() {
        let app = app();
        let text = "My email is jane.doe@example.com";
        let (status, body) = send(&app, post_json("/analyze_text", json!({ "text": text }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["action"], "encrypt");
        assert_eq!(body["processed_text"], "[Encrypted content]");
        assert_eq!(body["reasons"], json!(["Email detected"]));

        let reference = body["log_reference"].as_str().unwrap();
        let (status, body) = send(
            &app,
            get_req(&format!("/recover_content?filename={reference}")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recovered_text"], text);

        let (_, files) = send(&app, get_req("/encryption_files")).await;
        assert_eq!(files.as_array().unwrap().len(), 1);
        assert_eq!(files[0]["content_type"], "text");
        let filename = files[0]["filename"].as_str().unwrap();
        let (status, body) = send(
            &app,
            get_req(&format!("/recover_content?filename={filename}")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recovered_text"], text);
    }

    #[tokio::test]
    async fn missing_text_is_bad_request() {
        let (status, body) = send(&app(), post_json("/analyze_text", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["kind"], "bad_request");
        assert_eq!(body["error"]["message"], "No text provided");
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let req = Request::builder()
            .method("POST")
            .uri("/analyze_text")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&app(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["kind"], "bad_request");
    }

    #[tokio::test]
    async fn recover_rejects_traversal_as_not_found() {
        let (status, body) = send(
            &app(),
            get_req("/recover_content?filename=..%2F..%2Fetc%2Fpasswd"),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["kind"], "not_found");
    }

    #[tokio::test]
    async fn recover_without_filename_is_bad_request() {
        let (status, _) = send(&app(), get_req("/recover_content")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn recover_kept_text_is_unprocessable() {
        let app = app();
        let (_, body) = send(
            &app,
            post_json("/analyze_text", json!({"text": "hello there"})),
        )
        .await;
        let reference = body["log_reference"].as_str().unwrap();
        let (status, body) = send(
            &app,
            get_req(&format!("/recover_content?filename={reference}")),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["kind"], "invalid_record");
    }

    #[tokio::test]
    async fn history_lists_newest_first() {
        let app = app();
        send(&app, post_json("/analyze_text", json!({"text": "hello"}))).await;
        send(&app, post_json("/analyze_text", json!({"text": "what the hell"}))).await;

        let (status, body) = send(&app, get_req("/history")).await;
        assert_eq!(status, StatusCode::OK);
        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["action"], "remove");
        assert_eq!(items[0]["detection_summary"]["profanity"], true);
        assert_eq!(items[1]["action"], "keep");
    }

    #[tokio::test]
    async fn analyze_image_blurs_racy_content() {
        let signals = VisionSignals::default().with_safe_search(SafeSearchCategory::Racy, 0.75);
        let app = app_with(engine().with_analyzer(Arc::new(FixedAnalyzer(signals))));

        let (status, body) = send(
            &app,
            post_json(
                "/analyze_image",
                json!({"image_url": "https://img.test/a.png", "url": "https://x.test"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["action"], "blur");
        assert_eq!(body["severity_tier"], "questionable");
        assert_eq!(body["blur_radius"], 15);
        assert_eq!(body["reasons"], json!(["Racy detected"]));
    }

    #[tokio::test]
    async fn analyze_image_upstream_failure_is_bad_gateway() {
        let app = app_with(engine().with_analyzer(Arc::new(DownAnalyzer)));
        let (status, body) = send(
            &app,
            post_json("/analyze_image", json!({"image_url": "https://img.test/a.png"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["kind"], "upstream_error");
    }

    #[tokio::test]
    async fn analyze_image_requires_url() {
        let (status, body) = send(&app(), post_json("/analyze_image", json!({"url": "x"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "No image URL provided");
    }

    #[tokio::test]
    async fn debug_test_detection_writes_no_log() {
        let app = app();
        let (status, body) = send(
            &app,
            post_json("/debug/test_detection", json!({"text": "ssn 123-45-6789"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "ssn 123-45-6789");
        assert_eq!(body["determined_action"], "encrypt");
        assert_eq!(
            body["detection_results"]["sensitive_info"]["ssn"],
            json!(["123-45-6789"])
        );

        let (_, info) = send(&app, get_req("/debug/info")).await;
        assert_eq!(info["log_files"], 0);
        assert_eq!(info["has_encryption_key"], true);
        assert_eq!(info["image_filter_loaded"], false);
        assert_eq!(info["detector"], "lexicon");
    }

    #[tokio::test]
    async fn debug_routes_can_be_disabled() {
        let config = GatewayConfig {
            debug_routes: false,
            ..Default::default()
        };
        let app = build_router(Arc::new(GatewayState::new(Arc::new(engine()))), &config);
        let (status, _) = send(&app, get_req("/debug/info")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let config = GatewayConfig {
            max_body_bytes: 64,
            ..Default::default()
        };
        let app = build_router(Arc::new(GatewayState::new(Arc::new(engine()))), &config);
        let text = "a".repeat(200);
        let (status, body) = send(&app, post_json("/analyze_text", json!({ "text": text }))).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"]["kind"], "payload_too_large");
    }

    #[test]
    fn cors_accepts_listed_origins() {
        // Building with valid and invalid entries must not panic.
        let _ = cors_layer(&["https://example.com".into(), "bad\norigin".into()]);
        let _ = cors_layer(&[]);
    }
}
