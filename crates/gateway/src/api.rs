//! Routes called by the browser extension.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use socio_core::{DetectionSignals, TextAction};
use socio_engine::{EncryptionFileEntry, HistoryEntry, ImageOutcome, TextOutcome};
use tracing::{debug, info};

use crate::SharedState;
use crate::error::ApiError;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ── DTOs ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
pub struct StatusResponse {
    active: bool,
    version: &'static str,
    timestamp: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct AnalyzeTextRequest {
    text: Option<String>,
    url: Option<String>,
}

#[derive(Deserialize)]
pub struct AnalyzeImageRequest {
    image_url: Option<String>,
    url: Option<String>,
}

#[derive(Deserialize)]
pub struct RecoverQuery {
    filename: Option<String>,
}

#[derive(Serialize)]
pub struct RecoverResponse {
    recovered_text: String,
}

#[derive(Deserialize)]
pub struct TestDetectionRequest {
    text: Option<String>,
}

#[derive(Serialize)]
pub struct TestDetectionResponse {
    text: String,
    detection_results: DetectionSignals,
    determined_action: TextAction,
    reasons: Vec<String>,
}

#[derive(Serialize)]
pub struct DebugInfoResponse {
    app_version: &'static str,
    timestamp: DateTime<Utc>,
    uptime_secs: i64,
    log_files: usize,
    has_encryption_key: bool,
    key_fingerprint: String,
    image_filter_loaded: bool,
    detector: String,
    store: String,
}

/// Non-empty `field` of a request, or a 400.
fn required(value: Option<String>, what: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("No {what} provided")))
}

// ── Handlers ──────────────────────────────────────────────────────────────

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: VERSION,
    })
}

pub async fn status_handler() -> Json<StatusResponse> {
    Json(StatusResponse {
        active: true,
        version: VERSION,
        timestamp: Utc::now(),
    })
}

pub async fn analyze_text_handler(
    State(state): State<SharedState>,
    payload: Result<Json<AnalyzeTextRequest>, JsonRejection>,
) -> Result<Json<TextOutcome>, ApiError> {
    let Json(payload) = payload?;
    let text = payload
        .text
        .ok_or_else(|| ApiError::bad_request("No text provided"))?;

    debug!(
        chars = text.chars().count(),
        page = payload.url.as_deref().unwrap_or("unknown"),
        "Analyzing text"
    );
    let outcome = state.engine.process_text(&text).await?;
    Ok(Json(outcome))
}

pub async fn analyze_image_handler(
    State(state): State<SharedState>,
    payload: Result<Json<AnalyzeImageRequest>, JsonRejection>,
) -> Result<Json<ImageOutcome>, ApiError> {
    let Json(payload) = payload?;
    let image_url = required(payload.image_url, "image URL")?;

    info!(page = payload.url.as_deref().unwrap_or("unknown"), "Analyzing image");
    let outcome = state
        .engine
        .analyze_image(&image_url, payload.url.as_deref())
        .await?;
    Ok(Json(outcome))
}

pub async fn recover_content_handler(
    State(state): State<SharedState>,
    query: Result<Query<RecoverQuery>, QueryRejection>,
) -> Result<Json<RecoverResponse>, ApiError> {
    let Query(query) = query?;
    let filename = required(query.filename, "filename")?;

    let recovered = state.engine.recover_content(&filename).await?;
    Ok(Json(RecoverResponse {
        recovered_text: recovered.original_text,
    }))
}

pub async fn history_handler(
    State(state): State<SharedState>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    Ok(Json(state.engine.history().await?))
}

pub async fn encryption_files_handler(
    State(state): State<SharedState>,
) -> Result<Json<Vec<EncryptionFileEntry>>, ApiError> {
    Ok(Json(state.engine.encryption_files().await?))
}

pub async fn debug_info_handler(
    State(state): State<SharedState>,
) -> Result<Json<DebugInfoResponse>, ApiError> {
    let status = state.engine.status().await?;
    let now = Utc::now();
    Ok(Json(DebugInfoResponse {
        app_version: VERSION,
        timestamp: now,
        uptime_secs: (now - state.started_at).num_seconds(),
        log_files: status.log_files,
        has_encryption_key: true,
        key_fingerprint: status.key_fingerprint,
        image_filter_loaded: status.vision_analyzer.is_some(),
        detector: status.detector,
        store: status.store,
    }))
}

pub async fn test_detection_handler(
    State(state): State<SharedState>,
    payload: Result<Json<TestDetectionRequest>, JsonRejection>,
) -> Result<Json<TestDetectionResponse>, ApiError> {
    let Json(payload) = payload?;
    let text = payload
        .text
        .ok_or_else(|| ApiError::bad_request("No text provided"))?;

    let report = state.engine.test_detection(&text).await?;
    Ok(Json(TestDetectionResponse {
        text,
        detection_results: report.detection_results,
        determined_action: report.determined_action,
        reasons: report.reasons,
    }))
}
