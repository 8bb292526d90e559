//! Google Cloud Vision analyzer.
//!
//! One `images:annotate` call per image, requesting safe-search, labels,
//! text, and object localization. `data:` URLs are sent inline as base64
//! content; `http(s)` URLs are passed as `imageUri` for Google to fetch.
//!
//! Likelihood buckets are converted to scores: UNKNOWN 0.0, VERY_UNLIKELY 0.1,
//! UNLIKELY 0.3, POSSIBLE 0.5, LIKELY 0.7, VERY_LIKELY 0.9.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Deserialize;
use socio_config::VisionConfig;
use socio_core::{
    DetectedObject, Label, Likelihood, NormalizedVertex, SafeSearchCategory, SafeSearchScore,
    UpstreamError, VisionAnalyzer, VisionSignals,
};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

const MAX_LABELS: u32 = 10;
const MAX_OBJECTS: u32 = 10;

/// A [`VisionAnalyzer`] backed by the Google Cloud Vision REST API.
pub struct GoogleVisionAnalyzer {
    api_key: String,
    endpoint: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GoogleVisionAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleVisionAnalyzer")
            .field("api_key", &"[REDACTED]")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl GoogleVisionAnalyzer {
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            client,
        })
    }

    /// Build from configuration; fails with `NotConfigured` without an API key.
    pub fn from_config(config: &VisionConfig) -> Result<Self, UpstreamError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                UpstreamError::NotConfigured(
                    "no Google Cloud Vision API key (set vision.api_key or GOOGLE_CLOUD_API_KEY)"
                        .into(),
                )
            })?;
        Self::new(
            api_key,
            config.endpoint.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait]
impl VisionAnalyzer for GoogleVisionAnalyzer {
    fn name(&self) -> &str {
        "google_vision"
    }

    async fn analyze(&self, image_url: &str) -> Result<VisionSignals, UpstreamError> {
        let body = annotate_request(image_url)?;

        debug!(
            endpoint = %self.endpoint,
            inline = image_url.starts_with("data:"),
            "Sending annotate request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamError::Network(e.without_url().to_string()))?;

        let status = response.status().as_u16();

        if status == 401 || status == 403 {
            return Err(UpstreamError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Vision API returned error");
            return Err(UpstreamError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let parsed: AnnotateResponse = response.json().await.map_err(|e| {
            UpstreamError::MalformedResponse(format!("Failed to parse response: {e}"))
        })?;

        into_signals(parsed)
    }
}

/// The `images:annotate` request body for one image.
fn annotate_request(image_url: &str) -> Result<serde_json::Value, UpstreamError> {
    let image = if let Some(rest) = image_url.strip_prefix("data:") {
        let (meta, payload) = rest.split_once(',').ok_or_else(|| {
            UpstreamError::InvalidInput("data URL has no payload".into())
        })?;
        if !meta.ends_with(";base64") {
            return Err(UpstreamError::InvalidInput(
                "only base64 data URLs are supported".into(),
            ));
        }
        let payload = payload.trim();
        STANDARD.decode(payload).map_err(|_| {
            UpstreamError::InvalidInput("data URL payload is not valid base64".into())
        })?;
        serde_json::json!({ "content": payload })
    } else if image_url.starts_with("http://") || image_url.starts_with("https://") {
        serde_json::json!({ "source": { "imageUri": image_url } })
    } else {
        return Err(UpstreamError::InvalidInput(
            "image URL must be http(s) or a data URL".into(),
        ));
    };

    Ok(serde_json::json!({
        "requests": [{
            "image": image,
            "features": [
                { "type": "SAFE_SEARCH_DETECTION" },
                { "type": "LABEL_DETECTION", "maxResults": MAX_LABELS },
                { "type": "TEXT_DETECTION" },
                { "type": "OBJECT_LOCALIZATION", "maxResults": MAX_OBJECTS },
            ],
        }],
    }))
}

fn into_signals(response: AnnotateResponse) -> Result<VisionSignals, UpstreamError> {
    let result = response
        .responses
        .into_iter()
        .next()
        .ok_or_else(|| UpstreamError::MalformedResponse("No responses in annotate result".into()))?;

    if let Some(error) = result.error {
        return Err(UpstreamError::ApiError {
            status_code: 200,
            message: format!("image annotation failed (code {}): {}", error.code, error.message),
        });
    }

    let safe_search: BTreeMap<SafeSearchCategory, SafeSearchScore> = result
        .safe_search_annotation
        .map(|s| {
            [
                (SafeSearchCategory::Adult, s.adult),
                (SafeSearchCategory::Violence, s.violence),
                (SafeSearchCategory::Racy, s.racy),
                (SafeSearchCategory::Medical, s.medical),
                (SafeSearchCategory::Spoof, s.spoof),
            ]
            .into_iter()
            .map(|(category, likelihood)| (category, SafeSearchScore::from_likelihood(likelihood)))
            .collect()
        })
        .unwrap_or_default();

    let labels = result
        .label_annotations
        .into_iter()
        .map(|l| Label {
            description: l.description,
            score: l.score,
            topicality: l.topicality,
        })
        .collect();

    let detected_objects = result
        .localized_object_annotations
        .into_iter()
        .map(|o| DetectedObject {
            name: o.name,
            score: o.score,
            bounding_box: o
                .bounding_poly
                .map(|p| p.normalized_vertices)
                .unwrap_or_default(),
        })
        .collect();

    // The first text annotation is the full detected text.
    let text_content = result
        .text_annotations
        .into_iter()
        .next()
        .map(|t| t.description)
        .filter(|t| !t.is_empty());

    Ok(VisionSignals {
        safe_search,
        labels,
        detected_objects,
        text_content,
    })
}

// --- Wire types ---

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    safe_search_annotation: Option<SafeSearchAnnotation>,
    #[serde(default)]
    label_annotations: Vec<EntityAnnotation>,
    #[serde(default)]
    text_annotations: Vec<TextAnnotation>,
    #[serde(default)]
    localized_object_annotations: Vec<LocalizedObjectAnnotation>,
    error: Option<ApiStatus>,
}

#[derive(Debug, Deserialize)]
struct SafeSearchAnnotation {
    #[serde(default)]
    adult: Likelihood,
    #[serde(default)]
    violence: Likelihood,
    #[serde(default)]
    racy: Likelihood,
    #[serde(default)]
    medical: Likelihood,
    #[serde(default)]
    spoof: Likelihood,
}

#[derive(Debug, Deserialize)]
struct EntityAnnotation {
    #[serde(default)]
    description: String,
    #[serde(default)]
    score: f32,
    topicality: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocalizedObjectAnnotation {
    #[serde(default)]
    name: String,
    #[serde(default)]
    score: f32,
    bounding_poly: Option<BoundingPoly>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoundingPoly {
    #[serde(default)]
    normalized_vertices: Vec<NormalizedVertex>,
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}
