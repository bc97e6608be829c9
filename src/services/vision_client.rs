//! Google Vision annotation client
//!
//! Runs object localization over uploaded image bytes and returns the raw
//! `{name, score}` labels; the category rule lives in the classifier, not
//! here.

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::{BackendError, ImagePayload, Label, LabelAnnotator};

const VISION_ANNOTATE_URL: &str = "https://vision.googleapis.com/v1/images:annotate";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_LABELS: u32 = 10;

/// Vision API client
pub struct VisionClient {
    http_client: reqwest::Client,
    api_key: String,
}

#[derive(Serialize)]
struct AnnotateRequest {
    requests: Vec<AnnotateEntry>,
}

#[derive(Serialize)]
struct AnnotateEntry {
    image: ImageContent,
    features: Vec<Feature>,
}

#[derive(Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Serialize)]
struct Feature {
    #[serde(rename = "type")]
    feature_type: String,
    #[serde(rename = "maxResults")]
    max_results: u32,
}

#[derive(Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateResult>,
}

#[derive(Deserialize)]
struct AnnotateResult {
    #[serde(rename = "localizedObjectAnnotations", default)]
    annotations: Vec<ObjectAnnotation>,
}

#[derive(Deserialize)]
struct ObjectAnnotation {
    name: String,
    score: f32,
}

impl VisionClient {
    pub fn new(api_key: String) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
        })
    }
}

#[async_trait::async_trait]
impl LabelAnnotator for VisionClient {
    async fn annotate(&self, image: &ImagePayload) -> Result<Vec<Label>, BackendError> {
        let url = format!("{}?key={}", VISION_ANNOTATE_URL, self.api_key);
        let body = AnnotateRequest {
            requests: vec![AnnotateEntry {
                image: ImageContent {
                    content: base64::engine::general_purpose::STANDARD.encode(image.as_bytes()),
                },
                features: vec![Feature {
                    feature_type: "OBJECT_LOCALIZATION".to_string(),
                    max_results: MAX_LABELS,
                }],
            }],
        };

        tracing::debug!(image_bytes = image.len(), "Querying Vision API");

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(BackendError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(BackendError::Api(status.as_u16(), error_text));
        }

        let annotated: AnnotateResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))?;

        let labels: Vec<Label> = annotated
            .responses
            .into_iter()
            .flat_map(|r| r.annotations)
            .map(|a| Label {
                name: a.name,
                score: a.score,
            })
            .collect();

        tracing::debug!(labels = labels.len(), "Vision annotation complete");

        Ok(labels)
    }
}
