//! Core types and backend trait seams for plateful
//!
//! Every external service the enrichment pipeline talks to is abstracted as
//! an object-safe async trait, injected as `Arc<dyn Trait>` so tests can
//! substitute fakes without touching the network.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// Image payload
// ============================================================================

/// Raw bytes of an uploaded image.
///
/// Owned by the request scope, never mutated after read. Internally
/// reference-counted so concurrent enrichment tasks can hold it cheaply.
#[derive(Clone)]
pub struct ImagePayload {
    bytes: Arc<Vec<u8>>,
}

impl ImagePayload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Arc::new(bytes),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePayload")
            .field("len", &self.bytes.len())
            .finish()
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Three-way classification of an uploaded image, plus a catch-all for
/// categories this service does not recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "ingredient")]
    Ingredient,
    #[serde(rename = "cooked food")]
    CookedFood,
    #[serde(rename = "invalid")]
    Invalid,
    #[serde(other, rename = "unknown")]
    Unknown,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Ingredient => "ingredient",
            Category::CookedFood => "cooked food",
            Category::Invalid => "invalid",
            Category::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A single label/score annotation from the vision backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub score: f32,
}

// ============================================================================
// Enrichment results
// ============================================================================

/// A recommended tutorial video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoCandidate {
    pub title: String,
    pub thumbnail: String,
    #[serde(rename = "videoUrl")]
    pub video_url: String,
}

/// Search prompt derived from a cooked-food image, used to query the video
/// backend. Both fields are required; an empty field is a backend error.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoPrompt {
    pub food_name: String,
    pub youtube_search_prompt: String,
}

/// Receipt from the image store after a successful upload.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadReceipt {
    pub secure_url: String,
    pub public_id: String,
}

/// Primary payload of an aggregate response: either the detected ingredient
/// list or the generated recipe text, depending on the category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnrichedData {
    Ingredients(Vec<String>),
    Recipe(String),
}

/// JSON envelope returned by the enrichment pipeline.
///
/// Built incrementally by concurrent tasks, each writing a disjoint field;
/// finalized only after every scheduled task has reported. Optional fields
/// are omitted from the serialized form when unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateResponse {
    pub status: bool,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<EnrichedData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yt: Option<Vec<VideoCandidate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yt_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_error: Option<String>,
}

// ============================================================================
// Backend error taxonomy
// ============================================================================

/// Errors from external backend calls.
///
/// `Timeout` is the only transient class: the retry wrapper re-attempts it,
/// everything else propagates immediately.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("empty response: {0}")]
    Empty(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("{operation} failed after {attempts} attempts: {last}")]
    RetryExhausted {
        operation: String,
        attempts: u32,
        last: String,
    },
}

impl BackendError {
    /// Retry predicate: only deadline/timeout expiry is transient.
    pub fn is_timeout(&self) -> bool {
        matches!(self, BackendError::Timeout(_))
    }

    /// Classify a reqwest transport error.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::Timeout(err.to_string())
        } else {
            BackendError::Network(err.to_string())
        }
    }
}

// ============================================================================
// Backend trait seams
// ============================================================================

/// Request to the generative backend: a text prompt, an optional inline
/// image, and whether the caller expects strict JSON output.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub prompt: String,
    pub image: Option<ImagePayload>,
    pub expect_json: bool,
}

impl GenerateRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
            expect_json: false,
        }
    }

    pub fn with_image(prompt: impl Into<String>, image: ImagePayload) -> Self {
        Self {
            prompt: prompt.into(),
            image: Some(image),
            expect_json: false,
        }
    }

    pub fn expecting_json(mut self) -> Self {
        self.expect_json = true;
        self
    }
}

/// Label/annotation service: maps image bytes to scored labels.
#[async_trait::async_trait]
pub trait LabelAnnotator: Send + Sync {
    async fn annotate(&self, image: &ImagePayload) -> Result<Vec<Label>, BackendError>;
}

/// Text/vision generation service.
#[async_trait::async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<String, BackendError>;
}

/// Tutorial video search service.
#[async_trait::async_trait]
pub trait VideoSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<VideoCandidate>, BackendError>;
}

/// Archival object store for uploaded images.
#[async_trait::async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload(&self, image: &ImagePayload) -> Result<UploadReceipt, BackendError>;
}
