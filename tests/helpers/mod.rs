//! Shared fake backends for integration tests

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use plateful::config::RetryPolicy;
use plateful::services::{Aggregator, Classifier, RecipeGenerator};
use plateful::types::{
    BackendError, GenerateRequest, GenerativeBackend, ImagePayload, ImageStore, Label,
    LabelAnnotator, UploadReceipt, VideoCandidate, VideoSearch,
};
use plateful::AppState;

/// Scripted outcome for a fake backend call.
#[derive(Clone)]
pub enum Outcome {
    Ok(String),
    Timeout,
    ApiError(String),
}

impl Outcome {
    fn resolve(&self) -> Result<String, BackendError> {
        match self {
            Outcome::Ok(text) => Ok(text.clone()),
            Outcome::Timeout => Err(BackendError::Timeout("deadline exceeded".to_string())),
            Outcome::ApiError(msg) => Err(BackendError::Api(500, msg.clone())),
        }
    }
}

/// Fake label annotator returning a fixed label set.
pub struct FakeAnnotator {
    pub labels: Vec<Label>,
    pub calls: AtomicU32,
}

impl FakeAnnotator {
    pub fn with_labels(labels: Vec<(&str, f32)>) -> Arc<Self> {
        Arc::new(Self {
            labels: labels
                .into_iter()
                .map(|(name, score)| Label {
                    name: name.to_string(),
                    score,
                })
                .collect(),
            calls: AtomicU32::new(0),
        })
    }
}

#[async_trait::async_trait]
impl LabelAnnotator for FakeAnnotator {
    async fn annotate(&self, _image: &ImagePayload) -> Result<Vec<Label>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.labels.clone())
    }
}

/// Fake generative backend: expect-JSON requests get `json_reply`, plain
/// text requests get `text_reply`. Counts calls so tests can assert that
/// invalid images launch no tasks.
pub struct FakeGenerative {
    pub text_reply: Outcome,
    pub json_reply: Outcome,
    pub calls: AtomicU32,
}

impl FakeGenerative {
    pub fn new(text_reply: Outcome, json_reply: Outcome) -> Arc<Self> {
        Arc::new(Self {
            text_reply,
            json_reply,
            calls: AtomicU32::new(0),
        })
    }
}

#[async_trait::async_trait]
impl GenerativeBackend for FakeGenerative {
    async fn generate(&self, request: GenerateRequest) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if request.expect_json {
            self.json_reply.resolve()
        } else {
            self.text_reply.resolve()
        }
    }
}

/// Fake video search returning fixed candidates or an error.
pub struct FakeSearch {
    pub videos: Result<Vec<VideoCandidate>, String>,
}

impl FakeSearch {
    pub fn with_videos(videos: Vec<VideoCandidate>) -> Arc<Self> {
        Arc::new(Self { videos: Ok(videos) })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            videos: Err(message.to_string()),
        })
    }
}

#[async_trait::async_trait]
impl VideoSearch for FakeSearch {
    async fn search(&self, _query: &str) -> Result<Vec<VideoCandidate>, BackendError> {
        match &self.videos {
            Ok(videos) => Ok(videos.clone()),
            Err(msg) => Err(BackendError::Api(500, msg.clone())),
        }
    }
}

/// Fake image store.
pub struct FakeStore {
    pub fail: bool,
    pub calls: AtomicU32,
}

impl FakeStore {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            calls: AtomicU32::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            calls: AtomicU32::new(0),
        })
    }
}

#[async_trait::async_trait]
impl ImageStore for FakeStore {
    async fn upload(&self, _image: &ImagePayload) -> Result<UploadReceipt, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(BackendError::Api(500, "upload failed".to_string()))
        } else {
            Ok(UploadReceipt {
                secure_url: "https://store.example/plateful/img.jpg".to_string(),
                public_id: "plateful/img".to_string(),
            })
        }
    }
}

pub fn video(title: &str, id: &str) -> VideoCandidate {
    VideoCandidate {
        title: title.to_string(),
        thumbnail: format!("https://i.ytimg.com/vi/{id}/hq.jpg"),
        video_url: format!("https://www.youtube.com/watch?v={id}"),
    }
}

pub fn retry_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        delay_secs: 2,
    }
}

/// JPEG magic plus filler, enough to pass content sniffing.
pub fn jpeg_bytes() -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
    bytes.extend_from_slice(b"JFIF\0");
    bytes.extend_from_slice(&[0u8; 32]);
    bytes
}

pub fn image() -> ImagePayload {
    ImagePayload::new(jpeg_bytes())
}

/// Assemble application state from fakes, mirroring the wiring in main.
pub fn app_state(
    annotator: Arc<FakeAnnotator>,
    generative: Arc<FakeGenerative>,
    search: Arc<FakeSearch>,
    store: Arc<FakeStore>,
) -> AppState {
    let classifier = Arc::new(Classifier::new(annotator, 0.50));
    let aggregator = Arc::new(Aggregator::new(
        generative.clone(),
        search,
        store,
        retry_policy(),
    ));
    let recipes = RecipeGenerator::new(generative);
    AppState::new(classifier, aggregator, recipes)
}
