//! Tutorial video recommendation task
//!
//! Two-phase: (a) derive a search prompt from the image via the generative
//! backend, expecting `{"food_name": ..., "youtube_search_prompt": ...}`,
//! with timeout retries; (b) search the video backend with that prompt,
//! un-retried. Results are deduplicated by watch URL.

use std::sync::Arc;
use thiserror::Error;

use crate::config::RetryPolicy;
use crate::services::ingredients::extract_json_object;
use crate::types::{
    BackendError, GenerateRequest, GenerativeBackend, ImagePayload, VideoCandidate, VideoPrompt,
    VideoSearch,
};
use crate::utils::dedup::dedup_by_key;
use crate::utils::retry::with_retry;

const VIDEO_PROMPT: &str = "Identify the food in this image and derive a short YouTube search \
query for a tutorial on preparing it. Return the result as a valid JSON object formatted as \
{\"food_name\": \"...\", \"youtube_search_prompt\": \"...\"} without any additional text.";

/// Video recommendation errors, split by phase so the response envelope can
/// name which part failed.
#[derive(Debug, Error)]
pub enum VideoError {
    #[error("failed to retrieve video prompt: {0}")]
    Prompt(BackendError),

    #[error("video search failed: {0}")]
    Search(BackendError),
}

/// Recommends tutorial videos for a cooked-food image.
#[derive(Clone)]
pub struct VideoRecommender {
    backend: Arc<dyn GenerativeBackend>,
    search: Arc<dyn VideoSearch>,
    retry: RetryPolicy,
}

impl VideoRecommender {
    pub fn new(
        backend: Arc<dyn GenerativeBackend>,
        search: Arc<dyn VideoSearch>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            backend,
            search,
            retry,
        }
    }

    /// Recommend tutorial videos for the dish in the image.
    pub async fn recommend(&self, image: &ImagePayload) -> Result<Vec<VideoCandidate>, VideoError> {
        let prompt = self.derive_prompt(image).await.map_err(VideoError::Prompt)?;

        tracing::info!(
            food = %prompt.food_name,
            query = %prompt.youtube_search_prompt,
            "Derived video search prompt"
        );

        let videos = self
            .search
            .search(&prompt.youtube_search_prompt)
            .await
            .map_err(VideoError::Search)?;

        Ok(dedup_by_key(videos, |v| v.video_url.clone()))
    }

    /// Phase (a): derive the search prompt, retrying timeouts.
    async fn derive_prompt(&self, image: &ImagePayload) -> Result<VideoPrompt, BackendError> {
        let raw = with_retry(
            "video prompt",
            self.retry,
            BackendError::is_timeout,
            || {
                let request =
                    GenerateRequest::with_image(VIDEO_PROMPT, image.clone()).expecting_json();
                self.backend.generate(request)
            },
        )
        .await?;

        let object = extract_json_object(&raw).ok_or_else(|| {
            BackendError::Malformed(format!(
                "video prompt response contains no JSON object: {}",
                raw.trim()
            ))
        })?;

        let prompt: VideoPrompt = serde_json::from_str(object)
            .map_err(|e| BackendError::Malformed(format!("failed to parse video prompt: {e}")))?;

        if prompt.food_name.trim().is_empty() || prompt.youtube_search_prompt.trim().is_empty() {
            return Err(BackendError::Empty(
                "video prompt has empty required fields".to_string(),
            ));
        }

        Ok(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct ScriptedBackend {
        calls: AtomicU32,
        timeouts_before_success: u32,
        reply: String,
    }

    #[async_trait::async_trait]
    impl GenerativeBackend for ScriptedBackend {
        async fn generate(&self, _request: GenerateRequest) -> Result<String, BackendError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.timeouts_before_success {
                Err(BackendError::Timeout("deadline exceeded".to_string()))
            } else {
                Ok(self.reply.clone())
            }
        }
    }

    struct FixedSearch(Vec<VideoCandidate>);

    #[async_trait::async_trait]
    impl VideoSearch for FixedSearch {
        async fn search(&self, _query: &str) -> Result<Vec<VideoCandidate>, BackendError> {
            Ok(self.0.clone())
        }
    }

    fn video(title: &str, url: &str) -> VideoCandidate {
        VideoCandidate {
            title: title.to_string(),
            thumbnail: format!("{url}/thumb.jpg"),
            video_url: url.to_string(),
        }
    }

    fn prompt_json() -> String {
        r#"{"food_name": "jollof rice", "youtube_search_prompt": "jollof rice recipe"}"#
            .to_string()
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            delay_secs: 2,
        }
    }

    #[tokio::test]
    async fn recommends_and_dedups_by_watch_url() {
        let backend = Arc::new(ScriptedBackend {
            calls: AtomicU32::new(0),
            timeouts_before_success: 0,
            reply: prompt_json(),
        });
        let search = Arc::new(FixedSearch(vec![
            video("Jollof 1", "https://www.youtube.com/watch?v=a"),
            video("Jollof 2", "https://www.youtube.com/watch?v=b"),
            video("Jollof 1 repost", "https://www.youtube.com/watch?v=a"),
        ]));

        let recommender = VideoRecommender::new(backend, search, policy());
        let videos = recommender
            .recommend(&ImagePayload::new(vec![1]))
            .await
            .unwrap();

        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].title, "Jollof 1");
        assert_eq!(videos[1].title, "Jollof 2");
    }

    #[tokio::test(start_paused = true)]
    async fn prompt_phase_retries_timeouts() {
        let backend = Arc::new(ScriptedBackend {
            calls: AtomicU32::new(0),
            timeouts_before_success: 2,
            reply: prompt_json(),
        });
        let search = Arc::new(FixedSearch(vec![video(
            "Jollof",
            "https://www.youtube.com/watch?v=a",
        )]));

        let recommender = VideoRecommender::new(backend.clone(), search, policy());
        let videos = recommender
            .recommend(&ImagePayload::new(vec![1]))
            .await
            .unwrap();

        assert_eq!(videos.len(), 1);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_timeout_prompt_failure_is_not_retried() {
        struct FailingBackend(AtomicU32);

        #[async_trait::async_trait]
        impl GenerativeBackend for FailingBackend {
            async fn generate(&self, _request: GenerateRequest) -> Result<String, BackendError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Err(BackendError::Api(400, "bad request".to_string()))
            }
        }

        let backend = Arc::new(FailingBackend(AtomicU32::new(0)));
        let search = Arc::new(FixedSearch(vec![]));
        let recommender = VideoRecommender::new(backend.clone(), search, policy());

        let result = recommender.recommend(&ImagePayload::new(vec![1])).await;
        match result {
            Err(VideoError::Prompt(BackendError::Api(400, _))) => {}
            other => panic!("expected prompt-phase API error, got {other:?}"),
        }
        assert_eq!(backend.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_prompt_fields_are_rejected() {
        let backend = Arc::new(ScriptedBackend {
            calls: AtomicU32::new(0),
            timeouts_before_success: 0,
            reply: r#"{"food_name": "", "youtube_search_prompt": "x"}"#.to_string(),
        });
        let search = Arc::new(FixedSearch(vec![]));
        let recommender = VideoRecommender::new(backend, search, policy());

        let result = recommender.recommend(&ImagePayload::new(vec![1])).await;
        assert!(matches!(
            result,
            Err(VideoError::Prompt(BackendError::Empty(_)))
        ));
    }

    #[tokio::test]
    async fn prompt_error_message_names_the_phase() {
        let backend = Arc::new(ScriptedBackend {
            calls: AtomicU32::new(0),
            timeouts_before_success: 0,
            reply: "not json at all".to_string(),
        });
        let recommender = VideoRecommender::new(backend, Arc::new(FixedSearch(vec![])), policy());

        let err = recommender
            .recommend(&ImagePayload::new(vec![1]))
            .await
            .unwrap_err();
        assert!(err
            .to_string()
            .starts_with("failed to retrieve video prompt: "));
    }
}
