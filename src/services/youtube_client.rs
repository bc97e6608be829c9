//! YouTube search client
//!
//! Text search against the video API, restricted to the How-to & Style
//! category, five relevance-ordered results. The watch URL is derived from
//! the returned video id.

use serde::Deserialize;
use std::time::Duration;

use crate::types::{BackendError, VideoCandidate, VideoSearch};

const YOUTUBE_SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";
const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
// "Howto & Style" category
const VIDEO_CATEGORY_ID: &str = "26";
const MAX_RESULTS: &str = "5";

/// YouTube Data API client
pub struct YouTubeClient {
    http_client: reqwest::Client,
    api_key: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    id: ItemId,
    snippet: Snippet,
}

#[derive(Deserialize)]
struct ItemId {
    #[serde(rename = "videoId", default)]
    video_id: String,
}

#[derive(Deserialize)]
struct Snippet {
    title: String,
    thumbnails: Thumbnails,
}

#[derive(Deserialize)]
struct Thumbnails {
    high: Thumbnail,
}

#[derive(Deserialize)]
struct Thumbnail {
    url: String,
}

impl YouTubeClient {
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
impl VideoSearch for YouTubeClient {
    async fn search(&self, query: &str) -> Result<Vec<VideoCandidate>, BackendError> {
        tracing::debug!(query = %query, "Querying YouTube API");

        let response = self
            .http_client
            .get(YOUTUBE_SEARCH_URL)
            .query(&[
                ("part", "snippet"),
                ("q", query),
                ("key", self.api_key.as_str()),
                ("type", "video"),
                ("videoCategoryId", VIDEO_CATEGORY_ID),
                ("maxResults", MAX_RESULTS),
                ("order", "relevance"),
            ])
            .send()
            .await
            .map_err(BackendError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(BackendError::Api(status.as_u16(), error_text));
        }

        let search: SearchResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))?;

        let videos: Vec<VideoCandidate> = search
            .items
            .into_iter()
            .map(|item| VideoCandidate {
                title: item.snippet.title,
                thumbnail: item.snippet.thumbnails.high.url,
                video_url: format!("{}{}", WATCH_URL_PREFIX, item.id.video_id),
            })
            .collect();

        tracing::info!(query = %query, results = videos.len(), "YouTube search complete");

        Ok(videos)
    }
}
