//! plateful - Food Image Enrichment Microservice
//!
//! Accepts an uploaded food image, classifies it (ingredient / cooked food /
//! invalid) and concurrently enriches the result with a detected ingredient
//! list, a generated recipe, a recommended tutorial video and an archival
//! upload.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use plateful::config::Config;
use plateful::services::{
    Aggregator, Classifier, CloudinaryClient, GeminiClient, RecipeGenerator, VisionClient,
    YouTubeClient,
};
use plateful::types::{GenerativeBackend, ImageStore, LabelAnnotator, VideoSearch};
use plateful::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting plateful (Food Image Enrichment) microservice");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Resolve configuration (ENV -> TOML -> defaults)
    let config = Config::load()?;

    // Long-lived backend clients, shared read-only across requests
    let annotator: Arc<dyn LabelAnnotator> =
        Arc::new(VisionClient::new(config.vision_api_key.clone())?);
    let generative: Arc<dyn GenerativeBackend> = Arc::new(GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
    )?);
    let search: Arc<dyn VideoSearch> =
        Arc::new(YouTubeClient::new(config.youtube_api_key.clone())?);
    let store: Arc<dyn ImageStore> = Arc::new(CloudinaryClient::new(&config.upload)?);

    let classifier = Arc::new(Classifier::new(annotator, config.classify_threshold));
    let aggregator = Arc::new(Aggregator::new(
        generative.clone(),
        search,
        store,
        config.retry,
    ));
    let recipes = RecipeGenerator::new(generative);

    let state = AppState::new(classifier, aggregator, recipes);
    let app = plateful::build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on http://{}", config.bind_addr);
    info!("Health check: http://{}/health", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
