//! Enrichment aggregator (fan-out/fan-in)
//!
//! Launches the enrichment tasks applicable to a classified image
//! concurrently, collects each outcome into one shared response under a
//! single mutex, and joins every task before the response is read. A task's
//! failure records its own field and never cancels siblings; partial success
//! is a valid terminal state.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::RetryPolicy;
use crate::services::ingredients::IngredientDetector;
use crate::services::recipes::RecipeGenerator;
use crate::services::video::VideoRecommender;
use crate::types::{
    AggregateResponse, BackendError, Category, EnrichedData, GenerativeBackend, ImagePayload,
    ImageStore, VideoSearch,
};

/// Message returned for images that match neither category.
pub const INVALID_IMAGE_MESSAGE: &str =
    "invalid item detected...please upload appropriate image";

/// Fan-out/fan-in coordinator over the enrichment tasks.
///
/// Backend handles are injected at construction and shared read-only across
/// requests; everything per-request lives inside `aggregate`.
pub struct Aggregator {
    ingredients: IngredientDetector,
    recipes: RecipeGenerator,
    videos: VideoRecommender,
    store: Arc<dyn ImageStore>,
}

impl Aggregator {
    pub fn new(
        generative: Arc<dyn GenerativeBackend>,
        search: Arc<dyn VideoSearch>,
        store: Arc<dyn ImageStore>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            ingredients: IngredientDetector::new(generative.clone()),
            recipes: RecipeGenerator::new(generative.clone()),
            videos: VideoRecommender::new(generative, search.clone(), retry),
            store,
        }
    }

    /// Run every enrichment task for `category` concurrently and assemble
    /// the response envelope.
    ///
    /// The task set is fixed at fan-out time; each task writes a disjoint
    /// field of the shared response under the mutex. The method returns only
    /// after every launched task has reported. Cancelling `cancel` stops
    /// in-flight tasks; each records a cancellation error for its field.
    pub async fn aggregate(
        &self,
        category: Category,
        image: ImagePayload,
        cancel: CancellationToken,
    ) -> AggregateResponse {
        match category {
            Category::Invalid | Category::Unknown => {
                // No tasks for unusable images.
                return AggregateResponse {
                    status: false,
                    category: Some(category),
                    error: Some(INVALID_IMAGE_MESSAGE.to_string()),
                    ..Default::default()
                };
            }
            Category::Ingredient | Category::CookedFood => {}
        }

        let response = Arc::new(Mutex::new(AggregateResponse {
            status: true,
            category: Some(category),
            ..Default::default()
        }));

        let mut tasks = JoinSet::new();

        match category {
            Category::Ingredient => {
                self.spawn_ingredient_task(&mut tasks, &response, &image, &cancel);
            }
            Category::CookedFood => {
                self.spawn_recipe_task(&mut tasks, &response, &image, &cancel);
                self.spawn_video_task(&mut tasks, &response, &image, &cancel);
                self.spawn_upload_task(&mut tasks, &response, &image, &cancel);
            }
            Category::Invalid | Category::Unknown => unreachable!(),
        }

        // Join barrier: the response is not read until every task reported.
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Enrichment task panicked or was aborted");
            }
        }

        let assembled = response.lock().await.clone();

        tracing::info!(
            category = %category,
            status = assembled.status,
            "Enrichment aggregation complete"
        );

        assembled
    }

    /// Primary task for ingredient images: detect the food item list.
    fn spawn_ingredient_task(
        &self,
        tasks: &mut JoinSet<()>,
        response: &Arc<Mutex<AggregateResponse>>,
        image: &ImagePayload,
        cancel: &CancellationToken,
    ) {
        let detector = self.ingredients.clone();
        let response = response.clone();
        let image = image.clone();
        let cancel = cancel.clone();

        tasks.spawn(async move {
            // Biased so an already-cancelled token wins over a ready body.
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(BackendError::Cancelled),
                result = detector.detect(&image) => result,
            };

            let mut response = response.lock().await;
            match outcome {
                Ok(foods) => {
                    tracing::debug!(task = "ingredients", "Enrichment task succeeded");
                    response.data = Some(EnrichedData::Ingredients(foods));
                }
                Err(e) => {
                    tracing::warn!(task = "ingredients", error = %e, "Enrichment task failed");
                    response.status = false;
                    response.error = Some(e.to_string());
                }
            }
        });
    }

    /// Primary task for cooked-food images: identify the dish and generate
    /// a recipe. Its failure flips the top-level status.
    fn spawn_recipe_task(
        &self,
        tasks: &mut JoinSet<()>,
        response: &Arc<Mutex<AggregateResponse>>,
        image: &ImagePayload,
        cancel: &CancellationToken,
    ) {
        let recipes = self.recipes.clone();
        let response = response.clone();
        let image = image.clone();
        let cancel = cancel.clone();

        tasks.spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(BackendError::Cancelled),
                result = recipes.detect_food(&image) => result,
            };

            let mut response = response.lock().await;
            match outcome {
                Ok(recipe) => {
                    tracing::debug!(task = "recipe", "Enrichment task succeeded");
                    response.data = Some(EnrichedData::Recipe(recipe));
                }
                Err(e) => {
                    tracing::warn!(task = "recipe", error = %e, "Enrichment task failed");
                    response.status = false;
                    response.error = Some(e.to_string());
                }
            }
        });
    }

    /// Auxiliary task: tutorial video recommendation. Failure is reported
    /// under `yt_error` and does not flip the top-level status.
    fn spawn_video_task(
        &self,
        tasks: &mut JoinSet<()>,
        response: &Arc<Mutex<AggregateResponse>>,
        image: &ImagePayload,
        cancel: &CancellationToken,
    ) {
        let videos = self.videos.clone();
        let response = response.clone();
        let image = image.clone();
        let cancel = cancel.clone();

        tasks.spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(crate::services::video::VideoError::Prompt(
                    BackendError::Cancelled,
                )),
                result = videos.recommend(&image) => result,
            };

            let mut response = response.lock().await;
            match outcome {
                Ok(candidates) => {
                    tracing::debug!(
                        task = "video",
                        results = candidates.len(),
                        "Enrichment task succeeded"
                    );
                    response.yt = Some(candidates);
                }
                Err(e) => {
                    tracing::warn!(task = "video", error = %e, "Enrichment task failed");
                    response.yt_error = Some(e.to_string());
                }
            }
        });
    }

    /// Auxiliary task: archival upload. Success carries no payload; failure
    /// is reported under `upload_error` only.
    fn spawn_upload_task(
        &self,
        tasks: &mut JoinSet<()>,
        response: &Arc<Mutex<AggregateResponse>>,
        image: &ImagePayload,
        cancel: &CancellationToken,
    ) {
        let store = self.store.clone();
        let response = response.clone();
        let image = image.clone();
        let cancel = cancel.clone();

        tasks.spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(BackendError::Cancelled),
                result = store.upload(&image) => result,
            };

            let mut response = response.lock().await;
            match outcome {
                Ok(receipt) => {
                    tracing::debug!(
                        task = "upload",
                        public_id = %receipt.public_id,
                        "Enrichment task succeeded"
                    );
                }
                Err(e) => {
                    tracing::warn!(task = "upload", error = %e, "Enrichment task failed");
                    response.upload_error = Some(e.to_string());
                }
            }
        });
    }
}
