//! plateful library interface
//!
//! Exposes the application state, router and all service modules so
//! integration tests can assemble the service with fake backends.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod types;
pub mod utils;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::services::{Aggregator, Classifier, RecipeGenerator};

/// Application state shared across handlers
///
/// Holds long-lived, read-only service handles; everything request-scoped is
/// created inside the handlers.
#[derive(Clone)]
pub struct AppState {
    /// Image category classifier
    pub classifier: Arc<Classifier>,
    /// Fan-out enrichment coordinator
    pub aggregator: Arc<Aggregator>,
    /// Recipe generation for the ingredient-list endpoint
    pub recipes: RecipeGenerator,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        classifier: Arc<Classifier>,
        aggregator: Arc<Aggregator>,
        recipes: RecipeGenerator,
    ) -> Self {
        Self {
            classifier,
            aggregator,
            recipes,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::food_routes())
        .merge(api::recipe_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
