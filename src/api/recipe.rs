//! Recipe API handler
//!
//! POST /api/recipe: JSON ingredient list (optionally a target dish),
//! answered with generated recipe text in the service envelope.

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// POST /api/recipe request
#[derive(Debug, Deserialize)]
pub struct RecipeRequest {
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub dish: Option<String>,
}

/// POST /api/recipe response
#[derive(Debug, Serialize)]
pub struct RecipeResponse {
    pub status: bool,
    pub data: String,
}

/// POST /api/recipe
pub async fn generate_recipe(
    State(state): State<AppState>,
    Json(request): Json<RecipeRequest>,
) -> ApiResult<Json<RecipeResponse>> {
    if request.ingredients.iter().all(|i| i.trim().is_empty()) {
        return Err(ApiError::BadRequest("no ingredients provided".to_string()));
    }

    let recipe = state
        .recipes
        .generate_recipe(&request.ingredients, request.dish.as_deref())
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    tracing::info!(
        ingredients = request.ingredients.len(),
        dish = request.dish.as_deref().unwrap_or(""),
        "Recipe generated"
    );

    Ok(Json(RecipeResponse {
        status: true,
        data: recipe,
    }))
}

/// Build recipe routes
pub fn recipe_routes() -> Router<AppState> {
    Router::new().route("/api/recipe", post(generate_recipe))
}
