//! Food detection API handler
//!
//! POST /api/food: multipart image upload, classified and then enriched by
//! the concurrent pipeline. The whole envelope is returned with 200 even
//! when enrichment partially failed; only input errors are 4xx.

use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::types::{AggregateResponse, ImagePayload};
use crate::AppState;

/// Multipart field name carrying the image.
const IMAGE_FIELD: &str = "image";

/// POST /api/food
pub async fn detect_food(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<AggregateResponse>> {
    let image = read_image_field(&mut multipart).await?;
    let request_id = Uuid::new_v4();

    tracing::info!(
        request_id = %request_id,
        image_bytes = image.len(),
        "Food detection request received"
    );

    let category = state
        .classifier
        .classify(&image)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    // Dropping the request (client gone, outer timeout) cancels in-flight
    // enrichment tasks instead of abandoning them.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let response = state.aggregator.aggregate(category, image, cancel).await;

    tracing::info!(
        request_id = %request_id,
        category = %category,
        status = response.status,
        "Food detection request complete"
    );

    Ok(Json(response))
}

/// Pull the image bytes out of the multipart body and validate them.
async fn read_image_field(multipart: &mut Multipart) -> Result<ImagePayload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read multipart form: {e}")))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read uploaded image: {e}")))?;

        if bytes.is_empty() {
            return Err(ApiError::BadRequest("uploaded image is empty".to_string()));
        }

        let is_image = infer::get(&bytes)
            .map(|kind| kind.matcher_type() == infer::MatcherType::Image)
            .unwrap_or(false);
        if !is_image {
            return Err(ApiError::BadRequest(
                "uploaded file is not a decodable image".to_string(),
            ));
        }

        return Ok(ImagePayload::new(bytes.to_vec()));
    }

    Err(ApiError::BadRequest("no image uploaded".to_string()))
}

/// Build food detection routes
pub fn food_routes() -> Router<AppState> {
    Router::new().route("/api/food", post(detect_food))
}
