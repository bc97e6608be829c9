//! Ingredient detection task
//!
//! Asks the generative backend to enumerate the food items in an image as a
//! strict `{"foods": [...]}` object, then parses leniently: backends
//! sometimes wrap the JSON in prose or code fences, so the first balanced
//! object substring is extracted before parsing. A response with no
//! parsable object still fails loudly.

use serde::Deserialize;
use std::sync::Arc;

use crate::types::{BackendError, GenerateRequest, GenerativeBackend, ImagePayload};
use crate::utils::dedup::{dedup_by_key, ingredient_key};

const INGREDIENT_PROMPT: &str = "Identify and list all food items in this image with accurate \
labels in JSON format. Please return the result as a valid JSON object formatted as \
{\"foods\": [\"item1\", \"item2\", ...]} without any additional text, comments, or \
formatting issues.";

#[derive(Deserialize)]
struct FoodList {
    foods: Vec<String>,
}

/// Detects the ingredient list in an uploaded image.
#[derive(Clone)]
pub struct IngredientDetector {
    backend: Arc<dyn GenerativeBackend>,
}

impl IngredientDetector {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self { backend }
    }

    /// Detect and deduplicate the food items in an image.
    pub async fn detect(&self, image: &ImagePayload) -> Result<Vec<String>, BackendError> {
        let request =
            GenerateRequest::with_image(INGREDIENT_PROMPT, image.clone()).expecting_json();
        let raw = self.backend.generate(request).await?;

        let object = extract_json_object(&raw).ok_or_else(|| {
            BackendError::Malformed(format!(
                "ingredient response contains no JSON object: {}",
                raw.trim()
            ))
        })?;

        let parsed: FoodList = serde_json::from_str(object)
            .map_err(|e| BackendError::Malformed(format!("failed to parse food list: {e}")))?;

        let foods = dedup_by_key(parsed.foods, |name| ingredient_key(name));

        tracing::info!(foods = foods.len(), "Ingredient detection complete");

        Ok(foods)
    }
}

/// Extract the outermost `{...}` substring from possibly prose-wrapped text.
pub(crate) fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}
