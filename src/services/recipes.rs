//! Recipe generation tasks
//!
//! Two entry points against the generative backend: `detect_food` turns a
//! cooked-food image into a recipe, `generate_recipe` turns a caller-supplied
//! ingredient list (optionally with a target dish) into one.

use std::sync::Arc;

use crate::types::{BackendError, GenerateRequest, GenerativeBackend, ImagePayload};

const DETECT_FOOD_PROMPT: &str = "Accurately identify the food in the image and provide an \
appropriate recipe consistent with your analysis.";

const RECIPE_GUIDELINES: &str = "You are a helpful AI assistant devoted to providing accurate \
and delightful recipes. These are the guidelines to follow when delivering a recipe response: \
1. List out the ingredients first, including quantities. Provide detailed cooking times, \
temperatures and any special kitchen equipment needed. 2. Provide step-by-step instructions \
for prepping, mixing, cooking, plating and any other necessary steps, detailed enough to \
follow. Include safety tips and special techniques as applicable.";

/// Generates recipes via the generative backend.
#[derive(Clone)]
pub struct RecipeGenerator {
    backend: Arc<dyn GenerativeBackend>,
}

impl RecipeGenerator {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self { backend }
    }

    /// Identify the cooked dish in an image and return a matching recipe.
    pub async fn detect_food(&self, image: &ImagePayload) -> Result<String, BackendError> {
        let request = GenerateRequest::with_image(DETECT_FOOD_PROMPT, image.clone());
        let recipe = self.backend.generate(request).await?;

        tracing::info!(chars = recipe.len(), "Food detection complete");

        Ok(recipe)
    }

    /// Generate a recipe from an ingredient list; `dish` narrows the request
    /// to a specific target dish when present.
    pub async fn generate_recipe(
        &self,
        ingredients: &[String],
        dish: Option<&str>,
    ) -> Result<String, BackendError> {
        let listed = ingredients.join(", ");
        let prompt = match dish {
            Some(dish) if !dish.trim().is_empty() => format!(
                "{RECIPE_GUIDELINES} Here are the ingredients I have: {listed}. Can you give \
                 me a specific recipe that includes only these ingredients, and detailed \
                 preparation steps for {dish}?"
            ),
            _ => format!(
                "{RECIPE_GUIDELINES} Here are the ingredients I have: {listed}. Can you give \
                 me a specific recipe that includes only these ingredients, and detailed \
                 preparation steps?"
            ),
        };

        self.backend.generate(GenerateRequest::text(prompt)).await
    }
}
