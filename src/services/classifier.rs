//! Image category classification
//!
//! Maps label annotations from the vision backend to one of the three
//! request categories. The rule itself is a pure function of the label set
//! so it can be tested without a backend.

use std::sync::Arc;

use crate::types::{BackendError, Category, ImagePayload, Label, LabelAnnotator};

/// Minimum label confidence considered by the classifier.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.50;

/// Labels that indicate a prepared dish.
const COOKED_FOOD_TERMS: &[&str] = &[
    "Food",
    "Recipe",
    "Cuisine",
    "Dish",
    "Jollof rice",
    "Fried rice",
    "Rice",
];

/// Labels that indicate raw ingredients.
const INGREDIENT_TERMS: &[&str] = &["Ingredient", "Vegetable", "Spice"];

/// Classify a label set.
///
/// Cooked-food terms take priority over ingredient terms across the whole
/// set: a qualifying cooked-food label anywhere wins, regardless of where
/// ingredient labels appear. No qualifying label means `Invalid`.
pub fn classify_labels(labels: &[Label], threshold: f32) -> Category {
    let qualifying = |label: &&Label| label.score >= threshold;

    if labels
        .iter()
        .filter(qualifying)
        .any(|label| COOKED_FOOD_TERMS.contains(&label.name.as_str()))
    {
        return Category::CookedFood;
    }

    if labels
        .iter()
        .filter(qualifying)
        .any(|label| INGREDIENT_TERMS.contains(&label.name.as_str()))
    {
        return Category::Ingredient;
    }

    Category::Invalid
}

/// Classifier service: one annotation call, then the pure threshold rule.
pub struct Classifier {
    annotator: Arc<dyn LabelAnnotator>,
    threshold: f32,
}

impl Classifier {
    pub fn new(annotator: Arc<dyn LabelAnnotator>, threshold: f32) -> Self {
        Self {
            annotator,
            threshold,
        }
    }

    /// Classify an uploaded image.
    ///
    /// Backend failure propagates as-is; there is no retry at this layer.
    pub async fn classify(&self, image: &ImagePayload) -> Result<Category, BackendError> {
        let labels = self.annotator.annotate(image).await?;
        let category = classify_labels(&labels, self.threshold);

        tracing::info!(
            labels = labels.len(),
            category = %category,
            "Image classified"
        );

        Ok(category)
    }
}
