//! Services for plateful: classifier, backend clients, enrichment tasks and
//! the fan-out aggregator.

pub mod aggregator;
pub mod classifier;
pub mod cloudinary_client;
pub mod gemini_client;
pub mod ingredients;
pub mod recipes;
pub mod video;
pub mod vision_client;
pub mod youtube_client;

pub use aggregator::{Aggregator, INVALID_IMAGE_MESSAGE};
pub use classifier::{classify_labels, Classifier, DEFAULT_CONFIDENCE_THRESHOLD};
pub use cloudinary_client::CloudinaryClient;
pub use gemini_client::GeminiClient;
pub use ingredients::IngredientDetector;
pub use recipes::RecipeGenerator;
pub use video::{VideoError, VideoRecommender};
pub use vision_client::VisionClient;
pub use youtube_client::YouTubeClient;
