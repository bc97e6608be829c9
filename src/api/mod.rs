//! HTTP API handlers for plateful

pub mod food;
pub mod health;
pub mod recipe;

pub use food::food_routes;
pub use health::health_routes;
pub use recipe::recipe_routes;
