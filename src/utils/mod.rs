//! Utility modules for plateful

pub mod dedup;
pub mod retry;

pub use dedup::dedup_by_key;
pub use retry::with_retry;
