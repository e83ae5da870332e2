//! Error types surfaced at the HTTP boundary

pub mod types;

pub use types::ApiError;
