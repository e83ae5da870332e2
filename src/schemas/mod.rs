//! Schema module
//!
//! Inbound endpoint types and the upstream provider wire formats.

pub mod anthropic;
pub mod chat;
pub mod openai;

pub use chat::{ChatPayload, ChatRequest, ChatResponse, ErrorResponse, StatusResponse};
