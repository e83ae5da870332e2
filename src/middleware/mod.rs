//! Middleware module
//!
//! Contains HTTP middleware shared by all routes.

pub mod cors;
pub mod logging;

pub use cors::{apply_cors, CorsOrigins};
pub use logging::{log_request, TraceId, REQUEST_ID_HEADER, TRACE_ID_HEADER};
