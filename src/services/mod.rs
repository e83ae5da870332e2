//! Services module
//!
//! Provider integrations and the dispatcher that routes chat requests
//! between them.

pub mod dispatcher;
pub mod provider;
pub mod upstream;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatcher::{DispatchError, Dispatcher};
pub use provider::{AuthScheme, Provider, ProviderProfile};
pub use upstream::{UpstreamClient, UpstreamConfig};
