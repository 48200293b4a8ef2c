//! Source client abstraction and the built-in HTTP client.
//!
//! The failover core never parses provider wire formats itself. Each provider
//! is a [`SourceClient`]; adding a provider means adding an implementation and
//! a configuration entry, not editing a dispatch function.

mod http;
mod traits;

pub use http::HttpJsonSource;
pub use traits::SourceClient;
