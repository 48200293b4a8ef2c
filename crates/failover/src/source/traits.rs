//! Source client trait definition.

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::SourceError;
use crate::models::Quote;

/// One upstream quote provider.
///
/// Implement this trait to add a new provider; the registry pairs each
/// configured source with the client of the same name.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use quotewatch_failover::{Quote, SourceClient, SourceError};
///
/// struct MyProvider {
///     api_key: String,
/// }
///
/// #[async_trait]
/// impl SourceClient for MyProvider {
///     fn name(&self) -> &str {
///         "MY_PROVIDER"
///     }
///
///     async fn fetch(&self, symbol: &str, timeout: Duration) -> Result<Quote, SourceError> {
///         // ... one request, no retries
///     }
/// }
/// ```
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// Name of the source this client serves. Must match a configured source.
    fn name(&self) -> &str;

    /// Fetch the latest quote for `symbol`.
    ///
    /// Implementations make a single attempt and must not retry; failover
    /// and retries belong to the scheduler. `timeout` is the source's
    /// configured budget and may be passed down to the transport. The
    /// scheduler enforces it independently.
    async fn fetch(&self, symbol: &str, timeout: Duration) -> Result<Quote, SourceError>;
}
