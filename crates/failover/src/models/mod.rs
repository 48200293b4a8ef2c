//! Failover data models
//!
//! - `quote` - The immutable `Quote` value produced by a successful fetch
//! - `attempt` - Per-source attempt records collected during one fetch
//! - `status` - Health snapshots and reporting rows

mod attempt;
mod quote;
mod status;

pub use attempt::{AttemptLog, SourceAttempt};
pub use quote::Quote;
pub use status::{HealthSnapshot, SourceStatus};

use crate::errors::FetchError;

/// Outcome of one quote fetch: genuine data or a typed failure.
pub type FetchResult = Result<Quote, FetchError>;
