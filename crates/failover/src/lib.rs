//! QuoteWatch Failover Crate
//!
//! Reliable acquisition of live quotes from several independent, unreliable
//! upstream sources.
//!
//! # Overview
//!
//! For every request the crate ranks the enabled sources (pinned first, then
//! by live success rate and response time), tries them one at a time with a
//! per-source timeout, and returns the first valid quote. Sources that turn
//! slow or keep failing are disabled and cost live traffic nothing until a
//! background monitor sees them answer a canary request again.
//!
//! A fetch yields genuine data or a typed [`FetchError`]. Nothing in this
//! crate substitutes an estimated price for a missing one.
//!
//! # Architecture
//!
//! ```text
//!     fetch_quote(symbol)
//!            |
//!            v
//! +---------------------+   ranked    +------------------+
//! |  FailoverScheduler  | <---------- |  SourceRegistry  |  (enabled flags)
//! +---------------------+             +------------------+
//!     |            |                          ^
//!     | attempt    | record_outcome           | disable / re-enable
//!     v            v                          |
//! +----------+  +-----------------------+     |
//! | Source   |  |  SourceHealthTracker  | ----+
//! | Client   |  +-----------------------+     |
//! +----------+            ^                   |
//!                         |  canary outcome   |
//!                 +------------------+        |
//!                 |  HealthMonitor   | -------+
//!                 +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`FailoverManager`] - Facade wiring all components from one config
//! - [`FailoverScheduler`] - Candidate ranking and the attempt loop
//! - [`SourceHealthTracker`] - Per-source windows and the disable policy
//! - [`HealthMonitor`] - Periodic recovery probes
//! - [`SourceClient`] - One upstream provider
//! - [`Quote`] - An immutable quote value

pub mod config;
pub mod errors;
pub mod health;
pub mod manager;
pub mod models;
pub mod registry;
pub mod scheduler;
pub mod source;

pub use config::{FailoverConfig, HealthPolicy, HttpEndpoint, SourceConfig};
pub use errors::{ConfigError, FetchError, SourceError, SourceErrorKind};
pub use health::{
    DisableReason, HealthMonitor, PerformanceWindow, ProbeOutcome, ProbeReport,
    SourceHealthTracker,
};
pub use manager::FailoverManager;
pub use models::{
    AttemptLog, FetchResult, HealthSnapshot, Quote, SourceAttempt, SourceStatus,
};
pub use registry::{Source, SourceRegistry};
pub use scheduler::{FailoverScheduler, QuoteValidator, ValidatorConfig};
pub use source::{HttpJsonSource, SourceClient};

// Re-exported so callers can cancel fetches and stop the monitor without
// depending on tokio-util directly.
pub use tokio_util::sync::CancellationToken;
