//! Source health module.
//!
//! - Performance windows with ring-buffer eviction
//! - The health tracker, sole writer of those windows and the disable policy
//! - The health monitor, which probes disabled sources and re-enables them

mod monitor;
mod tracker;
mod window;

pub use monitor::{HealthMonitor, ProbeOutcome, ProbeReport};
pub use tracker::{DisableReason, SourceHealthTracker};
pub use window::PerformanceWindow;
