//! Failover scheduling module.
//!
//! - Candidate ranking: pinned sources first, then by live statistics
//! - The sequential attempt loop with per-source timeouts and cancellation
//! - Quote validation, so a nonsensical answer counts as a source failure

mod failover_scheduler;
mod ranking;
mod validator;

pub use failover_scheduler::FailoverScheduler;
pub use ranking::Candidate;
pub use validator::{QuoteValidator, ValidationIssue, ValidationSeverity, ValidatorConfig};
