//! Per-source health tracking.
//!
//! The tracker is the only writer of performance windows. Each source has its
//! own window behind its own mutex, so outcomes for different sources never
//! contend and outcomes for the same source apply one at a time.
//!
//! A source is disabled when any of these holds after an outcome is recorded:
//!
//! - its average response time exceeds `maxResponseTimeMs`
//! - its consecutive failures reach `maxConsecutiveFailures`
//! - its success rate is below `minSuccessRate` once it has at least
//!   `minSamplesForSuccessRate` samples
//!
//! The tracker never re-enables a source.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, info, warn};

use super::PerformanceWindow;
use crate::config::HealthPolicy;
use crate::models::HealthSnapshot;
use crate::registry::SourceRegistry;

/// Why the tracker disabled a source.
#[derive(Clone, Debug, PartialEq)]
pub enum DisableReason {
    SlowResponses { average: Duration, limit: Duration },
    ConsecutiveFailures { count: u32 },
    LowSuccessRate { rate: f64, samples: usize },
}

impl fmt::Display for DisableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SlowResponses { average, limit } => write!(
                f,
                "average response time {}ms exceeds {}ms",
                average.as_millis(),
                limit.as_millis()
            ),
            Self::ConsecutiveFailures { count } => write!(f, "{} consecutive failures", count),
            Self::LowSuccessRate { rate, samples } => write!(
                f,
                "success rate {:.1}% over {} samples",
                rate * 100.0,
                samples
            ),
        }
    }
}

/// Owner of all per-source performance statistics.
pub struct SourceHealthTracker {
    registry: Arc<SourceRegistry>,
    policy: HealthPolicy,
    windows: HashMap<String, Mutex<PerformanceWindow>>,
}

impl SourceHealthTracker {
    /// Create a tracker with one empty window per registered source.
    pub fn new(registry: Arc<SourceRegistry>, policy: HealthPolicy) -> Self {
        let windows = registry
            .list_sources()
            .iter()
            .map(|s| {
                (
                    s.name().to_string(),
                    Mutex::new(PerformanceWindow::new(policy.window_size)),
                )
            })
            .collect();

        Self {
            registry,
            policy,
            windows,
        }
    }

    /// Thresholds this tracker disables sources by.
    pub fn policy(&self) -> &HealthPolicy {
        &self.policy
    }

    /// Lock one source's window, recovering from poison if necessary.
    ///
    /// A poisoned window holds at most one half-applied sample.
    fn lock_window<'a>(
        &'a self,
        source: &str,
    ) -> Option<MutexGuard<'a, PerformanceWindow>> {
        let window = self.windows.get(source)?;
        Some(window.lock().unwrap_or_else(|poisoned| {
            warn!("Health window for '{}' was poisoned, recovering", source);
            poisoned.into_inner()
        }))
    }

    /// Record the outcome of one attempt against a source.
    ///
    /// Returns the reason if this outcome caused the source to be disabled.
    /// Outcomes for unknown sources are ignored.
    pub fn record_outcome(
        &self,
        source: &str,
        latency: Duration,
        success: bool,
    ) -> Option<DisableReason> {
        let snapshot = {
            let Some(mut window) = self.lock_window(source) else {
                warn!("Health tracker: outcome for unknown source '{}' ignored", source);
                return None;
            };
            window.push(latency, success);
            window.snapshot()
        };

        debug!(
            "Health tracker: '{}' {} in {}ms (rate {:.2}, {} samples, {} consecutive failures)",
            source,
            if success { "succeeded" } else { "failed" },
            latency.as_millis(),
            snapshot.success_rate,
            snapshot.sample_count,
            snapshot.consecutive_failures
        );

        let reason = self.breach(&snapshot)?;
        if self.registry.set_enabled(source, false) {
            info!("Health tracker: disabling '{}': {}", source, reason);
            Some(reason)
        } else {
            None
        }
    }

    /// First disable threshold the snapshot breaches, if any.
    pub fn breach(&self, snapshot: &HealthSnapshot) -> Option<DisableReason> {
        let limit = self.policy.max_response_time();
        if let Some(average) = snapshot.average_response_time {
            if average > limit {
                return Some(DisableReason::SlowResponses { average, limit });
            }
        }

        if snapshot.consecutive_failures >= self.policy.max_consecutive_failures {
            return Some(DisableReason::ConsecutiveFailures {
                count: snapshot.consecutive_failures,
            });
        }

        if snapshot.sample_count >= self.policy.min_samples_for_success_rate
            && snapshot.success_rate < self.policy.min_success_rate
        {
            return Some(DisableReason::LowSuccessRate {
                rate: snapshot.success_rate,
                samples: snapshot.sample_count,
            });
        }

        None
    }

    /// Point-in-time copy of a source's statistics.
    pub fn snapshot(&self, source: &str) -> Option<HealthSnapshot> {
        self.lock_window(source).map(|w| w.snapshot())
    }

    /// Clear a source's window, giving it a clean slate.
    pub fn reset(&self, source: &str) {
        if let Some(mut window) = self.lock_window(source) {
            window.clear();
            debug!("Health tracker: window for '{}' cleared", source);
        }
    }

    /// Clear every window.
    pub fn reset_all(&self) {
        for name in self.windows.keys() {
            self.reset(name);
        }
    }
}
