//! Background recovery of disabled sources.
//!
//! Runs on a fixed interval, decoupled from request traffic. Each round sends
//! one canary fetch to every disabled source; a source that answers with a
//! valid quote faster than the response-time limit is given a clean window
//! and re-enabled. This is the only path that re-enables a source
//! automatically.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use log::{debug, info};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::SourceHealthTracker;
use crate::config::MAX_HEALTH_CHECK_INTERVAL_MINUTES;
use crate::errors::SourceError;
use crate::registry::{Source, SourceRegistry};
use crate::scheduler::QuoteValidator;

/// Shortest probe interval; `interval_at` rejects a zero period.
const MIN_INTERVAL: Duration = Duration::from_millis(1);
const MAX_INTERVAL: Duration = Duration::from_secs(MAX_HEALTH_CHECK_INTERVAL_MINUTES * 60);

/// Result of probing one disabled source.
#[derive(Clone, Debug, PartialEq)]
pub enum ProbeOutcome {
    /// Canary succeeded in time; the source is enabled again.
    Recovered { latency: Duration },
    /// Canary succeeded but too slowly; the source stays disabled.
    TooSlow { latency: Duration, limit: Duration },
    /// Canary failed; the source stays disabled.
    StillUnavailable { error: SourceError },
}

/// Outcome of one canary fetch against one disabled source.
#[derive(Clone, Debug, PartialEq)]
pub struct ProbeReport {
    /// Name of the probed source.
    pub source: String,
    pub outcome: ProbeOutcome,
}

impl ProbeReport {
    /// Whether the source was re-enabled by this probe.
    pub fn recovered(&self) -> bool {
        matches!(self.outcome, ProbeOutcome::Recovered { .. })
    }
}

/// Periodic prober for disabled sources.
pub struct HealthMonitor {
    registry: Arc<SourceRegistry>,
    tracker: Arc<SourceHealthTracker>,
    validator: QuoteValidator,
    canary_symbol: String,
    interval: Duration,
}

impl HealthMonitor {
    /// Monitor probing with `canary_symbol` every `interval`.
    pub fn new(
        registry: Arc<SourceRegistry>,
        tracker: Arc<SourceHealthTracker>,
        canary_symbol: impl Into<String>,
        interval: Duration,
    ) -> Self {
        Self {
            registry,
            tracker,
            validator: QuoteValidator::new(),
            canary_symbol: canary_symbol.into(),
            interval: interval.clamp(MIN_INTERVAL, MAX_INTERVAL),
        }
    }

    /// Time between probe rounds.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Probe every currently disabled source once.
    ///
    /// Probes run concurrently; each is bounded by its source's timeout.
    pub async fn run_once(&self) -> Vec<ProbeReport> {
        let disabled: Vec<Arc<Source>> = self.registry.disabled_sources().cloned().collect();
        if disabled.is_empty() {
            debug!("Health monitor: no disabled sources");
            return Vec::new();
        }

        debug!("Health monitor: probing {} disabled source(s)", disabled.len());
        join_all(disabled.iter().map(|s| self.probe(s))).await
    }

    async fn probe(&self, source: &Source) -> ProbeReport {
        let name = source.name().to_string();
        let limit = self.tracker.policy().max_response_time();

        let Some(client) = self.registry.client(&name) else {
            return ProbeReport {
                outcome: ProbeOutcome::StillUnavailable {
                    error: SourceError::unavailable(&name, "no client registered"),
                },
                source: name,
            };
        };

        let timeout = source.timeout();
        let started = Instant::now();
        let result = match tokio::time::timeout(timeout, client.fetch(&self.canary_symbol, timeout))
            .await
        {
            Ok(Ok(quote)) => self
                .validator
                .validate_for(&quote, &name, &self.canary_symbol)
                .map(|_| quote),
            Ok(Err(e)) => Err(e.attributed_to(&name)),
            Err(_) => Err(SourceError::Timeout {
                source_name: name.clone(),
                timeout,
            }),
        };
        let latency = started.elapsed();

        let outcome = match result {
            Ok(_) if latency < limit => {
                self.tracker.reset(&name);
                self.tracker.record_outcome(&name, latency, true);
                self.registry.set_enabled(&name, true);
                info!(
                    "Health monitor: '{}' recovered (canary in {}ms)",
                    name,
                    latency.as_millis()
                );
                ProbeOutcome::Recovered { latency }
            }
            Ok(_) => {
                self.tracker.record_outcome(&name, latency, true);
                info!(
                    "Health monitor: '{}' answered but too slowly ({}ms >= {}ms)",
                    name,
                    latency.as_millis(),
                    limit.as_millis()
                );
                ProbeOutcome::TooSlow { latency, limit }
            }
            Err(error) => {
                self.tracker.record_outcome(&name, latency, false);
                info!("Health monitor: '{}' still failing: {}", name, error);
                ProbeOutcome::StillUnavailable { error }
            }
        };

        ProbeReport {
            source: name,
            outcome,
        }
    }

    /// Start the probe loop on the tokio runtime.
    ///
    /// The first round runs one interval after start. The loop exits when
    /// `shutdown` is cancelled.
    pub fn spawn(self: Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                "Health monitor started ({}s interval)",
                self.interval.as_secs()
            );

            let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let reports = self.run_once().await;
                        let recovered = reports.iter().filter(|r| r.recovered()).count();
                        if !reports.is_empty() {
                            info!(
                                "Health monitor: {}/{} disabled source(s) recovered",
                                recovered,
                                reports.len()
                            );
                        }
                    }
                }
            }

            info!("Health monitor stopped");
        })
    }
}
