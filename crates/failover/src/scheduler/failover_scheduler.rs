//! Per-request source selection and failover.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use log::{debug, info, warn};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::ranking::{self, Candidate};
use super::QuoteValidator;
use crate::errors::{FetchError, SourceError, SourceErrorKind};
use crate::health::SourceHealthTracker;
use crate::models::{AttemptLog, FetchResult, HealthSnapshot, Quote, SourceAttempt, SourceStatus};
use crate::registry::{Source, SourceRegistry};
use crate::source::SourceClient;

/// Tries ranked sources one after another until one returns a valid quote.
///
/// Attempts within one fetch are strictly sequential. Fetches for different
/// symbols, or concurrent fetches for the same symbol, run independently.
pub struct FailoverScheduler {
    registry: Arc<SourceRegistry>,
    tracker: Arc<SourceHealthTracker>,
    validator: QuoteValidator,
}

impl FailoverScheduler {
    /// Scheduler over `registry`, ranking by `tracker` and validating with
    /// the default rules.
    pub fn new(registry: Arc<SourceRegistry>, tracker: Arc<SourceHealthTracker>) -> Self {
        Self {
            registry,
            tracker,
            validator: QuoteValidator::new(),
        }
    }

    /// Replace the default quote validator.
    pub fn with_validator(mut self, validator: QuoteValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Registry the candidates are drawn from.
    pub fn registry(&self) -> &Arc<SourceRegistry> {
        &self.registry
    }

    pub fn tracker(&self) -> &Arc<SourceHealthTracker> {
        &self.tracker
    }

    /// Enabled sources in the order the next fetch would try them.
    pub fn candidates(&self) -> Vec<Arc<Source>> {
        self.ranked().into_iter().map(|c| c.source).collect()
    }

    fn ranked(&self) -> Vec<Candidate> {
        let candidates = self
            .registry
            .enabled_sources()
            .filter_map(|source| {
                self.tracker.snapshot(source.name()).map(|snapshot| Candidate {
                    source: Arc::clone(source),
                    snapshot,
                })
            })
            .collect();

        ranking::rank(candidates, self.tracker.policy().success_rate_tie_threshold)
    }

    /// Fetch a quote for `symbol` from the best available source.
    pub async fn fetch_quote(&self, symbol: &str) -> FetchResult {
        self.fetch_quote_with_cancel(symbol, &CancellationToken::new())
            .await
    }

    /// Fetch a quote, aborting promptly when `cancel` fires.
    ///
    /// Cancellation takes precedence over a source's own timeout. The
    /// in-flight source is noted in the attempt log as cancelled but its
    /// health is not touched.
    pub async fn fetch_quote_with_cancel(
        &self,
        symbol: &str,
        cancel: &CancellationToken,
    ) -> FetchResult {
        let candidates = self.candidates();
        let mut attempts = AttemptLog::new();

        if candidates.is_empty() {
            warn!("No enabled sources for {}", symbol);
            return Err(FetchError::AllSourcesFailed {
                symbol: symbol.to_string(),
                attempts,
            });
        }

        for source in candidates {
            if cancel.is_cancelled() {
                return Err(cancelled(symbol, attempts));
            }

            let name = source.name();
            let Some(client) = self.registry.client(name) else {
                warn!("No client registered for '{}', skipping", name);
                continue;
            };

            debug!(
                "Fetching {} from '{}' (timeout {}ms)",
                symbol,
                name,
                source.timeout().as_millis()
            );

            let started = Instant::now();
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = self.attempt(client.as_ref(), name, symbol, source.timeout()) => Some(result),
            };
            let latency = started.elapsed();

            match result {
                Some(Ok(quote)) => {
                    self.tracker.record_outcome(name, latency, true);
                    debug!(
                        "Got {} from '{}' in {}ms",
                        symbol,
                        name,
                        latency.as_millis()
                    );
                    return Ok(quote);
                }
                Some(Err(error)) if error.kind() == SourceErrorKind::Cancelled => {
                    attempts.push(SourceAttempt::failed(name, &error, latency));
                    info!("'{}' cancelled the fetch for {}", name, symbol);
                    return Err(cancelled(symbol, attempts));
                }
                Some(Err(error)) => {
                    if error.kind().counts_against_health() {
                        self.tracker.record_outcome(name, latency, false);
                    }
                    debug!("'{}' failed for {}: {}", name, symbol, error);
                    attempts.push(SourceAttempt::failed(name, &error, latency));
                }
                None => {
                    let error = SourceError::Cancelled {
                        source_name: name.to_string(),
                    };
                    attempts.push(SourceAttempt::failed(name, &error, latency));
                    info!("Fetch for {} cancelled while waiting on '{}'", symbol, name);
                    return Err(cancelled(symbol, attempts));
                }
            }
        }

        warn!(
            "All sources failed for {}: {}",
            symbol,
            attempts.summary()
        );
        Err(FetchError::AllSourcesFailed {
            symbol: symbol.to_string(),
            attempts,
        })
    }

    /// One bounded call to one client, with the quote validated.
    ///
    /// Errors and rejected quotes are attributed to `name`.
    async fn attempt(
        &self,
        client: &dyn SourceClient,
        name: &str,
        symbol: &str,
        timeout: Duration,
    ) -> Result<Quote, SourceError> {
        let quote = match tokio::time::timeout(timeout, client.fetch(symbol, timeout)).await {
            Ok(result) => result.map_err(|e| e.attributed_to(name))?,
            Err(_) => {
                return Err(SourceError::Timeout {
                    source_name: name.to_string(),
                    timeout,
                })
            }
        };

        self.validator.validate_for(&quote, name, symbol)?;
        Ok(quote)
    }

    /// Fetch several symbols concurrently, one independent failover per
    /// symbol. Results are in input order.
    pub async fn fetch_quotes<S: AsRef<str>>(&self, symbols: &[S]) -> Vec<FetchResult> {
        join_all(symbols.iter().map(|s| self.fetch_quote(s.as_ref()))).await
    }

    /// Status row per source: enabled sources in candidate order, then
    /// disabled sources by priority and name.
    pub fn source_status(&self) -> Vec<SourceStatus> {
        let max_response_time = self.tracker.policy().max_response_time();

        let mut disabled: Vec<&Arc<Source>> = self.registry.disabled_sources().collect();
        disabled.sort_by(|a, b| ranking::by_priority(a, b));

        let mut rows: Vec<SourceStatus> = self
            .ranked()
            .into_iter()
            .map(|c| status_row(&c.source, &c.snapshot, max_response_time))
            .collect();

        rows.extend(disabled.into_iter().filter_map(|source| {
            self.tracker
                .snapshot(source.name())
                .map(|snapshot| status_row(source, &snapshot, max_response_time))
        }));

        rows
    }

    /// Re-enable every source and clear all health windows.
    pub fn reset_all(&self) {
        self.tracker.reset_all();
        for source in self.registry.list_sources() {
            self.registry.set_enabled(source.name(), true);
        }
        info!("All sources reset and enabled");
    }
}

fn cancelled(symbol: &str, attempts: AttemptLog) -> FetchError {
    FetchError::Cancelled {
        symbol: symbol.to_string(),
        attempts,
    }
}

fn status_row(source: &Source, snapshot: &HealthSnapshot, max_response_time: Duration) -> SourceStatus {
    SourceStatus {
        name: source.name().to_string(),
        enabled: source.is_enabled(),
        pinned: source.is_pinned(),
        priority: source.priority(),
        avg_response_time_ms: snapshot
            .average_response_time
            .map(|d| d.as_millis() as u64),
        success_rate: snapshot.success_rate,
        sample_count: snapshot.sample_count,
        consecutive_failures: snapshot.consecutive_failures,
        performance_score: snapshot.performance_score(max_response_time),
        last_checked: snapshot.last_checked,
    }
}
