//! One-stop wiring of registry, tracker, scheduler and monitor.

use std::sync::Arc;

use log::info;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::FailoverConfig;
use crate::errors::ConfigError;
use crate::health::{HealthMonitor, ProbeReport, SourceHealthTracker};
use crate::models::{FetchResult, SourceStatus};
use crate::registry::SourceRegistry;
use crate::scheduler::FailoverScheduler;
use crate::source::SourceClient;

/// Failover manager built from a single [`FailoverConfig`].
///
/// All components share one registry and one tracker, so the monitor's
/// recoveries are visible to the very next fetch.
pub struct FailoverManager {
    scheduler: FailoverScheduler,
    monitor: Arc<HealthMonitor>,
}

impl FailoverManager {
    /// Validate the configuration and pair each source with its client.
    pub fn new(
        config: FailoverConfig,
        clients: Vec<Arc<dyn SourceClient>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let registry = Arc::new(SourceRegistry::new(&config.sources, clients)?);
        let tracker = Arc::new(SourceHealthTracker::new(
            Arc::clone(&registry),
            config.policy.clone(),
        ));
        let monitor = Arc::new(HealthMonitor::new(
            Arc::clone(&registry),
            Arc::clone(&tracker),
            config.canary_symbol.clone(),
            config.health_check_interval(),
        ));

        info!(
            "Failover manager ready with {} source(s)",
            registry.list_sources().len()
        );

        Ok(Self {
            scheduler: FailoverScheduler::new(registry, tracker),
            monitor,
        })
    }

    /// Fetch one quote, failing over across ranked sources.
    pub async fn fetch_quote(&self, symbol: &str) -> FetchResult {
        self.scheduler.fetch_quote(symbol).await
    }

    /// Like [`Self::fetch_quote`], stopping as soon as `cancel` fires.
    pub async fn fetch_quote_with_cancel(
        &self,
        symbol: &str,
        cancel: &CancellationToken,
    ) -> FetchResult {
        self.scheduler.fetch_quote_with_cancel(symbol, cancel).await
    }

    /// Fetch several symbols concurrently. Results are in input order.
    pub async fn fetch_quotes<S: AsRef<str>>(&self, symbols: &[S]) -> Vec<FetchResult> {
        self.scheduler.fetch_quotes(symbols).await
    }

    /// One status row per source, enabled ones in candidate order first.
    pub fn source_status(&self) -> Vec<SourceStatus> {
        self.scheduler.source_status()
    }

    /// Re-enable every source and clear all statistics.
    pub fn reset_all(&self) {
        self.scheduler.reset_all();
    }

    /// Run one recovery round now, outside the background schedule.
    pub async fn run_health_check(&self) -> Vec<ProbeReport> {
        self.monitor.run_once().await
    }

    /// Start the background recovery loop; it stops when `shutdown` fires.
    pub fn start_health_monitor(&self, shutdown: CancellationToken) -> JoinHandle<()> {
        Arc::clone(&self.monitor).spawn(shutdown)
    }

    pub fn scheduler(&self) -> &FailoverScheduler {
        &self.scheduler
    }

    pub fn registry(&self) -> &Arc<SourceRegistry> {
        self.scheduler.registry()
    }

    pub fn tracker(&self) -> &Arc<SourceHealthTracker> {
        self.scheduler.tracker()
    }
}
