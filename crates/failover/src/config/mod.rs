//! Failover configuration.
//!
//! Configuration is loaded once at startup and never reloaded. Every tunable
//! has a default, so a minimal configuration only lists sources:
//!
//! ```json
//! {
//!   "sources": [
//!     { "name": "UPSTOX_PRIMARY", "priority": 1, "pinned": true, "timeoutMs": 5000 },
//!     { "name": "YAHOO_FINANCE", "priority": 3, "timeoutMs": 8000 }
//!   ],
//!   "maxResponseTimeMs": 5000
//! }
//! ```

mod endpoint;

pub use endpoint::HttpEndpoint;

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

pub const DEFAULT_MAX_RESPONSE_TIME_MS: u64 = 5000;
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 3;
pub const DEFAULT_MIN_SUCCESS_RATE: f64 = 0.5;
pub const DEFAULT_MIN_SAMPLES_FOR_SUCCESS_RATE: usize = 5;
pub const DEFAULT_WINDOW_SIZE: usize = 100;
pub const DEFAULT_SUCCESS_RATE_TIE_THRESHOLD: f64 = 0.1;
pub const DEFAULT_HEALTH_CHECK_INTERVAL_MINUTES: u64 = 5;
/// Upper bound on the probe interval: one day.
pub const MAX_HEALTH_CHECK_INTERVAL_MINUTES: u64 = 24 * 60;
pub const DEFAULT_CANARY_SYMBOL: &str = "NIFTY";
pub const DEFAULT_SOURCE_PRIORITY: i32 = 10;
pub const DEFAULT_SOURCE_TIMEOUT_MS: u64 = 5000;

/// Thresholds that decide when a source is disabled, and how sources are ranked.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HealthPolicy {
    /// Average response time above which a source is disabled.
    pub max_response_time_ms: u64,
    /// Consecutive failures at which a source is disabled.
    pub max_consecutive_failures: u32,
    /// Success rate below which a warmed-up source is disabled.
    pub min_success_rate: f64,
    /// Samples required before the success rate can disable a source.
    pub min_samples_for_success_rate: usize,
    /// Capacity of each source's performance window.
    pub window_size: usize,
    /// Success rates closer than this are ranked by latency instead.
    pub success_rate_tie_threshold: f64,
}

impl HealthPolicy {
    /// [`Self::max_response_time_ms`] as a duration.
    pub fn max_response_time(&self) -> Duration {
        Duration::from_millis(self.max_response_time_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_response_time_ms == 0 {
            return Err(ConfigError::invalid("maxResponseTimeMs", "must be positive"));
        }
        if self.max_consecutive_failures == 0 {
            return Err(ConfigError::invalid(
                "maxConsecutiveFailures",
                "must be at least 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.min_success_rate) {
            return Err(ConfigError::invalid(
                "minSuccessRate",
                "must be between 0 and 1",
            ));
        }
        if self.window_size == 0 {
            return Err(ConfigError::invalid("windowSize", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.success_rate_tie_threshold) {
            return Err(ConfigError::invalid(
                "successRateTieThreshold",
                "must be between 0 and 1",
            ));
        }
        Ok(())
    }
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self {
            max_response_time_ms: DEFAULT_MAX_RESPONSE_TIME_MS,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
            min_success_rate: DEFAULT_MIN_SUCCESS_RATE,
            min_samples_for_success_rate: DEFAULT_MIN_SAMPLES_FOR_SUCCESS_RATE,
            window_size: DEFAULT_WINDOW_SIZE,
            success_rate_tie_threshold: DEFAULT_SUCCESS_RATE_TIE_THRESHOLD,
        }
    }
}

/// Static configuration of one upstream source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConfig {
    pub name: String,
    /// Lower values are tried earlier among equals.
    #[serde(default = "default_priority")]
    pub priority: i32,
    /// Pinned sources are always attempted first while enabled.
    #[serde(default)]
    pub pinned: bool,
    /// Initial value of the enabled flag.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Only consulted by [`HttpJsonSource`](crate::source::HttpJsonSource).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<HttpEndpoint>,
}

impl SourceConfig {
    pub fn new(name: impl Into<String>, priority: i32) -> Self {
        Self {
            name: name.into(),
            priority,
            pinned: false,
            enabled: true,
            timeout_ms: DEFAULT_SOURCE_TIMEOUT_MS,
            endpoint: None,
        }
    }

    pub fn pinned(mut self) -> Self {
        self.pinned = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_priority() -> i32 {
    DEFAULT_SOURCE_PRIORITY
}

fn default_enabled() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    DEFAULT_SOURCE_TIMEOUT_MS
}

/// Complete failover configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FailoverConfig {
    pub sources: Vec<SourceConfig>,
    #[serde(flatten)]
    pub policy: HealthPolicy,
    pub health_check_interval_minutes: u64,
    /// Symbol used by recovery probes.
    pub canary_symbol: String,
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            policy: HealthPolicy::default(),
            health_check_interval_minutes: DEFAULT_HEALTH_CHECK_INTERVAL_MINUTES,
            canary_symbol: DEFAULT_CANARY_SYMBOL.to_string(),
        }
    }
}

impl FailoverConfig {
    /// Default tunables around the given sources.
    pub fn with_sources(sources: Vec<SourceConfig>) -> Self {
        Self {
            sources,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Time between recovery probe rounds.
    pub fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_minutes.saturating_mul(60))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sources.is_empty() {
            return Err(ConfigError::invalid("sources", "at least one source is required"));
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(ConfigError::invalid("sources.name", "must not be empty"));
            }
            if !seen.insert(source.name.as_str()) {
                return Err(ConfigError::DuplicateSource(source.name.clone()));
            }
            if source.timeout_ms == 0 {
                return Err(ConfigError::invalid(
                    format!("sources.{}.timeoutMs", source.name),
                    "must be positive",
                ));
            }
        }

        self.policy.validate()?;

        if self.health_check_interval_minutes == 0 {
            return Err(ConfigError::invalid(
                "healthCheckIntervalMinutes",
                "must be positive",
            ));
        }
        if self.health_check_interval_minutes > MAX_HEALTH_CHECK_INTERVAL_MINUTES {
            return Err(ConfigError::invalid(
                "healthCheckIntervalMinutes",
                format!("must be at most {}", MAX_HEALTH_CHECK_INTERVAL_MINUTES),
            ));
        }
        if self.canary_symbol.trim().is_empty() {
            return Err(ConfigError::invalid("canarySymbol", "must not be empty"));
        }
        Ok(())
    }
}
