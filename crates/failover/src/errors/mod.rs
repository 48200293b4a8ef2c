//! Error types for the failover crate.
//!
//! This module provides:
//! - [`SourceError`]: a failure of one source for one attempt
//! - [`SourceErrorKind`]: classification used by the scheduler and the tracker
//! - [`FetchError`]: the only failure surfaced by a quote fetch
//! - [`ConfigError`]: invalid or unreadable configuration

mod kind;

pub use kind::SourceErrorKind;

use std::time::Duration;

use thiserror::Error;

use crate::models::AttemptLog;

/// Errors a single source can produce for a single attempt.
///
/// These never escape the attempt loop: the scheduler records them in the
/// attempt log and moves on to the next candidate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The source did not answer within its configured timeout.
    #[error("Timeout: {source_name} did not respond within {}ms", .timeout.as_millis())]
    Timeout {
        source_name: String,
        timeout: Duration,
    },

    /// The source answered with something that is not a usable quote.
    #[error("Protocol error: {source_name} - {message}")]
    Protocol {
        source_name: String,
        message: String,
    },

    /// Transport-level failure (connection refused, DNS, TLS).
    #[error("Network error: {source_name} - {message}")]
    Network {
        source_name: String,
        message: String,
    },

    /// The source reported itself unavailable, or is disabled.
    #[error("Source unavailable: {source_name} - {message}")]
    Unavailable {
        source_name: String,
        message: String,
    },

    /// The caller aborted the fetch while this source was in flight.
    #[error("Cancelled while waiting for {source_name}")]
    Cancelled { source_name: String },
}

impl SourceError {
    pub fn protocol(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Protocol {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn network(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn unavailable(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Returns the classification of this error.
    pub fn kind(&self) -> SourceErrorKind {
        match self {
            Self::Timeout { .. } => SourceErrorKind::Timeout,
            Self::Protocol { .. } => SourceErrorKind::Protocol,
            Self::Network { .. } => SourceErrorKind::Network,
            Self::Unavailable { .. } => SourceErrorKind::Unavailable,
            Self::Cancelled { .. } => SourceErrorKind::Cancelled,
        }
    }

    /// Name of the source that produced this error.
    pub fn source_name(&self) -> &str {
        match self {
            Self::Timeout { source_name, .. }
            | Self::Protocol { source_name, .. }
            | Self::Network { source_name, .. }
            | Self::Unavailable { source_name, .. }
            | Self::Cancelled { source_name } => source_name,
        }
    }

    /// Re-attribute this error to `name`, keeping kind and message.
    ///
    /// Clients may fill in any name they like; the scheduler and the health
    /// monitor pin errors to the source they actually called.
    pub fn attributed_to(mut self, name: &str) -> Self {
        match &mut self {
            Self::Timeout { source_name, .. }
            | Self::Protocol { source_name, .. }
            | Self::Network { source_name, .. }
            | Self::Unavailable { source_name, .. }
            | Self::Cancelled { source_name } => *source_name = name.to_string(),
        }
        self
    }
}

/// Failure of a whole quote fetch.
///
/// Either every candidate was exhausted, or the caller cancelled. There is no
/// variant carrying a substitute value.
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    /// Every enabled candidate was attempted and failed, or none was enabled.
    #[error("{}", all_sources_failed_message(.symbol, .attempts))]
    AllSourcesFailed { symbol: String, attempts: AttemptLog },

    /// The caller cancelled the fetch.
    #[error("Fetch for {symbol} cancelled after {} completed attempt(s)", .attempts.completed())]
    Cancelled { symbol: String, attempts: AttemptLog },
}

impl FetchError {
    /// Stable error code, suitable for reports.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AllSourcesFailed { .. } => "ALL_SOURCES_FAILED",
            Self::Cancelled { .. } => "CANCELLED",
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Self::AllSourcesFailed { symbol, .. } | Self::Cancelled { symbol, .. } => symbol,
        }
    }

    /// Per-source log of what was tried before the fetch gave up.
    pub fn attempts(&self) -> &AttemptLog {
        match self {
            Self::AllSourcesFailed { attempts, .. } | Self::Cancelled { attempts, .. } => attempts,
        }
    }
}

fn all_sources_failed_message(symbol: &str, attempts: &AttemptLog) -> String {
    if attempts.is_empty() {
        format!("All sources failed for {}: no enabled sources", symbol)
    } else {
        format!(
            "All sources failed for {}: all {} attempted sources failed ({})",
            symbol,
            attempts.len(),
            attempts.summary()
        )
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Duplicate source name: {0}")]
    DuplicateSource(String),

    #[error("Invalid value for {field}: {message}")]
    Invalid { field: String, message: String },

    #[error("No client registered for source: {0}")]
    MissingClient(String),

    #[error("Client registered for unknown source: {0}")]
    UnknownClient(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}
