//! Per-fetch attempt log for diagnostics.

use std::time::Duration;

use serde::Serialize;

use crate::errors::{SourceError, SourceErrorKind};

/// Record of one failed source attempt during a fetch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceAttempt {
    pub source_name: String,
    pub kind: SourceErrorKind,
    pub message: String,
    #[serde(rename = "latencyMs", serialize_with = "serialize_millis")]
    pub latency: Duration,
}

impl SourceAttempt {
    /// Entry for `source_name`, which failed with `error` after `latency`.
    ///
    /// The entry is keyed on the source that was called, not on whatever name
    /// the error carries.
    pub fn failed(source_name: &str, error: &SourceError, latency: Duration) -> Self {
        Self {
            source_name: source_name.to_string(),
            kind: error.kind(),
            message: error.to_string(),
            latency,
        }
    }
}

fn serialize_millis<S: serde::Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_millis() as u64)
}

/// Ordered log of every source tried by one fetch, in attempt order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AttemptLog {
    attempts: Vec<SourceAttempt>,
}

impl AttemptLog {
    pub fn new() -> Self {
        Self {
            attempts: Vec::new(),
        }
    }

    pub fn push(&mut self, attempt: SourceAttempt) {
        self.attempts.push(attempt);
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceAttempt> {
        self.attempts.iter()
    }

    /// Attempts that ran to an outcome, excluding one interrupted by cancellation.
    pub fn completed(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| a.kind != SourceErrorKind::Cancelled)
            .count()
    }

    /// Source names in attempt order.
    pub fn sources(&self) -> Vec<&str> {
        self.attempts.iter().map(|a| a.source_name.as_str()).collect()
    }

    /// Summary for logging/debugging.
    pub fn summary(&self) -> String {
        self.attempts
            .iter()
            .map(|a| format!("{}: {} ({}ms)", a.source_name, a.kind, a.latency.as_millis()))
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

impl<'a> IntoIterator for &'a AttemptLog {
    type Item = &'a SourceAttempt;
    type IntoIter = std::slice::Iter<'a, SourceAttempt>;

    fn into_iter(self) -> Self::IntoIter {
        self.attempts.iter()
    }
}
