//! Bounded per-source performance window.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::models::HealthSnapshot;

/// Success rate reported for a source with no samples.
const NEUTRAL_SUCCESS_RATE: f64 = 0.5;

#[derive(Clone, Copy, Debug)]
struct Sample {
    latency: Duration,
    success: bool,
}

/// Ring buffer of the most recent outcomes of one source.
///
/// Holds at most `capacity` samples; pushing onto a full window evicts the
/// oldest one.
#[derive(Debug)]
pub struct PerformanceWindow {
    capacity: usize,
    samples: VecDeque<Sample>,
    consecutive_failures: u32,
    last_checked: Option<DateTime<Utc>>,
}

impl PerformanceWindow {
    /// Empty window holding at most `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
            consecutive_failures: 0,
            last_checked: None,
        }
    }

    /// Append one outcome, evicting the oldest when full, and stamp the
    /// check time.
    pub fn push(&mut self, latency: Duration, success: bool) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(Sample { latency, success });

        if success {
            self.consecutive_failures = 0;
        } else {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        }
        self.last_checked = Some(Utc::now());
    }

    /// Number of samples held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Failures since the last success. Not bounded by the capacity.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Mean response time, or `None` when empty.
    pub fn average_response_time(&self) -> Option<Duration> {
        if self.samples.is_empty() {
            return None;
        }
        let total: u128 = self.samples.iter().map(|s| s.latency.as_nanos()).sum();
        let mean = total / self.samples.len() as u128;
        Some(Duration::from_nanos(mean.min(u64::MAX as u128) as u64))
    }

    /// Fraction of successful samples, or 0.5 when empty.
    pub fn success_rate(&self) -> f64 {
        if self.samples.is_empty() {
            return NEUTRAL_SUCCESS_RATE;
        }
        let successes = self.samples.iter().filter(|s| s.success).count();
        successes as f64 / self.samples.len() as f64
    }

    /// Drop every sample and the failure streak. The last check time is kept.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.consecutive_failures = 0;
    }

    /// Point-in-time copy of the derived statistics.
    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            average_response_time: self.average_response_time(),
            success_rate: self.success_rate(),
            sample_count: self.samples.len(),
            consecutive_failures: self.consecutive_failures,
            last_checked: self.last_checked,
        }
    }
}
