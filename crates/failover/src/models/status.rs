use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Weight of the success rate in the reported performance score.
const SUCCESS_WEIGHT: f64 = 70.0;

/// Weight of the response time in the reported performance score.
const LATENCY_WEIGHT: f64 = 30.0;

/// Point-in-time copy of one source's performance statistics.
#[derive(Clone, Debug, PartialEq)]
pub struct HealthSnapshot {
    /// Mean of the windowed response times; `None` when no sample exists,
    /// which ranks the source last on latency.
    pub average_response_time: Option<Duration>,
    /// Successes over samples; 0.5 when no sample exists.
    pub success_rate: f64,
    pub sample_count: usize,
    pub consecutive_failures: u32,
    pub last_checked: Option<DateTime<Utc>>,
}

impl HealthSnapshot {
    /// Score from 0 to 100, higher is better.
    ///
    /// Used for reporting only; candidate ranking compares success rate and
    /// latency directly.
    pub fn performance_score(&self, max_response_time: Duration) -> f64 {
        let success_score = self.success_rate * SUCCESS_WEIGHT;
        let latency_score = match self.average_response_time {
            Some(avg) if !max_response_time.is_zero() => {
                let max = max_response_time.as_secs_f64();
                ((max - avg.as_secs_f64()) / max).max(0.0) * LATENCY_WEIGHT
            }
            _ => 0.0,
        };
        success_score + latency_score
    }
}

/// Reporting row for one source, consumed by status printers.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceStatus {
    pub name: String,
    pub enabled: bool,
    pub pinned: bool,
    pub priority: i32,
    pub avg_response_time_ms: Option<u64>,
    pub success_rate: f64,
    pub sample_count: usize,
    pub consecutive_failures: u32,
    pub performance_score: f64,
    pub last_checked: Option<DateTime<Utc>>,
}
