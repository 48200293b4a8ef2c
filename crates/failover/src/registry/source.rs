use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::config::SourceConfig;

/// One configured upstream source.
///
/// Everything except the enabled flag is fixed at startup. The flag is a
/// single atomic so readers never lock.
#[derive(Debug)]
pub struct Source {
    name: String,
    priority: i32,
    pinned: bool,
    timeout: Duration,
    enabled: AtomicBool,
}

impl Source {
    /// Source in the initial state given by its configuration.
    pub fn from_config(config: &SourceConfig) -> Self {
        Self {
            name: config.name.clone(),
            priority: config.priority,
            pinned: config.pinned,
            timeout: config.timeout(),
            enabled: AtomicBool::new(config.enabled),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Bound on a single attempt against this source.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Set the enabled flag, returning true if it changed.
    pub(crate) fn set_enabled(&self, enabled: bool) -> bool {
        self.enabled.swap(enabled, Ordering::AcqRel) != enabled
    }
}
