//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use quotewatch_failover::{FailoverConfig, FailoverManager, Quote, SourceClient, SourceConfig, SourceError};
use rust_decimal::Decimal;

/// One scripted response.
#[derive(Clone, Debug)]
pub enum Step {
    /// Answer immediately with this price.
    Price(Decimal),
    /// Answer with this price after a delay.
    Slow(Duration, Decimal),
    /// Never answer within any reasonable timeout.
    Hang,
    /// Fail with a network error.
    Network,
    /// Fail with a protocol error.
    Protocol,
    /// Answer with this price, stamped with another source's name.
    Impersonate(&'static str, Decimal),
}

/// In-memory source that replays a script, then repeats a fallback step.
pub struct ScriptedClient {
    name: String,
    script: Mutex<VecDeque<Step>>,
    fallback: Mutex<Step>,
    calls: AtomicUsize,
}

impl ScriptedClient {
    pub fn always(name: &str, step: Step) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            script: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(step),
            calls: AtomicUsize::new(0),
        })
    }

    /// Queue steps to run before the fallback.
    pub fn then(&self, steps: impl IntoIterator<Item = Step>) {
        self.script.lock().unwrap().extend(steps);
    }

    /// Replace the fallback behaviour, e.g. to simulate an outage ending.
    pub fn set_behavior(&self, step: Step) {
        *self.fallback.lock().unwrap() = step;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> Step {
        let queued = self.script.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| self.fallback.lock().unwrap().clone())
    }
}

#[async_trait]
impl SourceClient for ScriptedClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, symbol: &str, _timeout: Duration) -> Result<Quote, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.next_step() {
            Step::Price(price) => Ok(Quote::new(symbol, price, &self.name)),
            Step::Slow(delay, price) => {
                tokio::time::sleep(delay).await;
                Ok(Quote::new(symbol, price, &self.name))
            }
            Step::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(SourceError::unavailable(&self.name, "hung"))
            }
            Step::Network => Err(SourceError::network(&self.name, "connection reset")),
            Step::Protocol => Err(SourceError::protocol(&self.name, "unexpected payload")),
            Step::Impersonate(other, price) => Ok(Quote::new(symbol, price, other)),
        }
    }
}

pub fn manager(sources: Vec<SourceConfig>, clients: &[Arc<ScriptedClient>]) -> FailoverManager {
    manager_with(FailoverConfig::with_sources(sources), clients)
}

pub fn manager_with(config: FailoverConfig, clients: &[Arc<ScriptedClient>]) -> FailoverManager {
    let clients = clients
        .iter()
        .map(|c| Arc::clone(c) as Arc<dyn SourceClient>)
        .collect();
    FailoverManager::new(config, clients).unwrap()
}

pub fn candidate_names(manager: &FailoverManager) -> Vec<String> {
    manager
        .scheduler()
        .candidates()
        .iter()
        .map(|s| s.name().to_string())
        .collect()
}

pub fn is_enabled(manager: &FailoverManager, name: &str) -> bool {
    manager.registry().get(name).unwrap().is_enabled()
}
