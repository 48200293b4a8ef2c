//! Process-wide store of configured sources and their clients.

use std::collections::HashMap;
use std::sync::Arc;

use log::info;

use super::Source;
use crate::config::SourceConfig;
use crate::errors::ConfigError;
use crate::source::SourceClient;

/// Configured sources, in configuration order, paired with their clients.
///
/// The set is fixed for the lifetime of the process. Only the per-source
/// enabled flag changes at runtime.
pub struct SourceRegistry {
    sources: Vec<Arc<Source>>,
    clients: HashMap<String, Arc<dyn SourceClient>>,
}

impl SourceRegistry {
    /// Build the registry, pairing every configured source with the client
    /// whose `name()` matches.
    pub fn new(
        configs: &[SourceConfig],
        clients: Vec<Arc<dyn SourceClient>>,
    ) -> Result<Self, ConfigError> {
        let mut by_name: HashMap<String, Arc<dyn SourceClient>> = HashMap::new();
        for client in clients {
            let name = client.name().to_string();
            if !configs.iter().any(|c| c.name == name) {
                return Err(ConfigError::UnknownClient(name));
            }
            if by_name.insert(name.clone(), client).is_some() {
                return Err(ConfigError::DuplicateSource(name));
            }
        }

        let mut sources = Vec::with_capacity(configs.len());
        for config in configs {
            if sources.iter().any(|s: &Arc<Source>| s.name() == config.name) {
                return Err(ConfigError::DuplicateSource(config.name.clone()));
            }
            if !by_name.contains_key(&config.name) {
                return Err(ConfigError::MissingClient(config.name.clone()));
            }
            sources.push(Arc::new(Source::from_config(config)));
        }

        Ok(Self {
            sources,
            clients: by_name,
        })
    }

    /// All configured sources, enabled or not.
    pub fn list_sources(&self) -> &[Arc<Source>] {
        &self.sources
    }

    /// Source registered under `name`.
    pub fn get(&self, name: &str) -> Option<&Arc<Source>> {
        self.sources.iter().find(|s| s.name() == name)
    }

    /// Client that serves the source `name`.
    pub fn client(&self, name: &str) -> Option<&Arc<dyn SourceClient>> {
        self.clients.get(name)
    }

    /// Sources currently eligible for live fetches, in configuration order.
    pub fn enabled_sources(&self) -> impl Iterator<Item = &Arc<Source>> {
        self.sources.iter().filter(|s| s.is_enabled())
    }

    /// Sources waiting on a recovery probe, in configuration order.
    pub fn disabled_sources(&self) -> impl Iterator<Item = &Arc<Source>> {
        self.sources.iter().filter(|s| !s.is_enabled())
    }

    /// Flip a source's enabled flag. Returns true if the flag changed.
    pub(crate) fn set_enabled(&self, name: &str, enabled: bool) -> bool {
        let Some(source) = self.get(name) else {
            return false;
        };
        let changed = source.set_enabled(enabled);
        if changed {
            info!(
                "Source registry: '{}' is now {}",
                name,
                if enabled { "enabled" } else { "disabled" }
            );
        }
        changed
    }
}
