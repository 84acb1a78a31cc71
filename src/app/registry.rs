use std::sync::Arc;

use anyhow::Result;

use crate::app::backend::ResourceClient;
use crate::geoserver::RestClient;
use crate::model::ConnectionConfig;

#[cfg(test)]
use std::collections::HashMap;

/// Builds the resource client for one configured connection.
pub(crate) trait ClientFactory: Send + Sync {
    fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn ResourceClient>>;
}

pub(crate) struct RestClientFactory;

impl ClientFactory for RestClientFactory {
    fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn ResourceClient>> {
        Ok(Arc::new(RestClient::new(config)?))
    }
}

struct RegistryEntry {
    config: ConnectionConfig,
    client: Result<Arc<dyn ResourceClient>, String>,
}

/// Configured connections in display order, each with its client.
pub(crate) struct ConnectionRegistry {
    factory: Arc<dyn ClientFactory>,
    entries: Vec<RegistryEntry>,
}

impl ConnectionRegistry {
    pub(crate) fn new(factory: Arc<dyn ClientFactory>, configs: Vec<ConnectionConfig>) -> Self {
        let mut registry = Self {
            factory,
            entries: vec![],
        };
        for config in configs {
            registry.upsert(config);
        }
        registry
    }

    fn entry(&self, config: ConnectionConfig) -> RegistryEntry {
        let client = self
            .factory
            .connect(&config)
            .map_err(|err| format!("{err:#}"));
        RegistryEntry { config, client }
    }

    /// Inserts a new connection or replaces the one with the same id,
    /// keeping its position.
    pub(crate) fn upsert(&mut self, config: ConnectionConfig) {
        let entry = self.entry(config);
        match self
            .entries
            .iter()
            .position(|existing| existing.config.id == entry.config.id)
        {
            Some(index) => self.entries[index] = entry,
            None => self.entries.push(entry),
        }
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<ConnectionConfig> {
        let index = self.entries.iter().position(|entry| entry.config.id == id)?;
        Some(self.entries.remove(index).config)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn config(&self, id: &str) -> Option<&ConnectionConfig> {
        self.entries
            .iter()
            .map(|entry| &entry.config)
            .find(|config| config.id == id)
    }

    pub(crate) fn configs(&self) -> Vec<ConnectionConfig> {
        self.entries.iter().map(|entry| entry.config.clone()).collect()
    }

    pub(crate) fn client(&self, id: &str) -> Result<Arc<dyn ResourceClient>, String> {
        let entry = self
            .entries
            .iter()
            .find(|entry| entry.config.id == id)
            .ok_or_else(|| format!("unknown connection {id}"))?;
        entry.client.clone()
    }

    /// `(id, label)` pairs used to seed the resource tree roots.
    pub(crate) fn tree_roots(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|entry| (entry.config.id.clone(), entry.config.label()))
            .collect()
    }
}

#[cfg(test)]
pub(crate) struct MockFactory {
    clients: HashMap<String, Arc<crate::app::backend::MockResourceClient>>,
    fallback: Arc<crate::app::backend::MockResourceClient>,
}

#[cfg(test)]
impl MockFactory {
    pub(crate) fn shared(client: Arc<crate::app::backend::MockResourceClient>) -> Self {
        Self {
            clients: HashMap::new(),
            fallback: client,
        }
    }

    pub(crate) fn with_client(
        mut self,
        id: &str,
        client: Arc<crate::app::backend::MockResourceClient>,
    ) -> Self {
        self.clients.insert(id.to_string(), client);
        self
    }
}

#[cfg(test)]
impl ClientFactory for MockFactory {
    fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn ResourceClient>> {
        if config.url.trim().is_empty() {
            anyhow::bail!("missing server url");
        }
        let client = self
            .clients
            .get(&config.id)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone());
        Ok(client)
    }
}
