use crate::domain::model::{ProviderKey, ProviderModule};
use crate::domain::ports::ProviderLoader;
use crate::utils::error::{DispatchError, Result};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;

struct RegistryEntry {
    loader: Arc<dyn ProviderLoader>,
    module: OnceCell<Arc<ProviderModule>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub lookups: u64,
    pub initializations: u64,
}

/// Read-only map from provider key to a lazily initialized provider module.
///
/// The set of keys is fixed when the registry is built. Each module is
/// initialized on first resolution; concurrent first resolutions of the same
/// key share a single initialization. A failed initialization is not cached.
pub struct ProviderRegistry {
    entries: BTreeMap<ProviderKey, RegistryEntry>,
    lookups: AtomicU64,
    initializations: AtomicU64,
}

impl ProviderRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub async fn resolve(&self, key: &ProviderKey) -> Result<Arc<ProviderModule>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);

        let entry = self
            .entries
            .get(key)
            .ok_or_else(|| DispatchError::ProviderNotFound {
                key: key.to_string(),
            })?;

        let module = entry
            .module
            .get_or_try_init(|| async {
                tracing::debug!("Initializing payment provider '{}'", key);
                let module = entry.loader.load(key).await?;
                self.initializations.fetch_add(1, Ordering::Relaxed);
                tracing::info!(
                    "Payment provider '{}' ({}) initialized",
                    key,
                    module.display_name
                );
                Ok::<_, DispatchError>(Arc::new(module))
            })
            .await?;

        Ok(Arc::clone(module))
    }

    pub fn contains(&self, key: &str) -> bool {
        ProviderKey::parse(key).is_some_and(|key| self.entries.contains_key(&key))
    }

    pub fn is_resolved(&self, key: &str) -> bool {
        ProviderKey::parse(key)
            .and_then(|key| self.entries.get(&key))
            .is_some_and(|entry| entry.module.initialized())
    }

    pub fn keys(&self) -> impl Iterator<Item = &ProviderKey> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            lookups: self.lookups.load(Ordering::Relaxed),
            initializations: self.initializations.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .field("stats", &self.stats())
            .finish()
    }
}

#[derive(Default)]
pub struct RegistryBuilder {
    entries: BTreeMap<ProviderKey, Arc<dyn ProviderLoader>>,
}

impl RegistryBuilder {
    /// Registering the same key twice keeps the last loader.
    pub fn register(mut self, key: ProviderKey, loader: Arc<dyn ProviderLoader>) -> Self {
        if self.entries.insert(key.clone(), loader).is_some() {
            tracing::warn!("Payment provider '{}' registered twice, keeping the last one", key);
        }
        self
    }

    pub fn build(self) -> ProviderRegistry {
        let entries = self
            .entries
            .into_iter()
            .map(|(key, loader)| {
                (
                    key,
                    RegistryEntry {
                        loader,
                        module: OnceCell::new(),
                    },
                )
            })
            .collect();

        ProviderRegistry {
            entries,
            lookups: AtomicU64::new(0),
            initializations: AtomicU64::new(0),
        }
    }
}
