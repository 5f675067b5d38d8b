use crate::adapters::http_gateway::HttpGatewayFactory;
use crate::adapters::static_provider::StaticPaymentFactory;
use crate::config::toml_config::{ProviderConfig, ProviderKind, RegistryConfig};
use crate::core::registry::ProviderRegistry;
use crate::domain::model::{ProviderKey, ProviderLib, ProviderModule};
use crate::domain::ports::{PaymentServiceFactory, ProviderLoader};
use crate::utils::error::{DispatchError, Result};
use crate::utils::validation::Validate;
use async_trait::async_trait;
use std::sync::Arc;

/// Initializes a provider from its registry configuration entry.
#[derive(Debug, Clone)]
pub struct ConfiguredProviderLoader {
    config: ProviderConfig,
}

impl ConfiguredProviderLoader {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ProviderLoader for ConfiguredProviderLoader {
    async fn load(&self, key: &ProviderKey) -> Result<ProviderModule> {
        let lib = match &self.config.kind {
            ProviderKind::Http(http) => {
                let factory: Arc<dyn PaymentServiceFactory> =
                    Arc::new(HttpGatewayFactory::new(key.clone(), http.clone())?);
                Some(ProviderLib {
                    payment_service: Some(factory),
                })
            }
            ProviderKind::Static { result } => {
                let factory: Arc<dyn PaymentServiceFactory> =
                    Arc::new(StaticPaymentFactory::new(*result));
                Some(ProviderLib {
                    payment_service: Some(factory),
                })
            }
            ProviderKind::Collector => Some(ProviderLib::default()),
            ProviderKind::Bare => None,
        };

        Ok(ProviderModule::new(
            key.clone(),
            self.config.display_name(),
            lib,
        ))
    }
}

impl ProviderRegistry {
    /// Builds the registry from a validated configuration. Providers are not
    /// initialized until first resolved.
    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = ProviderRegistry::builder();
        for provider in &config.providers {
            let key = ProviderKey::parse(&provider.key).ok_or_else(|| {
                DispatchError::InvalidConfigValueError {
                    field: "providers.key".to_string(),
                    value: provider.key.clone(),
                    reason: "Invalid provider key".to_string(),
                }
            })?;
            builder = builder.register(key, Arc::new(ConfiguredProviderLoader::new(provider.clone())));
        }

        let registry = builder.build();
        tracing::info!(
            "Provider registry '{}' ready with {} providers",
            config.name(),
            registry.len()
        );
        Ok(registry)
    }
}
