use crate::domain::model::{PaymentAppCredentials, PaymentId, ProviderKey, ProviderModule};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Provider-side payment operations. What "delete" means (cancel, refund,
/// hard remove) is up to the provider.
#[async_trait]
pub trait PaymentService: Send + Sync {
    async fn delete_payment(&self, payment_id: &PaymentId) -> Result<bool>;
}

/// Builds a call-scoped [`PaymentService`] from the stored app credentials.
pub trait PaymentServiceFactory: Send + Sync {
    fn create(&self, credentials: &PaymentAppCredentials) -> Result<Box<dyn PaymentService>>;
}

/// Runs a provider's one-time initialization.
#[async_trait]
pub trait ProviderLoader: Send + Sync {
    async fn load(&self, key: &ProviderKey) -> Result<ProviderModule>;
}
