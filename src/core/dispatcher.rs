use crate::core::registry::ProviderRegistry;
use crate::domain::model::{
    DeletionOutcome, PaymentAppCredentials, PaymentId, ProviderKey, ProviderModule,
    UnavailableReason,
};
use crate::domain::ports::PaymentServiceFactory;
use crate::utils::error::Result;
use std::sync::Arc;

/// Routes payment operations to the provider that created the payment.
///
/// A payment whose app is missing, or whose provider does not implement a
/// payment service, is an expected state and yields
/// [`DeletionOutcome::Unavailable`]. An unknown provider key is a deployment
/// error and is returned as [`crate::DispatchError::ProviderNotFound`].
/// Errors raised by the provider itself are returned unchanged.
#[derive(Debug, Clone)]
pub struct PaymentDispatcher {
    registry: Arc<ProviderRegistry>,
}

impl PaymentDispatcher {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Deletes the payment at its provider; `true` only when the provider
    /// reports a deletion.
    pub async fn delete_payment(
        &self,
        payment_id: &PaymentId,
        credentials: &PaymentAppCredentials,
    ) -> Result<bool> {
        self.dispatch_delete(payment_id, credentials)
            .await
            .map(|outcome| outcome.is_deleted())
    }

    pub async fn dispatch_delete(
        &self,
        payment_id: &PaymentId,
        credentials: &PaymentAppCredentials,
    ) -> Result<DeletionOutcome> {
        let key = match provider_key(credentials) {
            Ok(key) => key,
            Err(reason) => {
                tracing::warn!(
                    "Payment {} cannot be deleted at its provider: {}",
                    payment_id,
                    reason
                );
                return Ok(DeletionOutcome::Unavailable(reason));
            }
        };

        let module = self.registry.resolve(&key).await?;
        let factory = match payment_service(&module) {
            Ok(factory) => factory,
            Err(reason) => {
                tracing::warn!(
                    "Payment app service of type '{}' is not implemented ({})",
                    key,
                    reason
                );
                return Ok(DeletionOutcome::Unavailable(reason));
            }
        };

        let service = factory.create(credentials)?;
        tracing::debug!("Deleting payment {} via provider '{}'", payment_id, key);
        let deleted = service.delete_payment(payment_id).await?;

        if deleted {
            tracing::info!("Payment {} deleted by provider '{}'", payment_id, key);
        } else {
            tracing::info!("Provider '{}' declined to delete payment {}", key, payment_id);
        }
        Ok(DeletionOutcome::from(deleted))
    }

    /// Reports whether the payment's provider implements deletion, without
    /// contacting the provider.
    pub async fn supports_deletion(&self, credentials: &PaymentAppCredentials) -> Result<bool> {
        let Ok(key) = provider_key(credentials) else {
            return Ok(false);
        };
        let module = self.registry.resolve(&key).await?;
        Ok(payment_service(&module).is_ok())
    }
}

fn provider_key(
    credentials: &PaymentAppCredentials,
) -> std::result::Result<ProviderKey, UnavailableReason> {
    let dir_name = credentials.dir_name().ok_or(UnavailableReason::MissingApp)?;
    ProviderKey::parse(dir_name).ok_or(UnavailableReason::InvalidKey)
}

fn payment_service(
    module: &ProviderModule,
) -> std::result::Result<&Arc<dyn PaymentServiceFactory>, UnavailableReason> {
    let lib = module.lib.as_ref().ok_or(UnavailableReason::MissingLib)?;
    lib.payment_service
        .as_ref()
        .ok_or(UnavailableReason::MissingPaymentService)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{AppMetadata, ProviderLib};
    use crate::domain::ports::{PaymentService, ProviderLoader};
    use crate::utils::error::DispatchError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Calls {
        created: AtomicUsize,
        deleted: Mutex<Vec<String>>,
        seen_keys: Mutex<Vec<serde_json::Value>>,
    }

    struct RecordingService {
        calls: Arc<Calls>,
        result: std::result::Result<bool, u16>,
    }

    #[async_trait]
    impl PaymentService for RecordingService {
        async fn delete_payment(&self, payment_id: &PaymentId) -> Result<bool> {
            self.calls
                .deleted
                .lock()
                .unwrap()
                .push(payment_id.to_string());
            self.result.map_err(|status| DispatchError::ProviderOperation {
                provider: "recording".to_string(),
                status,
                message: "rejected".to_string(),
            })
        }
    }

    struct RecordingFactory {
        calls: Arc<Calls>,
        result: std::result::Result<bool, u16>,
    }

    impl PaymentServiceFactory for RecordingFactory {
        fn create(&self, credentials: &PaymentAppCredentials) -> Result<Box<dyn PaymentService>> {
            self.calls.created.fetch_add(1, Ordering::SeqCst);
            self.calls
                .seen_keys
                .lock()
                .unwrap()
                .push(credentials.key.clone());
            Ok(Box::new(RecordingService {
                calls: Arc::clone(&self.calls),
                result: self.result,
            }))
        }
    }

    struct FixedLoader {
        lib: Option<ProviderLib>,
    }

    #[async_trait]
    impl ProviderLoader for FixedLoader {
        async fn load(&self, key: &ProviderKey) -> Result<ProviderModule> {
            Ok(ProviderModule::new(key.clone(), key.as_str(), self.lib.clone()))
        }
    }

    fn dispatcher_with(
        result: std::result::Result<bool, u16>,
    ) -> (PaymentDispatcher, Arc<Calls>) {
        let calls = Arc::new(Calls::default());
        let factory: Arc<dyn PaymentServiceFactory> = Arc::new(RecordingFactory {
            calls: Arc::clone(&calls),
            result,
        });
        let registry = ProviderRegistry::builder()
            .register(
                ProviderKey::parse("stripe").unwrap(),
                Arc::new(FixedLoader {
                    lib: Some(ProviderLib {
                        payment_service: Some(factory),
                    }),
                }),
            )
            .register(
                ProviderKey::parse("paypal").unwrap(),
                Arc::new(FixedLoader {
                    lib: Some(ProviderLib::default()),
                }),
            )
            .register(
                ProviderKey::parse("bare").unwrap(),
                Arc::new(FixedLoader { lib: None }),
            )
            .build();
        (PaymentDispatcher::new(Arc::new(registry)), calls)
    }

    fn credentials(dir_name: &str) -> PaymentAppCredentials {
        PaymentAppCredentials {
            key: json!({ "api_key": "sk_test" }),
            app_id: Some(dir_name.to_string()),
            app: Some(AppMetadata {
                dir_name: dir_name.to_string(),
                categories: vec![],
            }),
        }
    }

    #[tokio::test]
    async fn test_missing_app_skips_registry() {
        let (dispatcher, calls) = dispatcher_with(Ok(true));
        let outcome = dispatcher
            .dispatch_delete(&"pay_1".into(), &PaymentAppCredentials::default())
            .await
            .unwrap();

        assert_eq!(outcome, DeletionOutcome::Unavailable(UnavailableReason::MissingApp));
        assert_eq!(dispatcher.registry().stats().lookups, 0);
        assert_eq!(calls.created.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_dir_name_is_unavailable() {
        let (dispatcher, _) = dispatcher_with(Ok(true));
        let outcome = dispatcher
            .dispatch_delete(&"pay_1".into(), &credentials(""))
            .await
            .unwrap();

        assert_eq!(outcome, DeletionOutcome::Unavailable(UnavailableReason::InvalidKey));
        assert_eq!(dispatcher.registry().stats().lookups, 0);
    }

    #[tokio::test]
    async fn test_service_constructed_once_and_invoked_once() {
        let (dispatcher, calls) = dispatcher_with(Ok(true));
        let deleted = dispatcher
            .delete_payment(&"pay_1".into(), &credentials("stripe"))
            .await
            .unwrap();

        assert!(deleted);
        assert_eq!(calls.created.load(Ordering::SeqCst), 1);
        assert_eq!(*calls.deleted.lock().unwrap(), vec!["pay_1".to_string()]);
        assert_eq!(
            *calls.seen_keys.lock().unwrap(),
            vec![json!({ "api_key": "sk_test" })]
        );
    }

    #[tokio::test]
    async fn test_each_call_gets_its_own_service() {
        let (dispatcher, calls) = dispatcher_with(Ok(false));
        for id in ["pay_1", "pay_2"] {
            let outcome = dispatcher
                .dispatch_delete(&id.into(), &credentials("stripe"))
                .await
                .unwrap();
            assert_eq!(outcome, DeletionOutcome::Declined);
        }
        assert_eq!(calls.created.load(Ordering::SeqCst), 2);
        assert_eq!(dispatcher.registry().stats().initializations, 1);
    }

    #[tokio::test]
    async fn test_missing_capability_is_not_an_error() {
        let (dispatcher, calls) = dispatcher_with(Ok(true));

        let collector = dispatcher
            .dispatch_delete(&"pay_1".into(), &credentials("paypal"))
            .await
            .unwrap();
        assert_eq!(
            collector,
            DeletionOutcome::Unavailable(UnavailableReason::MissingPaymentService)
        );

        let bare = dispatcher
            .delete_payment(&"pay_1".into(), &credentials("bare"))
            .await
            .unwrap();
        assert!(!bare);
        assert_eq!(calls.created.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_provider_propagates() {
        let (dispatcher, _) = dispatcher_with(Ok(true));
        let err = dispatcher
            .delete_payment(&"pay_1".into(), &credentials("unknown_app"))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::ProviderNotFound { .. }));
    }

    #[tokio::test]
    async fn test_provider_failure_is_not_masked() {
        let (dispatcher, calls) = dispatcher_with(Err(502));
        let err = dispatcher
            .delete_payment(&"pay_9".into(), &credentials("stripe"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DispatchError::ProviderOperation { status: 502, .. }
        ));
        assert_eq!(calls.deleted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_supports_deletion() {
        let (dispatcher, calls) = dispatcher_with(Ok(true));
        assert!(dispatcher.supports_deletion(&credentials("stripe")).await.unwrap());
        assert!(!dispatcher.supports_deletion(&credentials("paypal")).await.unwrap());
        assert!(!dispatcher
            .supports_deletion(&PaymentAppCredentials::default())
            .await
            .unwrap());
        assert!(dispatcher
            .supports_deletion(&credentials("unknown_app"))
            .await
            .is_err());
        assert_eq!(calls.created.load(Ordering::SeqCst), 0);
    }
}
