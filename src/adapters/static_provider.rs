use crate::domain::model::{PaymentAppCredentials, PaymentId};
use crate::domain::ports::{PaymentService, PaymentServiceFactory};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Provider that never leaves the process. Useful for mock payment apps.
#[derive(Debug, Clone, Copy)]
pub struct StaticPaymentFactory {
    result: bool,
}

impl StaticPaymentFactory {
    pub fn new(result: bool) -> Self {
        Self { result }
    }
}

impl PaymentServiceFactory for StaticPaymentFactory {
    fn create(&self, _credentials: &PaymentAppCredentials) -> Result<Box<dyn PaymentService>> {
        Ok(Box::new(StaticPaymentService {
            result: self.result,
        }))
    }
}

struct StaticPaymentService {
    result: bool,
}

#[async_trait]
impl PaymentService for StaticPaymentService {
    async fn delete_payment(&self, payment_id: &PaymentId) -> Result<bool> {
        tracing::debug!("Static provider answering {} for payment {}", self.result, payment_id);
        Ok(self.result)
    }
}
