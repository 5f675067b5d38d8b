pub mod dispatcher;
pub mod registry;

pub use crate::domain::model::{
    AppCategory, AppMetadata, DeletionOutcome, PaymentAppCredentials, PaymentId, ProviderKey,
    ProviderLib, ProviderModule, UnavailableReason,
};
pub use crate::domain::ports::{PaymentService, PaymentServiceFactory, ProviderLoader};
pub use crate::utils::error::Result;
