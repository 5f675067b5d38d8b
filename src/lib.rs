pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::RegistryConfig;
pub use crate::core::{
    dispatcher::PaymentDispatcher,
    registry::{ProviderRegistry, RegistryStats},
};
pub use domain::model::{
    AppCategory, AppMetadata, DeletionOutcome, PaymentAppCredentials, PaymentId, ProviderKey,
    ProviderLib, ProviderModule, UnavailableReason,
};
pub use domain::ports::{PaymentService, PaymentServiceFactory, ProviderLoader};
pub use utils::error::{DispatchError, Result};
