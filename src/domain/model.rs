use crate::domain::ports::PaymentServiceFactory;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock};

const MAX_PROVIDER_KEY_LEN: usize = 64;

fn provider_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.\-]*$").expect("provider key pattern is valid")
    })
}

/// Stable identifier of an installed payment provider, e.g. its app directory name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ProviderKey(String);

impl ProviderKey {
    /// Returns `None` when `raw` cannot be a registry key at all.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() > MAX_PROVIDER_KEY_LEN || !provider_key_pattern().is_match(raw) {
            return None;
        }
        Some(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(String);

impl PaymentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PaymentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppCategory {
    Payment,
    Calendar,
    Conferencing,
    Messaging,
    Crm,
    Analytics,
    Automation,
    Video,
    Web3,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppMetadata {
    /// Passed through verbatim from the persistence layer.
    pub dir_name: String,
    #[serde(default)]
    pub categories: Vec<AppCategory>,
}

/// Credentials of the app that created a payment, as stored alongside it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentAppCredentials {
    #[serde(default)]
    pub key: serde_json::Value,
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub app: Option<AppMetadata>,
}

impl PaymentAppCredentials {
    pub fn for_app(dir_name: impl Into<String>, key: serde_json::Value) -> Self {
        let dir_name = dir_name.into();
        Self {
            key,
            app_id: Some(dir_name.clone()),
            app: Some(AppMetadata {
                dir_name,
                categories: vec![AppCategory::Payment],
            }),
        }
    }

    pub fn dir_name(&self) -> Option<&str> {
        self.app.as_ref().map(|app| app.dir_name.as_str())
    }

    /// Looks up a string field of the opaque credential key.
    pub fn key_str(&self, field: &str) -> Option<&str> {
        self.key.get(field).and_then(|v| v.as_str())
    }
}

/// Exports of a provider module. A provider that only collects payment
/// methods has a lib but no payment service.
#[derive(Clone, Default)]
pub struct ProviderLib {
    pub payment_service: Option<Arc<dyn PaymentServiceFactory>>,
}

impl fmt::Debug for ProviderLib {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderLib")
            .field("payment_service", &self.payment_service.is_some())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ProviderModule {
    pub key: ProviderKey,
    pub display_name: String,
    pub lib: Option<ProviderLib>,
    pub loaded_at: DateTime<Utc>,
}

impl ProviderModule {
    pub fn new(key: ProviderKey, display_name: impl Into<String>, lib: Option<ProviderLib>) -> Self {
        Self {
            key,
            display_name: display_name.into(),
            lib,
            loaded_at: Utc::now(),
        }
    }

    pub fn payment_service(&self) -> Option<&Arc<dyn PaymentServiceFactory>> {
        self.lib.as_ref()?.payment_service.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    /// The payment has no originating app record.
    MissingApp,
    /// The app's directory name cannot be a registry key.
    InvalidKey,
    MissingLib,
    MissingPaymentService,
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            UnavailableReason::MissingApp => "no app metadata",
            UnavailableReason::InvalidKey => "invalid provider key",
            UnavailableReason::MissingLib => "provider has no lib",
            UnavailableReason::MissingPaymentService => "provider has no payment service",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum DeletionOutcome {
    Deleted,
    /// The provider answered but did not delete anything.
    Declined,
    Unavailable(UnavailableReason),
}

impl DeletionOutcome {
    pub fn is_deleted(&self) -> bool {
        matches!(self, DeletionOutcome::Deleted)
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, DeletionOutcome::Unavailable(_))
    }
}

impl From<bool> for DeletionOutcome {
    fn from(deleted: bool) -> Self {
        if deleted {
            DeletionOutcome::Deleted
        } else {
            DeletionOutcome::Declined
        }
    }
}
