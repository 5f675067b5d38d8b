use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Payment provider '{key}' is not installed in the registry")]
    ProviderNotFound { key: String },

    #[error("Payment provider '{key}' failed to initialize: {message}")]
    ProviderInit { key: String, message: String },

    #[error("Invalid credentials for provider '{provider}': {message}")]
    InvalidCredentials { provider: String, message: String },

    #[error("Provider '{provider}' rejected the operation (status {status}): {message}")]
    ProviderOperation {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Registry,
    Provider,
    Network,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl DispatchError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DispatchError::ProviderNotFound { .. } | DispatchError::ProviderInit { .. } => {
                ErrorCategory::Registry
            }
            DispatchError::InvalidCredentials { .. } | DispatchError::ProviderOperation { .. } => {
                ErrorCategory::Provider
            }
            DispatchError::Http(_) => ErrorCategory::Network,
            DispatchError::Io(_) | DispatchError::Serialization(_) => ErrorCategory::Data,
            DispatchError::ConfigValidationError { .. }
            | DispatchError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 註冊表與設定不一致屬於部署錯誤
            DispatchError::ProviderNotFound { .. } => ErrorSeverity::Critical,
            DispatchError::ConfigValidationError { .. }
            | DispatchError::InvalidConfigValueError { .. } => ErrorSeverity::Critical,
            DispatchError::Http(_) => ErrorSeverity::Medium,
            DispatchError::ProviderOperation { status, .. } if *status >= 500 || *status == 429 => {
                ErrorSeverity::Medium
            }
            DispatchError::ProviderOperation { .. }
            | DispatchError::ProviderInit { .. }
            | DispatchError::InvalidCredentials { .. }
            | DispatchError::Io(_)
            | DispatchError::Serialization(_) => ErrorSeverity::High,
        }
    }

    /// Hint only. Retrying is the caller's decision.
    pub fn is_retryable(&self) -> bool {
        match self {
            DispatchError::Http(e) => e.is_timeout() || e.is_connect(),
            DispatchError::ProviderOperation { status, .. } => *status >= 500 || *status == 429,
            DispatchError::ProviderInit { .. } => true,
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            DispatchError::ProviderNotFound { .. } => {
                "Install the provider or add it to the registry configuration"
            }
            DispatchError::ProviderInit { .. } => "Check the provider settings and try again",
            DispatchError::InvalidCredentials { .. } => {
                "Reconnect the payment app so that its credentials are refreshed"
            }
            DispatchError::ProviderOperation { .. } => {
                "Inspect the payment in the provider dashboard before retrying"
            }
            DispatchError::Http(_) => "Check network connectivity to the payment provider",
            DispatchError::Io(_) => "Check that the file exists and is readable",
            DispatchError::Serialization(_) => "Check that the credentials are valid JSON",
            DispatchError::ConfigValidationError { .. }
            | DispatchError::InvalidConfigValueError { .. } => {
                "Fix the registry configuration file and run again"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Registry => format!("Provider registry problem: {}", self),
            ErrorCategory::Provider => format!("The payment provider reported a failure: {}", self),
            ErrorCategory::Network => {
                format!("Could not reach the payment provider: {}", self)
            }
            ErrorCategory::Data => format!("Could not read input: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;
