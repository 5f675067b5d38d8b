use crate::domain::model::ProviderKey;
use crate::utils::error::{DispatchError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const DEFAULT_DELETE_PATH: &str = "/payments/{payment_id}";
pub const PAYMENT_ID_PLACEHOLDER: &str = "{payment_id}";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_CREDENTIAL_FIELD: &str = "api_key";

const SUPPORTED_METHODS: [&str; 2] = ["DELETE", "POST"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub registry: RegistrySection,
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrySection {
    pub name: Option<String>,
    pub log_format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub key: String,
    pub display_name: Option<String>,
    #[serde(flatten)]
    pub kind: ProviderKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProviderKind {
    /// REST gateway that cancels payments over HTTP.
    Http(HttpGatewayConfig),
    /// Always answers with a fixed result.
    Static {
        #[serde(default = "default_static_result")]
        result: bool,
    },
    /// Collects payment methods only; exports no payment service.
    Collector,
    /// Module without a lib.
    Bare,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpGatewayConfig {
    pub base_url: String,
    pub delete_path: Option<String>,
    pub method: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub credential_field: Option<String>,
    pub headers: Option<HashMap<String, String>>,
}

fn default_static_result() -> bool {
    true
}

impl HttpGatewayConfig {
    pub fn delete_path(&self) -> &str {
        self.delete_path.as_deref().unwrap_or(DEFAULT_DELETE_PATH)
    }

    pub fn method(&self) -> &str {
        self.method.as_deref().unwrap_or("DELETE")
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }

    pub fn credential_field(&self) -> &str {
        self.credential_field
            .as_deref()
            .unwrap_or(DEFAULT_CREDENTIAL_FIELD)
    }
}

impl ProviderConfig {
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.key)
    }

    fn validate_at(&self, index: usize) -> Result<()> {
        let field = |name: &str| format!("providers[{}].{}", index, name);

        if ProviderKey::parse(&self.key).is_none() {
            return Err(DispatchError::InvalidConfigValueError {
                field: field("key"),
                value: self.key.clone(),
                reason: "Provider keys must start with a letter or digit and contain only letters, digits, '_', '-' or '.'".to_string(),
            });
        }

        if let ProviderKind::Http(http) = &self.kind {
            validation::validate_url(&field("base_url"), &http.base_url)?;
            if !http.delete_path().contains(PAYMENT_ID_PLACEHOLDER) {
                return Err(DispatchError::InvalidConfigValueError {
                    field: field("delete_path"),
                    value: http.delete_path().to_string(),
                    reason: format!("Path must contain {}", PAYMENT_ID_PLACEHOLDER),
                });
            }
            validation::validate_one_of(&field("method"), http.method(), &SUPPORTED_METHODS)?;
            validation::validate_range(&field("timeout_seconds"), http.timeout_seconds(), 1, 300)?;
            validation::validate_non_empty_string(
                &field("credential_field"),
                http.credential_field(),
            )?;
        }

        Ok(())
    }
}

impl RegistryConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(DispatchError::Io)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| DispatchError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${STRIPE_API_BASE})
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::OnceLock;

        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        if self.providers.is_empty() {
            return Err(DispatchError::ConfigValidationError {
                field: "providers".to_string(),
                message: "At least one provider must be configured".to_string(),
            });
        }

        for (index, provider) in self.providers.iter().enumerate() {
            provider.validate_at(index)?;
        }

        validation::validate_unique(
            "providers.key",
            self.providers.iter().map(|p| p.key.as_str()),
        )?;

        if let Some(format) = &self.registry.log_format {
            validation::validate_one_of("registry.log_format", format, &["compact", "json"])?;
        }

        Ok(())
    }

    pub fn name(&self) -> &str {
        self.registry.name.as_deref().unwrap_or("payments")
    }

    pub fn json_logs(&self) -> bool {
        self.registry.log_format.as_deref() == Some("json")
    }

    pub fn provider(&self, key: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.key == key)
    }
}

impl Validate for RegistryConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
