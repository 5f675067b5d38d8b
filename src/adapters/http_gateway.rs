//! Payment provider backed by a REST gateway.
//!
//! Deleting a payment sends one authenticated request to the gateway's
//! cancellation endpoint. The API key is read from the stored app credentials
//! each time a service is constructed.

use crate::config::toml_config::{HttpGatewayConfig, PAYMENT_ID_PLACEHOLDER};
use crate::domain::model::{PaymentAppCredentials, PaymentId, ProviderKey};
use crate::domain::ports::{PaymentService, PaymentServiceFactory};
use crate::utils::error::{DispatchError, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

const MAX_ERROR_BODY_CHARS: usize = 512;

pub struct HttpGatewayFactory {
    provider: ProviderKey,
    client: Client,
    config: HttpGatewayConfig,
    base_url: Url,
    method: Method,
}

impl HttpGatewayFactory {
    /// Builds the shared HTTP client for this provider.
    pub fn new(provider: ProviderKey, config: HttpGatewayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds()))
            .build()
            .map_err(|e| DispatchError::ProviderInit {
                key: provider.to_string(),
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        let base_url = Url::parse(&config.base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| DispatchError::ProviderInit {
                key: provider.to_string(),
                message: format!("Invalid base URL: {}", config.base_url),
            })?;

        let method = match config.method() {
            "POST" => Method::POST,
            "DELETE" => Method::DELETE,
            other => {
                return Err(DispatchError::ProviderInit {
                    key: provider.to_string(),
                    message: format!("Unsupported HTTP method: {}", other),
                })
            }
        };

        Ok(Self {
            provider,
            client,
            config,
            base_url,
            method,
        })
    }
}

impl PaymentServiceFactory for HttpGatewayFactory {
    fn create(&self, credentials: &PaymentAppCredentials) -> Result<Box<dyn PaymentService>> {
        let field = self.config.credential_field();
        let api_key = credentials
            .key_str(field)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| DispatchError::InvalidCredentials {
                provider: self.provider.to_string(),
                message: format!("credential key has no '{}' entry", field),
            })?;

        Ok(Box::new(HttpGatewayService {
            provider: self.provider.clone(),
            client: self.client.clone(),
            method: self.method.clone(),
            base_url: self.base_url.clone(),
            delete_path: self.config.delete_path().to_string(),
            headers: self.config.headers.clone().unwrap_or_default(),
            api_key: api_key.to_string(),
        }))
    }
}

pub struct HttpGatewayService {
    provider: ProviderKey,
    client: Client,
    method: Method,
    base_url: Url,
    delete_path: String,
    headers: HashMap<String, String>,
    api_key: String,
}

impl HttpGatewayService {
    /// The payment id is percent-encoded as part of a single path segment.
    fn delete_url(&self, payment_id: &PaymentId) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| DispatchError::ProviderInit {
                key: self.provider.to_string(),
                message: format!("Base URL cannot carry a path: {}", self.base_url),
            })?;
            segments.pop_if_empty();
            for segment in self.delete_path.split('/').filter(|s| !s.is_empty()) {
                segments.push(&segment.replace(PAYMENT_ID_PLACEHOLDER, payment_id.as_str()));
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl PaymentService for HttpGatewayService {
    async fn delete_payment(&self, payment_id: &PaymentId) -> Result<bool> {
        let url = self.delete_url(payment_id)?;
        tracing::debug!("{} {} for provider '{}'", self.method, url, self.provider);

        let mut request = self
            .client
            .request(self.method.clone(), url.clone())
            .bearer_auth(&self.api_key);
        for (name, value) in &self.headers {
            request = request.header(name, value);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("Provider '{}' answered {}", self.provider, status);

        if status.is_success() {
            return Ok(true);
        }

        match status {
            StatusCode::NOT_FOUND | StatusCode::CONFLICT | StatusCode::GONE => Ok(false),
            _ => Err(DispatchError::ProviderOperation {
                provider: self.provider.to_string(),
                status: status.as_u16(),
                message: error_message(response.text().await),
            }),
        }
    }
}

fn error_message(body: reqwest::Result<String>) -> String {
    match body {
        Ok(body) => body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        Err(e) => format!("<unreadable body: {}>", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn gateway(base_url: String, method: &str) -> HttpGatewayFactory {
        HttpGatewayFactory::new(
            ProviderKey::parse("stripe").unwrap(),
            HttpGatewayConfig {
                base_url,
                delete_path: Some("/v1/payment_intents/{payment_id}/cancel".to_string()),
                method: Some(method.to_string()),
                timeout_seconds: Some(5),
                credential_field: None,
                headers: Some(HashMap::from([(
                    "Stripe-Version".to_string(),
                    "2024-06-20".to_string(),
                )])),
            },
        )
        .unwrap()
    }

    fn credentials() -> PaymentAppCredentials {
        PaymentAppCredentials::for_app("stripe", json!({ "api_key": "sk_test_123" }))
    }

    #[tokio::test]
    async fn test_successful_cancel() {
        let server = MockServer::start();
        let cancel = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/payment_intents/pi_1/cancel")
                .header("authorization", "Bearer sk_test_123")
                .header("stripe-version", "2024-06-20");
            then.status(200).json_body(json!({ "id": "pi_1", "status": "canceled" }));
        });

        let service = gateway(server.base_url(), "POST").create(&credentials()).unwrap();
        assert!(service.delete_payment(&"pi_1".into()).await.unwrap());
        cancel.assert();
    }

    #[tokio::test]
    async fn test_missing_payment_is_declined() {
        let server = MockServer::start();
        let cancel = server.mock(|when, then| {
            when.method(DELETE).path("/v1/payment_intents/pi_gone/cancel");
            then.status(404);
        });

        let service = gateway(format!("{}/", server.base_url()), "DELETE")
            .create(&credentials())
            .unwrap();
        assert!(!service.delete_payment(&"pi_gone".into()).await.unwrap());
        cancel.assert();
    }

    #[tokio::test]
    async fn test_gateway_error_is_returned() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/payment_intents/pi_2/cancel");
            then.status(402).body("payment already captured");
        });

        let service = gateway(server.base_url(), "POST").create(&credentials()).unwrap();
        let err = service.delete_payment(&"pi_2".into()).await.unwrap_err();
        match err {
            DispatchError::ProviderOperation {
                provider,
                status,
                message,
            } => {
                assert_eq!(provider, "stripe");
                assert_eq!(status, 402);
                assert_eq!(message, "payment already captured");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    fn service(base_url: &str, delete_path: &str) -> HttpGatewayService {
        HttpGatewayService {
            provider: ProviderKey::parse("stripe").unwrap(),
            client: Client::new(),
            method: Method::DELETE,
            base_url: Url::parse(base_url).unwrap(),
            delete_path: delete_path.to_string(),
            headers: HashMap::new(),
            api_key: "k".to_string(),
        }
    }

    #[test]
    fn test_payment_id_is_encoded_as_path_segment() {
        let url = service("https://gateway.test", "/payments/{payment_id}")
            .delete_url(&"a/b c".into())
            .unwrap();
        assert_eq!(url.as_str(), "https://gateway.test/payments/a%2Fb%20c");

        let url = service("https://gateway.test/api/", "/v1/intents/pi_{payment_id}/cancel")
            .delete_url(&"1+2?x#y".into())
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://gateway.test/api/v1/intents/pi_1+2%3Fx%23y/cancel"
        );
    }

    #[tokio::test]
    async fn test_gateway_receives_payment_id_unchanged() {
        let server = MockServer::start();
        let exact = server.mock(|when, then| {
            when.method(DELETE).path("/payments/pay%201");
            then.status(204);
        });
        let plus = server.mock(|when, then| {
            when.method(DELETE).path("/payments/pay+1");
            then.status(204);
        });

        let factory = HttpGatewayFactory::new(
            ProviderKey::parse("stripe").unwrap(),
            HttpGatewayConfig {
                base_url: server.base_url(),
                delete_path: None,
                method: None,
                timeout_seconds: Some(5),
                credential_field: None,
                headers: None,
            },
        )
        .unwrap();
        let service = factory.create(&credentials()).unwrap();

        assert!(service.delete_payment(&"pay 1".into()).await.unwrap());
        exact.assert_hits(1);
        plus.assert_hits(0);
    }

    #[test]
    fn test_error_message_marks_unreadable_body() {
        assert_eq!(error_message(Ok("x".repeat(600))).len(), MAX_ERROR_BODY_CHARS);
        assert_eq!(error_message(Ok(String::new())), "");

        let read_error = Client::new().get("not a url").build().unwrap_err();
        let message = error_message(Err(read_error));
        assert!(message.starts_with("<unreadable body:"), "{}", message);
    }

    #[test]
    fn test_credentials_without_api_key_are_rejected() {
        let factory = gateway("https://gateway.test".to_string(), "POST");
        let credentials = PaymentAppCredentials::for_app("stripe", json!({ "token": "x" }));
        let err = factory.create(&credentials).err().unwrap();
        assert!(matches!(err, DispatchError::InvalidCredentials { .. }));

        let blank = PaymentAppCredentials::for_app("stripe", json!({ "api_key": " " }));
        assert!(factory.create(&blank).is_err());
    }
}
