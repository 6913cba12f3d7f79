//! Inference backend client.
//!
//! The assistant's replies come from a remote agent service that takes a
//! question plus the shopper's email and answers with text and, optionally,
//! a list of products.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use contoso_core::config::BackendConfig;
use contoso_core::types::Product;

use crate::error::ChatError;

/// Text used when the backend answers without an `answer` field.
pub const NO_ANSWER_TEXT: &str = "Sorry, I didn't understand that.";

/// Body of a chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRequest {
    pub question: String,
    pub email: String,
}

/// Body of a chat response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentReply {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub products: Option<Vec<Product>>,
    /// Set by the backend instead of `answer` when it cannot serve requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentReply {
    pub fn answer_text(&self) -> &str {
        self.answer.as_deref().unwrap_or(NO_ANSWER_TEXT)
    }

    /// Products worth showing: `None` when absent, null, or empty.
    pub fn into_products(self) -> Option<Vec<Product>> {
        self.products.filter(|p| !p.is_empty())
    }
}

/// A service that turns a question into a reply.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn ask(&self, request: &AgentRequest) -> Result<AgentReply, ChatError>;
}

/// JSON-over-HTTP backend client.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    url: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, ChatError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChatError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.endpoint_url(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl InferenceBackend for HttpBackend {
    async fn ask(&self, request: &AgentRequest) -> Result<AgentReply, ChatError> {
        let response = self.client.post(&self.url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::BackendStatus {
                status: status.as_u16(),
                body,
            });
        }

        let reply: AgentReply = response
            .json()
            .await
            .map_err(|e| ChatError::InvalidResponse(e.to_string()))?;

        if let Some(ref err) = reply.error {
            tracing::warn!(error = %err, "Backend reported an error");
        }
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_shape() {
        let req = AgentRequest {
            question: "show me phones".to_string(),
            email: "a@x.com".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"question": "show me phones", "email": "a@x.com"})
        );
    }

    #[test]
    fn test_reply_with_products() {
        let reply: AgentReply = serde_json::from_value(json!({
            "answer": "Here are some phones",
            "products": [{"name": "P1", "price": 10, "rating": 4}]
        }))
        .unwrap();
        assert_eq!(reply.answer_text(), "Here are some phones");
        assert_eq!(reply.into_products().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_or_null_answer_uses_fallback() {
        let reply: AgentReply = serde_json::from_value(json!({})).unwrap();
        assert_eq!(reply.answer_text(), NO_ANSWER_TEXT);

        let reply: AgentReply = serde_json::from_value(json!({"answer": null})).unwrap();
        assert_eq!(reply.answer_text(), NO_ANSWER_TEXT);
    }

    #[test]
    fn test_empty_or_null_products_are_none() {
        let reply: AgentReply =
            serde_json::from_value(json!({"answer": "ok", "products": []})).unwrap();
        assert!(reply.into_products().is_none());

        let reply: AgentReply =
            serde_json::from_value(json!({"answer": "ok", "products": null})).unwrap();
        assert!(reply.into_products().is_none());
    }

    #[test]
    fn test_error_field_is_captured() {
        let reply: AgentReply =
            serde_json::from_value(json!({"error": "Agent not ready yet."})).unwrap();
        assert_eq!(reply.error.as_deref(), Some("Agent not ready yet."));
        assert_eq!(reply.answer_text(), NO_ANSWER_TEXT);
    }

    #[test]
    fn test_http_backend_url_from_config() {
        let config = BackendConfig {
            base_url: "http://127.0.0.1:9999/".to_string(),
            ..BackendConfig::default()
        };
        let backend = HttpBackend::new(&config).unwrap();
        assert_eq!(backend.url(), "http://127.0.0.1:9999/agent");
    }
}
