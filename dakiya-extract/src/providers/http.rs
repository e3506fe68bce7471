//! HTTP inference provider
//!
//! Calls a hosted extraction endpoint with the utterance and the
//! conversation's entity context, expecting a JSON candidate set back.

use crate::InferenceProvider;
use async_trait::async_trait;
use dakiya_core::{CandidateEntities, EntitySet, ExtractError};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

/// Inference provider backed by an HTTP extraction service.
pub struct HttpInferenceProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct InferRequest<'a> {
    model: &'a str,
    utterance: &'a str,
    context: &'a EntitySet,
}

#[derive(Deserialize)]
struct InferResponse {
    entities: CandidateEntities,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl HttpInferenceProvider {
    /// Create a new HTTP provider.
    ///
    /// # Arguments
    /// * `base_url` - Service base URL, without a trailing slash
    /// * `api_key` - Bearer token for the service
    /// * `model` - Model identifier passed through to the service
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    async fn post_infer(
        &self,
        utterance: &str,
        context: &EntitySet,
    ) -> Result<CandidateEntities, ExtractError> {
        let url = format!("{}/v1/extract", self.base_url);
        let body = InferRequest {
            model: &self.model,
            utterance,
            context,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ExtractError::Unavailable {
                provider: self.provider_id().to_string(),
                reason: format!("HTTP request failed: {}", e),
            })?;

        let status = response.status();

        if status.is_success() {
            let parsed: InferResponse =
                response.json().await.map_err(|e| ExtractError::Malformed {
                    provider: self.provider_id().to_string(),
                    reason: format!("Failed to parse response: {}", e),
                })?;
            return Ok(parsed.entities);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = match serde_json::from_str::<ApiErrorBody>(&error_text) {
            Ok(body) => body.error.message,
            Err(_) => error_text,
        };

        Err(match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ExtractError::Malformed {
                provider: self.provider_id().to_string(),
                reason: message,
            },
            _ => ExtractError::Unavailable {
                provider: self.provider_id().to_string(),
                reason: format!("{}: {}", status, message),
            },
        })
    }
}

#[async_trait]
impl InferenceProvider for HttpInferenceProvider {
    async fn infer(
        &self,
        utterance: &str,
        context: &EntitySet,
    ) -> Result<CandidateEntities, ExtractError> {
        self.post_infer(utterance, context).await
    }

    fn provider_id(&self) -> &str {
        "http"
    }
}

// ============================================================================
// TESTS
// ============================================================================
