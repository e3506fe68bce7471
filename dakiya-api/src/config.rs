//! API server configuration from environment variables

use crate::error::{ApiError, ApiResult};
use std::time::Duration;

/// Configuration for the API server and its outbound collaborators.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address for the HTTP server.
    pub bind_addr: String,
    /// Base URL of the parcel backend (catalog lists and parcel creation).
    pub backend_base_url: String,
    /// Basic Auth username for the backend.
    pub backend_username: String,
    /// Basic Auth password for the backend.
    pub backend_password: String,
    /// Base URL of the hosted inference service. When unset the rule-based
    /// extractor runs alone.
    pub inference_base_url: Option<String>,
    /// API key for the inference service.
    pub inference_api_key: String,
    /// Model identifier passed to the inference service.
    pub inference_model: String,
    /// Upper bound on any single collaborator call.
    pub call_timeout: Duration,
    /// Optional cap on clarification rounds.
    pub max_clarify_turns: Option<u32>,
    /// Whether catalog fetch failures fall back to the built-in set.
    pub allow_catalog_fallback: bool,
}

impl ApiConfig {
    /// Load configuration from `DAKIYA_*` environment variables.
    pub fn from_env() -> Self {
        Self {
            bind_addr: env_or("DAKIYA_BIND", "0.0.0.0:8080"),
            backend_base_url: env_or("DAKIYA_BACKEND_URL", ""),
            backend_username: env_or("DAKIYA_BACKEND_USER", ""),
            backend_password: env_or("DAKIYA_BACKEND_PASSWORD", ""),
            inference_base_url: std::env::var("DAKIYA_INFERENCE_URL").ok(),
            inference_api_key: env_or("DAKIYA_INFERENCE_API_KEY", ""),
            inference_model: env_or("DAKIYA_INFERENCE_MODEL", "extract-v1"),
            call_timeout: Duration::from_secs(
                std::env::var("DAKIYA_CALL_TIMEOUT_SECS")
                    .ok()
                    .and_then(|value| value.parse().ok())
                    .unwrap_or(30),
            ),
            max_clarify_turns: std::env::var("DAKIYA_MAX_CLARIFY_TURNS")
                .ok()
                .and_then(|value| value.parse().ok()),
            allow_catalog_fallback: std::env::var("DAKIYA_CATALOG_FALLBACK")
                .map(|value| value != "0" && value.to_lowercase() != "false")
                .unwrap_or(true),
        }
    }

    /// Validate the configuration before the server starts.
    pub fn validate(&self) -> ApiResult<()> {
        if self.backend_base_url.is_empty() {
            return Err(ApiError::internal_error(
                "DAKIYA_BACKEND_URL must be set",
            ));
        }
        if self.call_timeout.is_zero() {
            return Err(ApiError::internal_error(
                "DAKIYA_CALL_TIMEOUT_SECS must be positive",
            ));
        }
        if let Some(url) = &self.inference_base_url {
            if self.inference_api_key.is_empty() {
                return Err(ApiError::internal_error(format!(
                    "DAKIYA_INFERENCE_API_KEY must be set when DAKIYA_INFERENCE_URL ({url}) is"
                )));
            }
        }
        Ok(())
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
