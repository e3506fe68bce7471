//! HTTP parcel submitter
//!
//! Posts the completed parcel to the backend. Only canonical IDs and
//! validated values cross this boundary. A 4xx response is a terminal
//! validation rejection; connectivity problems and 5xx responses are
//! retryable transport failures.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use dakiya_core::{CompleteEntitySet, SubmissionReceipt, SubmitError};
use dakiya_engine::ParcelSubmitter;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub struct HttpParcelSubmitter {
    client: Client,
    base_url: String,
    auth_header: String,
}

#[derive(Debug, Serialize)]
struct ParcelPayload<'a> {
    company_name: &'a str,
    from_city: &'a str,
    to_city: &'a str,
    material_type: &'a str,
    quantity: f64,
    quantity_unit: &'static str,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ParcelResponse {
    #[serde(alias = "_id")]
    tracking_id: String,
    #[serde(default)]
    cost: i64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(alias = "_error")]
    error: Option<ErrorDetail>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl HttpParcelSubmitter {
    pub fn new(base_url: impl Into<String>, username: &str, password: &str) -> Self {
        let token = BASE64.encode(format!("{username}:{password}"));
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            auth_header: format!("Basic {token}"),
        }
    }

    fn payload(parcel: &CompleteEntitySet) -> ParcelPayload<'_> {
        ParcelPayload {
            company_name: &parcel.company,
            from_city: &parcel.origin_city.canonical_id,
            to_city: &parcel.destination_city.canonical_id,
            material_type: &parcel.material.canonical_id,
            quantity: parcel.weight_kg.kg(),
            quantity_unit: "KILOGRAMS",
            description: format!(
                "{} kg {} for {}",
                parcel.weight_kg.kg(),
                parcel.material.display_name,
                parcel.company
            ),
        }
    }
}

#[async_trait]
impl ParcelSubmitter for HttpParcelSubmitter {
    async fn create_parcel(
        &self,
        parcel: &CompleteEntitySet,
    ) -> Result<SubmissionReceipt, SubmitError> {
        let url = format!("{}/parcels", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", &self.auth_header)
            .json(&Self::payload(parcel))
            .send()
            .await
            .map_err(|e| SubmitError::Transport {
                reason: format!("HTTP request failed: {}", e),
            })?;

        let status = response.status();
        if status.is_success() {
            let parsed: ParcelResponse =
                response.json().await.map_err(|e| SubmitError::Transport {
                    reason: format!("Failed to parse response: {}", e),
                })?;
            return Ok(SubmissionReceipt {
                tracking_id: parsed.tracking_id,
                cost: parsed.cost,
            });
        }

        let body = response.text().await.unwrap_or_default();
        let reason = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|parsed| parsed.error.map(|e| e.message).or(parsed.message))
            .unwrap_or_else(|| format!("status {}", status));

        if status.is_client_error() {
            Err(SubmitError::ValidationRejected { reason })
        } else {
            Err(SubmitError::Transport {
                reason: format!("{}: {}", status, reason),
            })
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
