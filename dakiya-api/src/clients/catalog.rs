//! HTTP catalog source
//!
//! Fetches the serviced city and material lists from the parcel backend
//! over Basic Auth. The backend historically served Eve-style documents
//! (`{"_items": [{"_id": ..., "name": ...}]}`); newer deployments return a
//! plain array, so both shapes are accepted.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use dakiya_core::{CatalogEntry, CatalogError, CatalogKind};
use dakiya_engine::CatalogSource;
use reqwest::Client;
use serde::Deserialize;

pub struct HttpCatalogSource {
    client: Client,
    base_url: String,
    auth_header: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListResponse {
    Wrapped {
        #[serde(rename = "_items")]
        items: Vec<RawEntry>,
    },
    Plain(Vec<RawEntry>),
}

impl ListResponse {
    fn into_entries(self) -> Vec<CatalogEntry> {
        let items = match self {
            Self::Wrapped { items } => items,
            Self::Plain(items) => items,
        };
        items
            .into_iter()
            .map(|raw| CatalogEntry::new(raw.id, raw.name))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(alias = "_id")]
    id: String,
    name: String,
}

impl HttpCatalogSource {
    pub fn new(
        base_url: impl Into<String>,
        username: &str,
        password: &str,
    ) -> Self {
        let token = BASE64.encode(format!("{username}:{password}"));
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            auth_header: format!("Basic {token}"),
        }
    }

    async fn fetch_list(&self, path: &str, kind: CatalogKind) -> Result<Vec<CatalogEntry>, CatalogError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .header("Authorization", &self.auth_header)
            .send()
            .await
            .map_err(|e| CatalogError::FetchFailed {
                kind,
                reason: format!("HTTP request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::FetchFailed {
                kind,
                reason: format!("unexpected status {}", status),
            });
        }

        let parsed: ListResponse = response.json().await.map_err(|e| CatalogError::Malformed {
            kind,
            reason: format!("Failed to parse response: {}", e),
        })?;
        Ok(parsed.into_entries())
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn list_cities(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        self.fetch_list("cities", CatalogKind::City).await
    }

    async fn list_materials(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        self.fetch_list("material_types", CatalogKind::Material).await
    }

    fn source_id(&self) -> &str {
        "backend"
    }
}

// ============================================================================
// TESTS
// ============================================================================
