//! Catalog endpoints
//!
//! - GET  /api/v1/catalog/cities
//! - GET  /api/v1/catalog/materials
//! - POST /api/v1/catalog/refresh - Build and swap in a new snapshot

use crate::error::ApiResult;
use crate::state::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use dakiya_core::CatalogEntry;
use dakiya_engine::ReferenceCatalog;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CatalogListResponse {
    pub entries: Vec<CatalogEntry>,
    /// True while the engine runs on the built-in fallback set.
    pub fallback: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshResponse {
    pub cities: usize,
    pub materials: usize,
    pub fallback: bool,
}

/// GET /api/v1/catalog/cities
pub async fn list_cities(State(state): State<AppState>) -> Json<CatalogListResponse> {
    let catalog = state.engine.catalog();
    Json(CatalogListResponse {
        entries: catalog.cities().to_vec(),
        fallback: catalog.is_fallback(),
    })
}

/// GET /api/v1/catalog/materials
pub async fn list_materials(State(state): State<AppState>) -> Json<CatalogListResponse> {
    let catalog = state.engine.catalog();
    Json(CatalogListResponse {
        entries: catalog.materials().to_vec(),
        fallback: catalog.is_fallback(),
    })
}

/// POST /api/v1/catalog/refresh
///
/// Builds a fresh snapshot from the configured source and swaps it in.
/// In-flight turns keep the snapshot they started with.
pub async fn refresh(State(state): State<AppState>) -> ApiResult<Json<RefreshResponse>> {
    let catalog = ReferenceCatalog::load(
        state.catalog_source.as_ref(),
        state.config.call_timeout,
        state.config.allow_catalog_fallback,
    )
    .await
    .map_err(dakiya_core::DakiyaError::from)?;

    let response = RefreshResponse {
        cities: catalog.cities().len(),
        materials: catalog.materials().len(),
        fallback: catalog.is_fallback(),
    };
    state.engine.swap_catalog(catalog);
    Ok(Json(response))
}

/// Create the catalog router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/catalog/cities", get(list_cities))
        .route("/catalog/materials", get(list_materials))
        .route("/catalog/refresh", post(refresh))
        .with_state(state)
}
