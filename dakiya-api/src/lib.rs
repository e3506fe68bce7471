//! Dakiya API - HTTP surface for the parcel dialogue engine
//!
//! Exposes the turn endpoint, conversation lifecycle operations, catalog
//! listing/refresh, and health checks over axum, plus the reqwest-backed
//! clients for the parcel backend.

pub mod clients;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use clients::{HttpCatalogSource, HttpParcelSubmitter};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::AppState;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Assemble the full application router.
pub fn create_api_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::turns::create_router(state.clone()))
        .merge(routes::catalog::create_router(state.clone()));

    Router::new()
        .nest("/health", routes::health::create_router(state))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
