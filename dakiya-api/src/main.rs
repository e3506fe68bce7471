//! Dakiya API server entry point
//!
//! Bootstraps tracing and configuration, loads the initial catalog
//! snapshot, wires the extraction and submission collaborators into the
//! dialogue engine, and serves the axum router.

use std::net::SocketAddr;
use std::sync::Arc;

use dakiya_api::{
    create_api_router, ApiConfig, ApiError, ApiResult, AppState, HttpCatalogSource,
    HttpParcelSubmitter,
};
use dakiya_core::EngineConfig;
use dakiya_engine::{CatalogSource, DialogueEngine, ReferenceCatalog};
use dakiya_extract::{Extractor, HttpInferenceProvider, RuleBasedProvider};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ApiResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ApiConfig::from_env();
    config.validate()?;

    let catalog_source: Arc<dyn CatalogSource> = Arc::new(HttpCatalogSource::new(
        config.backend_base_url.clone(),
        &config.backend_username,
        &config.backend_password,
    ));
    let catalog = ReferenceCatalog::load(
        catalog_source.as_ref(),
        config.call_timeout,
        config.allow_catalog_fallback,
    )
    .await
    .map_err(dakiya_core::DakiyaError::from)?;
    tracing::info!(
        cities = catalog.cities().len(),
        materials = catalog.materials().len(),
        fallback = catalog.is_fallback(),
        "catalog snapshot loaded"
    );

    let extractor = match &config.inference_base_url {
        Some(url) => Extractor::new(
            Arc::new(HttpInferenceProvider::new(
                url.clone(),
                config.inference_api_key.clone(),
                config.inference_model.clone(),
            )),
            config.call_timeout,
        )
        .with_fallback(Arc::new(RuleBasedProvider::new())),
        None => {
            tracing::warn!("no inference service configured, rule-based extraction only");
            Extractor::new(Arc::new(RuleBasedProvider::new()), config.call_timeout)
        }
    };

    let submitter = Arc::new(HttpParcelSubmitter::new(
        config.backend_base_url.clone(),
        &config.backend_username,
        &config.backend_password,
    ));

    let engine = DialogueEngine::new(
        extractor,
        catalog,
        submitter,
        EngineConfig {
            call_timeout: config.call_timeout,
            max_clarify_turns: config.max_clarify_turns,
            allow_catalog_fallback: config.allow_catalog_fallback,
        },
    )?;

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(Arc::new(engine), catalog_source, config);
    let app = create_api_router(state);

    let addr: SocketAddr = bind_addr
        .parse()
        .map_err(|e| ApiError::internal_error(format!("Invalid bind address {bind_addr}: {e}")))?;
    tracing::info!(%addr, "Starting Dakiya API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {addr}: {e}")))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {e}")))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
