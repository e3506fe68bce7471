//! Shared application state for the HTTP layer

use crate::config::ApiConfig;
use dakiya_engine::{CatalogSource, DialogueEngine};
use std::sync::Arc;

/// State handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<DialogueEngine>,
    /// Kept alongside the engine so `POST /catalog/refresh` can build a new
    /// snapshot from the same source the server booted with.
    pub catalog_source: Arc<dyn CatalogSource>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(
        engine: Arc<DialogueEngine>,
        catalog_source: Arc<dyn CatalogSource>,
        config: ApiConfig,
    ) -> Self {
        Self {
            engine,
            catalog_source,
            config: Arc::new(config),
        }
    }
}
