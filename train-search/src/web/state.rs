//! Application state for the web layer.

use std::sync::Arc;

use crate::catalog::SharedCatalog;
use crate::search::{SearchConfig, TrainSearchEngine};

/// The engine as served: both catalogs backed by one refreshable snapshot.
pub type Engine = TrainSearchEngine<SharedCatalog, SharedCatalog>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
}

impl AppState {
    pub fn new(catalog: SharedCatalog, config: SearchConfig) -> Self {
        Self {
            engine: Arc::new(TrainSearchEngine::new(catalog.clone(), catalog, config)),
        }
    }
}
