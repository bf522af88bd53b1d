//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::store::BookStore;

/// Application state shared across handlers
///
/// Cloned into every request; the configuration sits behind an `Arc` and the
/// store handles are themselves cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    config: Arc<Config>,
    store: BookStore,
}

impl AppState {
    /// Create state from loaded configuration and a connected store
    pub fn new(config: Config, store: BookStore) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the book store
    pub fn store(&self) -> &BookStore {
        &self.store
    }
}
