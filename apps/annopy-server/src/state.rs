//! Application state management

use std::sync::Arc;

use crate::annotations::{CategoryRegistry, MemoryStore};
use crate::config::Config;
use crate::html::Highlighter;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    store: Arc<MemoryStore>,
    highlighter: Highlighter,
}

impl AppState {
    pub fn new(config: Config, categories: CategoryRegistry) -> Self {
        let highlighter = Highlighter::new(config.highlight());
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store: Arc::new(MemoryStore::new(categories)),
                highlighter,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the annotation store
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.inner.store
    }

    pub fn highlighter(&self) -> &Highlighter {
        &self.inner.highlighter
    }
}
