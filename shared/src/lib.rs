pub mod config;
pub mod payload;
pub mod sanitize;
pub mod store;
pub mod upload;

use std::sync::Arc;

use crate::config::RelayConfig;

/// Shared application state, built once at startup.
pub struct AppState {
    pub config: RelayConfig,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Arc<Self> {
        Arc::new(Self { config })
    }
}
