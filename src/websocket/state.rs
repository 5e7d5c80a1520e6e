//! Shared application state handed to every Axum handler.

use std::sync::Arc;

use crate::catalogue::Catalogue;
use crate::config::Config;
use crate::metrics::ServerMetrics;
use crate::room::RoomRegistry;

/// Everything a WebSocket connection or HTTP handler needs, cloned cheaply
/// behind `Arc`s and installed as Axum's `State`.
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: RoomRegistry,
    pub catalogue: Arc<Catalogue>,
    pub metrics: Arc<ServerMetrics>,
}

impl AppState {
    #[must_use]
    pub fn new(config: Arc<Config>, catalogue: Arc<Catalogue>) -> Arc<Self> {
        let metrics = Arc::new(ServerMetrics::new());
        let registry = RoomRegistry::new(
            Arc::new(config.server.clone()),
            Arc::clone(&catalogue),
            Arc::clone(&metrics),
        );
        Arc::new(Self {
            config,
            registry,
            catalogue,
            metrics,
        })
    }
}
