pub mod autocomplete;
pub mod cli;
pub mod config;
pub mod geocode;
pub mod observability;
pub mod registry;
pub mod rest;

use std::sync::Arc;

use config::{AppConfig, HotConfig};
use geocode::GeocodeClient;
use registry::Registry;
use tokio::sync::RwLock;

/// Shared application state passed to every REST handler.
///
/// All collaborators are explicitly constructed at startup and injected here —
/// there are no ambient global service handles.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    /// Shop and user registry (SQLite).
    pub registry: Arc<Registry>,
    /// Client for the external geocoding search endpoint.
    pub geocoder: Arc<GeocodeClient>,
    pub started_at: std::time::Instant,
    /// Hot-reloadable config subset (log level, geocoder result limit).
    /// `None` when the config watcher could not be started.
    pub hot: Option<Arc<RwLock<HotConfig>>>,
}
