//! Shared application state for HTTP handlers.

use boteco_db::Database;

use crate::config::ServerConfig;

/// State shared by every route through the axum router.
///
/// Cloning is cheap: `Database` wraps a pooled connection handle.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        AppState { db, config }
    }
}
