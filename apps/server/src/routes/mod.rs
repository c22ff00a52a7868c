//! HTTP route modules, one per domain, merged into a single router.

use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod customer;
pub mod employee;
pub mod group;
pub mod mesa;
pub mod product;
pub mod sale;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .merge(customer::router())
        .merge(employee::router())
        .merge(group::router())
        .merge(mesa::router())
        .merge(product::router())
        .merge(sale::router())
        // The React dev server runs on another port
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
