pub mod appointments;
pub mod auth;
pub mod cart;
pub mod extract;
pub mod models;
pub mod orders;

// Re-exports
pub use models::*;

use axum::{Json, Router, routing::get};

// Health handler (simple, keep here)
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Every route the API serves, relative to the `/api` prefix
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .merge(auth::routes())
        .merge(cart::routes())
        .merge(orders::routes())
        .merge(appointments::routes())
}
