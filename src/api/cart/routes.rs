use crate::api::cart::handlers::{get_cart_handler, update_cart_handler};
use crate::api::models::AppState;
use axum::{Router, routing::get};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(get_cart_handler).post(update_cart_handler))
}
