use crate::api::models::AppState;
use crate::api::orders::handlers::{
    create_order_handler, list_all_orders_handler, list_orders_handler, update_status_handler,
};
use axum::{
    Router,
    routing::{get, patch},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders_handler).post(create_order_handler))
        .route("/admin/orders", get(list_all_orders_handler))
        .route("/admin/orders/{id}", patch(update_status_handler))
}
