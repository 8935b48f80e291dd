use crate::api::appointments::handlers::{
    create_appointment_handler, list_all_appointments_handler, list_appointments_handler,
};
use crate::api::models::AppState;
use axum::{Router, routing::get};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/appointments",
            get(list_appointments_handler).post(create_appointment_handler),
        )
        .route("/admin/appointments", get(list_all_appointments_handler))
}
