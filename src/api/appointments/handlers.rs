use crate::api::extract::{AdminUser, AuthUser};
use crate::api::models::*;
use axum::{Json, extract::State, http::StatusCode};
use tracing::info;

pub async fn create_appointment_handler(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<AppointmentResponse>), AppError> {
    let appointment = request
        .validate(&user.user_id)
        .map_err(AppError::BadRequest)?;

    state.store.insert_appointment(&appointment).await?;

    info!(
        user_id = %user.user_id,
        appointment_id = %appointment.id,
        date = %appointment.date,
        service = %appointment.service,
        "Appointment booked"
    );

    Ok((
        StatusCode::CREATED,
        Json(AppointmentResponse {
            appointment: appointment.into(),
        }),
    ))
}

pub async fn list_appointments_handler(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<AppointmentsResponse>, AppError> {
    let appointments = state.store.list_appointments(Some(&user.user_id)).await?;

    Ok(Json(AppointmentsResponse {
        appointments: appointments.into_iter().map(AppointmentView::from).collect(),
    }))
}

pub async fn list_all_appointments_handler(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<AppointmentsResponse>, AppError> {
    let appointments = state.store.list_appointments(None).await?;

    Ok(Json(AppointmentsResponse {
        appointments: appointments.into_iter().map(AppointmentView::from).collect(),
    }))
}
