use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use super::service;
use crate::app_state::AppState;
use crate::db::{Appointment, CreateAppointmentPayload, ReschedulePayload, UserRole};
use crate::error::{AppError, AppResult};
use crate::modules::auth::AuthUser;

pub async fn create_appointment(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateAppointmentPayload>,
) -> AppResult<impl IntoResponse> {
    if auth.role != UserRole::Client {
        return Err(AppError::Forbidden(
            "Only clients can book appointments".to_string(),
        ));
    }
    payload.validate()?;

    let appointment = service::create_appointment(
        &state.db,
        auth.id,
        payload.business_id,
        payload.start_at,
        payload.duration_min,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(appointment)))
}

pub async fn reschedule_appointment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(appointment_id): Path<Uuid>,
    Json(payload): Json<ReschedulePayload>,
) -> AppResult<Json<Appointment>> {
    payload.validate()?;

    let appointment = service::reschedule_appointment(
        &state.db,
        appointment_id,
        auth.id,
        auth.role,
        payload.start_at,
        payload.duration_min,
    )
    .await?;

    Ok(Json(appointment))
}

pub async fn cancel_appointment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(appointment_id): Path<Uuid>,
) -> AppResult<Json<Appointment>> {
    let appointment =
        service::cancel_appointment(&state.db, appointment_id, auth.id, auth.role).await?;
    Ok(Json(appointment))
}

pub async fn list_my_appointments(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<Appointment>>> {
    let appointments =
        service::list_appointments_for_user(&state.db, auth.id, auth.role).await?;
    Ok(Json(appointments))
}
