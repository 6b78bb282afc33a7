use axum::{
    routing::{get, patch, post},
    Router,
};

use super::handlers::{
    cancel_appointment, create_appointment, list_my_appointments, reschedule_appointment,
};
use crate::app_state::AppState;

pub fn appointment_routes() -> Router<AppState> {
    Router::new()
        .route("/api/appointments", post(create_appointment))
        .route("/api/appointments/me", get(list_my_appointments))
        .route("/api/appointments/{id}", patch(reschedule_appointment))
        .route("/api/appointments/{id}/cancel", post(cancel_appointment))
}
