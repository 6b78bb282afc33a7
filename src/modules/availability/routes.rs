use axum::{
    routing::{get, put},
    Router,
};

use super::handlers::{get_business_slots, get_my_availability, get_slots, put_my_availability};
use crate::app_state::AppState;

pub fn availability_routes() -> Router<AppState> {
    Router::new()
        .route("/api/availability", put(put_my_availability))
        .route("/api/availability/me", get(get_my_availability))
        .route("/api/availability/slots", get(get_slots))
        .route("/api/businesses/{id}/slots", get(get_business_slots))
}
