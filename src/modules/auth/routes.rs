use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{me, sign_in, sign_up};
use crate::app_state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/sign-up", post(sign_up))
        .route("/api/auth/sign-in", post(sign_in))
        .route("/api/auth/me", get(me))
}
