use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use secrecy::SecretBox;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use validator::Validate;

use crate::app_state::AppState;
use crate::db::{DatabaseError, NewUser, PublicUser, UserRepository, UserRole};
use crate::error::{AppError, AppResult};
use crate::modules::auth::{jwt, password, AuthUser};

#[derive(Debug, Deserialize, Validate)]
pub struct SignInPayload {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub password: SecretBox<String>,
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<NewUser>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;
    if payload.role == UserRole::Admin {
        return Err(AppError::Forbidden(
            "Admin accounts cannot self-register".to_string(),
        ));
    }
    password::check_strength(&payload.password)?;

    let password_hash = password::hash(&payload.password).await?;
    let user = UserRepository::create(&state.db, &payload, &password_hash)
        .await
        .map_err(|e| match DatabaseError::from(e) {
            DatabaseError::Duplicate => AppError::Conflict("Email already exists".to_string()),
            other => AppError::Database(other),
        })?;

    info!(user_id = %user.id, role = ?user.role, "user signed up");

    let token = jwt::sign_token(user.id, user.role)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "token": token, "user": PublicUser::from(user) })),
    ))
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInPayload>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;

    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

    let user = UserRepository::get_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(invalid)?;

    if !password::verify(&payload.password, &user.password_hash).await? {
        return Err(invalid());
    }

    let token = jwt::sign_token(user.id, user.role)?;
    Ok(Json(
        json!({ "token": token, "user": PublicUser::from(user) }),
    ))
}

pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<PublicUser>> {
    let user = UserRepository::get_by_id(&state.db, auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(PublicUser::from(user)))
}
