use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::app_state::AppState;
use crate::db::{DatabaseError, NewUser, PublicUser, UpdateUser, UserRepository, UserRole};
use crate::error::{AppError, AppResult};
use crate::modules::auth::{password, AuthUser};

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<UserRole>,
}

/// Any signed-in user may browse businesses (that is the booking flow's
/// business picker); the full directory is admin-only.
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListUsersQuery>,
) -> AppResult<Json<Vec<PublicUser>>> {
    if auth.role != UserRole::Admin && query.role != Some(UserRole::Business) {
        return Err(AppError::Forbidden(
            "Only businesses can be listed".to_string(),
        ));
    }

    let users = UserRepository::list(&state.db, query.role).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

pub async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<NewUser>,
) -> AppResult<impl IntoResponse> {
    if auth.role != UserRole::Admin {
        return Err(AppError::Forbidden(
            "Only admins can create users".to_string(),
        ));
    }
    payload.validate()?;
    password::check_strength(&payload.password)?;

    let password_hash = password::hash(&payload.password).await?;
    let user = UserRepository::create(&state.db, &payload, &password_hash)
        .await
        .map_err(|e| match DatabaseError::from(e) {
            DatabaseError::Duplicate => AppError::Conflict("Email already exists".to_string()),
            other => AppError::Database(other),
        })?;

    Ok((StatusCode::CREATED, Json(PublicUser::from(user))))
}

pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<PublicUser>> {
    if auth.role != UserRole::Admin && auth.id != user_id {
        return Err(AppError::Forbidden(
            "You can only view your own account".to_string(),
        ));
    }

    let user = UserRepository::get_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(PublicUser::from(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateUser>,
) -> AppResult<Json<PublicUser>> {
    if auth.role != UserRole::Admin && auth.id != user_id {
        return Err(AppError::Forbidden(
            "You can only update your own account".to_string(),
        ));
    }
    if payload.role.is_some() && auth.role != UserRole::Admin {
        return Err(AppError::Forbidden(
            "Only admins can change roles".to_string(),
        ));
    }
    payload.validate()?;

    let password_hash = match &payload.password {
        Some(password) => {
            password::check_strength(password)?;
            Some(password::hash(password).await?)
        }
        None => None,
    };

    let user = UserRepository::update(&state.db, user_id, &payload, password_hash.as_deref())
        .await
        .map_err(|e| match DatabaseError::from(e) {
            DatabaseError::NotFound => AppError::NotFound("User not found".to_string()),
            DatabaseError::Duplicate => AppError::Conflict("Email already exists".to_string()),
            other => AppError::Database(other),
        })?;

    Ok(Json(PublicUser::from(user)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if auth.role != UserRole::Admin {
        return Err(AppError::Forbidden(
            "Only admins can delete users".to_string(),
        ));
    }

    if !UserRepository::delete(&state.db, user_id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
