use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::config;
use crate::db::UserRole;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

pub fn sign_token(user_id: Uuid, role: UserRole) -> AppResult<String> {
    let auth = &config::get().auth;
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        user_id,
        role,
        iat: now.unix_timestamp(),
        exp: (now + Duration::hours(auth.token_ttl_hours)).unix_timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(auth.jwt_secret.expose_secret().as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
}

pub fn verify_token(token: &str) -> AppResult<Claims> {
    let auth = &config::get().auth;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(auth.jwt_secret.expose_secret().as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))
}
