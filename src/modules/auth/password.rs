use secrecy::{ExposeSecret, SecretBox};

use crate::error::{AppError, AppResult};

/// bcrypt is CPU-bound, so both operations run on the blocking pool.
pub async fn hash(password: &SecretBox<String>) -> AppResult<String> {
    let password = password.expose_secret().clone();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| AppError::Internal(format!("Hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))
}

pub async fn verify(password: &SecretBox<String>, password_hash: &str) -> AppResult<bool> {
    let password = password.expose_secret().clone();
    let password_hash = password_hash.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &password_hash))
        .await
        .map_err(|e| AppError::Internal(format!("Hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("Password verification failed: {e}")))
}

pub fn check_strength(password: &SecretBox<String>) -> AppResult<()> {
    if password.expose_secret().len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    Ok(())
}
