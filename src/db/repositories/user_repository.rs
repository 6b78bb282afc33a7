use sqlx::{Error, PgPool};
use uuid::Uuid;

use crate::db::models::{NewUser, UpdateUser, User, UserRole};
use crate::scheduling::interval::clamp_tz_offset;

pub struct UserRepository;

impl UserRepository {
    pub async fn create(
        pool: &PgPool,
        new_user: &NewUser,
        password_hash: &str,
    ) -> Result<User, Error> {
        let tz_offset = clamp_tz_offset(new_user.tz_offset_min.unwrap_or(0));

        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, role, name, email, password_hash, timezone_offset_min)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, role, name, email, password_hash, timezone_offset_min, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_user.role)
        .bind(&new_user.name)
        .bind(new_user.email.trim().to_lowercase())
        .bind(password_hash)
        .bind(tz_offset)
        .fetch_one(pool)
        .await
    }

    pub async fn get_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, role, name, email, password_hash, timezone_offset_min, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn get_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, role, name, email, password_hash, timezone_offset_min, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await
    }

    pub async fn list(pool: &PgPool, role: Option<UserRole>) -> Result<Vec<User>, Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, role, name, email, password_hash, timezone_offset_min, created_at, updated_at
            FROM users
            WHERE $1::user_role IS NULL OR role = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(role)
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        update: &UpdateUser,
        password_hash: Option<&str>,
    ) -> Result<User, Error> {
        let tz_offset = update.tz_offset_min.map(clamp_tz_offset);

        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET
                name = COALESCE($1, name),
                email = COALESCE($2, email),
                role = COALESCE($3::user_role, role),
                password_hash = COALESCE($4, password_hash),
                timezone_offset_min = COALESCE($5, timezone_offset_min),
                updated_at = NOW()
            WHERE id = $6
            RETURNING id, role, name, email, password_hash, timezone_offset_min, created_at, updated_at
            "#,
        )
        .bind(&update.name)
        .bind(update.email.as_deref().map(|e| e.trim().to_lowercase()))
        .bind(update.role)
        .bind(password_hash)
        .bind(tz_offset)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, user_id: Uuid) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Server-side source of truth for a business's timezone offset. The
    /// client-supplied offset is never consulted for availability decisions.
    pub async fn timezone_offset_min(pool: &PgPool, user_id: Uuid) -> Result<Option<i32>, Error> {
        sqlx::query_scalar::<_, i32>("SELECT timezone_offset_min FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }
}
