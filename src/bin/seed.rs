//! Provision demo accounts for local development: two businesses and two
//! clients, all with the password `Password123!`. Safe to re-run.

use anyhow::{Context, Result};
use dotenv::dotenv;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use booking_backend::{config, db};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenv().ok();
    config::init()?;

    let pool = db::init_pool().await.context("Failed to initialize database")?;
    let password_hash =
        bcrypt::hash("Password123!", bcrypt::DEFAULT_COST).context("Failed to hash password")?;

    // Offsets are UTC - local: 300 is New York winter, -60 is Berlin winter.
    seed_user(&pool, "business", "Business One", "biz1@example.com", &password_hash, 300).await?;
    seed_user(&pool, "business", "Business Two", "biz2@example.com", &password_hash, -60).await?;
    seed_user(&pool, "client", "Client One", "client1@example.com", &password_hash, 0).await?;
    seed_user(&pool, "client", "Client Two", "client2@example.com", &password_hash, 0).await?;

    info!("seeded demo users (password: Password123!)");
    Ok(())
}

async fn seed_user(
    pool: &PgPool,
    role: &str,
    name: &str,
    email: &str,
    password_hash: &str,
    tz_offset_min: i32,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO users (id, role, name, email, password_hash, timezone_offset_min)
        VALUES ($1, $2::user_role, $3, $4, $5, $6)
        ON CONFLICT (email) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(role)
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(tz_offset_min)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to seed {email}"))?;

    info!(email, role, "seeded");
    Ok(())
}
