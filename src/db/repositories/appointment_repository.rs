use sqlx::{Error, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::models::Appointment;

const APPOINTMENT_COLUMNS: &str =
    "id, client_id, business_id, start_at, duration_min, status, created_at, updated_at";

pub struct AppointmentRepository;

impl AppointmentRepository {
    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Appointment>, Error> {
        sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_for_client(pool: &PgPool, client_id: Uuid) -> Result<Vec<Appointment>, Error> {
        sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE client_id = $1 ORDER BY start_at ASC"
        ))
        .bind(client_id)
        .fetch_all(pool)
        .await
    }

    pub async fn list_for_business(
        pool: &PgPool,
        business_id: Uuid,
    ) -> Result<Vec<Appointment>, Error> {
        sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE business_id = $1 ORDER BY start_at ASC"
        ))
        .bind(business_id)
        .fetch_all(pool)
        .await
    }

    pub async fn list_for_either_side(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<Appointment>, Error> {
        sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments \
             WHERE client_id = $1 OR business_id = $1 ORDER BY start_at ASC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Booked appointments whose start falls in `[from, to)`. Callers widen
    /// the range themselves when they need every row that could overlap it.
    pub async fn booked_between(
        pool: &PgPool,
        business_id: Uuid,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> Result<Vec<Appointment>, Error> {
        sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments \
             WHERE business_id = $1 AND status = 'booked' \
               AND start_at >= $2 AND start_at < $3 \
             ORDER BY start_at ASC"
        ))
        .bind(business_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }

    /// Serialize bookings per business for the rest of the transaction.
    /// Advisory-scoped rather than row-scoped because a conflicting row may
    /// not exist yet; plain row locks cannot stop two inserts racing.
    pub async fn lock_business(
        tx: &mut Transaction<'_, Postgres>,
        business_id: Uuid,
    ) -> Result<(), Error> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
            .bind(business_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Bounded conflict prefilter: only a BOOKED row starting before the
    /// candidate's end and after `candidate start - max duration` can
    /// overlap it. Exact overlap is re-checked per row by the caller.
    pub async fn conflict_candidates(
        tx: &mut Transaction<'_, Postgres>,
        business_id: Uuid,
        window_start: OffsetDateTime,
        window_end: OffsetDateTime,
        exclude_id: Option<Uuid>,
    ) -> Result<Vec<Appointment>, Error> {
        sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments \
             WHERE business_id = $1 AND status = 'booked' \
               AND start_at > $2 AND start_at < $3 \
               AND ($4::uuid IS NULL OR id <> $4) \
             ORDER BY start_at ASC"
        ))
        .bind(business_id)
        .bind(window_start)
        .bind(window_end)
        .bind(exclude_id)
        .fetch_all(&mut **tx)
        .await
    }

    pub async fn insert_booked(
        tx: &mut Transaction<'_, Postgres>,
        client_id: Uuid,
        business_id: Uuid,
        start_at: OffsetDateTime,
        duration_min: i32,
    ) -> Result<Appointment, Error> {
        sqlx::query_as::<_, Appointment>(&format!(
            "INSERT INTO appointments (id, client_id, business_id, start_at, duration_min, status) \
             VALUES ($1, $2, $3, $4, $5, 'booked') \
             RETURNING {APPOINTMENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(client_id)
        .bind(business_id)
        .bind(start_at)
        .bind(duration_min)
        .fetch_one(&mut **tx)
        .await
    }

    pub async fn update_times(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        start_at: OffsetDateTime,
        duration_min: i32,
    ) -> Result<Appointment, Error> {
        sqlx::query_as::<_, Appointment>(&format!(
            "UPDATE appointments \
             SET start_at = $2, duration_min = $3, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {APPOINTMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(start_at)
        .bind(duration_min)
        .fetch_one(&mut **tx)
        .await
    }

    pub async fn mark_canceled(pool: &PgPool, id: Uuid) -> Result<Appointment, Error> {
        sqlx::query_as::<_, Appointment>(&format!(
            "UPDATE appointments \
             SET status = 'canceled', updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {APPOINTMENT_COLUMNS}"
        ))
        .bind(id)
        .fetch_one(pool)
        .await
    }
}
