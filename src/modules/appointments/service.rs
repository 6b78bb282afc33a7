use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::db::{Appointment, AppointmentRepository, AppointmentStatus, UserRepository, UserRole};
use crate::error::{AppError, AppResult};
use crate::modules::availability;
use crate::scheduling::interval::{end_of, spans_overlap};
use crate::scheduling::slots::{MAX_DURATION_MIN, MIN_DURATION_MIN};

const OUTSIDE_AVAILABILITY: &str = "Time slot is outside business availability";
const ALREADY_BOOKED: &str = "Time slot is already booked";

/// Book a new appointment.
///
/// Availability is checked up front; the conflict scan and the insert then
/// run in one transaction holding the per-business advisory lock, so two
/// concurrent attempts at overlapping times serialize and the loser sees
/// the winner's row in its scan. Any error before commit rolls the whole
/// transaction back.
pub async fn create_appointment(
    pool: &PgPool,
    client_id: Uuid,
    business_id: Uuid,
    start_at: OffsetDateTime,
    duration_min: i32,
) -> AppResult<Appointment> {
    validate_start(start_at)?;
    validate_duration(duration_min)?;

    let business = UserRepository::get_by_id(pool, business_id)
        .await?
        .filter(|u| u.role == UserRole::Business)
        .ok_or_else(|| AppError::NotFound("Business not found".to_string()))?;

    if !availability::service::is_within_availability(pool, business.id, start_at, duration_min)
        .await?
    {
        return Err(AppError::Conflict(OUTSIDE_AVAILABILITY.to_string()));
    }

    let mut tx = pool.begin().await?;
    AppointmentRepository::lock_business(&mut tx, business.id).await?;
    ensure_no_conflict(&mut tx, business.id, start_at, duration_min, None).await?;
    let appointment =
        AppointmentRepository::insert_booked(&mut tx, client_id, business.id, start_at, duration_min)
            .await?;
    tx.commit().await?;

    tracing::info!(
        appointment_id = %appointment.id,
        business_id = %appointment.business_id,
        "appointment booked"
    );
    Ok(appointment)
}

/// Move a BOOKED appointment to new times. Client-owner only; runs the same
/// validations and transactional conflict scan as create, with the
/// appointment's own row excluded from the scan.
pub async fn reschedule_appointment(
    pool: &PgPool,
    appointment_id: Uuid,
    acting_client_id: Uuid,
    acting_role: UserRole,
    start_at: OffsetDateTime,
    duration_min: i32,
) -> AppResult<Appointment> {
    let appointment = AppointmentRepository::get_by_id(pool, appointment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))?;

    if acting_role != UserRole::Client || appointment.client_id != acting_client_id {
        return Err(AppError::Forbidden(
            "You can reschedule only your own appointments".to_string(),
        ));
    }
    if appointment.status != AppointmentStatus::Booked {
        return Err(AppError::Conflict(
            "Only booked appointments can be rescheduled".to_string(),
        ));
    }

    validate_start(start_at)?;
    validate_duration(duration_min)?;

    if !availability::service::is_within_availability(
        pool,
        appointment.business_id,
        start_at,
        duration_min,
    )
    .await?
    {
        return Err(AppError::Conflict(OUTSIDE_AVAILABILITY.to_string()));
    }

    let mut tx = pool.begin().await?;
    AppointmentRepository::lock_business(&mut tx, appointment.business_id).await?;
    ensure_no_conflict(
        &mut tx,
        appointment.business_id,
        start_at,
        duration_min,
        Some(appointment.id),
    )
    .await?;
    let updated =
        AppointmentRepository::update_times(&mut tx, appointment.id, start_at, duration_min)
            .await?;
    tx.commit().await?;

    Ok(updated)
}

/// Cancel an appointment. Clients may cancel appointments they booked,
/// businesses those booked with them. Canceling an already-canceled
/// appointment returns it unchanged: cancellation is idempotent and never
/// produces a conflict.
pub async fn cancel_appointment(
    pool: &PgPool,
    appointment_id: Uuid,
    acting_user_id: Uuid,
    acting_role: UserRole,
) -> AppResult<Appointment> {
    let appointment = AppointmentRepository::get_by_id(pool, appointment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))?;

    let allowed = match acting_role {
        UserRole::Client => appointment.client_id == acting_user_id,
        UserRole::Business => appointment.business_id == acting_user_id,
        UserRole::Admin => false,
    };
    if !allowed {
        return Err(AppError::Forbidden(
            "You can cancel only your own appointments".to_string(),
        ));
    }

    if appointment.status == AppointmentStatus::Canceled {
        return Ok(appointment);
    }

    let canceled = AppointmentRepository::mark_canceled(pool, appointment.id).await?;
    tracing::info!(appointment_id = %canceled.id, "appointment canceled");
    Ok(canceled)
}

pub async fn list_appointments_for_user(
    pool: &PgPool,
    user_id: Uuid,
    role: UserRole,
) -> AppResult<Vec<Appointment>> {
    let appointments = match role {
        UserRole::Client => AppointmentRepository::list_for_client(pool, user_id).await?,
        UserRole::Business => AppointmentRepository::list_for_business(pool, user_id).await?,
        UserRole::Admin => AppointmentRepository::list_for_either_side(pool, user_id).await?,
    };
    Ok(appointments)
}

/// Conflict scan inside the caller's transaction: fetch every BOOKED row
/// that could overlap the candidate (bounded prefilter) and re-check each
/// with the half-open overlap test.
async fn ensure_no_conflict(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    business_id: Uuid,
    start_at: OffsetDateTime,
    duration_min: i32,
    exclude_id: Option<Uuid>,
) -> AppResult<()> {
    let window_start = start_at - Duration::minutes(MAX_DURATION_MIN as i64);
    let window_end = end_of(start_at, duration_min);

    let candidates = AppointmentRepository::conflict_candidates(
        tx,
        business_id,
        window_start,
        window_end,
        exclude_id,
    )
    .await?;

    if candidates
        .iter()
        .any(|c| spans_overlap(c.start_at, c.duration_min, start_at, duration_min))
    {
        return Err(AppError::Conflict(ALREADY_BOOKED.to_string()));
    }
    Ok(())
}

fn validate_start(start_at: OffsetDateTime) -> AppResult<()> {
    if start_at <= OffsetDateTime::now_utc() {
        return Err(AppError::Validation(
            "startAt must be in the future".to_string(),
        ));
    }
    Ok(())
}

fn validate_duration(duration_min: i32) -> AppResult<()> {
    if !(MIN_DURATION_MIN..=MAX_DURATION_MIN).contains(&duration_min) {
        return Err(AppError::Validation(format!(
            "durationMin must be {MIN_DURATION_MIN}-{MAX_DURATION_MIN}"
        )));
    }
    Ok(())
}
