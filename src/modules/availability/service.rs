use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::config;
use crate::db::{
    AppointmentRepository, AvailabilityDayView, AvailabilityRepository, BreakView, UserRepository,
    WeeklyScheduleInput, WeeklyScheduleView,
};
use crate::error::AppResult;
use crate::scheduling::schedule::normalize_week;
use crate::scheduling::slots::{
    clamp_slot_step, free_slots, within_schedule, BookedSpan, DEFAULT_SLOT_STEP_MIN,
};

pub async fn get_schedule_view(pool: &PgPool, business_id: Uuid) -> AppResult<WeeklyScheduleView> {
    let windows = AvailabilityRepository::working_hours(pool, business_id).await?;
    let breaks = AvailabilityRepository::breaks(pool, business_id).await?;

    let days = windows
        .iter()
        .map(|wh| AvailabilityDayView {
            day_of_week: wh.day_of_week,
            start_min: wh.start_min,
            end_min: wh.end_min,
            breaks: breaks
                .iter()
                .filter(|b| b.day_of_week == wh.day_of_week)
                .map(|b| BreakView {
                    start_min: b.start_min,
                    end_min: b.end_min,
                })
                .collect(),
        })
        .collect();

    // The step is not persisted; clients may pass a preference per request
    // and the server clamps it.
    Ok(WeeklyScheduleView {
        slot_step_min: DEFAULT_SLOT_STEP_MIN,
        days,
    })
}

pub async fn replace_schedule(
    pool: &PgPool,
    business_id: Uuid,
    input: &WeeklyScheduleInput,
) -> AppResult<WeeklyScheduleView> {
    let normalized = normalize_week(&input.days)?;
    AvailabilityRepository::replace_schedule(pool, business_id, &normalized).await?;

    let mut view = get_schedule_view(pool, business_id).await?;
    view.slot_step_min = clamp_slot_step(input.slot_step_min);
    Ok(view)
}

/// Is `[start_at, start_at + duration)` bookable per the business's
/// recurring schedule? Resolved in the business's stored timezone.
///
/// A business with no configured windows at all is treated as always
/// available unless `STRICT_AVAILABILITY` is set: legacy accounts predate
/// the schedule editor and must keep accepting bookings.
pub async fn is_within_availability(
    pool: &PgPool,
    business_id: Uuid,
    start_at: OffsetDateTime,
    duration_min: i32,
) -> AppResult<bool> {
    let schedule = AvailabilityRepository::weekly_schedule(pool, business_id).await?;
    if schedule.is_empty() {
        return Ok(!config::get().app.strict_availability);
    }

    let tz_offset = UserRepository::timezone_offset_min(pool, business_id)
        .await?
        .unwrap_or(0);
    Ok(within_schedule(&schedule, start_at, duration_min, tz_offset))
}

/// Free bookable start instants for `[from, to)`, computed against the
/// business's stored timezone and its currently booked appointments.
pub async fn free_slots_for_business(
    pool: &PgPool,
    business_id: Uuid,
    from: OffsetDateTime,
    to: OffsetDateTime,
    duration_min: i32,
    slot_step_min: i32,
) -> AppResult<Vec<OffsetDateTime>> {
    let schedule = AvailabilityRepository::weekly_schedule(pool, business_id).await?;
    let tz_offset = UserRepository::timezone_offset_min(pool, business_id)
        .await?
        .unwrap_or(0);

    // Widened by a day on both sides so every appointment that could
    // overlap the range is present; exact overlap is re-checked per slot.
    let booked = AppointmentRepository::booked_between(
        pool,
        business_id,
        from - Duration::days(1),
        to + Duration::days(1),
    )
    .await?;
    let booked: Vec<BookedSpan> = booked
        .iter()
        .map(|a| BookedSpan {
            start_at: a.start_at,
            duration_min: a.duration_min,
        })
        .collect();

    Ok(free_slots(
        &schedule,
        &booked,
        from,
        to,
        duration_min,
        slot_step_min,
        tz_offset,
        OffsetDateTime::now_utc(),
    ))
}
