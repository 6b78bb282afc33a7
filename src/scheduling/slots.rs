use time::{Duration, OffsetDateTime, Time};

use crate::scheduling::interval::{
    clamp_tz_offset, end_of, local_day_of_week, local_minute_of_day, overlaps, to_local, to_utc,
};
use crate::scheduling::schedule::WeeklySchedule;

pub const MIN_DURATION_MIN: i32 = 15;
pub const MAX_DURATION_MIN: i32 = 240;

pub const DEFAULT_SLOT_STEP_MIN: i32 = 15;
pub const MIN_SLOT_STEP_MIN: i32 = 5;
pub const MAX_SLOT_STEP_MIN: i32 = 120;

/// Grace period for clock skew: a slot is only offered if it starts strictly
/// more than this far in the future.
pub const PAST_SLOT_GRACE: Duration = Duration::minutes(1);

/// A booked appointment projected to the data slot generation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookedSpan {
    pub start_at: OffsetDateTime,
    pub duration_min: i32,
}

/// Callers may request any step; the server clamps to a sane range.
pub fn clamp_slot_step(slot_step_min: i32) -> i32 {
    slot_step_min.clamp(MIN_SLOT_STEP_MIN, MAX_SLOT_STEP_MIN)
}

/// Whether `[start_at, start_at + duration)` falls inside the business's
/// recurring schedule, evaluated in the business's local frame. Closed
/// weekdays and break overlaps reject; an entirely empty schedule also
/// rejects here (the default-open policy for unconfigured businesses is a
/// booking-engine decision, not a schedule property).
pub fn within_schedule(
    schedule: &WeeklySchedule,
    start_at: OffsetDateTime,
    duration_min: i32,
    tz_offset_min: i32,
) -> bool {
    let tz = clamp_tz_offset(tz_offset_min);
    schedule.allows_local(
        local_day_of_week(start_at, tz),
        local_minute_of_day(start_at, tz),
        duration_min,
    )
}

/// Enumerate bookable start instants for `[from, to)`, ascending.
///
/// Pure function of its inputs: identical schedule/bookings/range/clock
/// yield identical output, which is what makes slot listings restartable.
/// Walks business-local calendar days, steps candidate start minutes through
/// each day's working window, and keeps a candidate only if it lies in the
/// requested range, misses every break, overlaps no booked appointment and
/// starts comfortably in the future.
pub fn free_slots(
    schedule: &WeeklySchedule,
    booked: &[BookedSpan],
    from: OffsetDateTime,
    to: OffsetDateTime,
    duration_min: i32,
    slot_step_min: i32,
    tz_offset_min: i32,
    now: OffsetDateTime,
) -> Vec<OffsetDateTime> {
    if to <= from || duration_min <= 0 || duration_min > MAX_DURATION_MIN {
        return Vec::new();
    }
    let step = clamp_slot_step(slot_step_min);
    let tz = clamp_tz_offset(tz_offset_min);

    let local_to = to_local(to, tz);
    let mut local_midnight = to_local(from, tz).replace_time(Time::MIDNIGHT);

    let mut slots = Vec::new();
    while local_midnight < local_to {
        if let Some(day) = schedule.day(local_midnight.weekday().number_days_from_sunday()) {
            let mut t = day.start_min;
            while t + duration_min <= day.end_min {
                let slot_start = to_utc(local_midnight + Duration::minutes(t as i64), tz);
                if candidate_is_free(slot_start, t, duration_min, day, booked, from, to, now) {
                    slots.push(slot_start);
                }
                t += step;
            }
        }
        local_midnight += Duration::days(1);
    }
    slots
}

#[allow(clippy::too_many_arguments)]
fn candidate_is_free(
    slot_start: OffsetDateTime,
    start_min: i32,
    duration_min: i32,
    day: &crate::scheduling::schedule::DaySchedule,
    booked: &[BookedSpan],
    from: OffsetDateTime,
    to: OffsetDateTime,
    now: OffsetDateTime,
) -> bool {
    if slot_start < from || slot_start >= to {
        return false;
    }
    let end_min = start_min + duration_min;
    if day
        .breaks
        .iter()
        .any(|b| overlaps(start_min, end_min, b.start_min, b.end_min))
    {
        return false;
    }
    let slot_end = end_of(slot_start, duration_min);
    if booked
        .iter()
        .any(|b| overlaps(slot_start, slot_end, b.start_at, end_of(b.start_at, b.duration_min)))
    {
        return false;
    }
    slot_start > now + PAST_SLOT_GRACE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{BreakRow, WorkingHourRow};
    use time::macros::datetime;
    use uuid::Uuid;

    // Business window: Monday 09:00-17:00 with a 13:00-14:00 break.
    fn monday_schedule() -> WeeklySchedule {
        let business_id = Uuid::new_v4();
        let windows = vec![WorkingHourRow {
            id: Uuid::new_v4(),
            business_id,
            day_of_week: 1,
            start_min: 9 * 60,
            end_min: 17 * 60,
        }];
        let breaks = vec![BreakRow {
            id: Uuid::new_v4(),
            business_id,
            day_of_week: 1,
            start_min: 13 * 60,
            end_min: 14 * 60,
        }];
        WeeklySchedule::from_rows(&windows, &breaks)
    }

    const MONDAY_FROM: OffsetDateTime = datetime!(2026-01-05 00:00 UTC);
    const MONDAY_TO: OffsetDateTime = datetime!(2026-01-06 00:00 UTC);
    const LONG_AGO: OffsetDateTime = datetime!(2025-01-01 00:00 UTC);

    #[test]
    fn monday_scenario_excludes_break_neighborhood() {
        let slots = free_slots(
            &monday_schedule(),
            &[],
            MONDAY_FROM,
            MONDAY_TO,
            60,
            15,
            0,
            LONG_AGO,
        );

        assert!(slots.contains(&datetime!(2026-01-05 09:00 UTC)));
        assert!(slots.contains(&datetime!(2026-01-05 12:00 UTC))); // ends as the break starts
        assert!(slots.contains(&datetime!(2026-01-05 14:00 UTC))); // starts as it ends
        assert!(slots.contains(&datetime!(2026-01-05 16:00 UTC))); // last fit before close

        // 12:15 through 13:45 would all overlap the 13:00-14:00 break.
        let mut t = datetime!(2026-01-05 12:15 UTC);
        while t <= datetime!(2026-01-05 13:45 UTC) {
            assert!(!slots.contains(&t), "{t} should overlap the break");
            t += Duration::minutes(15);
        }

        assert!(!slots.contains(&datetime!(2026-01-05 16:15 UTC))); // would end 17:15
        // 09:00..12:00 inclusive plus 14:00..16:00 inclusive at 15-minute steps
        assert_eq!(slots.len(), 13 + 9);
    }

    #[test]
    fn booked_appointment_blocks_overlapping_starts_only() {
        let booked = [BookedSpan {
            start_at: datetime!(2026-01-05 10:00 UTC),
            duration_min: 60,
        }];
        let slots = free_slots(
            &monday_schedule(),
            &booked,
            MONDAY_FROM,
            MONDAY_TO,
            60,
            15,
            0,
            LONG_AGO,
        );

        // Touching endpoints survive on both sides of the booking.
        assert!(slots.contains(&datetime!(2026-01-05 09:00 UTC)));
        assert!(slots.contains(&datetime!(2026-01-05 11:00 UTC)));

        let mut t = datetime!(2026-01-05 09:15 UTC);
        while t < datetime!(2026-01-05 11:00 UTC) {
            assert!(!slots.contains(&t), "{t} should collide with the booking");
            t += Duration::minutes(15);
        }
    }

    #[test]
    fn generation_is_idempotent() {
        let booked = [BookedSpan {
            start_at: datetime!(2026-01-05 14:30 UTC),
            duration_min: 30,
        }];
        let schedule = monday_schedule();
        let a = free_slots(&schedule, &booked, MONDAY_FROM, MONDAY_TO, 60, 15, 0, LONG_AGO);
        let b = free_slots(&schedule, &booked, MONDAY_FROM, MONDAY_TO, 60, 15, 0, LONG_AGO);
        assert_eq!(a, b);
        assert!(a.windows(2).all(|w| w[0] < w[1]), "ascending, no duplicates");
    }

    #[test]
    fn slots_follow_the_business_timezone() {
        // UTC-5 business: Monday 09:00 local is 14:00 UTC.
        let slots = free_slots(
            &monday_schedule(),
            &[],
            MONDAY_FROM,
            datetime!(2026-01-07 00:00 UTC),
            60,
            60,
            300,
            LONG_AGO,
        );
        assert_eq!(slots.first(), Some(&datetime!(2026-01-05 14:00 UTC)));
        assert_eq!(slots.last(), Some(&datetime!(2026-01-05 21:00 UTC)));
    }

    #[test]
    fn near_past_slots_are_withheld() {
        let now = datetime!(2026-01-05 09:59:30 UTC);
        let slots = free_slots(
            &monday_schedule(),
            &[],
            MONDAY_FROM,
            MONDAY_TO,
            60,
            15,
            0,
            now,
        );
        // 10:00 is within the one-minute grace period; 10:15 is not.
        assert!(!slots.contains(&datetime!(2026-01-05 10:00 UTC)));
        assert_eq!(slots.first(), Some(&datetime!(2026-01-05 10:15 UTC)));
    }

    #[test]
    fn window_shorter_than_duration_yields_nothing() {
        let windows = vec![WorkingHourRow {
            id: Uuid::new_v4(),
            business_id: Uuid::new_v4(),
            day_of_week: 1,
            start_min: 9 * 60,
            end_min: 9 * 60 + 30,
        }];
        let schedule = WeeklySchedule::from_rows(&windows, &[]);
        let slots = free_slots(&schedule, &[], MONDAY_FROM, MONDAY_TO, 60, 15, 0, LONG_AGO);
        assert!(slots.is_empty());
    }

    #[test]
    fn out_of_range_step_is_clamped() {
        // step 1 clamps to 5 minutes
        let slots = free_slots(
            &monday_schedule(),
            &[],
            MONDAY_FROM,
            MONDAY_TO,
            60,
            1,
            0,
            LONG_AGO,
        );
        assert!(slots.contains(&datetime!(2026-01-05 09:05 UTC)));
        assert!(!slots.contains(&datetime!(2026-01-05 09:01 UTC)));
    }

    #[test]
    fn degenerate_inputs_yield_nothing() {
        let schedule = monday_schedule();
        assert!(free_slots(&schedule, &[], MONDAY_TO, MONDAY_FROM, 60, 15, 0, LONG_AGO).is_empty());
        assert!(free_slots(&schedule, &[], MONDAY_FROM, MONDAY_TO, 300, 15, 0, LONG_AGO).is_empty());
        assert!(
            free_slots(&WeeklySchedule::default(), &[], MONDAY_FROM, MONDAY_TO, 60, 15, 0, LONG_AGO)
                .is_empty()
        );
    }

    #[test]
    fn range_bounds_apply_to_slot_starts() {
        let slots = free_slots(
            &monday_schedule(),
            &[],
            datetime!(2026-01-05 10:00 UTC),
            datetime!(2026-01-05 12:00 UTC),
            60,
            15,
            0,
            LONG_AGO,
        );
        assert_eq!(slots.first(), Some(&datetime!(2026-01-05 10:00 UTC)));
        assert_eq!(slots.last(), Some(&datetime!(2026-01-05 11:45 UTC)));
    }

    #[test]
    fn within_schedule_matches_generated_slots() {
        let schedule = monday_schedule();
        let slots = free_slots(&schedule, &[], MONDAY_FROM, MONDAY_TO, 60, 15, 0, LONG_AGO);
        for slot in slots {
            assert!(within_schedule(&schedule, slot, 60, 0));
        }
        assert!(!within_schedule(
            &schedule,
            datetime!(2026-01-05 13:30 UTC),
            60,
            0
        ));
        // Tuesday is closed
        assert!(!within_schedule(
            &schedule,
            datetime!(2026-01-06 10:00 UTC),
            60,
            0
        ));
    }
}
