use time::{Duration, OffsetDateTime};

/// Half-open interval test: `[a_start, a_end)` against `[b_start, b_end)`.
/// Touching endpoints (a_end == b_start) do not overlap, so back-to-back
/// appointments never conflict.
pub fn overlaps<T: PartialOrd>(a_start: T, a_end: T, b_start: T, b_end: T) -> bool {
    a_start < b_end && a_end > b_start
}

/// End instant of an appointment-style interval.
pub fn end_of(start_at: OffsetDateTime, duration_min: i32) -> OffsetDateTime {
    start_at + Duration::minutes(duration_min as i64)
}

/// Overlap test between two (start, duration-in-minutes) spans.
pub fn spans_overlap(
    a_start: OffsetDateTime,
    a_duration_min: i32,
    b_start: OffsetDateTime,
    b_duration_min: i32,
) -> bool {
    overlaps(
        a_start,
        end_of(a_start, a_duration_min),
        b_start,
        end_of(b_start, b_duration_min),
    )
}

/// Offsets follow the `Date.getTimezoneOffset()` convention stored on
/// business accounts: minutes = UTC - local. Converting to the local frame
/// therefore subtracts the offset.
pub fn to_local(utc: OffsetDateTime, tz_offset_min: i32) -> OffsetDateTime {
    utc - Duration::minutes(tz_offset_min as i64)
}

pub fn to_utc(local: OffsetDateTime, tz_offset_min: i32) -> OffsetDateTime {
    local + Duration::minutes(tz_offset_min as i64)
}

/// Local day of week, 0 = Sunday .. 6 = Saturday.
pub fn local_day_of_week(utc: OffsetDateTime, tz_offset_min: i32) -> u8 {
    to_local(utc, tz_offset_min)
        .weekday()
        .number_days_from_sunday()
}

/// Local minute of day, 0..=1439.
pub fn local_minute_of_day(utc: OffsetDateTime, tz_offset_min: i32) -> i32 {
    let local = to_local(utc, tz_offset_min);
    local.hour() as i32 * 60 + local.minute() as i32
}

/// Offsets beyond UTC±14:00 do not exist; clamp rather than reject so a
/// corrupt stored value degrades to the nearest real offset.
pub fn clamp_tz_offset(tz_offset_min: i32) -> i32 {
    tz_offset_min.clamp(-14 * 60, 14 * 60)
}
