use thiserror::Error;

use crate::db::{AvailabilityDayInput, BreakRow, WorkingHourRow};
use crate::scheduling::interval::overlaps;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid time (expected HH:MM): {0}")]
    InvalidTime(String),

    #[error("Missing start/end for enabled day {0}")]
    MissingBounds(u8),

    #[error("End must be after start for day {0}")]
    EmptyWindow(u8),
}

/// Strict HH:MM (00:00..23:59) to minute-of-day. Anything looser (single
/// digits, out-of-range fields, trailing garbage) is rejected so no
/// nonsense minute values reach the store.
pub fn parse_hhmm(hhmm: &str) -> Result<i32, ScheduleError> {
    let invalid = || ScheduleError::InvalidTime(hhmm.to_string());

    let bytes = hhmm.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return Err(invalid());
    }
    if !bytes[0].is_ascii_digit()
        || !bytes[1].is_ascii_digit()
        || !bytes[3].is_ascii_digit()
        || !bytes[4].is_ascii_digit()
    {
        return Err(invalid());
    }

    let hours = (bytes[0] - b'0') as i32 * 10 + (bytes[1] - b'0') as i32;
    let minutes = (bytes[3] - b'0') as i32 * 10 + (bytes[4] - b'0') as i32;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    Ok(hours * 60 + minutes)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakSpan {
    pub start_min: i32,
    pub end_min: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySchedule {
    pub start_min: i32,
    pub end_min: i32,
    pub breaks: Vec<BreakSpan>,
}

/// A business's recurring week: at most one working window per weekday
/// (0 = Sunday .. 6 = Saturday), each with zero or more breaks. A missing
/// weekday means closed that day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeeklySchedule {
    days: [Option<DaySchedule>; 7],
}

impl WeeklySchedule {
    pub fn from_rows(windows: &[WorkingHourRow], breaks: &[BreakRow]) -> Self {
        let mut days: [Option<DaySchedule>; 7] = Default::default();
        for wh in windows {
            let dow = wh.day_of_week as usize;
            if dow < 7 {
                days[dow] = Some(DaySchedule {
                    start_min: wh.start_min,
                    end_min: wh.end_min,
                    breaks: Vec::new(),
                });
            }
        }
        for b in breaks {
            let dow = b.day_of_week as usize;
            if let Some(day) = days.get_mut(dow).and_then(|d| d.as_mut()) {
                day.breaks.push(BreakSpan {
                    start_min: b.start_min,
                    end_min: b.end_min,
                });
            }
        }
        WeeklySchedule { days }
    }

    pub fn day(&self, day_of_week: u8) -> Option<&DaySchedule> {
        self.days.get(day_of_week as usize).and_then(|d| d.as_ref())
    }

    /// No weekday configured at all. Distinct from "closed on this weekday":
    /// an empty schedule is the never-onboarded state the default-open
    /// booking policy applies to.
    pub fn is_empty(&self) -> bool {
        self.days.iter().all(|d| d.is_none())
    }

    /// Whether a local-minutes interval fits a weekday window without
    /// touching a break. The interval must be fully contained in the window;
    /// exceeding the window end by a single minute rejects.
    pub fn allows_local(&self, day_of_week: u8, start_min: i32, duration_min: i32) -> bool {
        let Some(day) = self.day(day_of_week) else {
            return false;
        };
        let end_min = start_min + duration_min;
        if start_min < day.start_min || end_min > day.end_min {
            return false;
        }
        !day.breaks
            .iter()
            .any(|b| overlaps(start_min, end_min, b.start_min, b.end_min))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDay {
    pub day_of_week: u8,
    pub start_min: i32,
    pub end_min: i32,
    pub breaks: Vec<BreakSpan>,
}

/// Normalize a weekly-schedule submission: disabled days are dropped,
/// enabled days must carry a valid HH:MM window with end after start.
/// Breaks are forgiving on purpose: zero-length breaks and breaks that do
/// not overlap the working window are silently discarded instead of
/// erroring, so a stale break left in the form never blocks saving.
pub fn normalize_week(days: &[AvailabilityDayInput]) -> Result<Vec<NormalizedDay>, ScheduleError> {
    let mut normalized = Vec::new();

    for day in days.iter().filter(|d| d.enabled) {
        let (Some(start), Some(end)) = (day.start.as_deref(), day.end.as_deref()) else {
            return Err(ScheduleError::MissingBounds(day.day_of_week));
        };
        let start_min = parse_hhmm(start)?;
        let end_min = parse_hhmm(end)?;
        if end_min <= start_min {
            return Err(ScheduleError::EmptyWindow(day.day_of_week));
        }

        let mut breaks = Vec::new();
        for b in &day.breaks {
            let b_start = parse_hhmm(&b.start)?;
            let b_end = parse_hhmm(&b.end)?;
            if b_end <= b_start {
                continue;
            }
            if !overlaps(b_start, b_end, start_min, end_min) {
                continue;
            }
            breaks.push(BreakSpan {
                start_min: b_start,
                end_min: b_end,
            });
        }

        normalized.push(NormalizedDay {
            day_of_week: day.day_of_week,
            start_min,
            end_min,
            breaks,
        });
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::BreakInput;

    fn day(
        dow: u8,
        start: &str,
        end: &str,
        breaks: &[(&str, &str)],
    ) -> AvailabilityDayInput {
        AvailabilityDayInput {
            day_of_week: dow,
            enabled: true,
            start: Some(start.to_string()),
            end: Some(end.to_string()),
            breaks: breaks
                .iter()
                .map(|(s, e)| BreakInput {
                    start: s.to_string(),
                    end: e.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn parses_strict_hhmm() {
        assert_eq!(parse_hhmm("00:00"), Ok(0));
        assert_eq!(parse_hhmm("09:30"), Ok(570));
        assert_eq!(parse_hhmm("23:59"), Ok(1439));
    }

    #[test]
    fn rejects_malformed_times() {
        for s in ["24:00", "12:60", "9:30", "09:3", "0930", "09-30", "", "ab:cd", "09:30 "] {
            assert_eq!(parse_hhmm(s), Err(ScheduleError::InvalidTime(s.to_string())));
        }
    }

    #[test]
    fn disabled_days_are_dropped() {
        let days = vec![
            AvailabilityDayInput {
                day_of_week: 2,
                enabled: false,
                start: None,
                end: None,
                breaks: vec![],
            },
            day(1, "09:00", "17:00", &[]),
        ];
        let normalized = normalize_week(&days).unwrap();
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].day_of_week, 1);
        assert_eq!(normalized[0].start_min, 540);
        assert_eq!(normalized[0].end_min, 1020);
    }

    #[test]
    fn enabled_day_requires_bounds() {
        let days = vec![AvailabilityDayInput {
            day_of_week: 3,
            enabled: true,
            start: Some("09:00".into()),
            end: None,
            breaks: vec![],
        }];
        assert_eq!(normalize_week(&days), Err(ScheduleError::MissingBounds(3)));
    }

    #[test]
    fn rejects_inverted_window() {
        let days = vec![day(1, "17:00", "09:00", &[])];
        assert_eq!(normalize_week(&days), Err(ScheduleError::EmptyWindow(1)));
    }

    #[test]
    fn silently_drops_breaks_outside_window() {
        let days = vec![day(
            1,
            "09:00",
            "17:00",
            &[("07:00", "08:00"), ("13:00", "14:00"), ("18:00", "19:00")],
        )];
        let normalized = normalize_week(&days).unwrap();
        assert_eq!(
            normalized[0].breaks,
            vec![BreakSpan { start_min: 780, end_min: 840 }]
        );
    }

    #[test]
    fn break_straddling_window_edge_is_kept() {
        // Overlaps the window partially, so it survives normalization.
        let days = vec![day(1, "09:00", "17:00", &[("16:30", "18:00")])];
        let normalized = normalize_week(&days).unwrap();
        assert_eq!(
            normalized[0].breaks,
            vec![BreakSpan { start_min: 990, end_min: 1080 }]
        );
    }

    #[test]
    fn drops_zero_length_breaks() {
        let days = vec![day(1, "09:00", "17:00", &[("13:00", "13:00")])];
        let normalized = normalize_week(&days).unwrap();
        assert!(normalized[0].breaks.is_empty());
    }

    #[test]
    fn allows_local_respects_window_and_breaks() {
        let schedule = WeeklySchedule {
            days: {
                let mut days: [Option<DaySchedule>; 7] = Default::default();
                days[1] = Some(DaySchedule {
                    start_min: 540, // 09:00
                    end_min: 1020,  // 17:00
                    breaks: vec![BreakSpan { start_min: 780, end_min: 840 }], // 13:00-14:00
                });
                days
            },
        };

        assert!(schedule.allows_local(1, 540, 60));
        assert!(schedule.allows_local(1, 960, 60)); // 16:00-17:00 fits exactly
        assert!(!schedule.allows_local(1, 961, 60)); // one minute past the end
        assert!(!schedule.allows_local(1, 750, 60)); // 12:30-13:30 hits the break
        assert!(schedule.allows_local(1, 720, 60)); // 12:00-13:00 touches it only
        assert!(!schedule.allows_local(2, 600, 60)); // closed weekday
        assert!(!schedule.allows_local(1, 500, 60)); // before opening
    }
}
