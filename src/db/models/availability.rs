use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use validator::Validate;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WorkingHourRow {
    pub id: Uuid,
    pub business_id: Uuid,
    pub day_of_week: i32,
    pub start_min: i32,
    pub end_min: i32,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BreakRow {
    pub id: Uuid,
    pub business_id: Uuid,
    pub day_of_week: i32,
    pub start_min: i32,
    pub end_min: i32,
}

fn default_slot_step() -> i32 {
    crate::scheduling::slots::DEFAULT_SLOT_STEP_MIN
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BreakInput {
    pub start: String,
    pub end: String,
}

/// One weekday of a schedule submission. Disabled days carry no bounds;
/// enabled days must, which the normalizer enforces (the HH:MM format check
/// also lives there, next to the parsing).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityDayInput {
    #[validate(range(max = 6, message = "dayOfWeek must be 0-6 (Sunday = 0)"))]
    pub day_of_week: u8,
    pub enabled: bool,
    pub start: Option<String>,
    pub end: Option<String>,
    #[serde(default)]
    pub breaks: Vec<BreakInput>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyScheduleInput {
    #[serde(default = "default_slot_step")]
    #[validate(range(min = 5, max = 120, message = "slotStepMin must be 5-120"))]
    pub slot_step_min: i32,
    #[validate(length(min = 1, message = "At least one day entry is required"), nested)]
    pub days: Vec<AvailabilityDayInput>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakView {
    pub start_min: i32,
    pub end_min: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityDayView {
    pub day_of_week: i32,
    pub start_min: i32,
    pub end_min: i32,
    pub breaks: Vec<BreakView>,
}

/// Retrieval shape: only configured weekdays appear; absence means closed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyScheduleView {
    pub slot_step_min: i32,
    pub days: Vec<AvailabilityDayView>,
}
