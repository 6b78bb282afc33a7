use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime};
use uuid::Uuid;
use validator::Validate;

use super::service;
use crate::app_state::AppState;
use crate::db::{UserRepository, UserRole, WeeklyScheduleInput, WeeklyScheduleView};
use crate::error::{AppError, AppResult};
use crate::modules::auth::AuthUser;
use crate::scheduling::interval::{clamp_tz_offset, to_utc};
use crate::scheduling::slots::{DEFAULT_SLOT_STEP_MIN, MAX_DURATION_MIN, MIN_DURATION_MIN};

pub async fn get_my_availability(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<WeeklyScheduleView>> {
    require_business(auth)?;
    let view = service::get_schedule_view(&state.db, auth.id).await?;
    Ok(Json(view))
}

pub async fn put_my_availability(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<WeeklyScheduleInput>,
) -> AppResult<Json<WeeklyScheduleView>> {
    require_business(auth)?;
    payload.validate()?;
    let view = service::replace_schedule(&state.db, auth.id, &payload).await?;
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotsQuery {
    pub business_id: Option<Uuid>,
    /// Business-local calendar day, YYYY-MM-DD. Alternative to from/to.
    pub date: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub duration_min: i32,
    pub slot_step_min: Option<i32>,
}

/// `GET /api/availability/slots?businessId=...`, range or single-day form.
pub async fn get_slots(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<SlotsQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let business_id = query
        .business_id
        .ok_or_else(|| AppError::Validation("Missing businessId".to_string()))?;
    slots_response(&state, business_id, &query).await
}

/// `GET /api/businesses/{id}/slots`, the same data under a business-scoped path.
pub async fn get_business_slots(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(business_id): Path<Uuid>,
    Query(query): Query<SlotsQuery>,
) -> AppResult<Json<serde_json::Value>> {
    slots_response(&state, business_id, &query).await
}

async fn slots_response(
    state: &AppState,
    business_id: Uuid,
    query: &SlotsQuery,
) -> AppResult<Json<serde_json::Value>> {
    if !(MIN_DURATION_MIN..=MAX_DURATION_MIN).contains(&query.duration_min) {
        return Err(AppError::Validation(format!(
            "durationMin must be {MIN_DURATION_MIN}-{MAX_DURATION_MIN}"
        )));
    }

    let business = UserRepository::get_by_id(&state.db, business_id)
        .await?
        .filter(|u| u.role == UserRole::Business)
        .ok_or_else(|| AppError::NotFound("Business not found".to_string()))?;

    let (from, to) = resolve_range(query, business.timezone_offset_min)?;
    let slots = service::free_slots_for_business(
        &state.db,
        business_id,
        from,
        to,
        query.duration_min,
        query.slot_step_min.unwrap_or(DEFAULT_SLOT_STEP_MIN),
    )
    .await?;

    let slots: Vec<String> = slots
        .into_iter()
        .map(|s| {
            s.format(&Rfc3339)
                .map_err(|e| AppError::Internal(format!("Failed to format slot: {e}")))
        })
        .collect::<AppResult<_>>()?;

    Ok(Json(json!({
        "businessId": business_id,
        "durationMin": query.duration_min,
        "slots": slots,
    })))
}

/// A `date` is a calendar day on the business's local clock; `from`/`to`
/// are absolute instants.
fn resolve_range(
    query: &SlotsQuery,
    tz_offset_min: i32,
) -> AppResult<(OffsetDateTime, OffsetDateTime)> {
    if let Some(date) = query.date.as_deref() {
        let day = Date::parse(date, format_description!("[year]-[month]-[day]"))
            .map_err(|_| AppError::Validation("Invalid date (expected YYYY-MM-DD)".to_string()))?;
        let local_midnight = day.midnight().assume_utc();
        let from = to_utc(local_midnight, clamp_tz_offset(tz_offset_min));
        return Ok((from, from + Duration::days(1)));
    }

    match (query.from.as_deref(), query.to.as_deref()) {
        (Some(from), Some(to)) => Ok((
            parse_instant(from, "from")?,
            parse_instant(to, "to")?,
        )),
        _ => Err(AppError::Validation(
            "Provide either date or both from and to".to_string(),
        )),
    }
}

fn parse_instant(value: &str, field: &str) -> AppResult<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc3339)
        .map_err(|_| AppError::Validation(format!("Invalid {field} (expected RFC 3339)")))
}

fn require_business(auth: AuthUser) -> AppResult<()> {
    if auth.role != UserRole::Business {
        return Err(AppError::Forbidden(
            "Only businesses can manage availability".to_string(),
        ));
    }
    Ok(())
}
