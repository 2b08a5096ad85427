//! Handlers for project key dates and the cross-project calendar.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use cutroom_core::key_dates::{
    validate_calendar_range, validate_kind, validate_time_window, validate_title,
};
use cutroom_core::types::DbId;
use cutroom_db::models::key_date::{CalendarEntry, CreateKeyDate, KeyDate, UpdateKeyDate};
use cutroom_db::repositories::KeyDateRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::projects::find_project;
use crate::middleware::rbac::RequireStaff;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CalendarParams {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// GET /api/v1/projects/{id}/key-dates
pub async fn list_key_dates(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<KeyDate>>>> {
    find_project(&state, project_id).await?;
    let dates = KeyDateRepo::list_by_project(&state.pool, project_id).await?;
    Ok(Json(DataResponse { data: dates }))
}

/// POST /api/v1/projects/{id}/key-dates
///
/// Entries given a start time without `all_day` are stored as timed.
pub async fn create_key_date(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(project_id): Path<DbId>,
    Json(input): Json<CreateKeyDate>,
) -> AppResult<(StatusCode, Json<DataResponse<KeyDate>>)> {
    find_project(&state, project_id).await?;
    validate_title(&input.title)?;
    if let Some(kind) = input.kind.as_deref() {
        validate_kind(kind)?;
    }
    let all_day = input.all_day.unwrap_or(input.start_time.is_none());
    validate_time_window(all_day, input.start_time, input.end_time)?;

    let input = CreateKeyDate {
        all_day: Some(all_day),
        ..input
    };
    let key_date = KeyDateRepo::create(&state.pool, project_id, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: key_date })))
}

/// PUT /api/v1/key-dates/{id}
pub async fn update_key_date(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateKeyDate>,
) -> AppResult<Json<DataResponse<KeyDate>>> {
    let existing = find_key_date(&state, id).await?;
    if let Some(title) = input.title.as_deref() {
        validate_title(title)?;
    }
    if let Some(kind) = input.kind.as_deref() {
        validate_kind(kind)?;
    }
    let (all_day, start, end) = merged_window(&existing, &input);
    validate_time_window(all_day, start, end)?;

    let key_date = KeyDateRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::not_found("KeyDate", id))?;
    Ok(Json(DataResponse { data: key_date }))
}

/// DELETE /api/v1/key-dates/{id}
pub async fn delete_key_date(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if KeyDateRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("KeyDate", id))
    }
}

/// GET /api/v1/calendar?from=YYYY-MM-DD&to=YYYY-MM-DD
pub async fn calendar(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
    Query(params): Query<CalendarParams>,
) -> AppResult<Json<DataResponse<Vec<CalendarEntry>>>> {
    validate_calendar_range(params.from, params.to)?;
    let entries = KeyDateRepo::calendar(&state.pool, params.from, params.to).await?;
    Ok(Json(DataResponse { data: entries }))
}

async fn find_key_date(state: &AppState, id: DbId) -> AppResult<KeyDate> {
    KeyDateRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::not_found("KeyDate", id))
}

/// The time window a key date will have once `update` is applied, using
/// the same rules as the repository.
fn merged_window(
    existing: &KeyDate,
    update: &UpdateKeyDate,
) -> (bool, Option<NaiveTime>, Option<NaiveTime>) {
    let all_day = update.all_day.unwrap_or(existing.all_day);
    if update.all_day == Some(true) {
        return (true, None, None);
    }
    (
        all_day,
        update.start_time.or(existing.start_time),
        update.end_time.or(existing.end_time),
    )
}
