//! Project key date model and DTOs.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use cutroom_core::types::{DbId, Timestamp};

/// A row from the `project_key_dates` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct KeyDate {
    pub id: DbId,
    pub project_id: DbId,
    pub date: NaiveDate,
    pub kind: String,
    pub title: String,
    pub notes: Option<String>,
    pub all_day: bool,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a key date.
#[derive(Debug, Deserialize)]
pub struct CreateKeyDate {
    pub date: NaiveDate,
    pub kind: Option<String>,
    pub title: String,
    pub notes: Option<String>,
    pub all_day: Option<bool>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

/// DTO for updating a key date. All fields are optional.
///
/// Switching to all-day clears both times.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateKeyDate {
    pub date: Option<NaiveDate>,
    pub kind: Option<String>,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub all_day: Option<bool>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

/// A key date joined with its project for the calendar view.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CalendarEntry {
    pub id: DbId,
    pub project_id: DbId,
    pub project_title: String,
    pub project_status: String,
    pub date: NaiveDate,
    pub kind: String,
    pub title: String,
    pub all_day: bool,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}
