//! Project key dates (shoots, reviews, deliveries) and calendar ranges.

use chrono::{NaiveDate, NaiveTime};

use crate::error::CoreError;

pub const KIND_PRE_PRODUCTION: &str = "pre_production";
pub const KIND_SHOOT: &str = "shoot";
pub const KIND_REVIEW: &str = "review";
pub const KIND_DELIVERY: &str = "delivery";
pub const KIND_MILESTONE: &str = "milestone";
pub const KIND_OTHER: &str = "other";

pub const VALID_KINDS: &[&str] = &[
    KIND_PRE_PRODUCTION,
    KIND_SHOOT,
    KIND_REVIEW,
    KIND_DELIVERY,
    KIND_MILESTONE,
    KIND_OTHER,
];

/// Longest calendar window a single request may ask for.
pub const MAX_CALENDAR_SPAN_DAYS: i64 = 366;

/// Maximum length of a key date title.
pub const MAX_TITLE_LENGTH: usize = 200;

pub fn validate_kind(kind: &str) -> Result<(), CoreError> {
    if VALID_KINDS.contains(&kind) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid key date kind '{kind}'. Must be one of: {}",
            VALID_KINDS.join(", ")
        )))
    }
}

pub fn validate_title(title: &str) -> Result<(), CoreError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Title must not be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Title exceeds maximum length of {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

/// All-day entries carry no times; timed entries need a start, and an
/// end (when given) must come after it.
pub fn validate_time_window(
    all_day: bool,
    start: Option<NaiveTime>,
    end: Option<NaiveTime>,
) -> Result<(), CoreError> {
    if all_day {
        if start.is_some() || end.is_some() {
            return Err(CoreError::Validation(
                "All-day entries cannot have start or end times".to_string(),
            ));
        }
        return Ok(());
    }
    let Some(start) = start else {
        return Err(CoreError::Validation(
            "Timed entries need a start time".to_string(),
        ));
    };
    if let Some(end) = end {
        if end <= start {
            return Err(CoreError::Validation(
                "End time must be after start time".to_string(),
            ));
        }
    }
    Ok(())
}

/// Validate a calendar query window.
pub fn validate_calendar_range(from: NaiveDate, to: NaiveDate) -> Result<(), CoreError> {
    if to < from {
        return Err(CoreError::Validation(
            "Calendar range end must not precede its start".to_string(),
        ));
    }
    if (to - from).num_days() > MAX_CALENDAR_SPAN_DAYS {
        return Err(CoreError::Validation(format!(
            "Calendar range may span at most {MAX_CALENDAR_SPAN_DAYS} days"
        )));
    }
    Ok(())
}
