//! Singleton application settings.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use cutroom_core::types::Timestamp;

/// The single row of `app_settings`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AppSettings {
    pub company_name: String,
    pub admin_notification_email: Option<String>,
    pub fiscal_year_start_month: i16,
    pub default_currency: String,
    pub default_tax_rate_bps: i32,
    pub updated_at: Timestamp,
}

/// DTO for updating settings. All fields are optional.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateAppSettings {
    pub company_name: Option<String>,
    pub admin_notification_email: Option<String>,
    pub fiscal_year_start_month: Option<i16>,
    pub default_currency: Option<String>,
    pub default_tax_rate_bps: Option<i32>,
}
