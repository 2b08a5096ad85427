//! Repository for the singleton `app_settings` row.

use sqlx::PgPool;

use crate::models::settings::{AppSettings, UpdateAppSettings};

const COLUMNS: &str = "company_name, admin_notification_email, fiscal_year_start_month, \
                        default_currency, default_tax_rate_bps, updated_at";

pub struct SettingsRepo;

impl SettingsRepo {
    /// Load the settings row (seeded by migration, always present).
    pub async fn get(pool: &PgPool) -> Result<AppSettings, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM app_settings WHERE id = 1");
        sqlx::query_as::<_, AppSettings>(&query)
            .fetch_one(pool)
            .await
    }

    /// Apply a partial update. An empty notification email clears it.
    pub async fn update(
        pool: &PgPool,
        input: &UpdateAppSettings,
    ) -> Result<AppSettings, sqlx::Error> {
        let query = format!(
            "UPDATE app_settings SET
                company_name = COALESCE($1, company_name),
                admin_notification_email = CASE
                    WHEN $2::TEXT IS NULL THEN admin_notification_email
                    ELSE NULLIF($2, '')
                END,
                fiscal_year_start_month = COALESCE($3, fiscal_year_start_month),
                default_currency = COALESCE($4, default_currency),
                default_tax_rate_bps = COALESCE($5, default_tax_rate_bps)
             WHERE id = 1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AppSettings>(&query)
            .bind(&input.company_name)
            .bind(&input.admin_notification_email)
            .bind(input.fiscal_year_start_month)
            .bind(&input.default_currency)
            .bind(input.default_tax_rate_bps)
            .fetch_one(pool)
            .await
    }
}
