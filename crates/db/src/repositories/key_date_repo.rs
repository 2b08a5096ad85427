//! Repository for the `project_key_dates` table.

use chrono::NaiveDate;
use sqlx::PgPool;
use cutroom_core::types::DbId;

use crate::models::key_date::{CalendarEntry, CreateKeyDate, KeyDate, UpdateKeyDate};

const COLUMNS: &str = "id, project_id, date, kind, title, notes, all_day, start_time, end_time, \
                        created_at, updated_at";

pub struct KeyDateRepo;

impl KeyDateRepo {
    pub async fn create(
        pool: &PgPool,
        project_id: DbId,
        input: &CreateKeyDate,
    ) -> Result<KeyDate, sqlx::Error> {
        let query = format!(
            "INSERT INTO project_key_dates
                (project_id, date, kind, title, notes, all_day, start_time, end_time)
             VALUES ($1, $2, COALESCE($3, 'other'), $4, $5, COALESCE($6, true), $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, KeyDate>(&query)
            .bind(project_id)
            .bind(input.date)
            .bind(&input.kind)
            .bind(input.title.trim())
            .bind(&input.notes)
            .bind(input.all_day)
            .bind(input.start_time)
            .bind(input.end_time)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<KeyDate>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM project_key_dates WHERE id = $1");
        sqlx::query_as::<_, KeyDate>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<KeyDate>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM project_key_dates
             WHERE project_id = $1
             ORDER BY date ASC, start_time NULLS FIRST"
        );
        sqlx::query_as::<_, KeyDate>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Update a key date. Only non-`None` fields are applied, except that
    /// setting `all_day = true` clears both times.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateKeyDate,
    ) -> Result<Option<KeyDate>, sqlx::Error> {
        let query = format!(
            "UPDATE project_key_dates SET
                date = COALESCE($2, date),
                kind = COALESCE($3, kind),
                title = COALESCE($4, title),
                notes = COALESCE($5, notes),
                all_day = COALESCE($6, all_day),
                start_time = CASE WHEN $6 = true THEN NULL ELSE COALESCE($7, start_time) END,
                end_time = CASE WHEN $6 = true THEN NULL ELSE COALESCE($8, end_time) END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, KeyDate>(&query)
            .bind(id)
            .bind(input.date)
            .bind(&input.kind)
            .bind(input.title.as_deref().map(str::trim))
            .bind(&input.notes)
            .bind(input.all_day)
            .bind(input.start_time)
            .bind(input.end_time)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM project_key_dates WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Key dates across all projects within `[from, to]`, joined with the
    /// project title.
    pub async fn calendar(
        pool: &PgPool,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CalendarEntry>, sqlx::Error> {
        sqlx::query_as::<_, CalendarEntry>(
            "SELECT k.id, k.project_id, p.title AS project_title, p.status AS project_status,
                    k.date, k.kind, k.title, k.all_day, k.start_time, k.end_time
             FROM project_key_dates k
             JOIN projects p ON p.id = k.project_id
             WHERE k.date BETWEEN $1 AND $2
             ORDER BY k.date ASC, k.start_time NULLS FIRST, k.id ASC",
        )
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }
}
