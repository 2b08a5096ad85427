//! Repository for the seeded `roles` table (`admin`, `editor`).

use sqlx::PgPool;
use cutroom_core::types::DbId;

use crate::models::role::Role;

pub struct RoleRepo;

impl RoleRepo {
    pub async fn list(pool: &PgPool) -> Result<Vec<Role>, sqlx::Error> {
        sqlx::query_as::<_, Role>(
            "SELECT id, name, description, created_at FROM roles ORDER BY id",
        )
        .fetch_all(pool)
        .await
    }

    /// Name of the role, or `None` when no such role is seeded.
    pub async fn name_of(pool: &PgPool, role_id: DbId) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT name FROM roles WHERE id = $1")
            .bind(role_id)
            .fetch_optional(pool)
            .await
    }

    /// Role name for a user row. The foreign key guarantees the role
    /// exists, so a miss is surfaced as `RowNotFound`.
    pub async fn resolve_name(pool: &PgPool, role_id: DbId) -> Result<String, sqlx::Error> {
        Self::name_of(pool, role_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }
}
