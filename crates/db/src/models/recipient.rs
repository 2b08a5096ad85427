//! Project recipient (client contact) model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use cutroom_core::types::{DbId, Timestamp};

/// A row from the `project_recipients` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Recipient {
    pub id: DbId,
    pub project_id: DbId,
    pub email: String,
    pub name: Option<String>,
    pub is_primary: bool,
    pub receive_notifications: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Recipient {
    /// Name to show on comments, falling back to the email address.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

/// DTO for adding a recipient to a project.
#[derive(Debug, Deserialize)]
pub struct CreateRecipient {
    pub email: String,
    pub name: Option<String>,
    pub is_primary: Option<bool>,
    pub receive_notifications: Option<bool>,
}

/// DTO for updating a recipient. All fields are optional.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRecipient {
    pub email: Option<String>,
    pub name: Option<String>,
    pub is_primary: Option<bool>,
    pub receive_notifications: Option<bool>,
}
