//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - A create DTO for inserts
//! - An update DTO (all `Option` fields) for patches

pub mod comment;
pub mod key_date;
pub mod project;
pub mod recipient;
pub mod role;
pub mod sales;
pub mod settings;
pub mod share_otp;
pub mod share_session;
pub mod staff_session;
pub mod user;
pub mod video;
pub mod video_asset;
