//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod comment_repo;
pub mod key_date_repo;
pub mod project_repo;
pub mod recipient_repo;
pub mod role_repo;
pub mod sales_repo;
pub mod settings_repo;
pub mod share_otp_repo;
pub mod share_session_repo;
pub mod staff_session_repo;
pub mod user_repo;
pub mod video_asset_repo;
pub mod video_repo;

pub use comment_repo::CommentRepo;
pub use key_date_repo::KeyDateRepo;
pub use project_repo::ProjectRepo;
pub use recipient_repo::RecipientRepo;
pub use role_repo::RoleRepo;
pub use sales_repo::{InvoiceRepo, PaymentRepo, QuoteRepo, SalesClientRepo};
pub use settings_repo::SettingsRepo;
pub use share_otp_repo::ShareOtpRepo;
pub use share_session_repo::ShareSessionRepo;
pub use staff_session_repo::StaffSessionRepo;
pub use user_repo::UserRepo;
pub use video_asset_repo::VideoAssetRepo;
pub use video_repo::VideoRepo;
