//! Cutroom event bus and outbound mail.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`]: the domain event envelope (comments, approvals).
//! - [`delivery`]: the [`MailTransport`] seam with SMTP and log-only
//!   implementations.
//! - [`templates`]: plain-text bodies for every email the service sends.

pub mod bus;
pub mod delivery;
pub mod templates;

pub use bus::{EventBus, PlatformEvent};
pub use delivery::log::LogMailer;
pub use delivery::smtp::{EmailConfig, SmtpMailer};
pub use delivery::{MailError, MailTransport, OutgoingEmail};
