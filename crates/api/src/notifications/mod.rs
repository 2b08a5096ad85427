//! Email notifications.
//!
//! The [`NotificationRouter`] subscribes to the event bus and turns client
//! activity into staff emails, and staff replies into client emails.

pub mod router;

pub use router::NotificationRouter;
