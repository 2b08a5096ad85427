//! Cutroom domain core.
//!
//! Constants, validation helpers, and pure calculations shared by the
//! database, event, and API crates. Nothing in here touches I/O.

pub mod error;
pub mod hashing;
pub mod key_dates;
pub mod review;
pub mod roles;
pub mod sales;
pub mod share;
pub mod types;
pub mod uploads;
