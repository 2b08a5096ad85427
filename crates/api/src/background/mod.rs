//! Long-running maintenance tasks spawned from `main`.
//!
//! Tasks stop when their `CancellationToken` is cancelled at shutdown.

pub mod cleanup;
