//! # sphere-oplog
//!
//! Operation log recorder for Study Sphere. Every administrative action
//! (login, course creation, evaluation edits, ...) is written to the backend
//! audit log and mirrored into a bounded local cache, so the log stays
//! readable when the backend is unreachable.
//!
//! - [`dedup`]: drops identical calls repeated inside a short window
//! - [`retention`]: bounds the local cache by count and by age
//! - [`ip`]: best-effort client IP resolution with a process-lifetime cache
//! - [`remote`]: the backend API client
//! - [`store`]: the local cache and its key-value backends
//! - [`recorder`]: the [`LogRecorder`] tying it all together

pub mod clock;
pub mod csv;
pub mod dedup;
pub mod entry;
pub mod identity;
pub mod ip;
pub mod recorder;
pub mod remote;
pub mod retention;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use entry::{LogDetails, LogEntry, RecordRequest};
pub use recorder::{ClearOutcome, ListSource, LogListing, LogRecorder, RecordOutcome};
