//! Shared types used across crates.

pub mod actor;
pub mod response;

pub use actor::Actor;
pub use response::ApiEnvelope;
