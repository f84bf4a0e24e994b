//! # sphere-core
//!
//! Core crate for Study Sphere. Contains configuration schemas, the unified
//! error system, the `{success, data, message}` response envelope shared with
//! the backend API, and the collaborator traits (key-value storage, identity)
//! that the operation log is wired against.
//!
//! This crate has **no** internal dependencies on other Study Sphere crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
