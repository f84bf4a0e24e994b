//! Convenience result type alias for Study Sphere.

use crate::error::AppError;

/// A specialized `Result` type for Study Sphere operations.
pub type AppResult<T> = Result<T, AppError>;
