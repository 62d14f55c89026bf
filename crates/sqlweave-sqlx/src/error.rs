//! Error types for the sqlx adapter.

use sqlweave_core::{BindError, ReadError, RenderError, ValidationError};
use thiserror::Error;

/// Errors raised while preparing, binding, running or reading a statement.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The statement failed to render.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// The statement failed schema validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A parameter could not be bound.
    #[error("bind error: {0}")]
    Bind(#[from] BindError),

    /// A result column could not be read.
    #[error("read error: {0}")]
    Read(#[from] ReadError),
}

/// Result type alias for adapter operations.
pub type Result<T> = std::result::Result<T, AdapterError>;
