//! Error types shared by every index operation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("file `{0}` not found")]
    NotFound(String),
    #[error("file `{0}` already exists")]
    Conflict(String),
    #[error("name `{name}` invalid: {reason}")]
    InvalidName { name: String, reason: String },
    #[error("search pattern `{pattern}` invalid: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("file `{name}` declares {declared} bytes but {uploaded} were received")]
    SizeMismatch {
        name: String,
        declared: u64,
        uploaded: u64,
    },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type IndexResult<T> = Result<T, IndexError>;

impl IndexError {
    pub(crate) fn invalid_name(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_pattern(pattern: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}
