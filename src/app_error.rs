use filestore_index::IndexError;
use std::{fmt, process::ExitCode};

/// A lightweight wrapper for command failures that keeps the message local
/// and maps each index error kind to its own exit code.
#[derive(Debug)]
pub struct AppError {
    pub code: u8,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific exit code and message.
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
        }
    }

    /// Shortcut for a generic failure (exit code 1)
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(1, msg)
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl From<&IndexError> for AppError {
    fn from(err: &IndexError) -> Self {
        let code = match err {
            IndexError::NotFound(_) => 2,
            IndexError::Conflict(_) => 3,
            IndexError::InvalidName { .. } | IndexError::InvalidPattern { .. } => 4,
            IndexError::SizeMismatch { .. } => 5,
            IndexError::Sqlx(_) | IndexError::Json(_) => 1,
        };
        AppError::new(code, err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<IndexError>() {
            Some(index_err) => AppError::from(index_err),
            None => AppError::internal(format!("{err:#}")),
        }
    }
}
