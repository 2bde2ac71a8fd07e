//! Error types for taskm
//!
//! Exit codes:
//! - 0: Success (including "task not found" and "already done" reports)
//! - 1: User error (conflicting flags, missing arguments, bad config)
//! - 2: Operation failed (I/O, storage, background worker failure)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the taskm CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 1;
    pub const OPERATION_FAILED: i32 = 2;
}

/// Main error type for taskm operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 1)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Operation failures (exit code 2)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Background worker failed: {0}")]
    WorkerJoin(#[from] tokio::task::JoinError),
}

impl Error {
    /// Wrap an I/O error with the file it concerns
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Storage {
            path: path.into(),
            source,
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidArgument(_) | Error::InvalidConfig(_) => exit_codes::USER_ERROR,

            Error::Io(_)
            | Error::Storage { .. }
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::WorkerJoin(_) => exit_codes::OPERATION_FAILED,
        }
    }
}

/// Result type alias for taskm operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_errors_exit_with_one() {
        assert_eq!(
            Error::InvalidArgument("x".to_string()).exit_code(),
            exit_codes::USER_ERROR
        );
        assert_eq!(
            Error::InvalidConfig("x".to_string()).exit_code(),
            exit_codes::USER_ERROR
        );
    }

    #[test]
    fn storage_error_mentions_path() {
        let err = Error::storage(
            "/tmp/tasks.txt",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.exit_code(), exit_codes::OPERATION_FAILED);
        assert!(err.to_string().contains("/tmp/tasks.txt"));
    }
}
