//! Application error types

use app_fs::{ErrorKind, FsError};
use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Request errors (abort the current request) =====
    #[error(transparent)]
    Fs(#[from] FsError),

    // ===== Startup errors =====
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Kind of a request failure; `None` for startup errors
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            AppError::Fs(e) => Some(e.kind()),
            _ => None,
        }
    }

    /// Is this caused by the caller's input rather than the server?
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.kind(),
            Some(ErrorKind::PathTraversalRejected | ErrorKind::MemberNotFound)
        )
    }

    /// Get a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AppError::Fs(FsError::PathTraversalRejected { .. }) => {
                "Access denied: path is outside the log directory".to_string()
            }
            AppError::Fs(FsError::MemberNotFound { member, .. }) => {
                format!("File not found: {}", member)
            }
            AppError::Fs(FsError::NoProviderFound(path)) => {
                format!("Cannot browse {}", path.display())
            }
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
