//! Global error handling for filekit
//!
//! Most public operations report a plain success flag and log the cause.
//! The `Result`-returning entry points (strict disk checks, the symlink
//! creator, `Transfer::try_*`) surface this error type instead.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Global error type for filekit operations
#[derive(Error, Debug)]
pub enum FileKitError {
    /// File system errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Path not found
    #[error("Path not found: {0}")]
    PathNotFound(String),

    /// Path exists but is not a regular file
    #[error("Not a regular file: {0}")]
    NotAFile(String),

    /// Destination already exists and overwriting was not requested
    #[error("Destination already exists: {0}")]
    AlreadyExists(String),

    /// Destination volume lacks room for the operation
    #[error("{message}")]
    InsufficientSpace {
        /// Human-readable summary
        message: String,
        /// Bytes required, including the safety margin
        required: u64,
        /// Bytes available on the destination volume
        available: u64,
        /// `required - available`
        shortfall: u64,
        /// Path that was checked
        path: PathBuf,
    },

    /// Every symlink strategy declined
    #[error("Symlink creation failed: {0}")]
    SymlinkUnavailable(String),

    /// External command failed
    #[error("Command failed: {0}")]
    Command(String),

    /// JSON processing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unexpected error
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Specialized Result type for filekit operations
pub type Result<T> = std::result::Result<T, FileKitError>;

/// Creates a FileKitError with a formatted message
#[macro_export]
macro_rules! error {
    ($error_type:ident, $($arg:tt)*) => {
        $crate::error::FileKitError::$error_type(format!($($arg)*))
    };
}

/// Returns an error result with a formatted message
#[macro_export]
macro_rules! bail {
    ($error_type:ident, $($arg:tt)*) => {
        return Err($crate::error!($error_type, $($arg)*))
    };
}

/// Ensures a condition is true, otherwise returns an error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $error_type:ident, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($error_type, $($arg)*)
        }
    };
}

/// Extension trait for adding context to errors
pub trait ResultExt<T, E> {
    /// Add additional context to an error
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display;
}

impl<T, E: std::error::Error + 'static> ResultExt<T, E> for std::result::Result<T, E> {
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display,
    {
        self.map_err(|e| {
            let context = f();
            FileKitError::Unexpected(format!("{}: {}", context, e))
        })
    }
}

impl FileKitError {
    /// Shortfall in bytes for [`FileKitError::InsufficientSpace`], `None` otherwise
    pub fn shortfall(&self) -> Option<u64> {
        match self {
            Self::InsufficientSpace { shortfall, .. } => Some(*shortfall),
            _ => None,
        }
    }
}

// The binary's `main` returns io::Result
impl From<FileKitError> for io::Error {
    fn from(err: FileKitError) -> Self {
        match err {
            FileKitError::Io(e) => e,
            FileKitError::PathNotFound(_) => io::Error::new(io::ErrorKind::NotFound, err.to_string()),
            FileKitError::AlreadyExists(_) => {
                io::Error::new(io::ErrorKind::AlreadyExists, err.to_string())
            }
            FileKitError::InvalidArgument(_) => {
                io::Error::new(io::ErrorKind::InvalidInput, err.to_string())
            }
            other => io::Error::new(io::ErrorKind::Other, other.to_string()),
        }
    }
}
