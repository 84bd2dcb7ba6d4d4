//! Global error handling for cliptree
//!
//! Per-item failures (a bad pattern, an unreadable file) are built as
//! `ClipTreeError` values, logged and collected for the report. Only the
//! run-level failures propagate out of the pipeline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::clipboard::ClipboardError;

/// Global error type for cliptree operations
#[derive(Error, Debug)]
pub enum ClipTreeError {
    /// An ignore pattern that could not be compiled
    #[error("Invalid ignore pattern '{pattern}' ({origin}): {reason}")]
    InvalidPattern {
        pattern: String,
        origin: String,
        reason: String,
    },

    /// A requested root does not exist
    #[error("Path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    /// A directory could not be listed
    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    /// A file could not be read or decoded as UTF-8
    #[error("Failed to read {}: {reason}", .path.display())]
    ReadDecode { path: PathBuf, reason: String },

    /// Nothing qualified for output
    #[error("No valid files to copy")]
    NoContent,

    /// The clipboard refused the copy
    #[error("Failed to copy to clipboard: {0}")]
    Clipboard(#[from] ClipboardError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Specialized Result type for cliptree operations
pub type Result<T> = std::result::Result<T, ClipTreeError>;

/// Returns an error result with a formatted message
#[macro_export]
macro_rules! bail {
    ($error_type:ident, $($arg:tt)*) => {
        return Err($crate::error::ClipTreeError::$error_type(format!($($arg)*)))
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

#[cfg(test)]
mod tests {
    use super::*;

    fn needs_positive(n: i32) -> Result<i32> {
        ensure!(n > 0, Config, "expected a positive number, got {}", n);
        Ok(n)
    }

    #[test]
    fn test_ensure_builds_config_error() {
        assert_eq!(needs_positive(3).unwrap(), 3);
        let err = needs_positive(-1).unwrap_err();
        assert!(matches!(err, ClipTreeError::Config(_)));
        assert_eq!(
            err.to_string(),
            "Configuration error: expected a positive number, got -1"
        );
    }

    #[test]
    fn test_messages_name_the_path() {
        let err = ClipTreeError::ReadDecode {
            path: PathBuf::from("/tmp/a.bin"),
            reason: "stream did not contain valid UTF-8".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to read /tmp/a.bin: stream did not contain valid UTF-8"
        );
        assert_eq!(ClipTreeError::NoContent.to_string(), "No valid files to copy");
    }
}
