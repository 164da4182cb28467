//! Error types for Mural.
//!
//! This module provides the unified error type used throughout the
//! application. Recoverable failures (renderer, persistence) are logged at
//! the control-loop boundary; only the startup variants terminate the
//! process.

use thiserror::Error;

/// Errors that can occur during application execution.
#[derive(Debug, Error)]
pub enum MuralError {
    /// No monitors could be detected at startup.
    #[error("No monitors detected: {0}")]
    NoMonitors(String),
    /// No wallpapers survived discovery and filtering.
    #[error("No wallpapers found")]
    NoWallpapers,
    /// A rotation operation was attempted on an empty cyclic view.
    #[error("Cyclic view is empty")]
    EmptyPool,
    /// Filter expression failed to parse.
    #[error("Invalid filter expression: {0}")]
    Query(String),
    /// Store read, merge, or write failed.
    #[error("Store error: {0}")]
    Store(String),
    /// The external background setter failed.
    #[error("Renderer error: {0}")]
    Renderer(String),
    /// Terminal setup or drawing failed.
    #[error("Terminal error: {0}")]
    Terminal(String),
    /// An image file could not be decoded.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MuralError {
    /// Whether this error must abort startup rather than be logged and
    /// swallowed by the control loop.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::NoMonitors(_) | Self::NoWallpapers | Self::Query(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_monitors_display() {
        let err = MuralError::NoMonitors("xrandr returned no outputs".to_string());
        let msg = err.to_string();
        assert!(msg.contains("No monitors detected"));
        assert!(msg.contains("xrandr"));
    }

    #[test]
    fn test_query_error_display() {
        let err = MuralError::Query("unexpected token ')'".to_string());
        assert!(err.to_string().contains("Invalid filter expression"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: MuralError = io_err.into();
        assert!(matches!(err, MuralError::Io(_)));
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_startup_errors_are_fatal() {
        assert!(MuralError::NoWallpapers.is_fatal());
        assert!(MuralError::NoMonitors(String::new()).is_fatal());
        assert!(MuralError::Query(String::new()).is_fatal());
    }

    #[test]
    fn test_runtime_errors_are_recoverable() {
        assert!(!MuralError::Renderer("feh exited with 1".to_string()).is_fatal());
        assert!(!MuralError::Store("disk full".to_string()).is_fatal());
        assert!(!MuralError::EmptyPool.is_fatal());
    }
}
