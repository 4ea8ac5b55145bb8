//! Error types for pinscreen.
//!
//! The PIN entry core itself never fails: invalid presses are ignored and
//! calls against missing widgets are no-ops. Errors only arise at the edges,
//! namely configuration, layout construction and terminal I/O.

use thiserror::Error;

use crate::config::ConfigError;
use crate::keyboard::LayoutError;

/// Top-level error for pinscreen operations.
#[derive(Error, Debug)]
pub enum PinError {
    /// Configuration-related error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Keyboard layout could not be built.
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),

    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TUI-related error.
    #[error("TUI error: {0}")]
    Tui(#[from] TuiError),
}

/// Errors that can occur while running the terminal front-end.
#[derive(Error, Debug)]
pub enum TuiError {
    /// Terminal initialization failed.
    #[error("failed to initialize terminal: {0}")]
    TerminalInit(#[source] std::io::Error),

    /// Terminal rendering failed.
    #[error("render error: {0}")]
    Render(#[source] std::io::Error),

    /// Event handling error.
    #[error("event error: {0}")]
    Event(String),
}

/// A specialized `Result` type for pinscreen operations.
pub type Result<T> = std::result::Result<T, PinError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn config_error_conversion() {
        let err: PinError = ConfigError::NoConfigDirectory.into();
        assert!(matches!(err, PinError::Config(_)));
        assert_eq!(
            err.to_string(),
            "configuration error: failed to determine config directory"
        );
    }

    #[test]
    fn layout_error_conversion() {
        let err: PinError = LayoutError::EmptyLayout.into();
        assert_eq!(
            err.to_string(),
            "layout error: keyboard layout must have at least one row and one column"
        );
    }

    #[test]
    fn io_error_keeps_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: PinError = io_err.into();
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "I/O error: access denied");
    }

    #[test]
    fn tui_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "raw mode failed");
        let err = TuiError::TerminalInit(io_err);
        assert_eq!(
            err.to_string(),
            "failed to initialize terminal: raw mode failed"
        );
        assert!(err.source().is_some());

        let err: PinError = TuiError::Event("poll timeout".to_string()).into();
        assert_eq!(err.to_string(), "TUI error: event error: poll timeout");
    }

    #[test]
    fn render_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "write failed");
        assert_eq!(
            TuiError::Render(io_err).to_string(),
            "render error: write failed"
        );
    }

    #[test]
    fn result_alias() {
        fn ok() -> Result<u8> {
            Ok(1)
        }
        fn fails() -> Result<u8> {
            Err(TuiError::Event("x".to_string()).into())
        }
        assert!(ok().is_ok());
        assert!(fails().is_err());
    }
}
