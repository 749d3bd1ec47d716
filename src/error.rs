//! Error types for dompage.

use std::io;
use thiserror::Error;

/// Result type alias for dompage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while rendering fragments onto pages.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading font files or manifests.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Manifest or option JSON could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A font face could not be fetched or decoded.
    ///
    /// Never surfaced by a render call: the resolver records it and the
    /// descriptor falls back to regular font matching.
    #[error("Font load error for '{family}': {reason}")]
    FontLoad {
        /// Family of the descriptor that failed
        family: String,
        /// Why the load failed
        reason: String,
    },

    /// The rasterizer failed to produce fragments.
    #[error("Rasterization error: {0}")]
    Rasterization(String),

    /// The document writer rejected a call.
    #[error("Document write error: {0}")]
    DocumentWrite(String),

    /// The planner produced a plan that does not reconstruct its input.
    #[error("Pagination invariant violated: {0}")]
    PaginationInvariant(String),

    /// Render options are unusable (zero content height, bad scale, ...).
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a [`Error::FontLoad`] from a family name and reason.
    pub fn font_load(family: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::FontLoad {
            family: family.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error aborts a render call.
    ///
    /// Font load failures are absorbed by the resolver; everything else
    /// ends the pipeline.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::FontLoad { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Rasterization("canvas unavailable".to_string());
        assert_eq!(err.to_string(), "Rasterization error: canvas unavailable");

        let err = Error::font_load("Roboto", "timed out");
        assert_eq!(err.to_string(), "Font load error for 'Roboto': timed out");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_font_errors_are_not_fatal() {
        assert!(!Error::font_load("Roboto", "404").is_fatal());
        assert!(Error::DocumentWrite("disk full".into()).is_fatal());
        assert!(Error::PaginationInvariant("gap".into()).is_fatal());
    }
}
