//! Error types for dataset curation operations

use thiserror::Error;

/// Result type alias for curation operations
pub type Result<T> = std::result::Result<T, CurationError>;

/// Error types for dataset curation operations
///
/// Per-candidate fetch/decode failures are deliberately NOT represented here;
/// they are carried by [`crate::fetch::SampleFailure`] and recovered at the
/// pipeline boundary. Only run-fatal conditions reach this enum.
#[derive(Error, Debug)]
pub enum CurationError {
    /// Input/output errors (directory creation, file writes, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image encoding or processing errors on the output path
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// The upstream corpus cannot be reached or understood at all
    #[error("Upstream source unavailable: {0}")]
    SourceUnavailable(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CurationError {
    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new source-unavailable error
    pub fn source_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::SourceUnavailable(msg.into())
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }
}
