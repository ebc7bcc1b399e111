//! Error types for the manual crate.

use thiserror::Error;

/// Errors that can occur while assembling the build manual.
#[derive(Error, Debug)]
pub enum ManualError {
    /// No step was rendered, so there is nothing to assemble.
    #[error("No pages to assemble")]
    NoPages,

    /// Framing the camera or staging lights failed.
    #[error("Failed to set up the view: {0}")]
    View(#[from] brickforge_core::SceneError),

    /// I/O error writing the document.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// PDF encoding error.
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// A step image could not be read or re-encoded.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type alias for manual operations.
pub type ManualResult<T> = Result<T, ManualError>;
