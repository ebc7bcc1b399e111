//! Error types for the export crate.
//!
//! Every variant describes why a single object could not be exported; none of
//! them stop the batch.

use brickforge_core::SceneError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while exporting one object.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The bucket directory could not be created.
    #[error("Failed to create bucket directory {path}: {source}")]
    BucketDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Selecting the object in the engine failed.
    #[error("Failed to isolate object: {0}")]
    Isolation(#[source] SceneError),

    /// Welding or attaching a transient modifier failed.
    #[error("Geometry adjustment failed: {0}")]
    Adjustment(#[source] SceneError),

    /// The engine could not write the mesh file.
    #[error("Mesh export failed: {0}")]
    Write(#[source] SceneError),

    /// Transient modifiers could not be removed after export.
    #[error("Failed to revert transient modifiers: {0}")]
    Revert(#[source] SceneError),
}

/// Result type alias for export operations.
pub type ExportResult<T> = Result<T, ExportError>;
