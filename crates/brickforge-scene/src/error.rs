//! Error types for the scene crate.
//!
//! Loader errors stay local to this crate; the engine converts them into
//! [`ImportError`] at the trait boundary.

use brickforge_core::ImportError;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading model files.
#[derive(Error, Debug)]
pub enum LoadError {
    /// A file could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A file is not valid UTF-8 text.
    #[error("{path} is not a text file")]
    NotText { path: PathBuf },

    /// A sub-file reference forms a cycle.
    #[error("Recursive reference to {0}")]
    Recursion(String),

    /// The OBJ reader rejected the file.
    #[error("OBJ error: {0}")]
    Obj(#[from] tobj::LoadError),
}

impl LoadError {
    pub fn read(path: &Path, source: io::Error) -> Self {
        LoadError::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Convert into the engine-level import failure for `input`
    pub fn into_import_error(self, input: &Path) -> ImportError {
        ImportError::Rejected {
            path: input.to_path_buf(),
            reason: self.to_string(),
        }
    }
}

/// Result type alias for loader operations.
pub type LoadResult<T> = Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_display() {
        let err = LoadError::NotText {
            path: PathBuf::from("house.ldr"),
        };
        assert_eq!(err.to_string(), "house.ldr is not a text file");
    }

    #[test]
    fn test_into_import_error() {
        let err = LoadError::Recursion("loop.ldr".to_string());
        let import = err.into_import_error(Path::new("loop.ldr"));
        assert!(matches!(import, ImportError::Rejected { .. }));
        assert!(import.to_string().contains("Recursive reference"));
    }
}
