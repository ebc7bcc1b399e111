//! Error handling for BrickForge
//!
//! Provides error types for every layer of a conversion run:
//! - Scene errors (engine state, modifiers, rendering)
//! - Import errors (unsupported or rejected model files)
//! - Export errors (per-object mesh export)
//!
//! All error types use `thiserror` for ergonomic error handling.

use crate::model::ObjectId;
use std::path::PathBuf;
use thiserror::Error;

/// Scene engine error type
///
/// Represents failures reported by a [`crate::SceneEngine`] implementation
/// while querying or mutating engine-owned state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// The referenced object is not part of the live scene
    #[error("Object {id} not found in scene")]
    ObjectNotFound {
        /// The missing object id.
        id: ObjectId,
    },

    /// An operation needed a selected object but the selection is empty
    #[error("No object selected")]
    NothingSelected,

    /// An operation needed an active object but none is set
    #[error("No active object")]
    NoActiveObject,

    /// The modifier handle does not belong to any live modifier
    #[error("Modifier {serial} not found on object {object}")]
    ModifierNotFound {
        /// Object the handle was issued for.
        object: ObjectId,
        /// Serial number of the handle.
        serial: u64,
    },

    /// A geometry operator could not be applied
    #[error("Geometry operation '{operation}' failed: {reason}")]
    Geometry {
        /// Operator name.
        operation: String,
        /// Failure reason.
        reason: String,
    },

    /// Writing a mesh file failed
    #[error("Failed to export {path}: {reason}")]
    Export {
        /// Target path.
        path: PathBuf,
        /// Failure reason.
        reason: String,
    },

    /// Rendering the current view failed
    #[error("Render failed: {reason}")]
    Render {
        /// Failure reason.
        reason: String,
    },

    /// Generic engine error
    #[error("Scene error: {message}")]
    Other {
        /// The error message.
        message: String,
    },
}

/// Import error type
///
/// Import failures are fatal for a run: nothing can be exported
/// or rendered without a populated scene.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImportError {
    /// The input file does not exist or is not a regular file
    #[error("Input file not found: {path}")]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// The file extension is not handled by the engine
    #[error("Unsupported model format: {extension}")]
    UnsupportedFormat {
        /// The offending extension (lowercase, without dot).
        extension: String,
    },

    /// The engine could not read or interpret the file
    #[error("Failed to import {path}: {reason}")]
    Rejected {
        /// The input path.
        path: PathBuf,
        /// The reason the engine gave.
        reason: String,
    },

    /// The file was read but produced no mesh objects
    #[error("Model {path} contains no mesh objects")]
    Empty {
        /// The input path.
        path: PathBuf,
    },
}

/// Main error type for BrickForge
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Scene engine error
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// Model import error
    #[error(transparent)]
    Import(#[from] ImportError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
