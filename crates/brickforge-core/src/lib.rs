//! # BrickForge Core
//!
//! Core types, traits, and utilities for BrickForge.
//! Provides the data model shared by the step, export and manual crates,
//! the [`SceneEngine`] trait every 3D back end implements, and the
//! [`SceneContext`] that serializes access to the engine's selection state.

pub mod context;
pub mod error;
pub mod model;
pub mod scene;

pub use context::{Isolated, ModifierScope, ModifierSpec, SceneContext};

pub use error::{Error, ImportError, Result, SceneError};

pub use model::{ExportRecord, GeometryObject, ManualPage, ObjectId, PartReference, Step};

pub use scene::{
    CameraSetup, GapPolicy, ImportOptions, LightingSetup, MeshExportOptions, ModifierHandle,
    Resolution, SceneEngine, SplitMethod, TriangulateParams,
};
