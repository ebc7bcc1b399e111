//! Scene engine abstraction
//!
//! The 3D engine owns geometry, selection and rendering state. Everything the
//! pipeline needs from it goes through [`SceneEngine`]; every call is blocking
//! and the pipeline never issues more than one at a time.

use crate::error::{ImportError, SceneError};
use crate::model::{GeometryObject, ObjectId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Primitive resolution used when the engine tessellates library parts
///
/// Defaults to `High`: exported meshes are meant for printing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Low,
    Standard,
    #[default]
    High,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Standard => write!(f, "standard"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Shrink applied to each part on import so neighbours do not touch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapPolicy {
    pub enabled: bool,
    /// Total gap between two neighbouring parts, in millimetres
    pub width_mm: f64,
}

impl Default for GapPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            width_mm: 0.1,
        }
    }
}

/// Parameters for [`SceneEngine::import_model`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportOptions {
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default)]
    pub gaps: GapPolicy,
}

/// How non-triangular faces are split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMethod {
    /// Split along the shorter diagonal / best-shaped fan
    #[default]
    Beauty,
    /// Always split from the first vertex
    Fixed,
}

/// Parameters for the triangulate modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriangulateParams {
    pub quad_method: SplitMethod,
    pub ngon_method: SplitMethod,
    pub keep_custom_normals: bool,
}

impl Default for TriangulateParams {
    fn default() -> Self {
        Self {
            quad_method: SplitMethod::Beauty,
            ngon_method: SplitMethod::Beauty,
            keep_custom_normals: true,
        }
    }
}

/// Parameters for [`SceneEngine::export_selected`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshExportOptions {
    /// Uniform scale applied to written positions
    pub scale: f64,
    /// Bake transient modifiers into the written geometry
    pub evaluate_modifiers: bool,
    pub with_materials: bool,
}

/// Handle to one transient modifier on one object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModifierHandle {
    pub object: ObjectId,
    pub serial: u64,
}

/// Orthographic camera placement for step renders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSetup {
    /// Rotation about the vertical axis, degrees
    pub azimuth_deg: f64,
    /// Angle above the horizon, degrees
    pub elevation_deg: f64,
    /// Objects the view is fitted to
    #[serde(skip)]
    pub framing: Vec<ObjectId>,
    pub width: u32,
    pub height: u32,
    /// Fraction of the image left empty around the framed objects
    pub margin: f64,
}

impl Default for CameraSetup {
    fn default() -> Self {
        Self {
            azimuth_deg: 45.0,
            elevation_deg: 30.0,
            framing: Vec::new(),
            width: 800,
            height: 600,
            margin: 0.08,
        }
    }
}

/// Simple directional lighting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingSetup {
    /// Light direction in view-independent world space
    pub direction: [f64; 3],
    pub ambient: f64,
    /// RGB background
    pub background: [u8; 3],
}

impl Default for LightingSetup {
    fn default() -> Self {
        Self {
            direction: [-0.4, -0.6, 1.0],
            ambient: 0.35,
            background: [255, 255, 255],
        }
    }
}

/// Blocking interface to the 3D engine
///
/// Selection and the active object are single pieces of engine-global state;
/// callers should reach them through [`crate::SceneContext`] rather than
/// calling the selection methods directly.
pub trait SceneEngine {
    /// Populate the live object set from a model file
    fn import_model(&mut self, path: &Path, options: &ImportOptions) -> Result<(), ImportError>;

    /// Live mesh objects in import order
    fn objects(&self) -> Vec<GeometryObject>;

    fn select_only(&mut self, id: ObjectId) -> Result<(), SceneError>;

    fn deselect_all(&mut self);

    fn set_active(&mut self, id: ObjectId) -> Result<(), SceneError>;

    /// Merge vertices of the active object closer than `threshold`; returns the number removed
    fn weld(&mut self, threshold: f64) -> Result<usize, SceneError>;

    fn add_triangulate_modifier(
        &mut self,
        params: &TriangulateParams,
    ) -> Result<ModifierHandle, SceneError>;

    /// Offset the active object's surface along its normals (negative moves inward)
    fn add_displace_modifier(&mut self, strength: f64) -> Result<ModifierHandle, SceneError>;

    fn remove_modifier(&mut self, handle: ModifierHandle) -> Result<(), SceneError>;

    /// Number of transient modifiers currently attached to an object
    fn modifier_count(&self, id: ObjectId) -> usize;

    /// Write the selected objects to `path`
    fn export_selected(
        &mut self,
        path: &Path,
        options: &MeshExportOptions,
    ) -> Result<(), SceneError>;

    fn configure_camera(&mut self, camera: &CameraSetup) -> Result<(), SceneError>;

    fn configure_lighting(&mut self, lighting: &LightingSetup) -> Result<(), SceneError>;

    /// Show only `visible`; draw `highlighted` (a subset) emphasised
    fn stage_view(
        &mut self,
        visible: &[ObjectId],
        highlighted: &[ObjectId],
    ) -> Result<(), SceneError>;

    /// Render the staged view to an image file and return its path
    fn render_current_view(&mut self, path: &Path) -> Result<PathBuf, SceneError>;
}
