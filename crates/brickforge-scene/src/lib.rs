//! # BrickForge Scene
//!
//! The in-process scene engine used by the command-line tool.
//!
//! Loads LDraw (`.ldr`, `.mpd`, `.dat`) and Wavefront OBJ models into one mesh
//! object per part, applies the weld, triangulate and displace operators,
//! writes OBJ/MTL files and renders step images with `tiny-skia`.

pub mod color;
pub mod engine;
pub mod error;
pub mod ldraw;
pub mod library;
pub mod mesh;
pub mod obj;
pub mod render;

pub use color::{ColorTable, LdrawColor};
pub use engine::{MeshScene, SceneOptions};
pub use error::{LoadError, LoadResult};
pub use ldraw::{LdrawLoader, LoadedPart, LDU};
pub use library::Library;
pub use mesh::Mesh;
pub use obj::{import_obj, write_obj, MaterialRef, ObjObject};
