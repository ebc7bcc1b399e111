//! # BrickForge Export
//!
//! Writes every mesh object of an imported model to its own file, grouped into
//! one directory per color. Geometry is welded, triangulated and pulled inward
//! by a small offset for printing; the offset and triangulation are transient
//! and leave the scene as it was found.

pub mod error;
pub mod naming;
pub mod pipeline;

pub use error::{ExportError, ExportResult};
pub use naming::{bucket_key, normalize_material, resolve_output_path, sanitize, NamingOptions};
pub use pipeline::{ExportFailure, ExportOptions, ExportPipeline, ExportReport};
