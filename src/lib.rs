//! # BrickForge
//!
//! Converts brick models into print-ready meshes and a build manual.
//!
//! ## Architecture
//!
//! BrickForge is organized as a workspace with multiple crates:
//!
//! 1. **brickforge-core** - Data model, the `SceneEngine` trait, `SceneContext`
//! 2. **brickforge-steps** - Step parsing, synthesis and object assignment
//! 3. **brickforge-export** - Per-object, color-bucketed OBJ export
//! 4. **brickforge-manual** - Step renders and HTML/PDF manual assembly
//! 5. **brickforge-scene** - In-process LDraw/OBJ scene engine
//! 6. **brickforge-settings** - Configuration files and validation
//! 7. **brickforge** - Run orchestration and the command-line tool
//!
//! ## Features
//!
//! - **Model Import**: LDraw `.ldr`/`.mpd`/`.dat` and Wavefront `.obj`
//! - **Color Buckets**: one directory per normalized material name
//! - **Print Preparation**: weld, triangulate and inset every part
//! - **Build Manual**: declared or synthesized steps, HTML and PDF output

pub mod run;

pub use brickforge_core::{Error, GeometryObject, ObjectId, Result, SceneContext, SceneEngine};
pub use brickforge_export::{ExportOptions, ExportReport};
pub use brickforge_manual::{ManualFormat, ManualOptions};
pub use brickforge_scene::{MeshScene, SceneOptions};
pub use brickforge_settings::Config;
pub use run::{run, RunReport, RunRequest, INSTRUCTIONS_DIR};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Sets up structured logging with:
/// - Console output, plain text or JSON lines
/// - RUST_LOG environment variable support, falling back to `level`
pub fn init_logging(level: &str, json: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.to_lowercase()))?;

    if json {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_level(true);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}
