//! One conversion run
//!
//! Import is the only fatal phase after argument checks. The manual and the
//! export each recover from their own failures: a broken manual is logged and
//! the export still runs, a broken object is recorded and the rest still
//! export.

use anyhow::{bail, Context};
use brickforge_core::{GeometryObject, SceneContext, SceneEngine};
use brickforge_export::{ExportPipeline, ExportReport};
use brickforge_manual::{title_for, ManualBuilder, ManualResult};
use brickforge_settings::Config;
use brickforge_steps::{assign_objects, read_steps, StepPlan};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Subdirectory of the output root holding the manual
pub const INSTRUCTIONS_DIR: &str = "instructions";

/// What to convert and where
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Build the manual even when the config does not enable it
    pub instructions: bool,
}

impl RunRequest {
    fn wants_manual(&self, config: &Config) -> bool {
        self.instructions || config.instructions.enabled
    }
}

/// Outcome of a completed run
#[derive(Debug, Default)]
pub struct RunReport {
    pub object_count: usize,
    pub export: ExportReport,
    /// Manual documents written, empty when the manual was skipped or failed
    pub manual: Vec<PathBuf>,
}

/// Import, optionally build the manual, then export
pub fn run<E: SceneEngine + ?Sized>(
    engine: &mut E,
    request: &RunRequest,
    config: &Config,
) -> anyhow::Result<RunReport> {
    let input = &request.input;
    if !input.is_file() {
        bail!("Input file not found: {}", input.display());
    }

    let mut ctx = SceneContext::new(engine);
    ctx.import(input, &config.import)
        .with_context(|| format!("Failed to import {}", input.display()))?;
    let objects = ctx.objects();
    info!("Model has {} mesh objects", objects.len());

    fs::create_dir_all(&request.output).with_context(|| {
        format!(
            "Failed to create output directory {}",
            request.output.display()
        )
    })?;

    let mut report = RunReport {
        object_count: objects.len(),
        ..Default::default()
    };

    if request.wants_manual(config) {
        if objects.is_empty() {
            info!("No objects to build a manual from");
        } else {
            match build_manual(&mut ctx, input, &request.output, &objects, config) {
                Ok(written) => report.manual = written,
                Err(e) => warn!("Manual not generated: {}", e),
            }
        }
    }

    let pipeline = ExportPipeline::new(&request.output, config.export.clone());
    report.export = pipeline.run(&mut ctx, &objects);

    info!(
        "Done: {} exported, {} failed, {} skipped into {}",
        report.export.exported_count(),
        report.export.failure_count(),
        report.export.skipped,
        request.output.display()
    );
    Ok(report)
}

fn build_manual<E: SceneEngine + ?Sized>(
    ctx: &mut SceneContext<'_, E>,
    input: &Path,
    output: &Path,
    objects: &[GeometryObject],
    config: &Config,
) -> ManualResult<Vec<PathBuf>> {
    let plan = StepPlan::resolve(objects.len(), read_steps(input), config.steps.batch_size);
    let assignments = assign_objects(objects, plan.steps());
    info!(
        "Building manual with {} {} steps",
        assignments.len(),
        if plan.is_synthesized() { "synthesized" } else { "declared" }
    );

    let builder = ManualBuilder::new(
        output.join(INSTRUCTIONS_DIR),
        config.instructions.manual.clone(),
    );
    builder.build(ctx, &title_for(input), &assignments)
}
