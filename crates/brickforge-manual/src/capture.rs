//! Step render capture
//!
//! The camera is framed once on the finished model so every page shares the
//! same viewpoint. Each step then shows everything placed so far, with the
//! parts added in that step highlighted.

use crate::error::ManualResult;
use brickforge_core::{
    CameraSetup, GeometryObject, LightingSetup, ManualPage, ObjectId, SceneContext, SceneEngine,
};
use brickforge_steps::StepAssignment;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name of the render for one step, e.g. `step_007.png`
pub fn render_file_name(step_number: usize) -> String {
    format!("step_{:03}.png", step_number)
}

/// Render every step into `render_dir`
///
/// A step whose render fails is logged and left out; the returned pages stay
/// in step order. Only a failure to set up the shared view aborts capture.
pub fn render_steps<E: SceneEngine + ?Sized>(
    ctx: &mut SceneContext<'_, E>,
    assignments: &[StepAssignment<'_, GeometryObject>],
    render_dir: &Path,
    camera: &CameraSetup,
    lighting: &LightingSetup,
) -> ManualResult<Vec<ManualPage>> {
    std::fs::create_dir_all(render_dir)?;

    let framing = assignments
        .last()
        .map(|last| ids(last.cumulative))
        .unwrap_or_default();
    let camera = CameraSetup {
        framing,
        ..camera.clone()
    };
    ctx.configure_view(&camera, lighting)?;

    let mut pages = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        let target = render_dir.join(render_file_name(assignment.step_number));
        match render_one(ctx, assignment, &target) {
            Ok(image_path) => {
                debug!(
                    "Rendered step {} to {}",
                    assignment.step_number,
                    image_path.display()
                );
                pages.push(ManualPage {
                    step_number: assignment.step_number,
                    image_path,
                    new_part_count: assignment.new_objects.len(),
                });
            }
            Err(e) => warn!("Skipping step {}: {}", assignment.step_number, e),
        }
    }

    info!("Rendered {} of {} steps", pages.len(), assignments.len());
    Ok(pages)
}

fn render_one<E: SceneEngine + ?Sized>(
    ctx: &mut SceneContext<'_, E>,
    assignment: &StepAssignment<'_, GeometryObject>,
    target: &Path,
) -> Result<PathBuf, brickforge_core::SceneError> {
    ctx.stage_view(&ids(assignment.cumulative), &ids(assignment.new_objects))?;
    ctx.render(target)
}

fn ids(objects: &[GeometryObject]) -> Vec<ObjectId> {
    objects.iter().map(|o| o.id).collect()
}
