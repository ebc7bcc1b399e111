//! Per-object export loop
//!
//! Every exportable object goes through the same sequence: bucket, isolate,
//! weld, attach transient modifiers, pick a path, export, revert. A failure at
//! any point is recorded against that object and the loop moves on.

use crate::error::{ExportError, ExportResult};
use crate::naming::{bucket_key, resolve_output_path, NamingOptions};
use brickforge_core::{
    ExportRecord, GeometryObject, MeshExportOptions, ModifierSpec, SceneContext, SceneEngine,
    TriangulateParams,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Export settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Objects with fewer vertices are skipped
    pub min_vertices: usize,
    /// Weld distance in scene units
    pub weld_threshold: f64,
    /// Surface offset along normals in scene units; negative shrinks
    pub surface_offset: f64,
    /// Scene units to file units (metres to millimetres)
    pub export_scale: f64,
    pub with_materials: bool,
    pub triangulate: TriangulateParams,
    pub naming: NamingOptions,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            min_vertices: 3,
            weld_threshold: 0.0001,
            surface_offset: -0.000075,
            export_scale: 1000.0,
            with_materials: true,
            triangulate: TriangulateParams::default(),
            naming: NamingOptions::default(),
        }
    }
}

impl ExportOptions {
    fn modifiers(&self) -> [ModifierSpec; 2] {
        [
            ModifierSpec::Triangulate(self.triangulate),
            ModifierSpec::Displace {
                strength: self.surface_offset,
            },
        ]
    }

    fn mesh_options(&self) -> MeshExportOptions {
        MeshExportOptions {
            scale: self.export_scale,
            evaluate_modifiers: true,
            with_materials: self.with_materials,
        }
    }
}

/// An object that could not be exported
#[derive(Debug)]
pub struct ExportFailure {
    pub object: GeometryObject,
    pub reason: ExportError,
}

/// Accumulated outcome of one export run
#[derive(Debug, Default)]
pub struct ExportReport {
    pub exported: Vec<ExportRecord>,
    pub failures: Vec<ExportFailure>,
    /// Objects below the vertex minimum
    pub skipped: usize,
}

impl ExportReport {
    pub fn exported_count(&self) -> usize {
        self.exported.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Distinct bucket keys in first-seen order
    pub fn buckets(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.exported
            .iter()
            .map(|r| r.bucket_key.as_str())
            .filter(|key| seen.insert(*key))
            .collect()
    }
}

/// Batch exporter writing into one output root
pub struct ExportPipeline {
    output_root: PathBuf,
    options: ExportOptions,
}

impl ExportPipeline {
    pub fn new(output_root: impl Into<PathBuf>, options: ExportOptions) -> Self {
        Self {
            output_root: output_root.into(),
            options,
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Export every eligible object in list order
    pub fn run<E: SceneEngine + ?Sized>(
        &self,
        ctx: &mut SceneContext<'_, E>,
        objects: &[GeometryObject],
    ) -> ExportReport {
        let mut reserved = HashSet::new();

        let report = objects
            .iter()
            .fold(ExportReport::default(), |mut report, object| {
                if object.vertex_count < self.options.min_vertices {
                    debug!("Skipping {}: {} vertices", object, object.vertex_count);
                    report.skipped += 1;
                    return report;
                }

                match self.export_one(ctx, object, &reserved) {
                    Ok(record) => {
                        info!(
                            "[{}] Exported: {}",
                            report.exported.len() + 1,
                            record.output_path.display()
                        );
                        reserved.insert(record.output_path.clone());
                        report.exported.push(record);
                    }
                    Err(reason) => {
                        warn!("Failed to export {}: {}", object, reason);
                        report.failures.push(ExportFailure {
                            object: object.clone(),
                            reason,
                        });
                    }
                }
                report
            });

        info!(
            "Export finished: {} exported, {} failed, {} skipped",
            report.exported_count(),
            report.failure_count(),
            report.skipped
        );
        report
    }

    fn export_one<E: SceneEngine + ?Sized>(
        &self,
        ctx: &mut SceneContext<'_, E>,
        object: &GeometryObject,
        reserved: &HashSet<PathBuf>,
    ) -> ExportResult<ExportRecord> {
        let key = bucket_key(object.material.as_deref(), &self.options.naming);
        let bucket_dir = self.output_root.join(&key);
        fs::create_dir_all(&bucket_dir).map_err(|source| ExportError::BucketDirectory {
            path: bucket_dir.clone(),
            source,
        })?;

        let mut isolated = ctx.isolate(object).map_err(ExportError::Isolation)?;
        isolated
            .weld(self.options.weld_threshold)
            .map_err(ExportError::Adjustment)?;

        let mut scope = isolated
            .apply_modifiers(&self.options.modifiers())
            .map_err(ExportError::Adjustment)?;

        let output_path =
            resolve_output_path(&bucket_dir, &object.name, &self.options.naming, reserved);
        scope
            .export(&output_path, &self.options.mesh_options())
            .map_err(ExportError::Write)?;
        scope.release().map_err(ExportError::Revert)?;

        Ok(ExportRecord {
            source: object.clone(),
            bucket_key: key,
            output_path,
        })
    }
}
