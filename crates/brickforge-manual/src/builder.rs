//! Manual phase entry point: capture, then write the selected formats

use crate::capture::render_steps;
use crate::document::ManualDocument;
use crate::error::ManualResult;
use crate::html::write_html;
use crate::pdf::write_pdf;
use brickforge_core::{
    CameraSetup, GeometryObject, LightingSetup, ManualPage, SceneContext, SceneEngine,
};
use brickforge_steps::StepAssignment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Name of the render directory inside the instructions directory
pub const RENDER_DIR: &str = "renders";

/// Output document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManualFormat {
    Html,
    Pdf,
}

/// Manual settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualOptions {
    pub formats: Vec<ManualFormat>,
    pub camera: CameraSetup,
    pub lighting: LightingSetup,
}

impl Default for ManualOptions {
    fn default() -> Self {
        Self {
            formats: vec![ManualFormat::Html, ManualFormat::Pdf],
            camera: CameraSetup::default(),
            lighting: LightingSetup::default(),
        }
    }
}

/// Builds the manual for one model into an instructions directory
pub struct ManualBuilder {
    dir: PathBuf,
    options: ManualOptions,
}

impl ManualBuilder {
    pub fn new(dir: impl Into<PathBuf>, options: ManualOptions) -> Self {
        Self {
            dir: dir.into(),
            options,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn render_dir(&self) -> PathBuf {
        self.dir.join(RENDER_DIR)
    }

    /// Render one page per step
    pub fn capture<E: SceneEngine + ?Sized>(
        &self,
        ctx: &mut SceneContext<'_, E>,
        assignments: &[StepAssignment<'_, GeometryObject>],
    ) -> ManualResult<Vec<ManualPage>> {
        render_steps(
            ctx,
            assignments,
            &self.render_dir(),
            &self.options.camera,
            &self.options.lighting,
        )
    }

    /// Write every configured format; returns the written documents
    pub fn assemble(&self, title: &str, pages: Vec<ManualPage>) -> ManualResult<Vec<PathBuf>> {
        let document = ManualDocument::new(title, pages)?;
        let mut written = Vec::with_capacity(self.options.formats.len());
        for format in &self.options.formats {
            let path = match format {
                ManualFormat::Html => write_html(&document, &self.dir)?,
                ManualFormat::Pdf => write_pdf(&document, &self.dir)?,
            };
            info!("Manual written: {}", path.display());
            written.push(path);
        }
        Ok(written)
    }

    /// Capture and assemble in one go
    pub fn build<E: SceneEngine + ?Sized>(
        &self,
        ctx: &mut SceneContext<'_, E>,
        title: &str,
        assignments: &[StepAssignment<'_, GeometryObject>],
    ) -> ManualResult<Vec<PathBuf>> {
        let pages = self.capture(ctx, assignments)?;
        self.assemble(title, pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_formats() {
        let options = ManualOptions::default();
        assert_eq!(options.formats, vec![ManualFormat::Html, ManualFormat::Pdf]);
    }

    #[test]
    fn test_assemble_without_pages_fails() {
        let dir = tempfile::tempdir().unwrap();
        let builder = ManualBuilder::new(dir.path(), ManualOptions::default());
        assert!(matches!(
            builder.assemble("house", Vec::new()),
            Err(crate::ManualError::NoPages)
        ));
        assert!(!dir.path().join("house.html").exists());
    }
}
