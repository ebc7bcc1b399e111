//! Serialized access to the engine's shared selection state
//!
//! [`SceneContext`] wraps the engine for the duration of a run. Selection is only
//! changed by [`SceneContext::isolate`], and the returned [`Isolated`] borrow keeps
//! the context locked until the caller is done with that object. Transient
//! modifiers live in a [`ModifierScope`] that removes them when it goes away,
//! whichever way the export attempt ends.

use crate::error::{ImportError, SceneError};
use crate::model::{GeometryObject, ObjectId};
use crate::scene::{
    CameraSetup, ImportOptions, LightingSetup, MeshExportOptions, ModifierHandle, SceneEngine,
    TriangulateParams,
};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A transient modifier to attach for one export
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModifierSpec {
    Triangulate(TriangulateParams),
    Displace { strength: f64 },
}

/// Exclusive handle on the engine for one conversion run
pub struct SceneContext<'e, E: SceneEngine + ?Sized> {
    engine: &'e mut E,
}

impl<'e, E: SceneEngine + ?Sized> SceneContext<'e, E> {
    pub fn new(engine: &'e mut E) -> Self {
        Self { engine }
    }

    pub fn import(&mut self, path: &Path, options: &ImportOptions) -> Result<(), ImportError> {
        self.engine.deselect_all();
        self.engine.import_model(path, options)
    }

    pub fn objects(&self) -> Vec<GeometryObject> {
        self.engine.objects()
    }

    pub fn modifier_count(&self, id: ObjectId) -> usize {
        self.engine.modifier_count(id)
    }

    /// Make `object` the only selected and the active object
    pub fn isolate(&mut self, object: &GeometryObject) -> Result<Isolated<'_, E>, SceneError> {
        self.engine.deselect_all();
        self.engine.select_only(object.id)?;
        self.engine.set_active(object.id)?;
        debug!("Isolated {}", object);
        Ok(Isolated {
            engine: &mut *self.engine,
            object: object.id,
        })
    }

    pub fn configure_view(
        &mut self,
        camera: &CameraSetup,
        lighting: &LightingSetup,
    ) -> Result<(), SceneError> {
        self.engine.configure_camera(camera)?;
        self.engine.configure_lighting(lighting)
    }

    pub fn stage_view(
        &mut self,
        visible: &[ObjectId],
        highlighted: &[ObjectId],
    ) -> Result<(), SceneError> {
        self.engine.stage_view(visible, highlighted)
    }

    pub fn render(&mut self, path: &Path) -> Result<PathBuf, SceneError> {
        self.engine.render_current_view(path)
    }
}

impl<E: SceneEngine + ?Sized> Drop for SceneContext<'_, E> {
    fn drop(&mut self) {
        self.engine.deselect_all();
    }
}

/// The engine with exactly one object selected and active
pub struct Isolated<'s, E: SceneEngine + ?Sized> {
    engine: &'s mut E,
    object: ObjectId,
}

impl<'s, E: SceneEngine + ?Sized> Isolated<'s, E> {
    pub fn object(&self) -> ObjectId {
        self.object
    }

    /// Permanently merge coincident vertices of the isolated object
    pub fn weld(&mut self, threshold: f64) -> Result<usize, SceneError> {
        let merged = self.engine.weld(threshold)?;
        if merged > 0 {
            debug!("Welded {} vertices on {}", merged, self.object);
        }
        Ok(merged)
    }

    /// Attach transient modifiers in order
    ///
    /// If any attachment fails, the ones already attached are removed before
    /// the error is returned.
    pub fn apply_modifiers(
        &mut self,
        specs: &[ModifierSpec],
    ) -> Result<ModifierScope<'_, E>, SceneError> {
        let mut scope = ModifierScope {
            engine: &mut *self.engine,
            handles: Vec::with_capacity(specs.len()),
        };
        for spec in specs {
            let handle = match spec {
                ModifierSpec::Triangulate(params) => {
                    scope.engine.add_triangulate_modifier(params)?
                }
                ModifierSpec::Displace { strength } => {
                    scope.engine.add_displace_modifier(*strength)?
                }
            };
            scope.handles.push(handle);
        }
        Ok(scope)
    }
}

/// Transient modifiers that must not outlive one export
pub struct ModifierScope<'i, E: SceneEngine + ?Sized> {
    engine: &'i mut E,
    handles: Vec<ModifierHandle>,
}

impl<E: SceneEngine + ?Sized> ModifierScope<'_, E> {
    pub fn handles(&self) -> &[ModifierHandle] {
        &self.handles
    }

    /// Export the isolated object with the modifiers evaluated
    pub fn export(&mut self, path: &Path, options: &MeshExportOptions) -> Result<(), SceneError> {
        self.engine.export_selected(path, options)
    }

    /// Remove every modifier, reporting the first failure
    pub fn release(mut self) -> Result<(), SceneError> {
        let handles = std::mem::take(&mut self.handles);
        remove_all(&mut *self.engine, handles)
    }
}

impl<E: SceneEngine + ?Sized> Drop for ModifierScope<'_, E> {
    fn drop(&mut self) {
        if self.handles.is_empty() {
            return;
        }
        let handles = std::mem::take(&mut self.handles);
        if let Err(e) = remove_all(&mut *self.engine, handles) {
            warn!("Failed to remove transient modifier: {}", e);
        }
    }
}

fn remove_all<E: SceneEngine + ?Sized>(
    engine: &mut E,
    handles: Vec<ModifierHandle>,
) -> Result<(), SceneError> {
    let mut first_error = None;
    for handle in handles.into_iter().rev() {
        if let Err(e) = engine.remove_modifier(handle) {
            first_error.get_or_insert(e);
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
