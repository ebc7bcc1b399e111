//! In-process scene engine
//!
//! [`MeshScene`] keeps every imported part as its own mesh object and
//! implements the full [`SceneEngine`] surface on top of the loaders, the mesh
//! operators, the OBJ writer and the software renderer.

use crate::color::ColorTable;
use crate::error::LoadResult;
use crate::ldraw::LdrawLoader;
use crate::library::Library;
use crate::mesh::Mesh;
use crate::obj::{import_obj, write_obj, MaterialRef};
use crate::render::{self, Framing, RenderItem, ViewBasis};
use brickforge_core::{
    CameraSetup, GeometryObject, ImportError, ImportOptions, LightingSetup, MeshExportOptions,
    ModifierHandle, ModifierSpec, ObjectId, Resolution, SceneEngine, SceneError,
    TriangulateParams,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Millimetres to scene units
const MM: f64 = 0.001;

/// Color of objects imported without a material
const DEFAULT_RGB: [u8; 3] = [0x8A, 0x92, 0x8D];

/// Engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneOptions {
    /// Root of an LDraw parts library (`parts/`, `p/`, `LDConfig.ldr`)
    pub library: Option<PathBuf>,
}

#[derive(Debug, Clone)]
struct SceneObject {
    id: ObjectId,
    name: String,
    material: Option<String>,
    rgb: [u8; 3],
    mesh: Mesh,
    modifiers: Vec<(u64, ModifierSpec)>,
}

impl SceneObject {
    /// Mesh with the modifier stack applied in order
    fn evaluated(&self) -> Mesh {
        self.modifiers
            .iter()
            .fold(self.mesh.clone(), |mesh, (_, spec)| match spec {
                ModifierSpec::Triangulate(params) => mesh.triangulated(params),
                ModifierSpec::Displace { strength } => mesh.displaced(*strength),
            })
    }
}

/// Staged render view
#[derive(Debug, Clone, Default)]
struct Staging {
    visible: Vec<ObjectId>,
    highlighted: HashSet<ObjectId>,
}

/// Mesh objects with selection, modifier, camera and lighting state
#[derive(Debug, Default)]
pub struct MeshScene {
    options: SceneOptions,
    objects: Vec<SceneObject>,
    selection: BTreeSet<ObjectId>,
    active: Option<ObjectId>,
    next_id: u64,
    next_serial: u64,
    camera: CameraSetup,
    lighting: LightingSetup,
    staging: Option<Staging>,
}

impl MeshScene {
    pub fn new(options: SceneOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn options(&self) -> &SceneOptions {
        &self.options
    }

    pub fn selection(&self) -> Vec<ObjectId> {
        self.selection.iter().copied().collect()
    }

    pub fn active(&self) -> Option<ObjectId> {
        self.active
    }

    fn clear(&mut self) {
        self.objects.clear();
        self.selection.clear();
        self.active = None;
        self.staging = None;
    }

    fn object(&self, id: ObjectId) -> Result<&SceneObject, SceneError> {
        self.objects
            .iter()
            .find(|o| o.id == id)
            .ok_or(SceneError::ObjectNotFound { id })
    }

    fn object_mut(&mut self, id: ObjectId) -> Result<&mut SceneObject, SceneError> {
        self.objects
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(SceneError::ObjectNotFound { id })
    }

    fn active_mut(&mut self) -> Result<&mut SceneObject, SceneError> {
        let id = self.active.ok_or(SceneError::NoActiveObject)?;
        self.object_mut(id)
    }

    fn push_object(&mut self, name: String, material: Option<String>, rgb: [u8; 3], mesh: Mesh) {
        self.next_id += 1;
        self.objects.push(SceneObject {
            id: ObjectId(self.next_id),
            name,
            material,
            rgb,
            mesh,
            modifiers: Vec::new(),
        });
    }

    fn load_ldraw(&mut self, path: &Path, resolution: Resolution) -> LoadResult<()> {
        let library = Library::new(self.options.library.clone(), resolution);
        let colors = ColorTable::load(library.root());
        let model_dir = path.parent().unwrap_or_else(|| Path::new("."));

        for part in LdrawLoader::new(&library, model_dir).load(path)? {
            let material = colors.name(part.color);
            let rgb = colors.rgb(part.color);
            self.push_object(part.name, Some(material), rgb, part.mesh);
        }
        Ok(())
    }

    fn load_obj(&mut self, path: &Path) -> LoadResult<()> {
        for object in import_obj(path)? {
            if object.mesh.is_empty() {
                debug!("OBJ model '{}' has no faces, skipped", object.name);
                continue;
            }
            let rgb = object.color.unwrap_or(DEFAULT_RGB);
            self.push_object(object.name, object.material, rgb, object.mesh);
        }
        Ok(())
    }

    fn add_modifier(&mut self, spec: ModifierSpec) -> Result<ModifierHandle, SceneError> {
        self.next_serial += 1;
        let serial = self.next_serial;
        let object = self.active_mut()?;
        object.modifiers.push((serial, spec));
        debug!("Added {:?} to {}", spec, object.id);
        Ok(ModifierHandle {
            object: object.id,
            serial,
        })
    }
}

impl SceneEngine for MeshScene {
    fn import_model(&mut self, path: &Path, options: &ImportOptions) -> Result<(), ImportError> {
        if !path.is_file() {
            return Err(ImportError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        self.clear();
        let loaded = match extension.as_str() {
            "ldr" | "mpd" | "dat" => self.load_ldraw(path, options.resolution),
            "obj" => self.load_obj(path),
            _ => return Err(ImportError::UnsupportedFormat { extension }),
        };
        if let Err(e) = loaded {
            self.clear();
            return Err(e.into_import_error(path));
        }

        if self.objects.is_empty() {
            return Err(ImportError::Empty {
                path: path.to_path_buf(),
            });
        }

        if options.gaps.enabled {
            let gap = options.gaps.width_mm * MM;
            for object in &mut self.objects {
                object.mesh.shrink_to_gap(gap);
            }
        }

        info!(
            "Imported {} objects from {} ({} resolution)",
            self.objects.len(),
            path.display(),
            options.resolution
        );
        Ok(())
    }

    fn objects(&self) -> Vec<GeometryObject> {
        self.objects
            .iter()
            .map(|o| GeometryObject::new(o.id, &o.name, o.material.clone(), o.mesh.vertex_count()))
            .collect()
    }

    fn select_only(&mut self, id: ObjectId) -> Result<(), SceneError> {
        self.object(id)?;
        self.selection.clear();
        self.selection.insert(id);
        Ok(())
    }

    fn deselect_all(&mut self) {
        self.selection.clear();
    }

    fn set_active(&mut self, id: ObjectId) -> Result<(), SceneError> {
        self.object(id)?;
        self.active = Some(id);
        Ok(())
    }

    fn weld(&mut self, threshold: f64) -> Result<usize, SceneError> {
        let object = self.active_mut()?;
        Ok(object.mesh.weld(threshold))
    }

    fn add_triangulate_modifier(
        &mut self,
        params: &TriangulateParams,
    ) -> Result<ModifierHandle, SceneError> {
        self.add_modifier(ModifierSpec::Triangulate(*params))
    }

    fn add_displace_modifier(&mut self, strength: f64) -> Result<ModifierHandle, SceneError> {
        if !strength.is_finite() {
            return Err(SceneError::Geometry {
                operation: "displace".to_string(),
                reason: format!("strength {} is not finite", strength),
            });
        }
        self.add_modifier(ModifierSpec::Displace { strength })
    }

    fn remove_modifier(&mut self, handle: ModifierHandle) -> Result<(), SceneError> {
        let not_found = SceneError::ModifierNotFound {
            object: handle.object,
            serial: handle.serial,
        };
        let object = self
            .object_mut(handle.object)
            .map_err(|_| not_found.clone())?;
        let index = object
            .modifiers
            .iter()
            .position(|(serial, _)| *serial == handle.serial)
            .ok_or(not_found)?;
        object.modifiers.remove(index);
        Ok(())
    }

    fn modifier_count(&self, id: ObjectId) -> usize {
        self.object(id).map_or(0, |o| o.modifiers.len())
    }

    fn export_selected(
        &mut self,
        path: &Path,
        options: &MeshExportOptions,
    ) -> Result<(), SceneError> {
        let selected: Vec<&SceneObject> = self
            .objects
            .iter()
            .filter(|o| self.selection.contains(&o.id))
            .collect();
        let Some(first) = selected.first() else {
            return Err(SceneError::NothingSelected);
        };

        let mut mesh = Mesh::default();
        for object in &selected {
            if options.evaluate_modifiers {
                mesh.append(&object.evaluated());
            } else {
                mesh.append(&object.mesh);
            }
        }

        let material = match (&first.material, options.with_materials) {
            (Some(name), true) => Some(MaterialRef {
                name,
                rgb: first.rgb,
            }),
            _ => None,
        };

        write_obj(path, &first.name, &mesh, material, options.scale).map_err(|e| {
            SceneError::Export {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        debug!("Wrote {} faces to {}", mesh.face_count(), path.display());
        Ok(())
    }

    fn configure_camera(&mut self, camera: &CameraSetup) -> Result<(), SceneError> {
        if camera.width == 0 || camera.height == 0 {
            return Err(SceneError::Render {
                reason: format!("invalid image size {}x{}", camera.width, camera.height),
            });
        }
        for &id in &camera.framing {
            self.object(id)?;
        }
        self.camera = camera.clone();
        Ok(())
    }

    fn configure_lighting(&mut self, lighting: &LightingSetup) -> Result<(), SceneError> {
        self.lighting = *lighting;
        Ok(())
    }

    fn stage_view(
        &mut self,
        visible: &[ObjectId],
        highlighted: &[ObjectId],
    ) -> Result<(), SceneError> {
        for &id in visible.iter().chain(highlighted) {
            self.object(id)?;
        }
        self.staging = Some(Staging {
            visible: visible.to_vec(),
            highlighted: highlighted.iter().copied().collect(),
        });
        Ok(())
    }

    fn render_current_view(&mut self, path: &Path) -> Result<PathBuf, SceneError> {
        let items: Vec<RenderItem<'_>> = match &self.staging {
            Some(staging) => staging
                .visible
                .iter()
                .filter_map(|&id| self.object(id).ok())
                .map(|o| RenderItem {
                    mesh: &o.mesh,
                    color: o.rgb,
                    highlighted: staging.highlighted.contains(&o.id),
                })
                .collect(),
            None => self
                .objects
                .iter()
                .map(|o| RenderItem {
                    mesh: &o.mesh,
                    color: o.rgb,
                    highlighted: true,
                })
                .collect(),
        };

        let basis = ViewBasis::from_camera(&self.camera);
        let framing = if self.camera.framing.is_empty() {
            Framing::fit(&basis, items.iter().map(|item| item.mesh), &self.camera)
        } else {
            let framed = self
                .objects
                .iter()
                .filter(|o| self.camera.framing.contains(&o.id))
                .map(|o| &o.mesh);
            Framing::fit(&basis, framed, &self.camera)
        };

        let pixmap = render::render(&items, &framing, &basis, &self.camera, &self.lighting)
            .ok_or_else(|| SceneError::Render {
                reason: format!(
                    "cannot allocate a {}x{} image",
                    self.camera.width, self.camera.height
                ),
            })?;
        pixmap.save_png(path).map_err(|e| SceneError::Render {
            reason: format!("{}: {}", path.display(), e),
        })?;
        debug!("Rendered {} objects to {}", items.len(), path.display());
        Ok(path.to_path_buf())
    }
}
