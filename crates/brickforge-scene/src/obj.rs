//! Wavefront OBJ import and export
//!
//! OBJ files are Y-up; the scene is Z-up. Positions are rotated on the way in
//! and rotated back on the way out, so an import/export round trip keeps the
//! file's orientation.

use crate::error::LoadResult;
use crate::mesh::Mesh;
use nalgebra::Point3;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::warn;

/// One OBJ model as a scene object
#[derive(Debug, Clone)]
pub struct ObjObject {
    pub name: String,
    pub material: Option<String>,
    pub color: Option<[u8; 3]>,
    pub mesh: Mesh,
}

/// Material written alongside an exported mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialRef<'a> {
    pub name: &'a str,
    pub rgb: [u8; 3],
}

fn obj_to_scene(x: f64, y: f64, z: f64) -> Point3<f64> {
    Point3::new(x, -z, y)
}

fn scene_to_obj(p: &Point3<f64>) -> [f64; 3] {
    // `+ 0.0` turns -0.0 into 0.0
    [p.x, p.z, -p.y + 0.0]
}

/// Read every model of an OBJ file; faces keep their arity
pub fn import_obj(path: &Path) -> LoadResult<Vec<ObjObject>> {
    let options = tobj::LoadOptions {
        single_index: true,
        triangulate: false,
        ..Default::default()
    };
    let (models, materials) = tobj::load_obj(path, &options)?;
    let materials = materials.unwrap_or_else(|e| {
        warn!("Materials for {} not loaded: {}", path.display(), e);
        Vec::new()
    });

    let objects = models
        .into_iter()
        .map(|model| {
            let mesh = &model.mesh;
            let positions: Vec<Point3<f64>> = mesh
                .positions
                .chunks_exact(3)
                .map(|c| obj_to_scene(c[0] as f64, c[1] as f64, c[2] as f64))
                .collect();

            let indices: Vec<usize> = mesh.indices.iter().map(|&i| i as usize).collect();
            let faces: Vec<Vec<usize>> = if mesh.face_arities.is_empty() {
                indices.chunks_exact(3).map(<[usize]>::to_vec).collect()
            } else {
                let mut start = 0;
                mesh.face_arities
                    .iter()
                    .map(|&arity| {
                        let end = start + arity as usize;
                        let face = indices[start..end.min(indices.len())].to_vec();
                        start = end;
                        face
                    })
                    .filter(|face| face.len() >= 3)
                    .collect()
            };

            let material = mesh.material_id.and_then(|id| materials.get(id));
            ObjObject {
                name: model.name.clone(),
                material: material.map(|m| m.name.clone()),
                color: material.and_then(|m| m.diffuse).map(|[r, g, b]| {
                    [to_byte(r), to_byte(g), to_byte(b)]
                }),
                mesh: Mesh::new(positions, faces),
            }
        })
        .collect();
    Ok(objects)
}

fn to_byte(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Write `mesh` as a single-object OBJ, plus an MTL beside it when a material
/// is given
pub fn write_obj(
    path: &Path,
    name: &str,
    mesh: &Mesh,
    material: Option<MaterialRef<'_>>,
    scale: f64,
) -> io::Result<()> {
    let mtl_path = path.with_extension("mtl");
    let mut out = BufWriter::new(File::create(path)?);

    writeln!(out, "# BrickForge {}", env!("CARGO_PKG_VERSION"))?;
    if let (Some(_), Some(mtl_name)) = (material, mtl_path.file_name()) {
        writeln!(out, "mtllib {}", mtl_name.to_string_lossy())?;
    }
    writeln!(out, "o {}", name)?;
    for p in &mesh.positions {
        let [x, y, z] = scene_to_obj(p);
        writeln!(out, "v {:.6} {:.6} {:.6}", x * scale, y * scale, z * scale)?;
    }
    if let Some(material) = material {
        writeln!(out, "usemtl {}", material.name)?;
    }
    writeln!(out, "s off")?;
    for face in &mesh.faces {
        let indices: Vec<String> = face.iter().map(|i| (i + 1).to_string()).collect();
        writeln!(out, "f {}", indices.join(" "))?;
    }
    out.flush()?;

    if let Some(material) = material {
        write_mtl(&mtl_path, material)?;
    }
    Ok(())
}

fn write_mtl(path: &Path, material: MaterialRef<'_>) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    let [r, g, b] = material.rgb.map(|c| c as f64 / 255.0);
    writeln!(out, "newmtl {}", material.name)?;
    writeln!(out, "Kd {:.4} {:.4} {:.4}", r, g, b)?;
    writeln!(out, "Ka 0.0000 0.0000 0.0000")?;
    writeln!(out, "d 1.0")?;
    writeln!(out, "illum 1")?;
    out.flush()
}
