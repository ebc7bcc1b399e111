//! Polygon mesh and the geometry operators applied before export
//!
//! Faces are stored as index lists so quads and n-gons survive import
//! untouched; [`Mesh::triangulated`] splits them only when asked to.

use brickforge_core::{SplitMethod, TriangulateParams};
use nalgebra::{Matrix4, Point3, Vector3};
use std::collections::HashMap;

/// An indexed polygon mesh in scene units
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<Point3<f64>>,
    /// Vertex indices per face, at least three each
    pub faces: Vec<Vec<usize>>,
}

impl Mesh {
    pub fn new(positions: Vec<Point3<f64>>, faces: Vec<Vec<usize>>) -> Self {
        Self { positions, faces }
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Add a face given by its corner positions
    pub fn push_polygon(&mut self, corners: &[Point3<f64>]) {
        let start = self.positions.len();
        self.positions.extend_from_slice(corners);
        self.faces.push((start..start + corners.len()).collect());
    }

    /// Append another mesh, offsetting its indices
    pub fn append(&mut self, other: &Mesh) {
        let offset = self.positions.len();
        self.positions.extend_from_slice(&other.positions);
        self.faces.extend(
            other
                .faces
                .iter()
                .map(|face| face.iter().map(|i| i + offset).collect()),
        );
    }

    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        for p in &mut self.positions {
            *p = matrix.transform_point(p);
        }
    }

    /// Axis-aligned bounds, `None` for a mesh without vertices
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = *self.positions.first()?;
        Some(self.positions.iter().fold((first, first), |(min, max), p| {
            (min.inf(p), max.sup(p))
        }))
    }

    /// Shrink about the bounding-box center so every extent loses `gap`
    ///
    /// Axes not larger than the gap are left alone.
    pub fn shrink_to_gap(&mut self, gap: f64) {
        let Some((min, max)) = self.bounds() else {
            return;
        };
        if gap <= 0.0 {
            return;
        }
        let center = nalgebra::center(&min, &max);
        let extent = max - min;
        let scale = extent.map(|e| if e > gap { (e - gap) / e } else { 1.0 });
        for p in &mut self.positions {
            let offset = (*p - center).component_mul(&scale);
            *p = center + offset;
        }
    }

    /// Triangles of every face, fanned from the first corner
    pub fn fan_triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.faces.iter().flat_map(|face| {
            (1..face.len().saturating_sub(1)).map(move |i| [face[0], face[i], face[i + 1]])
        })
    }

    /// Merge vertices closer than `threshold`; returns how many were removed
    ///
    /// Faces that collapse to fewer than three distinct corners are dropped.
    pub fn weld(&mut self, threshold: f64) -> usize {
        if threshold <= 0.0 || self.positions.is_empty() {
            return 0;
        }

        let cell = |p: &Point3<f64>| {
            (
                (p.x / threshold).floor() as i64,
                (p.y / threshold).floor() as i64,
                (p.z / threshold).floor() as i64,
            )
        };

        // Representatives by grid cell; a vertex merges into the first
        // representative within reach in its own or a neighbouring cell.
        let mut grid: HashMap<(i64, i64, i64), Vec<usize>> = HashMap::new();
        let mut remap = vec![0usize; self.positions.len()];
        let mut kept: Vec<Point3<f64>> = Vec::with_capacity(self.positions.len());

        for (index, p) in self.positions.iter().enumerate() {
            let (cx, cy, cz) = cell(p);
            let mut found = None;
            'search: for dx in -1..=1 {
                for dy in -1..=1 {
                    for dz in -1..=1 {
                        if let Some(candidates) = grid.get(&(cx + dx, cy + dy, cz + dz)) {
                            if let Some(&rep) = candidates
                                .iter()
                                .find(|&&rep| (kept[rep] - p).norm() <= threshold)
                            {
                                found = Some(rep);
                                break 'search;
                            }
                        }
                    }
                }
            }

            remap[index] = match found {
                Some(rep) => rep,
                None => {
                    kept.push(*p);
                    let rep = kept.len() - 1;
                    grid.entry((cx, cy, cz)).or_default().push(rep);
                    rep
                }
            };
        }

        let removed = self.positions.len() - kept.len();
        self.positions = kept;
        self.faces = self
            .faces
            .iter()
            .filter_map(|face| {
                let mut merged: Vec<usize> = Vec::with_capacity(face.len());
                for &i in face {
                    let v = remap[i];
                    if merged.last() != Some(&v) {
                        merged.push(v);
                    }
                }
                while merged.len() > 1 && merged.first() == merged.last() {
                    merged.pop();
                }
                let mut distinct = merged.clone();
                distinct.sort_unstable();
                distinct.dedup();
                (distinct.len() >= 3).then_some(merged)
            })
            .collect();
        removed
    }

    /// Copy with every face split into triangles
    pub fn triangulated(&self, params: &TriangulateParams) -> Mesh {
        let mut faces = Vec::with_capacity(self.faces.len() * 2);
        for face in &self.faces {
            match face.len() {
                0..=2 => {}
                3 => faces.push(face.clone()),
                4 => {
                    let [a, b, c, d] = [face[0], face[1], face[2], face[3]];
                    let split_first = match params.quad_method {
                        SplitMethod::Fixed => true,
                        SplitMethod::Beauty => {
                            let ac = (self.positions[a] - self.positions[c]).norm_squared();
                            let bd = (self.positions[b] - self.positions[d]).norm_squared();
                            ac <= bd
                        }
                    };
                    if split_first {
                        faces.push(vec![a, b, c]);
                        faces.push(vec![a, c, d]);
                    } else {
                        faces.push(vec![b, c, d]);
                        faces.push(vec![b, d, a]);
                    }
                }
                n => {
                    for i in 1..n - 1 {
                        faces.push(vec![face[0], face[i], face[i + 1]]);
                    }
                }
            }
        }
        Mesh::new(self.positions.clone(), faces)
    }

    /// Per-vertex normals weighted by adjacent face area
    pub fn vertex_normals(&self) -> Vec<Vector3<f64>> {
        let mut normals = vec![Vector3::zeros(); self.positions.len()];
        for [a, b, c] in self.fan_triangles() {
            let weighted = (self.positions[b] - self.positions[a])
                .cross(&(self.positions[c] - self.positions[a]));
            normals[a] += weighted;
            normals[b] += weighted;
            normals[c] += weighted;
        }
        for n in &mut normals {
            *n = n.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros);
        }
        normals
    }

    /// Signed enclosed volume; negative when faces wind inward
    pub fn signed_volume(&self) -> f64 {
        self.fan_triangles()
            .map(|[a, b, c]| {
                let (pa, pb, pc) = (
                    self.positions[a].coords,
                    self.positions[b].coords,
                    self.positions[c].coords,
                );
                pa.dot(&pb.cross(&pc)) / 6.0
            })
            .sum()
    }

    /// Copy with every vertex moved `strength` along its outward normal
    ///
    /// Outward is decided by the sign of the enclosed volume, so inverted
    /// winding still shrinks for a negative strength.
    pub fn displaced(&self, strength: f64) -> Mesh {
        let orientation = if self.signed_volume() < 0.0 { -1.0 } else { 1.0 };
        let normals = self.vertex_normals();
        let positions = self
            .positions
            .iter()
            .zip(&normals)
            .map(|(p, n)| p + n * (strength * orientation))
            .collect();
        Mesh::new(positions, self.faces.clone())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Unit cube with one quad per side and shared corners, wound outward
    pub(crate) fn cube(size: f64) -> Mesh {
        let s = size;
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(s, 0.0, 0.0),
            Point3::new(s, s, 0.0),
            Point3::new(0.0, s, 0.0),
            Point3::new(0.0, 0.0, s),
            Point3::new(s, 0.0, s),
            Point3::new(s, s, s),
            Point3::new(0.0, s, s),
        ];
        let faces = vec![
            vec![0, 3, 2, 1],
            vec![4, 5, 6, 7],
            vec![0, 1, 5, 4],
            vec![1, 2, 6, 5],
            vec![2, 3, 7, 6],
            vec![3, 0, 4, 7],
        ];
        Mesh::new(positions, faces)
    }

    /// The same cube with every face owning its own corners
    fn split_cube(size: f64) -> Mesh {
        let shared = cube(size);
        let mut mesh = Mesh::default();
        for face in &shared.faces {
            let corners: Vec<_> = face.iter().map(|&i| shared.positions[i]).collect();
            mesh.push_polygon(&corners);
        }
        mesh
    }

    #[test]
    fn test_cube_volume_is_positive() {
        assert!((cube(2.0).signed_volume() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_weld_merges_shared_corners() {
        let mut mesh = split_cube(1.0);
        assert_eq!(mesh.vertex_count(), 24);
        let removed = mesh.weld(0.0001);
        assert_eq!(removed, 16);
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.face_count(), 6);
        assert!((mesh.signed_volume() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_weld_drops_collapsed_faces() {
        let mut mesh = Mesh::default();
        mesh.push_polygon(&[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.00001, 0.0, 0.0),
            Point3::new(0.0, 0.00001, 0.0),
        ]);
        mesh.push_polygon(&[
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ]);
        mesh.weld(0.0001);
        assert_eq!(mesh.face_count(), 1);
    }

    #[test]
    fn test_weld_respects_threshold() {
        let mut mesh = split_cube(1.0);
        assert_eq!(mesh.weld(0.0), 0);
        assert_eq!(mesh.vertex_count(), 24);
    }

    #[test]
    fn test_triangulate_counts() {
        let mesh = cube(1.0).triangulated(&TriangulateParams::default());
        assert_eq!(mesh.face_count(), 12);
        assert!(mesh.faces.iter().all(|f| f.len() == 3));
        assert!((mesh.signed_volume() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_beauty_split_uses_shorter_diagonal() {
        // Kite: the 1-3 diagonal is much shorter than 0-2.
        let mesh = Mesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0, 0.5, 0.0),
                Point3::new(4.0, 0.0, 0.0),
                Point3::new(2.0, -0.5, 0.0),
            ],
            vec![vec![0, 1, 2, 3]],
        );
        let beauty = mesh.triangulated(&TriangulateParams::default());
        assert_eq!(beauty.faces, vec![vec![1, 2, 3], vec![1, 3, 0]]);

        let fixed = mesh.triangulated(&TriangulateParams {
            quad_method: SplitMethod::Fixed,
            ..Default::default()
        });
        assert_eq!(fixed.faces, vec![vec![0, 1, 2], vec![0, 2, 3]]);
    }

    #[test]
    fn test_ngon_is_fanned() {
        let mut mesh = Mesh::default();
        let corners: Vec<_> = (0..6)
            .map(|i| {
                let a = i as f64 * std::f64::consts::PI / 3.0;
                Point3::new(a.cos(), a.sin(), 0.0)
            })
            .collect();
        mesh.push_polygon(&corners);
        assert_eq!(mesh.triangulated(&TriangulateParams::default()).face_count(), 4);
    }

    #[test]
    fn test_displace_shrinks_inward() {
        let mesh = cube(1.0);
        let shrunk = mesh.displaced(-0.01);
        assert!(shrunk.signed_volume() < mesh.signed_volume());
        let (min, max) = shrunk.bounds().unwrap();
        assert!(min.x > 0.0 && max.x < 1.0);
    }

    #[test]
    fn test_displace_handles_inverted_winding() {
        let mut mesh = cube(1.0);
        for face in &mut mesh.faces {
            face.reverse();
        }
        assert!(mesh.signed_volume() < 0.0);
        let shrunk = mesh.displaced(-0.01);
        let (min, _) = shrunk.bounds().unwrap();
        assert!(min.x > 0.0);
    }

    #[test]
    fn test_shrink_to_gap() {
        let mut mesh = cube(0.008);
        mesh.shrink_to_gap(0.0001);
        let (min, max) = mesh.bounds().unwrap();
        assert!(((max.x - min.x) - 0.0079).abs() < 1e-12);
        assert!((min.x - 0.00005).abs() < 1e-12);
    }

    #[test]
    fn test_shrink_ignores_flat_axes() {
        let mut mesh = Mesh::default();
        mesh.push_polygon(&[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ]);
        mesh.shrink_to_gap(0.1);
        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min.z, max.z);
        assert!(((max.x - min.x) - 0.9).abs() < 1e-12);
    }
}
