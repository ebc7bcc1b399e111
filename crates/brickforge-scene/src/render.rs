//! Software renderer for step images
//!
//! Orthographic projection, painter's algorithm, flat Lambert shading. Parts
//! placed in earlier steps are drawn faded toward the background; highlighted
//! parts are drawn at full color with a dark outline.

use crate::mesh::Mesh;
use brickforge_core::{CameraSetup, LightingSetup};
use nalgebra::{Point3, Vector3};
use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, Stroke, Transform};

/// How much of the background is mixed into faded parts
const FADE: f64 = 0.6;
const OUTLINE_WIDTH: f32 = 0.75;

/// One mesh to draw
#[derive(Debug, Clone, Copy)]
pub struct RenderItem<'a> {
    pub mesh: &'a Mesh,
    pub color: [u8; 3],
    pub highlighted: bool,
}

/// Orthonormal camera basis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBasis {
    pub right: Vector3<f64>,
    pub up: Vector3<f64>,
    /// Viewing direction, away from the eye
    pub forward: Vector3<f64>,
}

impl ViewBasis {
    pub fn from_camera(camera: &CameraSetup) -> Self {
        let (az, el) = (camera.azimuth_deg.to_radians(), camera.elevation_deg.to_radians());
        let eye = Vector3::new(el.cos() * az.cos(), el.cos() * az.sin(), el.sin());
        let forward = -eye;
        let right = forward
            .cross(&Vector3::z())
            .try_normalize(1e-9)
            .unwrap_or_else(Vector3::x);
        let up = right.cross(&forward);
        Self { right, up, forward }
    }

    /// `(u, v, depth)`; larger depth is farther from the eye
    pub fn project(&self, p: &Point3<f64>) -> (f64, f64, f64) {
        let v = p.coords;
        (v.dot(&self.right), v.dot(&self.up), v.dot(&self.forward))
    }
}

/// Maps projected coordinates to pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Framing {
    center: (f64, f64),
    scale: f64,
    width: f64,
    height: f64,
}

impl Framing {
    /// Fit the projected bounds of `meshes` into the image, leaving `margin`
    pub fn fit<'a>(
        basis: &ViewBasis,
        meshes: impl IntoIterator<Item = &'a Mesh>,
        camera: &CameraSetup,
    ) -> Self {
        let mut min = (f64::INFINITY, f64::INFINITY);
        let mut max = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for mesh in meshes {
            for p in &mesh.positions {
                let (u, v, _) = basis.project(p);
                min = (min.0.min(u), min.1.min(v));
                max = (max.0.max(u), max.1.max(v));
            }
        }

        let width = camera.width as f64;
        let height = camera.height as f64;
        if !min.0.is_finite() {
            return Self {
                center: (0.0, 0.0),
                scale: 1.0,
                width,
                height,
            };
        }

        let usable = (1.0 - 2.0 * camera.margin.clamp(0.0, 0.45)).max(0.1);
        let extent_u = (max.0 - min.0).max(1e-9);
        let extent_v = (max.1 - min.1).max(1e-9);
        let scale = (width * usable / extent_u).min(height * usable / extent_v);
        Self {
            center: ((min.0 + max.0) / 2.0, (min.1 + max.1) / 2.0),
            scale,
            width,
            height,
        }
    }

    pub fn to_pixel(&self, u: f64, v: f64) -> (f32, f32) {
        let x = self.width / 2.0 + (u - self.center.0) * self.scale;
        let y = self.height / 2.0 - (v - self.center.1) * self.scale;
        (x as f32, y as f32)
    }
}

struct Triangle {
    corners: [(f32, f32); 3],
    depth: f64,
    shade: f64,
    color: [u8; 3],
    highlighted: bool,
}

/// Draw `items` with the given framing
pub fn render(
    items: &[RenderItem<'_>],
    framing: &Framing,
    basis: &ViewBasis,
    camera: &CameraSetup,
    lighting: &LightingSetup,
) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(camera.width, camera.height)?;
    let [br, bg, bb] = lighting.background;
    pixmap.fill(Color::from_rgba8(br, bg, bb, 255));

    let light = Vector3::from(lighting.direction)
        .try_normalize(1e-9)
        .unwrap_or_else(Vector3::z);
    let ambient = lighting.ambient.clamp(0.0, 1.0);

    let mut triangles: Vec<Triangle> = Vec::new();
    for item in items {
        let mesh = item.mesh;
        for [a, b, c] in mesh.fan_triangles() {
            let (pa, pb, pc) = (mesh.positions[a], mesh.positions[b], mesh.positions[c]);
            let Some(normal) = (pb - pa).cross(&(pc - pa)).try_normalize(1e-18) else {
                continue;
            };
            let facing = if normal.dot(&basis.forward) > 0.0 { -normal } else { normal };
            let shade = ambient + (1.0 - ambient) * facing.dot(&light).max(0.0);

            let project = |p: &Point3<f64>| {
                let (u, v, depth) = basis.project(p);
                (framing.to_pixel(u, v), depth)
            };
            let ((a2, da), (b2, db), (c2, dc)) = (project(&pa), project(&pb), project(&pc));
            triangles.push(Triangle {
                corners: [a2, b2, c2],
                depth: (da + db + dc) / 3.0,
                shade,
                color: item.color,
                highlighted: item.highlighted,
            });
        }
    }

    triangles.sort_by(|x, y| y.depth.total_cmp(&x.depth));

    let mut paint = Paint {
        anti_alias: true,
        ..Paint::default()
    };
    let stroke = Stroke {
        width: OUTLINE_WIDTH,
        ..Stroke::default()
    };

    for triangle in &triangles {
        let mut pb = PathBuilder::new();
        let [(x0, y0), (x1, y1), (x2, y2)] = triangle.corners;
        pb.move_to(x0, y0);
        pb.line_to(x1, y1);
        pb.line_to(x2, y2);
        pb.close();
        let Some(path) = pb.finish() else {
            continue;
        };

        let lit = triangle.color.map(|c| c as f64 * triangle.shade);
        let fill = if triangle.highlighted {
            lit
        } else {
            let background = lighting.background.map(f64::from);
            [0, 1, 2].map(|i| lit[i] * (1.0 - FADE) + background[i] * FADE)
        };
        let [r, g, b] = fill.map(channel);
        paint.set_color_rgba8(r, g, b, 255);
        pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);

        if triangle.highlighted {
            let [r, g, b] = lit.map(|c| channel(c * 0.35));
            paint.set_color_rgba8(r, g, b, 255);
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }

    Some(pixmap)
}

fn channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
