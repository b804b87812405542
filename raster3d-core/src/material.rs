//! Vertex/fragment shading contract and the mesh draw routine built on it
use std::fmt;
use std::ops::AddAssign;

use nalgebra::{Matrix4, Point3, Vector4};

use crate::color::Color;
use crate::geometry::Mesh;
use crate::projection::transform_vertex;
use crate::raster::{clip_to_screen, draw_triangle, is_back_facing, FrameBuffers};

/// Per-vertex inputs to the vertex stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attributes {
    /// Index of the vertex within its mesh
    pub index: usize,
    /// Object-space position
    pub position: Point3<f64>,
}

/// Constants for one mesh draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uniforms {
    pub mvp: Matrix4<f64>,
    pub model: Matrix4<f64>,
    pub width: u32,
    pub height: u32,
}

/// Values the vertex stage hands to the fragment stage
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Varyings {
    pub color: Color,
    /// Free slot for materials that need more than a color
    pub custom: [f64; 4],
}

/// Outcome of one mesh draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawStats {
    /// Triangles handed to the rasterizer
    pub drawn: usize,
    /// Triangles dropped because a vertex was at or behind the camera
    pub behind_camera: usize,
    /// Triangles dropped by back-face culling
    pub back_facing: usize,
    /// Pixels that passed the depth test
    pub pixels: usize,
}

impl AddAssign for DrawStats {
    fn add_assign(&mut self, rhs: Self) {
        self.drawn += rhs.drawn;
        self.behind_camera += rhs.behind_camera;
        self.back_facing += rhs.back_facing;
        self.pixels += rhs.pixels;
    }
}

/// A programmable shading stage pair.
///
/// `vertex` runs once per mesh vertex. `fragment` runs once per vertex of each
/// surviving triangle, and the rasterizer interpolates the resulting colors
/// across the triangle with perspective correction.
pub trait Material: fmt::Debug + Send + Sync {
    /// Returns the homogeneous clip-space position and the vertex's varyings
    fn vertex(&self, attributes: &Attributes, uniforms: &Uniforms) -> (Vector4<f64>, Varyings);

    fn fragment(&self, varyings: &Varyings, uniforms: &Uniforms) -> Color;

    /// Draw a whole mesh into `target`
    fn process(&self, uniforms: &Uniforms, mesh: &Mesh, target: &mut FrameBuffers) -> DrawStats {
        draw_mesh(self, uniforms, mesh, target)
    }
}

/// Run the vertex stage over `mesh`, cull, shade and rasterize its triangles.
///
/// A triangle with any vertex at `w <= 0` is dropped whole rather than clipped
/// against the near plane, so geometry crossing the camera plane disappears.
pub fn draw_mesh<M: Material + ?Sized>(
    material: &M,
    uniforms: &Uniforms,
    mesh: &Mesh,
    target: &mut FrameBuffers,
) -> DrawStats {
    let (clip, varyings): (Vec<_>, Vec<_>) = mesh
        .vertices()
        .iter()
        .enumerate()
        .map(|(index, &position)| material.vertex(&Attributes { index, position }, uniforms))
        .unzip();

    let screen = clip_to_screen(&clip, uniforms.width, uniforms.height);
    let mut stats = DrawStats::default();

    for face in mesh.indices() {
        let [a, b, c] = face.map(|i| screen[i as usize]);

        if a.w <= 0.0 || b.w <= 0.0 || c.w <= 0.0 {
            stats.behind_camera += 1;
            continue;
        }
        if is_back_facing(a.position, b.position, c.position) {
            stats.back_facing += 1;
            continue;
        }

        let colors = face.map(|i| material.fragment(&varyings[i as usize], uniforms));
        stats.pixels += draw_triangle(
            target,
            [a.position, b.position, c.position],
            colors,
            [a.w, b.w, c.w],
        );
        stats.drawn += 1;
    }

    log::trace!("{material:?}: {stats:?}");
    stats
}

/// Flat, unlit color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatColorMaterial {
    pub color: Color,
}

impl FlatColorMaterial {
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

impl Default for FlatColorMaterial {
    fn default() -> Self {
        Self::new(Color::WHITE)
    }
}

impl Material for FlatColorMaterial {
    fn vertex(&self, attributes: &Attributes, uniforms: &Uniforms) -> (Vector4<f64>, Varyings) {
        let clip = transform_vertex(&attributes.position, &uniforms.mvp);
        let varyings = Varyings {
            color: self.color,
            ..Varyings::default()
        };
        (clip, varyings)
    }

    fn fragment(&self, varyings: &Varyings, _uniforms: &Uniforms) -> Color {
        varyings.color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::projection_matrix;
    use crate::transform::Transform;

    /// Colors vertices by index so interpolation is visible
    #[derive(Debug)]
    struct IndexColorMaterial;

    impl Material for IndexColorMaterial {
        fn vertex(&self, attributes: &Attributes, uniforms: &Uniforms) -> (Vector4<f64>, Varyings) {
            let color = [Color::RED, Color::GREEN, Color::BLUE][attributes.index % 3];
            let clip = transform_vertex(&attributes.position, &uniforms.mvp);
            (clip, Varyings { color, custom: [0.0; 4] })
        }

        fn fragment(&self, varyings: &Varyings, _uniforms: &Uniforms) -> Color {
            varyings.color
        }
    }

    fn uniforms(model: Transform, size: u32) -> Uniforms {
        let projection = projection_matrix(90.0, size, size, 0.1, 100.0);
        // Identity view: camera at the origin looking down -Z
        let model = model.matrix();
        Uniforms {
            mvp: projection * model,
            model,
            width: size,
            height: size,
        }
    }

    /// A triangle facing the camera at z = -2
    fn facing_triangle() -> Mesh {
        Mesh::from_arrays(
            &[[-1.0, -1.0, -2.0], [1.0, -1.0, -2.0], [0.0, 1.0, -2.0]],
            &[[0, 1, 2]],
        )
        .unwrap()
    }

    #[test]
    fn test_flat_color_vertex() {
        let material = FlatColorMaterial::new(Color::YELLOW);
        let u = Uniforms {
            mvp: Matrix4::identity(),
            model: Matrix4::identity(),
            width: 10,
            height: 10,
        };
        let (clip, varyings) = material.vertex(
            &Attributes {
                index: 0,
                position: Point3::new(1.0, 2.0, 3.0),
            },
            &u,
        );
        assert_eq!(clip, Vector4::new(1.0, 2.0, 3.0, 1.0));
        assert_eq!(material.fragment(&varyings, &u), Color::YELLOW);
    }

    #[test]
    fn test_default_material_is_white() {
        assert_eq!(FlatColorMaterial::default().color, Color::WHITE);
    }

    #[test]
    fn test_process_draws_facing_triangle() {
        let mut target = FrameBuffers::new(64, 64);
        let stats = FlatColorMaterial::new(Color::GREEN).process(
            &uniforms(Transform::identity(), 64),
            &facing_triangle(),
            &mut target,
        );
        assert_eq!(stats.drawn, 1);
        assert!(stats.pixels > 0);
        let center = target.pixel(32, 36).unwrap();
        assert!(center.g >= 254 && center.r == 0);
        assert!((target.depth_at(32, 36).unwrap() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_process_culls_reversed_winding() {
        let mesh = Mesh::from_arrays(
            &[[-1.0, -1.0, -2.0], [1.0, -1.0, -2.0], [0.0, 1.0, -2.0]],
            &[[0, 2, 1]],
        )
        .unwrap();
        let mut target = FrameBuffers::new(64, 64);
        let stats = FlatColorMaterial::default().process(
            &uniforms(Transform::identity(), 64),
            &mesh,
            &mut target,
        );
        assert_eq!(stats.back_facing, 1);
        assert_eq!(stats.drawn, 0);
        assert!(target.depth().iter().all(|d| d.is_infinite()));
    }

    #[test]
    fn test_process_drops_triangle_behind_camera() {
        // Push the triangle so one vertex crosses to z > 0
        let mesh = Mesh::from_arrays(
            &[[-1.0, -1.0, -2.0], [1.0, -1.0, -2.0], [0.0, 1.0, 1.0]],
            &[[0, 1, 2]],
        )
        .unwrap();
        let mut target = FrameBuffers::new(64, 64);
        let stats = FlatColorMaterial::default().process(
            &uniforms(Transform::identity(), 64),
            &mesh,
            &mut target,
        );
        assert_eq!(stats.behind_camera, 1);
        assert_eq!(stats.pixels, 0);
    }

    #[test]
    fn test_process_drops_triangle_on_camera_plane() {
        // z = 0 gives a clip w of exactly zero
        let mesh = Mesh::from_arrays(
            &[[-1.0, -1.0, -2.0], [1.0, -1.0, -2.0], [0.0, 1.0, 0.0]],
            &[[0, 1, 2]],
        )
        .unwrap();
        let u = uniforms(Transform::identity(), 64);
        assert_eq!(transform_vertex(&mesh.vertices()[2], &u.mvp).w, 0.0);

        let mut target = FrameBuffers::new(64, 64);
        let stats = FlatColorMaterial::default().process(&u, &mesh, &mut target);
        assert_eq!(stats.behind_camera, 1);
        assert_eq!(stats.drawn, 0);
        assert!(target.depth().iter().all(|d| d.is_infinite()));
    }

    #[test]
    fn test_custom_material_interpolates() {
        let mut target = FrameBuffers::new(64, 64);
        let stats = IndexColorMaterial.process(
            &uniforms(Transform::identity(), 64),
            &facing_triangle(),
            &mut target,
        );
        assert_eq!(stats.drawn, 1);
        let center = target.pixel(32, 40).unwrap();
        assert!(center.r > 0 && center.g > 0 && center.b > 0);
    }

    #[test]
    fn test_stats_accumulate() {
        let mut total = DrawStats::default();
        total += DrawStats {
            drawn: 1,
            behind_camera: 2,
            back_facing: 3,
            pixels: 4,
        };
        total += DrawStats {
            drawn: 1,
            ..DrawStats::default()
        };
        assert_eq!(total.drawn, 2);
        assert_eq!(total.pixels, 4);
    }
}
