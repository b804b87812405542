//! Immutable vertex/index buffers consumed by the renderer
use nalgebra::Point3;

use crate::error::{RenderError, Result};

/// A triangle mesh: object-space positions plus index triples into them.
///
/// Meshes are immutable once built. Share one between several nodes with
/// `Arc<Mesh>`.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    vertices: Vec<Point3<f64>>,
    indices: Vec<[u32; 3]>,
}

impl Mesh {
    /// Build a mesh, checking that every index points at an existing vertex
    pub fn new(vertices: Vec<Point3<f64>>, indices: Vec<[u32; 3]>) -> Result<Self> {
        for (triangle, face) in indices.iter().enumerate() {
            if let Some(&index) = face.iter().find(|&&i| i as usize >= vertices.len()) {
                return Err(RenderError::IndexOutOfRange {
                    triangle,
                    index,
                    vertex_count: vertices.len(),
                });
            }
        }
        Ok(Self { vertices, indices })
    }

    /// Convenience constructor for plain float triples
    pub fn from_arrays(vertices: &[[f64; 3]], indices: &[[u32; 3]]) -> Result<Self> {
        let vertices = vertices.iter().map(|&v| Point3::from(v)).collect();
        Self::new(vertices, indices.to_vec())
    }

    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    pub fn indices(&self) -> &[[u32; 3]] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
