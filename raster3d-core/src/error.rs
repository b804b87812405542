//! Error types shared by the rendering core
use std::io;

use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, RenderError>;

/// Errors surfaced by the rendering core.
///
/// Degenerate and behind-camera triangles are not errors: the rasterizer
/// skips them and reports them in [`DrawStats`](crate::DrawStats).
#[derive(Debug, Error)]
pub enum RenderError {
    /// A transform component did not have exactly three elements
    #[error("{field} must have {expected} components, got {found}")]
    Shape {
        field: &'static str,
        expected: usize,
        found: usize,
    },

    /// A mesh triangle referenced a vertex that does not exist
    #[error("triangle {triangle} references vertex {index}, but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        triangle: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Raised by a display or input collaborator inside the frame loop
    #[error("collaborator I/O failed: {0}")]
    Io(#[from] io::Error),
}
