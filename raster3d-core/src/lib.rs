//! raster3d core - a CPU software rasterizer with a scene graph
//!
//! This crate holds everything that does not touch a real display: transform
//! math, camera and projection, the depth-tested triangle rasterizer, the
//! material contract, the scene graph and the frame loop. Display and input
//! are supplied by the caller through [`Presenter`] and [`InputSource`].

pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod material;
pub mod projection;
pub mod raster;
pub mod scene;
pub mod transform;

// Re-export commonly used types
pub use color::Color;
pub use config::{EngineConfig, RenderContext};
pub use engine::{frame_delay, Engine, FrameStats, InputSource, Presenter};
pub use error::{RenderError, Result};
pub use geometry::Mesh;
pub use material::{
    draw_mesh, Attributes, DrawStats, FlatColorMaterial, Material, Uniforms, Varyings,
};
pub use projection::{projection_matrix, transform_vertex, transform_vertices, view_matrix, Camera};
pub use raster::{FrameBuffers, ScreenVertex};
pub use scene::{Behavior, Node, Traverse};
pub use transform::Transform;
