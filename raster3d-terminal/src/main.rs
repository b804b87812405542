//! raster3d terminal demo - a spinning cube with an orbiting moon
//!
//! Controls:
//!   - W/S: Move forward/back
//!   - A/D: Strafe
//!   - Space/C: Move up/down
//!   - Arrow keys: Look around
//!   - Q/ESC: Quit
//!
//! Logs go to stderr; run with `RUST_LOG=debug 2>raster3d.log` to keep them
//! off the screen.

use std::f64::consts::TAU;
use std::sync::Arc;

use anyhow::Context;
use crossterm::terminal;
use nalgebra::{Point3, Vector3, Vector4};
use raster3d_core::{
    transform_vertex, Attributes, Color, Engine, EngineConfig, FlatColorMaterial, Material, Mesh,
    Node, Transform, Uniforms, Varyings,
};
use raster3d_terminal::renderer::viewport_for;

/// Colors each vertex by its world-space position, so colors slide over the
/// mesh as it moves
#[derive(Debug)]
struct PositionColorMaterial {
    /// World-space center of the color gradient
    center: Point3<f64>,
    /// Distance from `center` at which a channel saturates
    half_extent: f64,
}

impl Material for PositionColorMaterial {
    fn vertex(&self, attributes: &Attributes, uniforms: &Uniforms) -> (Vector4<f64>, Varyings) {
        let p = attributes.position;
        let world = uniforms.model.transform_point(&p) - self.center;
        let channel = |v: f64| ((v / self.half_extent + 1.0) * 0.5).clamp(0.0, 1.0);
        let varyings = Varyings {
            custom: [channel(world.x), channel(world.y), channel(world.z), 1.0],
            ..Varyings::default()
        };
        (transform_vertex(&p, &uniforms.mvp), varyings)
    }

    fn fragment(&self, varyings: &Varyings, _uniforms: &Uniforms) -> Color {
        let [r, g, b, _] = varyings.custom.map(|c| (c * 255.0) as u8);
        Color::rgb(r, g, b)
    }
}

/// Axis-aligned cube centered at the origin.
///
/// Faces are wound clockwise when seen from outside, which is the winding
/// the camera treats as front-facing.
fn cube(size: f64) -> anyhow::Result<Mesh> {
    let h = size / 2.0;
    let vertices = [
        [-h, -h, -h],
        [h, -h, -h],
        [h, h, -h],
        [-h, h, -h],
        [-h, -h, h],
        [h, -h, h],
        [h, h, h],
        [-h, h, h],
    ];
    #[rustfmt::skip]
    let indices = [
        [4, 6, 5], [4, 7, 6], // +z
        [1, 3, 0], [1, 2, 3], // -z
        [0, 7, 4], [0, 3, 7], // -x
        [5, 2, 1], [5, 6, 2], // +x
        [7, 2, 6], [7, 3, 2], // +y
        [0, 5, 1], [0, 4, 5], // -y
    ];
    Mesh::from_arrays(&vertices, &indices).context("invalid cube mesh")
}

fn demo_scene() -> anyhow::Result<Node> {
    let cube = Arc::new(cube(2.0)?);

    let moon = Node::new()
        .with_name("moon")
        .with_transform(Transform::new(
            Vector3::new(2.5, 0.0, 0.0),
            Vector3::zeros(),
            Vector3::repeat(0.35),
        ))
        .with_mesh(Arc::clone(&cube))
        .with_material(FlatColorMaterial::new(Color::rgb(90, 160, 255)))
        .with_behavior(|t: &mut Transform, _: &mut [Node], delta: f64| {
            t.rotate(delta * TAU, 0.0, delta * TAU / 2.0);
        });

    // Spins the planet and swings the moon around it
    let planet = Node::new()
        .with_name("planet")
        .with_mesh(cube)
        .with_material(PositionColorMaterial {
            center: Point3::new(0.0, 0.0, -6.0),
            half_extent: 1.5,
        })
        .with_child(moon)
        .with_behavior(|t: &mut Transform, _: &mut [Node], delta: f64| {
            t.rotate(delta * 0.3, delta * 0.6, 0.0);
        });

    Ok(Node::new()
        .with_name("root")
        .with_transform(Transform::from_position(0.0, 0.0, -6.0))
        .with_child(planet))
}

fn init_logging() {
    let mut builder = env_logger::Builder::new();
    if let Ok(filter) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filter);
    } else {
        builder.filter_level(log::LevelFilter::Warn);
    }
    builder.init();
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let (cols, rows) = terminal::size().context("failed to query terminal size")?;
    let (width, height) = viewport_for(cols, rows);
    let config = EngineConfig::default()
        .with_viewport(width, height)
        .with_fps(30)
        .with_lens(70.0, 0.1, 100.0);

    let mut engine = Engine::new(config, demo_scene()?)?;
    raster3d_terminal::run(&mut engine).context("frame loop failed")?;

    log::info!(
        "exited after {} frames, last sample {:.1} fps",
        engine.frame_index(),
        engine.fps()
    );
    Ok(())
}
