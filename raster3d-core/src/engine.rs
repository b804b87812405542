//! Frame loop and the collaborator traits it drives
//!
//! One frame is: poll input, clear, build the view matrix, walk the scene
//! graph (update hooks, then mesh draws), present, then sleep until the next
//! frame deadline. The loop never queues or skips frames; under load it
//! simply runs slower.

use std::io;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::{EngineConfig, RenderContext};
use crate::error::Result;
use crate::material::{DrawStats, Uniforms};
use crate::projection::Camera;
use crate::raster::FrameBuffers;
use crate::scene::Node;
use crate::transform::Transform;

/// Shortest sleep between frames, even when a frame overran its budget
pub const MIN_FRAME_DELAY: Duration = Duration::from_millis(1);

/// Display collaborator: shows each finished color buffer
pub trait Presenter {
    fn present(&mut self, frame: &FrameBuffers) -> io::Result<()>;

    /// Current surface size, if the presenter tracks one. A value that
    /// differs from the engine's viewport triggers a resize before rendering.
    fn viewport(&mut self) -> io::Result<Option<(u32, u32)>> {
        Ok(None)
    }
}

/// Input collaborator: updates the camera once per frame before rendering
pub trait InputSource {
    /// Apply pending input. Returning `false` stops the frame loop.
    fn poll(&mut self, camera: &mut Camera, delta: f64) -> io::Result<bool>;
}

/// Counters for one rendered frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub frame_index: u64,
    /// Nodes visited, with or without a mesh
    pub nodes: usize,
    pub draw: DrawStats,
}

/// How long to sleep after a frame that took `elapsed` against a `target` budget
pub fn frame_delay(target: Duration, elapsed: Duration) -> Duration {
    target.saturating_sub(elapsed).max(MIN_FRAME_DELAY)
}

/// Owns the scene, camera, render context and frame buffers
pub struct Engine {
    config: EngineConfig,
    context: RenderContext,
    buffers: FrameBuffers,
    camera: Camera,
    root: Node,
    frame_index: u64,
    fps: f32,
}

impl Engine {
    pub fn new(config: EngineConfig, root: Node) -> Result<Self> {
        config.validate()?;
        let context = RenderContext::new(&config)?;
        let buffers = FrameBuffers::new(config.width, config.height);
        Ok(Self {
            config,
            context,
            buffers,
            camera: Camera::default(),
            root,
            frame_index: 0,
            fps: 0.0,
        })
    }

    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = camera;
        self
    }

    /// Change the viewport: recomputes the projection and reallocates the buffers
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.context.resize(width, height)?;
        self.config.width = width;
        self.config.height = height;
        self.buffers.resize(width, height);
        Ok(())
    }

    pub fn set_lens(&mut self, fov: f64, near: f64, far: f64) -> Result<()> {
        self.context.set_lens(fov, near, far)?;
        self.config.fov = fov;
        self.config.near = near;
        self.config.far = far;
        Ok(())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    pub fn buffers(&self) -> &FrameBuffers {
        &self.buffers
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    /// Frames rendered so far
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Most recent one-second FPS sample from [`run`](Self::run)
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Render one frame into the engine's buffers
    pub fn render_frame(&mut self, delta: f64) -> FrameStats {
        let Self {
            config,
            context,
            buffers,
            camera,
            root,
            frame_index,
            ..
        } = self;

        buffers.clear(config.clear_color);
        let view = camera.view_matrix();
        let projection = context.projection();
        let (width, height) = (context.width(), context.height());

        let mut stats = FrameStats {
            frame_index: *frame_index,
            ..FrameStats::default()
        };
        root.update_and_visit(&Transform::identity(), delta, &mut |node, global| {
            stats.nodes += 1;
            let Some(mesh) = node.mesh.as_deref() else {
                return;
            };
            let model = global.matrix();
            let uniforms = Uniforms {
                mvp: Transform::mvp_matrix(&model, &view, projection),
                model,
                width,
                height,
            };
            stats.draw += node.material.process(&uniforms, mesh, buffers);
        });

        *frame_index += 1;
        log::trace!("{stats:?}");
        stats
    }

    /// Drive frames until `input` asks to stop or a collaborator fails
    pub fn run<P, I>(&mut self, presenter: &mut P, input: &mut I) -> Result<()>
    where
        P: Presenter,
        I: InputSource,
    {
        let target_frame_time = self.config.frame_time();
        let mut last_frame = Instant::now();
        let mut sample_start = last_frame;
        let mut sample_frames = 0u32;

        loop {
            let frame_start = Instant::now();
            let delta = frame_start.duration_since(last_frame).as_secs_f64();
            last_frame = frame_start;

            if !input.poll(&mut self.camera, delta)? {
                break;
            }

            if let Some((width, height)) = presenter.viewport()? {
                if (width, height) != (self.context.width(), self.context.height()) {
                    self.resize(width, height)?;
                }
            }

            self.render_frame(delta);
            presenter.present(&self.buffers)?;

            // Update FPS counter
            sample_frames += 1;
            let since_sample = frame_start.duration_since(sample_start);
            if since_sample >= Duration::from_secs(1) {
                self.fps = sample_frames as f32 / since_sample.as_secs_f32();
                log::debug!("{:.1} fps", self.fps);
                sample_frames = 0;
                sample_start = frame_start;
            }

            thread::sleep(frame_delay(target_frame_time, frame_start.elapsed()));
        }

        log::info!("frame loop stopped after {} frames", self.frame_index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    #[test]
    fn test_frame_delay() {
        let target = Duration::from_millis(16);
        assert_eq!(frame_delay(target, Duration::from_millis(6)), Duration::from_millis(10));
        assert_eq!(frame_delay(target, Duration::from_millis(40)), MIN_FRAME_DELAY);
        assert_eq!(frame_delay(target, Duration::from_micros(15_500)), MIN_FRAME_DELAY);
    }

    #[test]
    fn test_engine_rejects_invalid_config() {
        let config = EngineConfig::default().with_viewport(0, 100);
        assert!(Engine::new(config, Node::new()).is_err());
    }

    #[test]
    fn test_empty_scene_clears_to_clear_color() {
        let config = EngineConfig::default()
            .with_viewport(8, 6)
            .with_clear_color(Color::YELLOW);
        let mut engine = Engine::new(config, Node::new()).unwrap();

        let stats = engine.render_frame(0.016);
        assert_eq!(stats.nodes, 1);
        assert_eq!(stats.draw, DrawStats::default());
        assert!(engine
            .buffers()
            .color()
            .chunks_exact(4)
            .all(|px| px == Color::YELLOW.to_array()));
        assert_eq!(engine.frame_index(), 1);
    }

    #[test]
    fn test_resize_reallocates_buffers() {
        let config = EngineConfig::default().with_viewport(8, 6);
        let mut engine = Engine::new(config, Node::new()).unwrap();
        engine.resize(20, 10).unwrap();
        assert_eq!((engine.buffers().width(), engine.buffers().height()), (20, 10));
        assert_eq!(engine.config().width, 20);
        assert!((engine.context().aspect() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_set_lens_updates_projection() {
        let mut engine = Engine::new(EngineConfig::default(), Node::new()).unwrap();
        let before = *engine.context().projection();
        engine.set_lens(45.0, 0.1, 10.0).unwrap();
        assert_ne!(before, *engine.context().projection());
        assert_eq!(engine.config().fov, 45.0);
        assert!(engine.set_lens(45.0, 1.0, 0.5).is_err());
    }
}
