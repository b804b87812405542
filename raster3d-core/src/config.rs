//! Engine configuration and the projection state derived from it
use std::time::Duration;

use nalgebra::Matrix4;

use crate::color::Color;
use crate::error::{RenderError, Result};
use crate::projection::projection_matrix;

/// Viewport, pacing and lens settings for an [`Engine`](crate::Engine)
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Viewport width in pixels
    pub width: u32,
    /// Viewport height in pixels
    pub height: u32,
    /// Frame pacing target
    pub fps: u32,
    /// Vertical field of view in degrees
    pub fov: f64,
    pub near: f64,
    pub far: f64,
    /// Color the buffer is reset to at the start of every frame
    pub clear_color: Color,
}

impl EngineConfig {
    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_lens(mut self, fov: f64, near: f64, far: f64) -> Self {
        self.fov = fov;
        self.near = near;
        self.far = far;
        self
    }

    pub fn with_clear_color(mut self, clear_color: Color) -> Self {
        self.clear_color = clear_color;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_viewport(self.width, self.height)?;
        validate_lens(self.fov, self.near, self.far)?;
        if self.fps == 0 {
            return Err(RenderError::InvalidConfig("fps must be positive".into()));
        }
        Ok(())
    }

    /// Time budget for one frame
    pub fn frame_time(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.fps.max(1)))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: 1600,
            height: 900,
            fps: 60,
            fov: 90.0,
            near: 0.01,
            far: 100.0,
            clear_color: Color::BLACK,
        }
    }
}

fn validate_viewport(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidConfig(format!(
            "viewport must be non-empty, got {width}x{height}"
        )));
    }
    Ok(())
}

fn validate_lens(fov: f64, near: f64, far: f64) -> Result<()> {
    if !(fov > 0.0 && fov < 180.0) {
        return Err(RenderError::InvalidConfig(format!(
            "fov must be within (0, 180) degrees, got {fov}"
        )));
    }
    if !(near > 0.0 && far > near) {
        return Err(RenderError::InvalidConfig(format!(
            "clip planes must satisfy 0 < near < far, got near={near} far={far}"
        )));
    }
    Ok(())
}

/// Viewport and lens state with its projection matrix kept current
#[derive(Debug, Clone, PartialEq)]
pub struct RenderContext {
    width: u32,
    height: u32,
    fov: f64,
    near: f64,
    far: f64,
    projection: Matrix4<f64>,
}

impl RenderContext {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        validate_viewport(config.width, config.height)?;
        validate_lens(config.fov, config.near, config.far)?;
        Ok(Self {
            width: config.width,
            height: config.height,
            fov: config.fov,
            near: config.near,
            far: config.far,
            projection: projection_matrix(
                config.fov,
                config.width,
                config.height,
                config.near,
                config.far,
            ),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        validate_viewport(width, height)?;
        self.width = width;
        self.height = height;
        self.update_projection();
        Ok(())
    }

    pub fn set_lens(&mut self, fov: f64, near: f64, far: f64) -> Result<()> {
        validate_lens(fov, near, far)?;
        self.fov = fov;
        self.near = near;
        self.far = far;
        self.update_projection();
        Ok(())
    }

    fn update_projection(&mut self) {
        self.projection = projection_matrix(self.fov, self.width, self.height, self.near, self.far);
        log::debug!(
            "projection updated: {}x{} fov={} near={} far={}",
            self.width,
            self.height,
            self.fov,
            self.near,
            self.far
        );
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    pub fn fov(&self) -> f64 {
        self.fov
    }

    pub fn near(&self) -> f64 {
        self.near
    }

    pub fn far(&self) -> f64 {
        self.far
    }

    pub fn projection(&self) -> &Matrix4<f64> {
        &self.projection
    }
}
