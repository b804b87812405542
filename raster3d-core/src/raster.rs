//! Depth-tested triangle rasterizer over RGBA8 color and f64 depth buffers
use std::ops::RangeInclusive;

use nalgebra::{Point2, Vector4};
use rayon::prelude::*;

use crate::color::Color;

/// Bounding boxes with at least this many pixels fill their rows in parallel
const PARALLEL_FILL_THRESHOLD: i64 = 64 * 64;

/// Color and depth targets for one viewport.
///
/// Color is row-major RGBA8 with the origin at the top-left. Depth stores the
/// interpolated clip-space `w` of the nearest fragment so far; smaller is nearer.
#[derive(Debug, Clone)]
pub struct FrameBuffers {
    width: u32,
    height: u32,
    color: Vec<u8>,
    depth: Vec<f64>,
}

impl FrameBuffers {
    pub fn new(width: u32, height: u32) -> Self {
        let size = width as usize * height as usize;
        Self {
            width,
            height,
            color: vec![0; size * 4],
            depth: vec![f64::INFINITY; size],
        }
    }

    /// Reallocate both buffers for a new viewport. Previous contents are lost.
    pub fn resize(&mut self, width: u32, height: u32) {
        *self = Self::new(width, height);
    }

    pub fn clear(&mut self, color: Color) {
        let rgba = color.to_array();
        for pixel in self.color.chunks_exact_mut(4) {
            pixel.copy_from_slice(&rgba);
        }
        self.depth.fill(f64::INFINITY);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn color(&self) -> &[u8] {
        &self.color
    }

    pub fn depth(&self) -> &[f64] {
        &self.depth
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        let idx = self.index(x, y)? * 4;
        let rgba: [u8; 4] = self.color[idx..idx + 4].try_into().ok()?;
        Some(Color::from_array(rgba))
    }

    pub fn depth_at(&self, x: u32, y: u32) -> Option<f64> {
        self.index(x, y).map(|idx| self.depth[idx])
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }
}

/// A vertex after the perspective divide and viewport mapping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenVertex {
    pub position: Point2<i32>,
    /// Clip-space `w`, kept for the near-plane test and perspective correction
    pub w: f64,
}

/// Perspective-divide clip positions and map them to integer pixel coordinates.
///
/// Y is flipped so that +Y in NDC points up the screen. Coordinates are
/// truncated toward zero. Vertices with `w <= 0` produce meaningless
/// coordinates; callers drop their triangles using the returned `w`.
pub fn clip_to_screen(clip: &[Vector4<f64>], width: u32, height: u32) -> Vec<ScreenVertex> {
    let (width, height) = (width as f64, height as f64);
    clip.iter()
        .map(|c| {
            let ndc = c.xyz() / c.w;
            let x = (ndc.x + 1.0) * 0.5 * width;
            let y = (1.0 - (ndc.y + 1.0) * 0.5) * height;
            ScreenVertex {
                position: Point2::new(x as i32, y as i32),
                w: c.w,
            }
        })
        .collect()
}

/// Whether a screen-space triangle faces away from the camera.
///
/// Screen Y points down, so a non-negative cross product of the two edges
/// means the triangle is back-facing. Zero-area triangles count as back-facing.
pub fn is_back_facing(p0: Point2<i32>, p1: Point2<i32>, p2: Point2<i32>) -> bool {
    let (e1x, e1y) = (p1.x as f64 - p0.x as f64, p1.y as f64 - p0.y as f64);
    let (e2x, e2y) = (p2.x as f64 - p0.x as f64, p2.y as f64 - p0.y as f64);
    e1x * e2y - e1y * e2x >= 0.0
}

/// Barycentric weights `(u, v, w)` of point `(px, py)` relative to `p0, p1, p2`.
///
/// Returns `(-1, -1, -1)` for a zero-area triangle so that the point is
/// treated as outside.
pub fn barycentric_weights(
    px: f64,
    py: f64,
    p0: Point2<i32>,
    p1: Point2<i32>,
    p2: Point2<i32>,
) -> (f64, f64, f64) {
    let (x0, y0) = (p0.x as f64, p0.y as f64);
    let (v0x, v0y) = (p1.x as f64 - x0, p1.y as f64 - y0);
    let (v1x, v1y) = (p2.x as f64 - x0, p2.y as f64 - y0);
    let (v2x, v2y) = (px - x0, py - y0);

    let d00 = v0x * v0x + v0y * v0y;
    let d01 = v0x * v1x + v0y * v1y;
    let d11 = v1x * v1x + v1y * v1y;
    let d20 = v2x * v0x + v2y * v0y;
    let d21 = v2x * v1x + v2y * v1y;

    let denom = d00 * d11 - d01 * d01;
    if denom == 0.0 {
        return (-1.0, -1.0, -1.0);
    }

    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    (1.0 - v - w, v, w)
}

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Fill a triangle with perspective-correct colors, depth tested against `target`.
///
/// Every pixel whose center lies inside the triangle is shaded; a pixel is
/// written only when its interpolated depth is strictly nearer than the stored
/// one. Returns the number of pixels written.
pub fn draw_triangle(
    target: &mut FrameBuffers,
    points: [Point2<i32>; 3],
    colors: [Color; 3],
    w: [f64; 3],
) -> usize {
    let (width, height) = (target.width as i64, target.height as i64);
    let [p0, p1, p2] = points;

    let min_x = (p0.x.min(p1.x).min(p2.x) as i64).max(0);
    let max_x = (p0.x.max(p1.x).max(p2.x) as i64).min(width - 1);
    let min_y = (p0.y.min(p1.y).min(p2.y) as i64).max(0);
    let max_y = (p0.y.max(p1.y).max(p2.y) as i64).min(height - 1);

    if min_x > max_x || min_y > max_y {
        return 0;
    }

    let span = TriangleSpan {
        points,
        colors: colors.map(|c| c.to_array().map(f64::from)),
        inv_w: w.map(|w| 1.0 / w),
        columns: min_x as usize..=max_x as usize,
    };

    let row_len = target.width as usize;
    let (first_row, end_row) = (min_y as usize, max_y as usize + 1);
    let color_rows = &mut target.color[first_row * row_len * 4..end_row * row_len * 4];
    let depth_rows = &mut target.depth[first_row * row_len..end_row * row_len];

    let fill = |(offset, (color_row, depth_row)): (usize, (&mut [u8], &mut [f64]))| {
        span.fill_row(first_row + offset, color_row, depth_row)
    };

    // Rows touch disjoint cells, so the parallel and serial paths write the same pixels
    if (max_x - min_x + 1) * (max_y - min_y + 1) >= PARALLEL_FILL_THRESHOLD {
        color_rows
            .par_chunks_mut(row_len * 4)
            .zip(depth_rows.par_chunks_mut(row_len))
            .enumerate()
            .map(fill)
            .sum()
    } else {
        color_rows
            .chunks_mut(row_len * 4)
            .zip(depth_rows.chunks_mut(row_len))
            .enumerate()
            .map(fill)
            .sum()
    }
}

/// Per-triangle constants shared by every row of one `draw_triangle` call
struct TriangleSpan {
    points: [Point2<i32>; 3],
    colors: [[f64; 4]; 3],
    inv_w: [f64; 3],
    columns: RangeInclusive<usize>,
}

impl TriangleSpan {
    fn fill_row(&self, y: usize, color_row: &mut [u8], depth_row: &mut [f64]) -> usize {
        let [p0, p1, p2] = self.points;
        let [c0, c1, c2] = &self.colors;
        let [inv_w0, inv_w1, inv_w2] = self.inv_w;
        let py = y as f64 + 0.5;
        let mut written = 0;

        for x in self.columns.clone() {
            let (u, v, w) = barycentric_weights(x as f64 + 0.5, py, p0, p1, p2);
            if !(u >= 0.0 && v >= 0.0 && w >= 0.0) {
                continue;
            }

            let inv_w = u * inv_w0 + v * inv_w1 + w * inv_w2;
            if inv_w == 0.0 {
                continue;
            }
            let depth = 1.0 / inv_w;

            if !(depth < depth_row[x]) {
                continue;
            }
            depth_row[x] = depth;

            let pixel = &mut color_row[x * 4..x * 4 + 4];
            for (ch, out) in pixel.iter_mut().enumerate() {
                let weighted = u * c0[ch] * inv_w0 + v * c1[ch] * inv_w1 + w * c2[ch] * inv_w2;
                let value = weighted * depth;
                *out = value.clamp(0.0, 255.0) as u8;
            }
            written += 1;
        }

        written
    }
}
