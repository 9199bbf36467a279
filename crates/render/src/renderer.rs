use glam::{UVec2, Vec3};
use rayon::prelude::*;
use voxelspace_kernel::VoxelSource;

use crate::camera::{CameraConfig, FlyCamera};
use crate::ray::{TraceConfig, cast_ray};
use crate::shading::{ShadingConfig, shade_outcome};

/// Edge length in pixels of the square tiles a frame is split into.
pub const TILE_SIZE: u32 = 16;

/// Number of tiles needed to cover a `width` x `height` frame.
pub fn tile_grid(width: u32, height: u32) -> (u32, u32) {
    (width.div_ceil(TILE_SIZE), height.div_ceil(TILE_SIZE))
}

/// Everything a frame needs to know about the viewer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    pub camera: FlyCamera,
    pub resolution: UVec2,
    pub focal_length: f32,
    /// Seconds since the driver started.
    pub time: f32,
}

impl RenderView {
    pub fn new(camera: FlyCamera, resolution: UVec2) -> Self {
        Self {
            camera,
            resolution,
            focal_length: CameraConfig::default().focal_length,
            time: 0.0,
        }
    }
}

/// Renderer-agnostic interface.
///
/// A renderer reads the voxel source and the view and produces output. It
/// never writes to either.
pub trait Renderer {
    type Output;

    fn render<S: VoxelSource>(&self, source: &S, view: &RenderView) -> Self::Output;
}

/// A rendered image in linear RGB, row 0 at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<Vec3>,
}

impl Frame {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Vec3] {
        &self.pixels
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Vec3> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    /// True when every pixel is background.
    pub fn is_black(&self) -> bool {
        self.pixels.iter().all(|p| *p == Vec3::ZERO)
    }

    /// Pack as tightly laid out RGBA8 with opaque alpha.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 4);
        for p in &self.pixels {
            let c = (p.clamp(Vec3::ZERO, Vec3::ONE) * 255.0 + 0.5).as_uvec3();
            out.extend_from_slice(&[c.x as u8, c.y as u8, c.z as u8, 255]);
        }
        out
    }
}

/// Shade a single pixel. Pure in all of its inputs.
pub fn render_pixel<S: VoxelSource>(
    source: &S,
    view: &RenderView,
    pixel: UVec2,
    trace: &TraceConfig,
    shading: &ShadingConfig,
) -> Vec3 {
    let ray = view.camera.primary_ray(pixel, view.resolution, view.focal_length);
    let outcome = cast_ray(source, &ray, trace.max_steps);
    shade_outcome(source, &outcome, shading)
}

/// Multithreaded software ray caster.
///
/// Each band of [`TILE_SIZE`] rows is one rayon task writing a disjoint slice
/// of the frame buffer. Inside a band, pixels are computed tile by tile, one
/// [`TILE_SIZE`] x [`TILE_SIZE`] block at a time, so neighbouring rays walk
/// the same cells back to back.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuRenderer {
    pub trace: TraceConfig,
    pub shading: ShadingConfig,
}

impl CpuRenderer {
    pub fn new(trace: TraceConfig, shading: ShadingConfig) -> Self {
        Self { trace, shading }
    }
}

impl Renderer for CpuRenderer {
    type Output = Frame;

    fn render<S: VoxelSource>(&self, source: &S, view: &RenderView) -> Frame {
        let UVec2 { x: width, y: height } = view.resolution;
        let (tiles_x, tiles_y) = tile_grid(width, height);
        let _span = tracing::info_span!("render_frame", width, height, tiles_x, tiles_y).entered();

        let mut pixels = vec![Vec3::ZERO; width as usize * height as usize];
        if pixels.is_empty() {
            return Frame { width, height, pixels };
        }

        let band_len = width as usize * TILE_SIZE as usize;
        pixels.par_chunks_mut(band_len).enumerate().for_each(|(band, rows)| {
            let y0 = band as u32 * TILE_SIZE;
            let band_height = (rows.len() / width as usize) as u32;
            for tile_x in 0..tiles_x {
                let x0 = tile_x * TILE_SIZE;
                let x1 = (x0 + TILE_SIZE).min(width);
                for y in 0..band_height {
                    for x in x0..x1 {
                        let pixel = UVec2::new(x, y0 + y);
                        rows[(y * width + x) as usize] =
                            render_pixel(source, view, pixel, &self.trace, &self.shading);
                    }
                }
            }
        });

        tracing::trace!("frame complete");
        Frame { width, height, pixels }
    }
}
