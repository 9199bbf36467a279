//! Camera, ray casting, shading and the CPU renderer.
//!
//! Every pixel is a pure function of the pixel coordinate, the camera and
//! the voxel source. The [`FrameDriver`] advances the camera before a frame
//! is dispatched; nothing in a frame mutates shared state.
//!
//! # Invariants
//! - Camera pitch stays within `[-pi/2, pi/2]`; front, right and up stay
//!   orthonormal after every update.
//! - A traversal examines at most `max_steps` cells, then reports a miss.
//! - A hit normal is always one of the six axis-aligned unit vectors.
//! - Shaded colors are clamped to `[0, 1]`; a miss is black.

pub mod camera;
pub mod frame;
pub mod ray;
pub mod renderer;
pub mod settings;
pub mod shading;

pub use camera::{CameraConfig, FlyCamera};
pub use frame::{FrameDriver, FrameState, FrameTimer};
pub use ray::{
    Hit, MAX_TRACE_STEPS, Ray, TraceConfig, TraceOutcome, Traversal, TraversalState, Visit,
    cast_ray,
};
pub use renderer::{
    CpuRenderer, Frame, RenderView, Renderer, TILE_SIZE, render_pixel, tile_grid,
};
pub use settings::{Settings, SettingsError};
pub use shading::{ShadingConfig, interpolate_ao, shade, shade_outcome, voxel_ao};

pub fn crate_info() -> &'static str {
    "voxelspace-render v0.1.0"
}
