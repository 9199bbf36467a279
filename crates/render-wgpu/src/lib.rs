//! wgpu backend for the voxel ray caster.
//!
//! The same traversal and shading as the CPU renderer, run as a compute
//! kernel over 16x16 tiles and presented with a full-screen triangle.
//!
//! # Invariants
//! - The voxel grid is uploaded once and never written afterwards.
//! - Uniforms are written once per frame, before the dispatch.
//! - Renderer never mutates camera or field state.

mod gpu;
mod shaders;
mod uniforms;

pub use gpu::{GpuError, WgpuRenderer};
pub use shaders::{PRESENT_SHADER, raycast_shader};
pub use uniforms::FrameUniforms;

pub fn crate_info() -> &'static str {
    "voxelspace-render-wgpu v0.1.0"
}
