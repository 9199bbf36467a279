use bytemuck::{Pod, Zeroable};
use voxelspace_render::RenderView;

/// Per-frame uniform block shared with the ray cast kernel.
///
/// Matches the WGSL layout `vec3 position, f32 time, vec3 rotation, f32 pad`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub position: [f32; 3],
    pub time: f32,
    /// `(pitch, yaw, 0)` in radians.
    pub rotation: [f32; 3],
    pub _padding: f32,
}

impl FrameUniforms {
    pub fn from_view(view: &RenderView) -> Self {
        Self {
            position: view.camera.position.to_array(),
            time: view.time,
            rotation: [view.camera.pitch(), view.camera.yaw(), 0.0],
            _padding: 0.0,
        }
    }
}
