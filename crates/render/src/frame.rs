use std::time::Duration;

use glam::UVec2;
use voxelspace_input::InputSnapshot;

use crate::camera::{CameraConfig, FlyCamera};
use crate::renderer::RenderView;

/// What a frame renders: the camera after this frame's input was applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    pub frame_index: u64,
    /// Seconds accumulated across all advanced frames.
    pub elapsed: f32,
    pub camera: FlyCamera,
}

impl FrameState {
    pub fn view(&self, resolution: UVec2, focal_length: f32) -> RenderView {
        RenderView {
            camera: self.camera,
            resolution,
            focal_length,
            time: self.elapsed,
        }
    }
}

/// Owns the camera across frames and advances it once per frame, before
/// any pixel of that frame is computed.
#[derive(Debug, Clone)]
pub struct FrameDriver {
    camera: FlyCamera,
    config: CameraConfig,
    elapsed: f32,
    frame_index: u64,
}

impl FrameDriver {
    pub fn new(camera: FlyCamera, config: CameraConfig) -> Self {
        Self {
            camera,
            config,
            elapsed: 0.0,
            frame_index: 0,
        }
    }

    pub fn camera(&self) -> &FlyCamera {
        &self.camera
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// Apply one frame of input. Negative or non-finite `dt` counts as zero.
    pub fn advance(&mut self, input: &InputSnapshot, dt: f32, viewport: UVec2) -> FrameState {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.camera = self.camera.advanced(input, dt, viewport, &self.config);
        self.elapsed += dt;
        self.frame_index += 1;
        tracing::trace!(
            frame = self.frame_index,
            dt,
            position = ?self.camera.position,
            "frame advanced"
        );
        self.state()
    }

    pub fn state(&self) -> FrameState {
        FrameState {
            frame_index: self.frame_index,
            elapsed: self.elapsed,
            camera: self.camera,
        }
    }
}

/// Ring buffer of recent frame durations.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    history: Vec<Duration>,
    next: usize,
    filled: bool,
}

impl FrameTimer {
    /// A capacity of zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            history: vec![Duration::ZERO; capacity.max(1)],
            next: 0,
            filled: false,
        }
    }

    pub fn record(&mut self, dt: Duration) {
        self.history[self.next] = dt;
        self.next = (self.next + 1) % self.history.len();
        if self.next == 0 {
            self.filled = true;
        }
    }

    fn recorded(&self) -> &[Duration] {
        if self.filled {
            &self.history
        } else {
            &self.history[..self.next]
        }
    }

    pub fn count(&self) -> usize {
        self.recorded().len()
    }

    /// True once a full window of samples has been recorded since the last
    /// wrap, i.e. right after every `capacity`-th sample.
    pub fn window_complete(&self) -> bool {
        self.filled && self.next == 0
    }

    pub fn average(&self) -> Duration {
        let recorded = self.recorded();
        if recorded.is_empty() {
            return Duration::ZERO;
        }
        recorded.iter().sum::<Duration>() / recorded.len() as u32
    }

    pub fn max(&self) -> Duration {
        self.recorded().iter().copied().max().unwrap_or_default()
    }

    pub fn min(&self) -> Duration {
        self.recorded().iter().copied().min().unwrap_or_default()
    }
}
