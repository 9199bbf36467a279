use std::f32::consts::FRAC_PI_2;

use glam::{UVec2, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use voxelspace_common::normalize_or_self;
use voxelspace_input::{Action, ActionSet, InputSnapshot};

use crate::ray::Ray;

/// Camera tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Distance of the image plane in front of the eye; smaller is wider.
    pub focal_length: f32,
    /// Multiplier applied to the step while the slow action is held.
    pub slow_factor: f32,
    /// World units travelled per second of frame time.
    pub move_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            focal_length: 0.8,
            slow_factor: 0.05,
            move_speed: 10.0,
        }
    }
}

/// Free-fly camera: position, pitch/yaw, and the basis derived from them.
///
/// Pitch rotates about the screen x axis, yaw about world y. With this
/// convention `right` points toward screen-left and `up` toward
/// screen-bottom; the action mapping in [`FlyCamera::update`] accounts for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyCamera {
    pub position: Vec3,
    pitch: f32,
    yaw: f32,
    front: Vec3,
    right: Vec3,
    up: Vec3,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::new(Vec3::new(64.0, 108.0, -30.0), 0.0, 0.0)
    }
}

impl FlyCamera {
    pub fn new(position: Vec3, pitch: f32, yaw: f32) -> Self {
        let mut camera = Self {
            position,
            pitch: pitch.clamp(-FRAC_PI_2, FRAC_PI_2),
            yaw,
            front: Vec3::Z,
            right: Vec3::ZERO,
            up: Vec3::ZERO,
        };
        camera.update_vectors();
        camera
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Apply a relative pointer motion, scaled by the viewport so one full
    /// viewport sweep turns the camera by one radian.
    pub fn update_orientation(&mut self, dx: f32, dy: f32, width: f32, height: f32) {
        if width > 0.0 {
            self.yaw -= dx / width;
        }
        if height > 0.0 {
            self.pitch += dy / height;
        }
        self.pitch = self.pitch.clamp(-FRAC_PI_2, FRAC_PI_2);
        self.update_vectors();
    }

    fn update_vectors(&mut self) {
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();

        let front = normalize_or_self(Vec3::new(
            -sin_yaw * cos_pitch,
            -sin_pitch,
            cos_yaw * cos_pitch,
        ));
        let right = normalize_or_self(Vec3::new(-front.z, 0.0, front.x));
        let up = normalize_or_self(Vec3::new(
            right.z * front.y,
            right.x * front.z - right.z * front.x,
            -right.x * front.y,
        ));

        self.front = front;
        self.right = right;
        self.up = up;
    }

    /// Move along the basis for the held actions. The direction is
    /// normalized, so diagonal motion is not faster.
    pub fn update(&mut self, held: &ActionSet, delta_time: f32, config: &CameraConfig) {
        let mut movement = Vec3::ZERO;
        if held.holds(Action::MoveForward) {
            movement += self.front;
        }
        if held.holds(Action::StrafeLeft) {
            movement += self.right;
        }
        if held.holds(Action::MoveBackward) {
            movement -= self.front;
        }
        if held.holds(Action::StrafeRight) {
            movement -= self.right;
        }
        if held.holds(Action::Ascend) {
            movement -= self.up;
        }
        if held.holds(Action::Descend) {
            movement += self.up;
        }

        let mut delta_time = delta_time;
        if held.holds(Action::Slow) {
            delta_time *= config.slow_factor;
        }
        self.position += normalize_or_self(movement) * delta_time;
    }

    /// One frame of camera motion as a pure step: orientation from the
    /// snapshot's mouse delta, then translation for `dt` seconds.
    pub fn advanced(
        mut self,
        input: &InputSnapshot,
        dt: f32,
        viewport: UVec2,
        config: &CameraConfig,
    ) -> Self {
        let Vec2 { x: dx, y: dy } = input.mouse_delta;
        if dx != 0.0 || dy != 0.0 {
            self.update_orientation(dx, dy, viewport.x as f32, viewport.y as f32);
        }
        self.update(&input.held, dt * config.move_speed, config);
        self
    }

    /// Primary ray through the center of `pixel` (row 0 is the top row).
    pub fn primary_ray(&self, pixel: UVec2, resolution: UVec2, focal_length: f32) -> Ray {
        let res = resolution.max(UVec2::ONE).as_vec2();
        let aspect = res.y / res.x;
        let frag = Vec2::new(pixel.x as f32 + 0.5, res.y - pixel.y as f32 - 0.5);
        let uv = 2.0 * frag / res - Vec2::ONE;

        let dir = Vec3::new(uv.x, uv.y * aspect, focal_length);
        let yz = rotate2d(Vec2::new(dir.y, dir.z), self.pitch);
        let dir = Vec3::new(dir.x, yz.x, yz.y);
        let xz = rotate2d(Vec2::new(dir.x, dir.z), self.yaw);
        let dir = Vec3::new(xz.x, dir.y, xz.y);

        Ray::new(self.position, dir)
    }
}

fn rotate2d(v: Vec2, angle: f32) -> Vec2 {
    let (s, c) = angle.sin_cos();
    Vec2::new(v.x * c - v.y * s, v.y * c + v.x * s)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn assert_orthonormal(cam: &FlyCamera) {
        for v in [cam.front(), cam.right(), cam.up()] {
            assert!((v.length() - 1.0).abs() < EPS, "not unit: {v}");
        }
        assert!(cam.front().dot(cam.right()).abs() < EPS);
        assert!(cam.front().dot(cam.up()).abs() < EPS);
        assert!(cam.right().dot(cam.up()).abs() < EPS);
    }

    #[test]
    fn default_orientation_looks_down_z() {
        let cam = FlyCamera::new(Vec3::ZERO, 0.0, 0.0);
        assert!((cam.front() - Vec3::Z).length() < EPS);
        assert_orthonormal(&cam);
    }

    #[test]
    fn pitch_stays_clamped() {
        let mut cam = FlyCamera::default();
        let deltas = [500.0, 10_000.0, -3.0, -90_000.0, 42.0, 1e9, -1e9, 0.0];
        for dy in deltas {
            cam.update_orientation(0.0, dy, 800.0, 600.0);
            assert!((-FRAC_PI_2..=FRAC_PI_2).contains(&cam.pitch()));
            assert_orthonormal(&cam);
        }
    }

    #[test]
    fn basis_orthonormal_across_orientations() {
        for pi in -10..=10 {
            for yi in -12..=12 {
                let pitch = pi as f32 / 10.0 * FRAC_PI_2;
                let yaw = yi as f32 * 0.55;
                assert_orthonormal(&FlyCamera::new(Vec3::ZERO, pitch, yaw));
            }
        }
    }

    #[test]
    fn orientation_scales_by_viewport() {
        let mut cam = FlyCamera::new(Vec3::ZERO, 0.0, 0.0);
        cam.update_orientation(400.0, 150.0, 800.0, 600.0);
        assert!((cam.yaw() + 0.5).abs() < EPS);
        assert!((cam.pitch() - 0.25).abs() < EPS);
    }

    #[test]
    fn zero_viewport_does_not_rotate() {
        let mut cam = FlyCamera::new(Vec3::ZERO, 0.1, 0.2);
        cam.update_orientation(50.0, 50.0, 0.0, 0.0);
        assert_eq!(cam.yaw(), 0.2);
        assert_eq!(cam.pitch(), 0.1);
    }

    #[test]
    fn no_keys_no_motion() {
        let config = CameraConfig::default();
        let mut cam = FlyCamera::new(Vec3::new(1.0, 2.0, 3.0), 0.3, -1.2);
        for dt in [0.0, 0.016, 1.0, 1e6] {
            cam.update(&ActionSet::empty(), dt, &config);
            assert_eq!(cam.position, Vec3::new(1.0, 2.0, 3.0));
        }
    }

    #[test]
    fn forward_one_unit_from_origin() {
        let config = CameraConfig::default();
        let mut cam = FlyCamera::new(Vec3::ZERO, 0.0, 0.0);
        cam.update(&ActionSet::MOVE_FORWARD, 1.0, &config);
        assert!((cam.position - Vec3::new(0.0, 0.0, 1.0)).length() < EPS);
    }

    #[test]
    fn opposing_keys_cancel() {
        let config = CameraConfig::default();
        let mut cam = FlyCamera::new(Vec3::ZERO, 0.4, 0.7);
        cam.update(&(ActionSet::MOVE_FORWARD | ActionSet::MOVE_BACKWARD), 5.0, &config);
        assert!(cam.position.length() < EPS);
    }

    #[test]
    fn diagonal_motion_is_normalized() {
        let config = CameraConfig::default();
        let mut cam = FlyCamera::new(Vec3::ZERO, 0.0, 0.0);
        cam.update(&(ActionSet::MOVE_FORWARD | ActionSet::STRAFE_LEFT), 2.0, &config);
        assert!((cam.position.length() - 2.0).abs() < EPS);
    }

    #[test]
    fn slow_modifier_scales_step() {
        let config = CameraConfig::default();
        let mut cam = FlyCamera::new(Vec3::ZERO, 0.0, 0.0);
        cam.update(&(ActionSet::MOVE_FORWARD | ActionSet::SLOW), 1.0, &config);
        assert!((cam.position.z - 0.05).abs() < EPS);
    }

    #[test]
    fn ascend_moves_up_in_world() {
        let config = CameraConfig::default();
        let mut cam = FlyCamera::new(Vec3::ZERO, 0.0, 0.0);
        cam.update(&ActionSet::ASCEND, 1.0, &config);
        assert!(cam.position.y > 0.99);
    }

    #[test]
    fn advanced_is_pure_step() {
        let config = CameraConfig::default();
        let cam = FlyCamera::new(Vec3::ZERO, 0.0, 0.0);
        let input = InputSnapshot::holding([Action::MoveForward]);
        let next = cam.advanced(&input, 0.1, UVec2::new(640, 480), &config);
        assert_eq!(cam.position, Vec3::ZERO);
        assert!((next.position - Vec3::Z).length() < EPS);
    }

    #[test]
    fn center_ray_follows_front() {
        for (pitch, yaw) in [(0.0, 0.0), (0.5, 1.0), (-1.2, -2.5), (1.5, 3.0)] {
            let cam = FlyCamera::new(Vec3::ZERO, pitch, yaw);
            // Even resolution: pixel centers straddle the middle, so use odd.
            let ray = cam.primary_ray(UVec2::new(50, 50), UVec2::new(101, 101), 0.8);
            let dir = ray.direction.normalize();
            assert!((dir - cam.front()).length() < 1e-4, "{dir} vs {}", cam.front());
        }
    }

    #[test]
    fn top_row_rays_point_up_screen() {
        let cam = FlyCamera::new(Vec3::ZERO, 0.0, 0.0);
        let top = cam.primary_ray(UVec2::new(50, 0), UVec2::new(101, 101), 0.8);
        let bottom = cam.primary_ray(UVec2::new(50, 100), UVec2::new(101, 101), 0.8);
        assert!(top.direction.y > 0.0);
        assert!(bottom.direction.y < 0.0);
    }
}
