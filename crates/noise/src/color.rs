use glam::Vec3;

const RED_KEY: Vec3 = Vec3::new(12.9898, 78.233, 45.543);
const GREEN_KEY: Vec3 = Vec3::new(34.456, 98.765, 67.891);
const BLUE_KEY: Vec3 = Vec3::new(87.654, 21.987, 43.219);

const RED_GAIN: f32 = 43758.5453;
const GREEN_GAIN: f32 = 23543.345;
const BLUE_GAIN: f32 = 87654.123;

fn hash(point: Vec3, key: Vec3, gain: f32) -> f32 {
    let v = point.dot(key).sin() * gain;
    v - v.floor()
}

/// Pseudo-random RGB triple in `[0, 1]^3` for a point.
///
/// Three independent sine/dot hashes, so nearby integer cells get visibly
/// unrelated colors while the same cell always gets the same one.
pub fn random_color(point: Vec3) -> Vec3 {
    Vec3::new(
        hash(point, RED_KEY, RED_GAIN),
        hash(point, GREEN_KEY, GREEN_GAIN),
        hash(point, BLUE_KEY, BLUE_GAIN),
    )
}
