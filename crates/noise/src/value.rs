use glam::{Vec3, Vec3Swizzles, Vec4, Vec4Swizzles};

/// Modulus of the polynomial permutation.
const PERMUTATION_MODULUS: f32 = 289.0;
/// Divisor mapping permuted lattice values into `[0, 1)`.
const HASH_DIVISOR: f32 = 41.0;

fn fract(v: Vec4) -> Vec4 {
    v - v.floor()
}

fn mod289(v: Vec4) -> Vec4 {
    v - (v * (1.0 / PERMUTATION_MODULUS)).floor() * PERMUTATION_MODULUS
}

/// Lattice coordinates reduced into `[0, 289)`. Exact for every finite
/// input, so the permutation products below stay small integers.
fn wrap_lattice(a: Vec3) -> Vec3 {
    Vec3::new(
        a.x.rem_euclid(PERMUTATION_MODULUS),
        a.y.rem_euclid(PERMUTATION_MODULUS),
        a.z.rem_euclid(PERMUTATION_MODULUS),
    )
}

/// `((x * 34) + 1) * x mod 289`, applied lane-wise.
fn permute(v: Vec4) -> Vec4 {
    mod289((v * 34.0 + Vec4::ONE) * v)
}

/// Smooth 3D value noise in `[0, 1)`.
///
/// Each integer lattice corner gets a pseudo-random value from a mod-289
/// polynomial permutation; values are blended trilinearly across the cell
/// with the `d * d * (3 - 2d)` ease curve.
pub fn noise3(p: Vec3) -> f32 {
    let a = p.floor();
    let d = p - a;
    let d = d * d * (Vec3::splat(3.0) - 2.0 * d);
    let a = wrap_lattice(a);

    let b = a.xxyy() + Vec4::new(0.0, 1.0, 0.0, 1.0);
    let k1 = permute(b.xyxy());
    let k2 = permute(k1.xyxy() + b.zzww());

    let c = k2 + Vec4::splat(a.z);
    let k3 = permute(c);
    let k4 = permute(c + Vec4::ONE);

    let o1 = fract(k3 * (1.0 / HASH_DIVISOR));
    let o2 = fract(k4 * (1.0 / HASH_DIVISOR));

    let o3 = o2 * d.z + o1 * (1.0 - d.z);
    let o4 = o3.yw() * d.x + o3.xz() * (1.0 - d.x);

    o4.y * d.y + o4.x * (1.0 - d.y)
}
