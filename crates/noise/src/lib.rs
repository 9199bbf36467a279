//! Procedural primitives: smooth 3D value noise and per-cell hash colors.
//!
//! # Invariants
//! - Pure functions: identical input always yields identical output.
//! - `noise3` is defined for every finite point and stays within `[0, 1)`.
//! - No seeds or tables; everything is computed from the input coordinates,
//!   so the CPU path and the WGSL kernel evaluate the same formulas.

mod color;
mod value;

pub use color::random_color;
pub use value::noise3;

pub fn crate_info() -> &'static str {
    "voxelspace-noise v0.1.0"
}
