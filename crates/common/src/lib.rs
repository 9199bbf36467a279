//! Shared types for the voxelspace crates: material ids, grid axes and the
//! small vector helpers every stage agrees on.

mod types;

pub use types::{Axis, MaterialId, normalize_or_self, sign};

pub fn crate_info() -> &'static str {
    "voxelspace-common v0.1.0"
}
