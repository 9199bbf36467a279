//! Voxel kernel: the authoritative voxel world the renderer samples.
//!
//! # Invariants
//! - The stored grid is immutable once built and shared read-only.
//! - `VoxelField::sample` is total over all integer coordinates.
//! - Stored and generated tiers never overlap: the grid bounds test decides.
//! - Generated content is empty beyond the cutoff radius.

pub mod field;
pub mod grid;
pub mod scene;

pub use field::{FieldConfig, ProceduralSource, VoxelField, VoxelSource};
pub use grid::{DEFAULT_GRID_SIZE, GridBuilder, GridError, VoxelGrid};
pub use scene::Scene;

pub fn crate_info() -> &'static str {
    "voxelspace-kernel v0.1.0"
}
