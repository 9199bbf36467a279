use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};
use voxelspace_common::MaterialId;
use voxelspace_noise::noise3;

use crate::grid::VoxelGrid;

/// Anything that can answer "what material occupies this cell".
///
/// Implementations must be total: every integer coordinate has an answer.
pub trait VoxelSource: Sync {
    fn sample(&self, coord: IVec3) -> MaterialId;
}

impl<T: VoxelSource + ?Sized> VoxelSource for &T {
    fn sample(&self, coord: IVec3) -> MaterialId {
        (**self).sample(coord)
    }
}

/// Tunables for the procedural tier.
///
/// These shape what the generated world looks like, not whether sampling is
/// well-defined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Radius around the grid center that stays empty outside the grid.
    pub clearance_radius: f32,
    /// Beyond this distance from the grid center everything is empty.
    pub cutoff_radius: f32,
    /// Frequency of the solid/empty noise.
    pub noise_scale: f32,
    /// Noise level at or above which a generated cell is solid.
    pub solid_threshold: f32,
    /// Number of colored variants generated cells are spread over.
    pub variant_count: u8,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            clearance_radius: 128.0,
            cutoff_radius: 220.0,
            noise_scale: 0.05,
            solid_threshold: 0.5,
            variant_count: 8,
        }
    }
}

impl FieldConfig {
    /// Variant count actually used, so ids stay within `2..=255`.
    pub fn variants(&self) -> u8 {
        self.variant_count.clamp(1, u8::MAX - 1)
    }

    /// DDA steps needed for a ray to cross the whole non-empty region around
    /// a stored grid of edge `grid_size`.
    pub fn traversal_span(&self, grid_size: u32) -> u32 {
        let diameter = 2.0 * self.cutoff_radius.max(grid_size as f32);
        (diameter * 3f32.sqrt()).ceil() as u32 + 3
    }
}

/// Noise-driven material generator for coordinates outside the stored grid.
#[derive(Debug, Clone, Copy)]
pub struct ProceduralSource {
    center: Vec3,
    config: FieldConfig,
}

impl ProceduralSource {
    pub fn new(center: Vec3, config: FieldConfig) -> Self {
        Self { center, config }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }
}

impl VoxelSource for ProceduralSource {
    fn sample(&self, coord: IVec3) -> MaterialId {
        let p = coord.as_vec3();
        let distance = (p - self.center).length();
        if distance > self.config.cutoff_radius || distance < self.config.clearance_radius {
            return MaterialId::EMPTY;
        }
        if noise3(p * self.config.noise_scale) < self.config.solid_threshold {
            return MaterialId::EMPTY;
        }
        let variants = self.config.variants();
        let variant = ((noise3(p) * variants as f32) as u8).min(variants - 1);
        MaterialId(MaterialId::FIRST_VARIANT.0 + variant)
    }
}

/// The two-tier voxel world: stored grid inside `[0, N)^3`, procedural
/// generation outside it, empty beyond the cutoff radius.
#[derive(Debug, Clone)]
pub struct VoxelField {
    grid: VoxelGrid,
    procedural: ProceduralSource,
}

impl VoxelField {
    pub fn new(grid: VoxelGrid, config: FieldConfig) -> Self {
        let center = Vec3::splat(grid.size() as f32 / 2.0);
        Self {
            grid,
            procedural: ProceduralSource::new(center, config),
        }
    }

    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    pub fn config(&self) -> &FieldConfig {
        &self.procedural.config
    }

    /// Center of the stored grid, which the radii are measured from.
    pub fn center(&self) -> Vec3 {
        self.procedural.center()
    }

    /// DDA steps needed for a ray to cross the whole non-empty region.
    ///
    /// A traversal cap below this can end a ray inside generated terrain.
    pub fn max_traversal_span(&self) -> u32 {
        self.config().traversal_span(self.grid.size())
    }
}

impl VoxelSource for VoxelField {
    fn sample(&self, coord: IVec3) -> MaterialId {
        match self.grid.get(coord) {
            Some(stored) => stored,
            None => self.procedural.sample(coord),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridBuilder;

    fn field_with_marker() -> VoxelField {
        let mut builder = GridBuilder::new(16).unwrap();
        builder.set(IVec3::new(3, 4, 5), MaterialId(9));
        let config = FieldConfig {
            clearance_radius: 20.0,
            cutoff_radius: 60.0,
            ..FieldConfig::default()
        };
        VoxelField::new(builder.build(), config)
    }

    #[test]
    fn stored_cells_come_from_grid() {
        let field = field_with_marker();
        assert_eq!(field.sample(IVec3::new(3, 4, 5)), MaterialId(9));
        // Inside the grid, empty stays empty even where noise would be solid.
        for x in 0..16 {
            for z in 0..16 {
                let c = IVec3::new(x, 0, z);
                assert_eq!(field.sample(c), field.grid().sample(c));
            }
        }
    }

    #[test]
    fn beyond_cutoff_is_empty() {
        let field = field_with_marker();
        let center = field.center();
        let dirs = [
            Vec3::X,
            Vec3::NEG_X,
            Vec3::Y,
            Vec3::NEG_Y,
            Vec3::Z,
            Vec3::NEG_Z,
            Vec3::ONE.normalize(),
            Vec3::new(-1.0, 2.0, -3.0).normalize(),
        ];
        for dir in dirs {
            for r in [61.0, 75.0, 200.0, 1.0e4, 1.0e6] {
                let c = (center + dir * r).round().as_ivec3();
                assert_eq!(field.sample(c), MaterialId::EMPTY, "at {c}");
            }
        }
    }

    #[test]
    fn clearance_shell_is_empty() {
        let field = field_with_marker();
        for x in -11..0 {
            let c = IVec3::new(x, 8, 8);
            assert_eq!(field.sample(c), MaterialId::EMPTY);
        }
    }

    #[test]
    fn total_over_extreme_coordinates() {
        let field = field_with_marker();
        for c in [
            IVec3::MIN,
            IVec3::MAX,
            IVec3::new(i32::MIN, 0, i32::MAX),
            IVec3::new(-1, -1, -1),
            IVec3::new(16, 16, 16),
        ] {
            let _ = field.sample(c);
        }
    }

    #[test]
    fn generated_materials_are_variants() {
        let field = field_with_marker();
        let mut solid = 0;
        for x in (-60..=76).step_by(4) {
            for y in (-60..=76).step_by(4) {
                for z in (-60..=76).step_by(4) {
                    let m = field.sample(IVec3::new(x, y, z));
                    if m.is_solid() {
                        solid += 1;
                        assert!(m.is_variant());
                        assert!(m.0 < MaterialId::FIRST_VARIANT.0 + 8);
                    }
                }
            }
        }
        assert!(solid > 0, "shell should contain some generated terrain");
    }

    #[test]
    fn sampling_is_deterministic() {
        let a = field_with_marker();
        let b = field_with_marker();
        for x in -70..70 {
            let c = IVec3::new(x, x / 2, -x);
            assert_eq!(a.sample(c), b.sample(c));
        }
    }

    #[test]
    fn traversal_span_covers_cutoff_diameter() {
        let field = VoxelField::new(VoxelGrid::empty(128).unwrap(), FieldConfig::default());
        assert!(field.max_traversal_span() <= 768);
        assert!(field.max_traversal_span() as f32 > 2.0 * 220.0);
    }

    #[test]
    fn variant_count_is_clamped() {
        let mut config = FieldConfig::default();
        assert_eq!(config.variants(), 8);
        config.variant_count = 0;
        assert_eq!(config.variants(), 1);
        config.variant_count = u8::MAX;
        assert_eq!(config.variants(), u8::MAX - 1);
    }

    #[test]
    fn traversal_span_needs_no_grid() {
        let config = FieldConfig::default();
        let field = VoxelField::new(VoxelGrid::empty(64).unwrap(), config);
        assert_eq!(config.traversal_span(64), field.max_traversal_span());
        assert_eq!(config.traversal_span(64), 766);
        assert!(config.traversal_span(512) > config.traversal_span(64));
    }
}
