use glam::{IVec3, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use voxelspace_common::{Axis, MaterialId};
use voxelspace_kernel::VoxelSource;
use voxelspace_noise::random_color;

use crate::ray::{Hit, TraceOutcome};

/// Color written for rays that hit nothing.
pub const BACKGROUND: Vec3 = Vec3::ZERO;

/// Lighting weights. The final color is
/// `base * (ambient + diffuse * diffuse_weight + ao * ao_weight)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadingConfig {
    /// Direction towards the light. Normalized before use.
    pub light_direction: Vec3,
    pub ambient: f32,
    pub diffuse_weight: f32,
    pub ao_weight: f32,
}

impl Default for ShadingConfig {
    fn default() -> Self {
        Self {
            light_direction: Vec3::ONE,
            ambient: 0.25,
            diffuse_weight: 0.5,
            ao_weight: 0.5,
        }
    }
}

fn occupied<S: VoxelSource>(source: &S, cell: IVec3) -> f32 {
    if source.sample(cell).is_solid() { 1.0 } else { 0.0 }
}

fn vertex_ao(side_a: f32, side_b: f32, corner: f32) -> f32 {
    1.0 - (side_a + side_b + corner.max(side_a * side_b)) / 3.0
}

/// Ambient occlusion at the four corners of the face whose open side is
/// `face_cell`, spanned by the tangent axes `t1` and `t2`.
///
/// Components are the corners at `(+t1,+t2)`, `(-t1,+t2)`, `(-t1,-t2)` and
/// `(+t1,-t2)`; 1 is fully open, 0 fully occluded.
pub fn voxel_ao<S: VoxelSource>(source: &S, face_cell: IVec3, t1: Axis, t2: Axis) -> Vec4 {
    let d1 = t1.unit();
    let d2 = t2.unit();
    let at = |offset: IVec3| occupied(source, face_cell.saturating_add(offset));

    let side = Vec4::new(at(d1), at(d2), at(-d1), at(-d2));
    let corner = Vec4::new(at(d1 + d2), at(d2 - d1), at(-d1 - d2), at(d1 - d2));

    Vec4::new(
        vertex_ao(side.x, side.y, corner.x),
        vertex_ao(side.y, side.z, corner.y),
        vertex_ao(side.z, side.w, corner.z),
        vertex_ao(side.w, side.x, corner.w),
    )
}

/// Bilinear blend of the corner terms across the face, softened by a cube root.
pub fn interpolate_ao(ao: Vec4, uv: Vec2) -> f32 {
    let bottom = lerp(ao.z, ao.w, uv.x);
    let top = lerp(ao.y, ao.x, uv.x);
    lerp(bottom, top, uv.y).max(0.0).cbrt()
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Lambert term for a face normal.
pub fn diffuse(normal: IVec3, config: &ShadingConfig) -> f32 {
    let light = config.light_direction.normalize_or_zero();
    normal.as_vec3().dot(light).clamp(0.0, 1.0)
}

/// Unlit color of a material at `cell`.
pub fn base_color(material: MaterialId, cell: IVec3) -> Vec3 {
    if material == MaterialId::SOLID {
        Vec3::ONE
    } else {
        random_color(cell.as_vec3())
    }
}

/// Linear RGB for a hit, each channel in `[0, 1]`.
pub fn shade<S: VoxelSource>(source: &S, hit: &Hit, config: &ShadingConfig) -> Vec3 {
    let (t1, t2) = hit.axis.tangents();
    let ao = interpolate_ao(voxel_ao(source, hit.face_cell(), t1, t2), hit.uv);
    let light = config.ambient
        + diffuse(hit.normal, config) * config.diffuse_weight
        + ao * config.ao_weight;
    (base_color(hit.material, hit.cell) * light).clamp(Vec3::ZERO, Vec3::ONE)
}

pub fn shade_outcome<S: VoxelSource>(
    source: &S,
    outcome: &TraceOutcome,
    config: &ShadingConfig,
) -> Vec3 {
    match outcome {
        TraceOutcome::Hit(hit) => shade(source, hit, config),
        TraceOutcome::Miss { .. } => BACKGROUND,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxelspace_kernel::{GridBuilder, VoxelGrid};

    const EPS: f32 = 1e-5;

    fn grid_with(cells: &[IVec3]) -> VoxelGrid {
        let mut builder = GridBuilder::new(8).unwrap();
        for &c in cells {
            builder.set(c, MaterialId::SOLID);
        }
        builder.build()
    }

    fn top_hit(uv: Vec2, material: MaterialId) -> Hit {
        Hit {
            material,
            cell: IVec3::splat(4),
            axis: Axis::Y,
            normal: IVec3::Y,
            point: Vec3::new(4.0 + uv.y, 5.0, 4.0 + uv.x),
            uv,
            steps: 3,
        }
    }

    #[test]
    fn open_face_is_unoccluded() {
        let grid = grid_with(&[IVec3::splat(4)]);
        let ao = voxel_ao(&grid, IVec3::new(4, 5, 4), Axis::Z, Axis::X);
        assert_eq!(ao, Vec4::ONE);
        assert!((interpolate_ao(ao, Vec2::new(0.3, 0.8)) - 1.0).abs() < EPS);
    }

    #[test]
    fn every_neighbor_pattern_stays_in_unit_range() {
        let face = IVec3::new(4, 5, 4);
        let (d1, d2) = (IVec3::Z, IVec3::X);
        let neighbors = [d1, d2, -d1, -d2, d1 + d2, d2 - d1, -d1 - d2, d1 - d2];
        for mask in 0u32..256 {
            let solid: Vec<IVec3> = neighbors
                .iter()
                .enumerate()
                .filter(|(bit, _)| mask & (1 << bit) != 0)
                .map(|(_, &offset)| face + offset)
                .collect();
            let ao = voxel_ao(&grid_with(&solid), face, Axis::Z, Axis::X);
            for v in ao.to_array() {
                assert!((0.0..=1.0).contains(&v), "mask {mask:#010b}: {ao}");
            }
            for uv in [Vec2::ZERO, Vec2::ONE, Vec2::new(0.25, 0.7)] {
                let blended = interpolate_ao(ao, uv);
                assert!((0.0..=1.0 + EPS).contains(&blended), "mask {mask:#010b}: {blended}");
            }
        }
    }

    #[test]
    fn side_neighbor_darkens_adjacent_corners() {
        // Face cell (4,5,4); t1 = z, t2 = x. Block at +t1.
        let grid = grid_with(&[IVec3::splat(4), IVec3::new(4, 5, 5)]);
        let ao = voxel_ao(&grid, IVec3::new(4, 5, 4), Axis::Z, Axis::X);
        let third = 2.0 / 3.0;
        assert!((ao - Vec4::new(third, 1.0, 1.0, third)).abs().max_element() < EPS);
    }

    #[test]
    fn corner_only_occludes_one_vertex() {
        let grid = grid_with(&[IVec3::new(3, 5, 3)]);
        let ao = voxel_ao(&grid, IVec3::new(4, 5, 4), Axis::Z, Axis::X);
        assert!((ao - Vec4::new(1.0, 1.0, 2.0 / 3.0, 1.0)).abs().max_element() < EPS);
    }

    #[test]
    fn two_sides_fully_occlude_their_corner() {
        let grid = grid_with(&[IVec3::new(4, 5, 5), IVec3::new(5, 5, 4)]);
        let ao = voxel_ao(&grid, IVec3::new(4, 5, 4), Axis::Z, Axis::X);
        assert_eq!(ao.x, 0.0);
    }

    #[test]
    fn interpolation_hits_corner_values() {
        let ao = Vec4::new(0.0, 0.125, 0.512, 1.0);
        assert!((interpolate_ao(ao, Vec2::new(1.0, 1.0)) - 0.0).abs() < EPS);
        assert!((interpolate_ao(ao, Vec2::new(0.0, 1.0)) - 0.5).abs() < EPS);
        assert!((interpolate_ao(ao, Vec2::new(0.0, 0.0)) - 0.8).abs() < EPS);
        assert!((interpolate_ao(ao, Vec2::new(1.0, 0.0)) - 1.0).abs() < EPS);
    }

    #[test]
    fn diffuse_faces_the_light() {
        let config = ShadingConfig::default();
        let expected = 1.0 / 3f32.sqrt();
        assert!((diffuse(IVec3::Y, &config) - expected).abs() < EPS);
        assert_eq!(diffuse(IVec3::NEG_X, &config), 0.0);
    }

    #[test]
    fn shade_stays_in_unit_range() {
        let grid = grid_with(&[IVec3::splat(4)]);
        let config = ShadingConfig::default();
        let bright = shade(&grid, &top_hit(Vec2::splat(0.5), MaterialId::SOLID), &config);
        assert_eq!(bright, Vec3::ONE);
        for m in 2..10 {
            let c = shade(&grid, &top_hit(Vec2::new(0.1, 0.9), MaterialId(m)), &config);
            assert!(c.cmpge(Vec3::ZERO).all() && c.cmple(Vec3::ONE).all());
        }
    }

    #[test]
    fn shaded_face_away_from_light() {
        let grid = grid_with(&[IVec3::splat(4)]);
        let hit = Hit {
            normal: IVec3::NEG_Y,
            point: Vec3::new(4.5, 4.0, 4.5),
            ..top_hit(Vec2::splat(0.5), MaterialId::SOLID)
        };
        let color = shade(&grid, &hit, &ShadingConfig::default());
        assert!((color - Vec3::splat(0.75)).abs().max_element() < EPS);
    }

    #[test]
    fn variants_use_cell_color() {
        let hit = top_hit(Vec2::ZERO, MaterialId(4));
        assert_eq!(base_color(hit.material, hit.cell), random_color(hit.cell.as_vec3()));
        assert_eq!(base_color(MaterialId::SOLID, hit.cell), Vec3::ONE);
    }

    #[test]
    fn miss_is_background() {
        let grid = VoxelGrid::empty(4).unwrap();
        let miss = TraceOutcome::Miss { steps: 768 };
        let color = shade_outcome(&grid, &miss, &ShadingConfig::default());
        assert_eq!(color, BACKGROUND);
    }
}
