use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};
use voxelspace_common::MaterialId;
use voxelspace_noise::noise3;

use crate::grid::{GridBuilder, GridError, VoxelGrid};

/// Built-in models used to populate the stored grid when no model file is given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scene {
    /// Nothing stored; only the procedural shell is visible.
    Empty,
    /// A solid ball with a banded colored core.
    Sphere,
    /// Noise heightfield with colored strata under a white top layer.
    #[default]
    Terrain,
}

impl Scene {
    pub fn build(self, size: u32) -> Result<VoxelGrid, GridError> {
        let _span = tracing::debug_span!("build_scene", scene = ?self, size).entered();
        let mut builder = GridBuilder::new(size)?;
        match self {
            Scene::Empty => {}
            Scene::Sphere => fill_sphere(&mut builder),
            Scene::Terrain => fill_terrain(&mut builder),
        }
        let grid = builder.build();
        tracing::debug!(solid = grid.solid_count(), "scene built");
        Ok(grid)
    }
}

fn cells(size: u32) -> impl Iterator<Item = IVec3> {
    let n = size as i32;
    (0..n).flat_map(move |z| (0..n).flat_map(move |y| (0..n).map(move |x| IVec3::new(x, y, z))))
}

fn fill_sphere(builder: &mut GridBuilder) {
    let n = builder.size();
    let center = Vec3::splat(n as f32 / 2.0);
    let radius = n as f32 / 3.0;
    for cell in cells(n) {
        let d = (cell.as_vec3() + Vec3::splat(0.5) - center).length();
        if d > radius {
            continue;
        }
        let material = if d > radius - 2.0 {
            MaterialId::SOLID
        } else {
            let band = (d / 4.0) as u8 % 8;
            MaterialId(MaterialId::FIRST_VARIANT.0 + band)
        };
        builder.set(cell, material);
    }
}

fn fill_terrain(builder: &mut GridBuilder) {
    let n = builder.size() as i32;
    let base = n as f32 * 0.2;
    let relief = n as f32 * 0.45;
    for z in 0..n {
        for x in 0..n {
            let p = Vec3::new(x as f32, 0.0, z as f32) * 0.035;
            let height = (base + noise3(p) * relief) as i32;
            for y in 0..=height.min(n - 1) {
                let material = if y >= height - 1 {
                    MaterialId::SOLID
                } else {
                    MaterialId(MaterialId::FIRST_VARIANT.0 + (y / 6 % 8) as u8)
                };
                builder.set(IVec3::new(x, y, z), material);
            }
        }
    }
}
