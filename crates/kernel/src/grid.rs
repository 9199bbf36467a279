use glam::IVec3;
use voxelspace_common::MaterialId;

use crate::field::VoxelSource;

/// Default edge length of the stored voxel cube.
pub const DEFAULT_GRID_SIZE: u32 = 128;

/// Errors from constructing a voxel grid out of raw bytes.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("grid edge length must be non-zero")]
    ZeroSize,
    #[error("grid data has {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("grid data of {0} bytes is not a cube")]
    NotCubic(usize),
}

/// The finite, stored tier of the voxel world.
///
/// A cube of edge `size`, one byte per voxel, indexed `x + y*N + z*N*N`
/// (x fastest, then rows, then slices). Immutable once built; use
/// [`GridBuilder`] to populate one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoxelGrid {
    size: u32,
    voxels: Vec<u8>,
}

impl VoxelGrid {
    /// An all-empty grid.
    pub fn empty(size: u32) -> Result<Self, GridError> {
        if size == 0 {
            return Err(GridError::ZeroSize);
        }
        let len = (size as usize).pow(3);
        Ok(Self {
            size,
            voxels: vec![0; len],
        })
    }

    /// Wrap an existing byte buffer of exactly `size^3` bytes.
    pub fn from_bytes(size: u32, voxels: Vec<u8>) -> Result<Self, GridError> {
        if size == 0 {
            return Err(GridError::ZeroSize);
        }
        let expected = (size as usize).pow(3);
        if voxels.len() != expected {
            return Err(GridError::SizeMismatch {
                expected,
                actual: voxels.len(),
            });
        }
        Ok(Self { size, voxels })
    }

    /// Wrap a raw model dump, inferring the edge length from the byte count.
    pub fn from_raw(voxels: Vec<u8>) -> Result<Self, GridError> {
        let len = voxels.len();
        let edge = (len as f64).cbrt().round() as usize;
        if edge == 0 || edge.pow(3) != len {
            return Err(GridError::NotCubic(len));
        }
        Self::from_bytes(edge as u32, voxels)
    }

    /// Edge length N.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Raw voxel bytes in upload order.
    pub fn as_bytes(&self) -> &[u8] {
        &self.voxels
    }

    /// Whether `coord` lies in `[0, N)` on every axis.
    pub fn contains(&self, coord: IVec3) -> bool {
        let n = self.size as i64;
        [coord.x, coord.y, coord.z]
            .iter()
            .all(|&c| (0..n).contains(&(c as i64)))
    }

    fn index(&self, coord: IVec3) -> usize {
        let n = self.size as usize;
        coord.x as usize + coord.y as usize * n + coord.z as usize * n * n
    }

    /// Stored material at `coord`, or `None` outside the grid.
    pub fn get(&self, coord: IVec3) -> Option<MaterialId> {
        self.contains(coord)
            .then(|| MaterialId(self.voxels[self.index(coord)]))
    }

    /// Number of non-empty cells.
    pub fn solid_count(&self) -> usize {
        self.voxels.iter().filter(|&&v| v != 0).count()
    }
}

impl VoxelSource for VoxelGrid {
    fn sample(&self, coord: IVec3) -> MaterialId {
        self.get(coord).unwrap_or(MaterialId::EMPTY)
    }
}

/// Mutable staging area used to synthesize a grid before freezing it.
#[derive(Debug, Clone)]
pub struct GridBuilder {
    grid: VoxelGrid,
}

impl GridBuilder {
    pub fn new(size: u32) -> Result<Self, GridError> {
        Ok(Self {
            grid: VoxelGrid::empty(size)?,
        })
    }

    pub fn size(&self) -> u32 {
        self.grid.size
    }

    /// Set a cell. Coordinates outside the cube are ignored.
    pub fn set(&mut self, coord: IVec3, material: MaterialId) {
        if self.grid.contains(coord) {
            let index = self.grid.index(coord);
            self.grid.voxels[index] = material.0;
        }
    }

    pub fn build(self) -> VoxelGrid {
        self.grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_grid_is_all_zero() {
        let grid = VoxelGrid::empty(8).unwrap();
        assert_eq!(grid.as_bytes().len(), 512);
        assert_eq!(grid.solid_count(), 0);
    }

    #[test]
    fn zero_size_rejected() {
        assert!(matches!(VoxelGrid::empty(0), Err(GridError::ZeroSize)));
    }

    #[test]
    fn from_bytes_checks_length() {
        let err = VoxelGrid::from_bytes(4, vec![0; 63]).unwrap_err();
        assert!(matches!(
            err,
            GridError::SizeMismatch {
                expected: 64,
                actual: 63
            }
        ));
    }

    #[test]
    fn from_raw_infers_edge() {
        let grid = VoxelGrid::from_raw(vec![0; 27]).unwrap();
        assert_eq!(grid.size(), 3);
        assert!(matches!(
            VoxelGrid::from_raw(vec![0; 28]),
            Err(GridError::NotCubic(28))
        ));
        assert!(VoxelGrid::from_raw(Vec::new()).is_err());
    }

    #[test]
    fn index_is_x_fastest() {
        let mut bytes = vec![0; 64];
        bytes[1] = 5; // (1, 0, 0)
        bytes[4] = 6; // (0, 1, 0)
        bytes[16] = 7; // (0, 0, 1)
        let grid = VoxelGrid::from_bytes(4, bytes).unwrap();
        assert_eq!(grid.get(IVec3::new(1, 0, 0)), Some(MaterialId(5)));
        assert_eq!(grid.get(IVec3::new(0, 1, 0)), Some(MaterialId(6)));
        assert_eq!(grid.get(IVec3::new(0, 0, 1)), Some(MaterialId(7)));
    }

    #[test]
    fn bounds_are_half_open() {
        let grid = VoxelGrid::empty(4).unwrap();
        assert!(grid.contains(IVec3::new(3, 3, 3)));
        assert!(!grid.contains(IVec3::new(4, 0, 0)));
        assert!(!grid.contains(IVec3::new(0, -1, 0)));
        assert_eq!(grid.get(IVec3::new(i32::MAX, 0, 0)), None);
    }

    #[test]
    fn builder_sets_and_ignores_outside() {
        let mut builder = GridBuilder::new(4).unwrap();
        builder.set(IVec3::new(2, 1, 3), MaterialId::SOLID);
        builder.set(IVec3::new(9, 0, 0), MaterialId::SOLID);
        let grid = builder.build();
        assert_eq!(grid.sample(IVec3::new(2, 1, 3)), MaterialId::SOLID);
        assert_eq!(grid.solid_count(), 1);
    }
}
