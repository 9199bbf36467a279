use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

/// Material stored in (or generated for) a single voxel cell.
///
/// `0` is empty space, `1` is generic solid, `2..` are colored variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialId(pub u8);

impl MaterialId {
    pub const EMPTY: Self = Self(0);
    pub const SOLID: Self = Self(1);
    /// First id of the colored variant range.
    pub const FIRST_VARIANT: Self = Self(2);

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn is_solid(self) -> bool {
        self.0 != 0
    }

    /// True for ids that are shaded with a per-cell hash color.
    pub fn is_variant(self) -> bool {
        self.0 >= Self::FIRST_VARIANT.0
    }
}

impl From<u8> for MaterialId {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

/// One of the three grid axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn from_index(index: usize) -> Self {
        match index % 3 {
            0 => Axis::X,
            1 => Axis::Y,
            _ => Axis::Z,
        }
    }

    /// Unit vector along this axis.
    pub fn unit(self) -> IVec3 {
        let mut v = IVec3::ZERO;
        v[self.index()] = 1;
        v
    }

    /// The two axes spanning a face perpendicular to this one, in the
    /// cyclic order `(axis + 1, axis + 2)`.
    pub fn tangents(self) -> (Axis, Axis) {
        let i = self.index();
        (Axis::from_index(i + 1), Axis::from_index(i + 2))
    }
}

/// Normalize `v`, returning it unchanged when its length is zero.
pub fn normalize_or_self(v: Vec3) -> Vec3 {
    let len = v.length();
    if len > 0.0 { v / len } else { v }
}

/// Sign with `0.0` for zero, matching shader `sign()` rather than `f32::signum`.
pub fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
