use glam::{IVec3, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use voxelspace_common::{Axis, MaterialId, sign};
use voxelspace_kernel::VoxelSource;

/// Cells a single ray may visit before it is reported as a miss.
///
/// This bounds the worst-case per-pixel cost and must exceed
/// [`voxelspace_kernel::VoxelField::max_traversal_span`] for the default
/// field, otherwise distant terrain gets clipped.
pub const MAX_TRACE_STEPS: u32 = 768;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    pub max_steps: u32,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            max_steps: MAX_TRACE_STEPS,
        }
    }
}

/// A half-line through voxel space. `direction` need not be normalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// First solid cell along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub material: MaterialId,
    pub cell: IVec3,
    /// Axis of the face the ray entered through.
    pub axis: Axis,
    /// Outward unit normal of that face.
    pub normal: IVec3,
    /// Point where the ray meets the face.
    pub point: Vec3,
    /// Position on the face, each component in `[0, 1)`.
    pub uv: Vec2,
    /// Boundaries crossed before reaching the cell.
    pub steps: u32,
}

impl Hit {
    /// The cell on the open side of the hit face, `cell + normal`. Empty for
    /// any hit that crossed a boundary; when the ray starts inside a solid
    /// cell (`steps == 0`) it may be solid too.
    pub fn face_cell(&self) -> IVec3 {
        self.cell.saturating_add(self.normal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TraceOutcome {
    Hit(Hit),
    /// No solid cell within the step budget. Not an error.
    Miss { steps: u32 },
}

impl TraceOutcome {
    pub fn hit(&self) -> Option<&Hit> {
        match self {
            TraceOutcome::Hit(hit) => Some(hit),
            TraceOutcome::Miss { .. } => None,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, TraceOutcome::Hit(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalState {
    Traveling,
    Hit,
    Miss,
}

/// One cell visited by a [`Traversal`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visit {
    pub cell: IVec3,
    pub material: MaterialId,
    /// Axis crossed to enter this cell; `None` for the origin cell.
    pub entered: Option<Axis>,
}

/// Amanatides-Woo grid walk, one cell per `next()`.
///
/// Yields the origin cell first, then each cell the ray enters, and stops
/// after yielding the first solid cell or after `max_steps` visits. Ties
/// between equal side distances go to x, then y, then z.
#[derive(Debug, Clone)]
pub struct Traversal<S> {
    source: S,
    ray: Ray,
    cell: IVec3,
    step: IVec3,
    delta: Vec3,
    side: Vec3,
    entered: Option<Axis>,
    visited: u32,
    max_steps: u32,
    state: TraversalState,
}

impl<S: VoxelSource> Traversal<S> {
    pub fn new(source: S, ray: Ray, max_steps: u32) -> Self {
        let dir = ray.direction;
        let length = dir.length();
        let cell = ray.origin.floor().as_ivec3();
        let mut step = IVec3::ZERO;
        let mut delta = Vec3::ZERO;
        let mut side = Vec3::ZERO;
        for a in 0..3 {
            let s = sign(dir[a]);
            step[a] = s as i32;
            delta[a] = (length / dir[a]).abs();
            side[a] = initial_side(ray.origin[a], cell[a], s, delta[a]);
        }
        Self {
            source,
            ray,
            cell,
            step,
            delta,
            side,
            entered: None,
            visited: 0,
            max_steps,
            state: TraversalState::Traveling,
        }
    }

    pub fn state(&self) -> TraversalState {
        self.state
    }

    /// Cells examined so far.
    pub fn visited(&self) -> u32 {
        self.visited
    }

    fn advance(&mut self) {
        if self.step == IVec3::ZERO {
            self.state = TraversalState::Miss;
            return;
        }
        let side = self.side;
        let a = if side.x <= side.y && side.x <= side.z {
            0
        } else if side.y <= side.z {
            1
        } else {
            2
        };
        self.cell[a] = self.cell[a].saturating_add(self.step[a]);
        self.side[a] += self.delta[a];
        self.entered = Some(Axis::from_index(a));
    }

    /// Resolve a solid visit into the hit record.
    fn resolve(&self, visit: Visit) -> Hit {
        let dir = self.ray.direction;
        let (axis, point) = match visit.entered {
            Some(axis) => {
                let a = axis.index();
                let plane = visit.cell[a] as f32 + if dir[a] < 0.0 { 1.0 } else { 0.0 };
                let t = (plane - self.ray.origin[a]) / dir[a];
                (axis, self.ray.at(t))
            }
            // Started inside a solid cell: no face was crossed.
            None => (dominant_axis(dir), self.ray.origin),
        };
        let a = axis.index();
        let mut normal = IVec3::ZERO;
        normal[a] = if dir[a] > 0.0 { -1 } else { 1 };

        let (t1, t2) = axis.tangents();
        let uv = Vec2::new(fract(point[t1.index()]), fract(point[t2.index()]));

        Hit {
            material: visit.material,
            cell: visit.cell,
            axis,
            normal,
            point,
            uv,
            steps: self.visited - 1,
        }
    }
}

impl<S: VoxelSource> Iterator for Traversal<S> {
    type Item = Visit;

    fn next(&mut self) -> Option<Visit> {
        if self.state != TraversalState::Traveling {
            return None;
        }
        if self.visited >= self.max_steps {
            self.state = TraversalState::Miss;
            return None;
        }
        let visit = Visit {
            cell: self.cell,
            material: self.source.sample(self.cell),
            entered: self.entered,
        };
        self.visited += 1;
        if visit.material.is_solid() {
            self.state = TraversalState::Hit;
        } else {
            self.advance();
        }
        Some(visit)
    }
}

/// Walk `ray` through `source` until it enters a solid cell or `max_steps`
/// cells have been examined.
pub fn cast_ray<S: VoxelSource>(source: S, ray: &Ray, max_steps: u32) -> TraceOutcome {
    let mut traversal = Traversal::new(source, *ray, max_steps);
    match traversal.by_ref().find(|visit| visit.material.is_solid()) {
        Some(visit) => TraceOutcome::Hit(traversal.resolve(visit)),
        None => TraceOutcome::Miss {
            steps: traversal.visited,
        },
    }
}

fn initial_side(origin: f32, cell: i32, step: f32, delta: f32) -> f32 {
    if step == 0.0 {
        return f32::INFINITY;
    }
    let side = (step * (cell as f32 - origin) + step * 0.5 + 0.5) * delta;
    // 0 * inf when a component is too small for its delta to be finite.
    if side.is_nan() { 0.0 } else { side }
}

fn dominant_axis(dir: Vec3) -> Axis {
    let d = dir.abs();
    if d.x >= d.y && d.x >= d.z {
        Axis::X
    } else if d.y >= d.z {
        Axis::Y
    } else {
        Axis::Z
    }
}

fn fract(x: f32) -> f32 {
    x - x.floor()
}
