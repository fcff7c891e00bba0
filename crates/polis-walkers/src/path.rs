use polis_core::{GridTransform, Point, WorldPos};
use serde::{Deserialize, Serialize};

/// An immutable ordered route.
///
/// Either a list of grid coordinates (world positions derive through the
/// host's [`GridTransform`]) or a list of raw world positions — never both.
/// Derived quantities (lengths, directions) are computed, not stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Path {
    Points(Vec<Point>),
    Positions(Vec<WorldPos>),
}

impl Path {
    /// Number of waypoints.
    pub fn len(&self) -> usize {
        match self {
            Path::Points(points) => points.len(),
            Path::Positions(positions) => positions.len(),
        }
    }

    /// Whether the path has no waypoints at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this is a grid-coordinate path.
    pub fn is_point_path(&self) -> bool {
        matches!(self, Path::Points(_))
    }

    /// The grid coordinate at `index`. `None` past the end or for raw
    /// position paths.
    pub fn point(&self, index: usize) -> Option<Point> {
        match self {
            Path::Points(points) => points.get(index).copied(),
            Path::Positions(_) => None,
        }
    }

    /// First grid coordinate, for point paths.
    pub fn start_point(&self) -> Option<Point> {
        self.point(0)
    }

    /// Last grid coordinate, for point paths.
    pub fn end_point(&self) -> Option<Point> {
        match self {
            Path::Points(points) => points.last().copied(),
            Path::Positions(_) => None,
        }
    }

    /// The world position of the waypoint at `index`.
    pub fn position(&self, index: usize, t: &dyn GridTransform) -> Option<WorldPos> {
        match self {
            Path::Points(points) => points.get(index).map(|&p| t.world_position(p)),
            Path::Positions(positions) => positions.get(index).copied(),
        }
    }

    /// World position of the first waypoint.
    pub fn start_position(&self, t: &dyn GridTransform) -> Option<WorldPos> {
        self.position(0, t)
    }

    /// World position of the last waypoint.
    pub fn end_position(&self, t: &dyn GridTransform) -> Option<WorldPos> {
        match self.len() {
            0 => None,
            n => self.position(n - 1, t),
        }
    }

    /// Whether `index` is the final waypoint (or beyond): there is no
    /// segment leading onward from it.
    pub fn has_ended(&self, index: usize) -> bool {
        index + 1 >= self.len()
    }

    /// World position of the waypoint after `index`.
    pub fn next_position(&self, index: usize, t: &dyn GridTransform) -> Option<WorldPos> {
        self.position(index + 1, t)
    }

    /// World position of the waypoint before `index`.
    pub fn prev_position(&self, index: usize, t: &dyn GridTransform) -> Option<WorldPos> {
        index.checked_sub(1).and_then(|i| self.position(i, t))
    }

    /// World-space length of the segment starting at `index`.
    pub fn segment_length(&self, index: usize, t: &dyn GridTransform) -> Option<f32> {
        let a = self.position(index, t)?;
        let b = self.position(index + 1, t)?;
        Some(a.distance(b))
    }

    /// Unit direction of the segment starting at `index`.
    pub fn segment_direction(&self, index: usize, t: &dyn GridTransform) -> Option<WorldPos> {
        let a = self.position(index, t)?;
        let b = self.position(index + 1, t)?;
        Some((b - a).normalized())
    }
}
