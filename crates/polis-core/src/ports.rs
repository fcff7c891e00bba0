//! Collaborator ports.
//!
//! The toolkit never reaches into the host game through globals; everything
//! it needs from the outside world comes in through these traits, passed
//! explicitly to the operations that use them.

use crate::geom::{Point, WorldPos};

/// Conversion between grid coordinates and world-space positions.
pub trait GridTransform {
    /// The grid cell containing a world position.
    fn grid_position(&self, pos: WorldPos) -> Point;
    /// The world position of a grid cell (typically its center, with the
    /// host's terrain height folded into the vertical component).
    fn world_position(&self, p: Point) -> WorldPos;
}

/// Transform hooks of a moving agent's visual body.
///
/// `face` has a no-op default so hosts without rotation can ignore it.
pub trait AgentBody {
    /// Place the body at a world position.
    fn set_position(&mut self, pos: WorldPos);
    /// Record the grid cell the body currently logically occupies.
    fn set_cell(&mut self, _cell: Point) {}
    /// Orient the body along a movement direction.
    fn face(&mut self, _dir: WorldPos) {}
}

/// Structure-occupancy query. The host answers whether a coordinate is free
/// for a connectivity network to claim, applying its own structure-priority
/// rules.
pub trait OccupancyQuery {
    fn is_free(&self, p: Point) -> bool;
}

/// Environmental layer values (elevation, moisture, proximity fields, ...)
/// used for tile-stage re-evaluation.
pub trait LayerQuery {
    fn value(&self, layer: &str, p: Point) -> f32;
}

// ---------------------------------------------------------------------------
// UnitTransform
// ---------------------------------------------------------------------------

/// The identity grid transform: one cell per world unit, flat ground.
///
/// Suitable for hosts without terrain and for tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnitTransform;

impl GridTransform for UnitTransform {
    fn grid_position(&self, pos: WorldPos) -> Point {
        Point::new(pos.x.round() as i32, pos.z.round() as i32)
    }

    fn world_position(&self, p: Point) -> WorldPos {
        WorldPos::new(p.x as f32, 0.0, p.y as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_transform_round_trips_cells() {
        let t = UnitTransform;
        for p in [Point::ZERO, Point::new(3, -2), Point::new(-7, 11)] {
            assert_eq!(t.grid_position(t.world_position(p)), p);
        }
    }

    #[test]
    fn unit_transform_snaps_to_nearest_cell() {
        let t = UnitTransform;
        assert_eq!(
            t.grid_position(WorldPos::new(2.4, 0.0, 2.6)),
            Point::new(2, 3)
        );
    }
}
