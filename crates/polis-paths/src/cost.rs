use polis_core::Point;

/// Cost of one cardinal step.
pub const CARDINAL_COST: i32 = 10;

/// Weight of one diagonal-equivalent step. The grid has no diagonal edges;
/// this constant participates only in the heuristic estimate.
pub const DIAGONAL_COST: i32 = 14;

/// Octile distance between two points in [`CARDINAL_COST`] units.
#[inline]
pub fn octile(a: Point, b: Point) -> i32 {
    let dx = (a.x - b.x).abs();
    let dy = (a.y - b.y).abs();
    let (lo, hi) = if dx < dy { (dx, dy) } else { (dy, dx) };
    DIAGONAL_COST * lo + CARDINAL_COST * (hi - lo)
}

/// Manhattan (L1) distance between two points.
#[inline]
pub fn manhattan(a: Point, b: Point) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}
