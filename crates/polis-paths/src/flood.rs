//! Flood-fill reachability.

use std::collections::HashSet;

use polis_core::Point;

use crate::graph::{GraphArena, GraphId, NodeKey};

/// Collect every coordinate reachable from `from` in graph `graph`.
///
/// Follows the same neighbor rules as path search, so junction edges are
/// included and the fill may spill into bridged graphs. Coordinates are
/// reported once each, even when present in several graphs. Returns an
/// empty list if `from` is not traversable.
pub fn flood(arena: &GraphArena, graph: GraphId, from: Point) -> Vec<Point> {
    let mut result = Vec::new();
    if !arena.contains(graph, from) {
        return result;
    }

    let mut seen: HashSet<NodeKey> = HashSet::new();
    let mut coords: HashSet<Point> = HashSet::new();
    let mut stack: Vec<NodeKey> = Vec::new();
    let mut nbuf: Vec<NodeKey> = Vec::new();

    let start = (graph, from);
    let _ = seen.insert(start);
    let _ = coords.insert(from);
    result.push(from);
    stack.push(start);

    // Iterative DFS over (graph, coordinate) keys.
    while let Some((gid, p)) = stack.pop() {
        arena.neighbors(gid, p, &mut nbuf);
        for i in 0..nbuf.len() {
            let nk = nbuf[i];
            if seen.insert(nk) {
                if coords.insert(nk.1) {
                    result.push(nk.1);
                }
                stack.push(nk);
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flood_covers_connected_component_only() {
        let mut arena = GraphArena::new();
        let g = arena.create();
        for x in 0..=2 {
            arena.add(g, Point::new(x, 0));
        }
        // A separate island.
        arena.add(g, Point::new(5, 5));

        let mut cells = flood(&arena, g, Point::new(0, 0));
        cells.sort();
        assert_eq!(
            cells,
            vec![Point::new(0, 0), Point::new(1, 0), Point::new(2, 0)]
        );
    }

    #[test]
    fn flood_from_absent_cell_is_empty() {
        let mut arena = GraphArena::new();
        let g = arena.create();
        arena.add(g, Point::new(0, 0));
        assert!(flood(&arena, g, Point::new(3, 3)).is_empty());
    }

    #[test]
    fn flood_crosses_switch_junctions() {
        let mut arena = GraphArena::new();
        let a = arena.create();
        let b = arena.create();
        arena.add(a, Point::new(0, 0));
        arena.add(b, Point::new(2, 0));
        arena.add_switch(a, Point::new(1, 0), b);

        let cells = flood(&arena, a, Point::new(0, 0));
        assert_eq!(cells.len(), 3);
        assert!(cells.contains(&Point::new(2, 0)));
    }
}
