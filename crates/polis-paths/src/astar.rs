use std::collections::{BinaryHeap, HashMap};

use polis_core::Point;

use crate::cost::{CARDINAL_COST, octile};
use crate::graph::{GraphArena, GraphId, NodeKey};

// ---------------------------------------------------------------------------
// Internal node scratch for A* searches
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
struct Node {
    g: i32,
    parent: Option<NodeKey>,
    generation: u32,
    open: bool,
}

/// Heap entry ordered by `f`, ties broken by lower `h`.
#[derive(Clone, Copy, Eq, PartialEq)]
struct HeapRef {
    key: NodeKey,
    f: i32,
    h: i32,
}

impl Ord for HeapRef {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Reverse so BinaryHeap (max-heap) pops smallest f first; among
        // equal f prefer the node closer to a target.
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.h.cmp(&self.h))
    }
}

impl PartialOrd for HeapRef {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

// ---------------------------------------------------------------------------
// GraphSearch
// ---------------------------------------------------------------------------

/// Reusable A* search state over a [`GraphArena`].
///
/// `GraphSearch` owns the per-node scratch (cost-so-far, parent pointers,
/// open flags) keyed by `(graph, coordinate)`. Entries carry a generation
/// stamp, so starting a new search lazily invalidates everything from the
/// previous one without clearing; the coordinate sets of the graphs are
/// never touched.
pub struct GraphSearch {
    nodes: HashMap<NodeKey, Node>,
    generation: u32,
    nbuf: Vec<NodeKey>,
}

impl Default for GraphSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphSearch {
    /// Create a fresh search state.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            generation: 0,
            nbuf: Vec::with_capacity(8),
        }
    }

    /// Compute the shortest path from `from` to `to`, starting in `graph`.
    ///
    /// The route may cross into other graphs through switch junctions.
    /// Returns the full coordinate path (both endpoints included) or `None`
    /// if no route exists — callers must treat `None` as "no route", not an
    /// error.
    pub fn find_path(
        &mut self,
        arena: &GraphArena,
        graph: GraphId,
        from: Point,
        to: Point,
    ) -> Option<Vec<Point>> {
        self.find_path_multi(arena, graph, &[from], &[to])
    }

    /// Multi-source / multi-sink variant of [`find_path`](Self::find_path).
    ///
    /// The search starts from every `starts` coordinate present in `graph`
    /// and succeeds on the first expanded node whose coordinate is in
    /// `targets`, wherever junctions have led by then.
    pub fn find_path_multi(
        &mut self,
        arena: &GraphArena,
        graph: GraphId,
        starts: &[Point],
        targets: &[Point],
    ) -> Option<Vec<Point>> {
        if starts.is_empty() || targets.is_empty() {
            return None;
        }
        if !targets.iter().any(|&t| arena.contains_anywhere(t)) {
            return None;
        }

        // Bump generation to lazily invalidate all scratch entries.
        self.generation = self.generation.wrapping_add(1);
        let cur_gen = self.generation;

        let mut open: BinaryHeap<HeapRef> = BinaryHeap::new();

        for &s in starts {
            if !arena.contains(graph, s) {
                continue;
            }
            let key = (graph, s);
            let h = estimate(s, targets);
            let _ = self.nodes.insert(
                key,
                Node {
                    g: 0,
                    parent: None,
                    generation: cur_gen,
                    open: true,
                },
            );
            open.push(HeapRef { key, f: h, h });
        }
        if open.is_empty() {
            return None;
        }

        let mut nbuf = std::mem::take(&mut self.nbuf);

        let found = 'search: loop {
            let Some(current) = open.pop() else {
                break 'search None;
            };

            let ck = current.key;

            // Skip stale entries.
            let cn = self.nodes[&ck];
            if cn.generation != cur_gen || !cn.open {
                continue;
            }

            if targets.contains(&ck.1) {
                break 'search Some(ck);
            }

            if let Some(n) = self.nodes.get_mut(&ck) {
                n.open = false;
            }
            let current_g = cn.g;

            arena.neighbors(ck.0, ck.1, &mut nbuf);

            for i in 0..nbuf.len() {
                let nk = nbuf[i];
                let tentative_g = current_g + CARDINAL_COST;

                match self.nodes.get_mut(&nk) {
                    Some(n) if n.generation == cur_gen => {
                        // Already visited this generation.
                        if tentative_g >= n.g {
                            continue;
                        }
                        n.g = tentative_g;
                        n.parent = Some(ck);
                        n.open = true;
                    }
                    Some(n) => {
                        n.g = tentative_g;
                        n.parent = Some(ck);
                        n.generation = cur_gen;
                        n.open = true;
                    }
                    None => {
                        let _ = self.nodes.insert(
                            nk,
                            Node {
                                g: tentative_g,
                                parent: Some(ck),
                                generation: cur_gen,
                                open: true,
                            },
                        );
                    }
                }

                let h = estimate(nk.1, targets);
                open.push(HeapRef {
                    key: nk,
                    f: tentative_g + h,
                    h,
                });
            }
        };

        self.nbuf = nbuf;

        let goal = found?;

        // Reconstruct the coordinate path.
        let mut path = Vec::new();
        let mut ck = Some(goal);
        while let Some(k) = ck {
            path.push(k.1);
            ck = self.nodes[&k].parent;
        }
        path.reverse();
        Some(path)
    }
}

/// Multi-target heuristic: minimum octile distance to any target.
fn estimate(p: Point, targets: &[Point]) -> i32 {
    targets
        .iter()
        .map(|&t| octile(p, t))
        .min()
        .unwrap_or(0)
}
