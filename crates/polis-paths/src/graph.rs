use std::collections::HashMap;

use polis_core::Point;

/// Handle to a grid graph inside a [`GraphArena`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GraphId(pub(crate) usize);

/// A node key during search and neighbor enumeration: which graph, which cell.
pub(crate) type NodeKey = (GraphId, Point);

/// What occupies a traversable coordinate.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// An ordinary traversable cell.
    Plain,
    /// An undirected junction: its neighborhood is the union of the
    /// 4-adjacent cells in its own graph and in `peer`.
    Switch {
        /// The bridged graph.
        peer: GraphId,
    },
    /// A directed junction: enterable only from `entry` in the owning graph,
    /// continuing only at `exit` in `peer`.
    Gate {
        /// The sole cell the junction may be entered from.
        entry: Point,
        /// The sole cell the junction continues at, in `peer`.
        exit: Point,
        /// The bridged graph.
        peer: GraphId,
    },
}

// ---------------------------------------------------------------------------
// GridGraph
// ---------------------------------------------------------------------------

/// A mutable 4-connected grid graph: a coordinate is traversable iff present.
///
/// Graphs are owned by a [`GraphArena`]; all mutation goes through the arena
/// so cross-graph junctions stay consistent.
#[derive(Debug, Default)]
pub struct GridGraph {
    nodes: HashMap<Point, NodeKind>,
}

impl GridGraph {
    /// Whether `p` is traversable in this graph.
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        self.nodes.contains_key(&p)
    }

    /// The node at `p`, if present.
    #[inline]
    pub fn node(&self, p: Point) -> Option<NodeKind> {
        self.nodes.get(&p).copied()
    }

    /// Number of traversable coordinates.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no coordinates at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterator over every traversable coordinate, in arbitrary order.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.nodes.keys().copied()
    }

    fn add(&mut self, p: Point) {
        // Re-adding never downgrades a junction back to a plain cell.
        let _ = self.nodes.entry(p).or_insert(NodeKind::Plain);
    }

    fn put(&mut self, p: Point, kind: NodeKind) {
        let _ = self.nodes.insert(p, kind);
    }

    fn remove(&mut self, p: Point) {
        let _ = self.nodes.remove(&p);
    }

    fn clear(&mut self) {
        self.nodes.clear();
    }
}

// ---------------------------------------------------------------------------
// GraphArena
// ---------------------------------------------------------------------------

/// Owner of every grid graph, addressed by [`GraphId`] handles.
#[derive(Debug, Default)]
pub struct GraphArena {
    graphs: Vec<GridGraph>,
}

impl GraphArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new empty graph and return its handle.
    pub fn create(&mut self) -> GraphId {
        self.graphs.push(GridGraph::default());
        GraphId(self.graphs.len() - 1)
    }

    /// Borrow a graph for reading.
    #[inline]
    pub fn graph(&self, id: GraphId) -> &GridGraph {
        &self.graphs[id.0]
    }

    /// Make `p` traversable in graph `id`. No-op if already present.
    pub fn add(&mut self, id: GraphId, p: Point) {
        self.graphs[id.0].add(p);
    }

    /// [`add`](Self::add) for a batch of coordinates.
    pub fn add_all(&mut self, id: GraphId, coords: &[Point]) {
        for &p in coords {
            self.graphs[id.0].add(p);
        }
    }

    /// Remove `p` from graph `id`. No-op if absent.
    pub fn remove(&mut self, id: GraphId, p: Point) {
        self.graphs[id.0].remove(p);
    }

    /// [`remove`](Self::remove) for a batch of coordinates.
    pub fn remove_all(&mut self, id: GraphId, coords: &[Point]) {
        for &p in coords {
            self.graphs[id.0].remove(p);
        }
    }

    /// Remove every coordinate from graph `id`.
    pub fn clear(&mut self, id: GraphId) {
        self.graphs[id.0].clear();
    }

    /// Whether `p` is traversable in graph `id`.
    #[inline]
    pub fn contains(&self, id: GraphId, p: Point) -> bool {
        self.graphs[id.0].contains(p)
    }

    /// Whether `p` is traversable in any graph.
    pub fn contains_anywhere(&self, p: Point) -> bool {
        self.graphs.iter().any(|g| g.contains(p))
    }

    /// Remove the node at `p` from graph `id` and return what it was.
    ///
    /// Used for temporary blocking, paired with
    /// [`put_node`](Self::put_node) to restore the exact node (junctions
    /// included) when the obstruction lifts.
    pub fn take_node(&mut self, id: GraphId, p: Point) -> Option<NodeKind> {
        self.graphs[id.0].nodes.remove(&p)
    }

    /// Restore a node previously returned by [`take_node`](Self::take_node).
    pub fn put_node(&mut self, id: GraphId, p: Point, kind: NodeKind) {
        self.graphs[id.0].put(p, kind);
    }

    /// Register an undirected switch junction at `coord` between graphs `a`
    /// and `b`.
    ///
    /// The junction is inserted into both graphs, each side referencing the
    /// other, so it is traversable in both directions. An existing plain
    /// node at `coord` is upgraded in place.
    pub fn add_switch(&mut self, a: GraphId, coord: Point, b: GraphId) {
        self.graphs[a.0].put(coord, NodeKind::Switch { peer: b });
        self.graphs[b.0].put(coord, NodeKind::Switch { peer: a });
    }

    /// Register a directed gate junction at `coord` in graph `a`: enterable
    /// only from `entry` (in `a`), continuing only at `exit` (in `b`).
    ///
    /// The gate lives in `a` alone, so nothing in `b` can route back through
    /// it. An existing plain node at `coord` is upgraded in place.
    pub fn add_gate(&mut self, a: GraphId, entry: Point, coord: Point, exit: Point, b: GraphId) {
        self.graphs[a.0].put(coord, NodeKind::Gate { entry, exit, peer: b });
    }

    /// Enumerate the traversable neighbors of `(id, p)` into `buf`.
    ///
    /// This is the single place the junction rules live: a plain cell
    /// neighbors the present 4-adjacent cells of its own graph; a switch
    /// additionally neighbors those of its peer; a gate's sole onward
    /// neighbor is its exit cell. A gate is only ever a valid *target*
    /// neighbor when approached from its entry cell.
    pub(crate) fn neighbors(&self, id: GraphId, p: Point, buf: &mut Vec<NodeKey>) {
        buf.clear();
        let Some(kind) = self.graphs[id.0].node(p) else {
            return;
        };

        match kind {
            NodeKind::Plain => {
                self.push_adjacent(id, p, buf);
            }
            NodeKind::Switch { peer } => {
                self.push_adjacent(id, p, buf);
                self.push_adjacent(peer, p, buf);
            }
            NodeKind::Gate { exit, peer, .. } => {
                if let Some(exit_kind) = self.graphs[peer.0].node(exit) {
                    if accepts(exit_kind, p) {
                        buf.push((peer, exit));
                    }
                }
            }
        }
    }

    fn push_adjacent(&self, id: GraphId, p: Point, buf: &mut Vec<NodeKey>) {
        let graph = &self.graphs[id.0];
        for n in p.neighbors_4() {
            if let Some(kind) = graph.node(n) {
                if accepts(kind, p) {
                    buf.push((id, n));
                }
            }
        }
    }
}

/// Whether a node may be stepped onto from `from`.
#[inline]
fn accepts(kind: NodeKind, from: Point) -> bool {
    match kind {
        NodeKind::Gate { entry, .. } => entry == from,
        _ => true,
    }
}
