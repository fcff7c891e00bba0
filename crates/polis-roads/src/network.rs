//! A single connectivity network: a blocked-aware grid-graph pair bound to
//! tile visuals.

use std::collections::HashMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use polis_core::{LayerQuery, OccupancyQuery, Point};
use polis_paths::{GraphArena, GraphId, NodeKind};

use crate::stage::{TilePainter, TileStage, resolve_stage};

// ---------------------------------------------------------------------------
// GraphPair
// ---------------------------------------------------------------------------

/// The two pathfinder variants of a network.
///
/// `base` holds every connected cell; `passable` holds the same cells
/// minus temporarily blocked ones. Routing that must avoid transient
/// obstructions uses `passable`; the base graph keeps the permanent
/// connectivity knowledge intact.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GraphPair {
    pub base: GraphId,
    pub passable: GraphId,
}

impl GraphPair {
    /// Allocate a fresh pair of empty graphs.
    pub fn create(arena: &mut GraphArena) -> Self {
        Self {
            base: arena.create(),
            passable: arena.create(),
        }
    }

    /// The variant to search: `avoid_blocked` selects the passable graph.
    #[inline]
    pub fn graph(self, avoid_blocked: bool) -> GraphId {
        if avoid_blocked { self.passable } else { self.base }
    }
}

/// A junction between two networks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Junction {
    /// Traversable in both directions at `coord`.
    Undirected { coord: Point },
    /// One-way: enterable from `entry`, continuing at `exit` on the far
    /// network.
    Directed {
        entry: Point,
        coord: Point,
        exit: Point,
    },
}

// ---------------------------------------------------------------------------
// RoadNetwork
// ---------------------------------------------------------------------------

/// One named connectivity network.
///
/// Owns a [`GraphPair`], the set of temporarily blocked coordinates, and
/// the coordinate→stage tile map. All graph mutation funnels through the
/// methods here (or through the registry wrapping them); agents only ever
/// read path results.
#[derive(Debug)]
pub struct RoadNetwork {
    key: String,
    pair: GraphPair,
    stages: Vec<TileStage>,
    tiles: HashMap<Point, usize>,
    /// Blocked coordinate → the node taken out of the passable graph, so
    /// unblocking restores junction nodes exactly.
    blocked: HashMap<Point, NodeKind>,
}

impl RoadNetwork {
    /// Create an empty network with the given visual stages.
    ///
    /// `stages` must not be empty; the first stage is the default tile.
    pub fn new(key: impl Into<String>, stages: Vec<TileStage>, arena: &mut GraphArena) -> Self {
        assert!(!stages.is_empty(), "a network needs at least one tile stage");
        Self {
            key: key.into(),
            pair: GraphPair::create(arena),
            stages,
            tiles: HashMap::new(),
            blocked: HashMap::new(),
        }
    }

    /// The network's tag.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The network's graph pair.
    pub fn pair(&self) -> GraphPair {
        self.pair
    }

    /// Whether `p` is connected in this network.
    pub fn contains(&self, arena: &GraphArena, p: Point) -> bool {
        arena.contains(self.pair.base, p)
    }

    /// Whether `p` is currently blocked.
    pub fn is_blocked(&self, p: Point) -> bool {
        self.blocked.contains_key(&p)
    }

    /// The stage key currently painted at `p`, if this network painted one.
    pub fn stage_at(&self, p: Point) -> Option<&str> {
        self.tiles.get(&p).map(|&i| self.stages[i].key.as_str())
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Connect `coords`, painting tiles as `stage` (or the first stage when
    /// `None`). Coordinates already connected, or refused by the host's
    /// occupancy query, are filtered out. Returns the coordinates actually
    /// added.
    pub fn add(
        &mut self,
        arena: &mut GraphArena,
        coords: &[Point],
        stage: Option<&str>,
        occupancy: &dyn OccupancyQuery,
        painter: &mut dyn TilePainter,
    ) -> Vec<Point> {
        let stage_idx = match stage {
            Some(key) => match self.stage_index(key) {
                Some(i) => i,
                None => {
                    warn!("network `{}`: unknown stage `{key}`, using default", self.key);
                    0
                }
            },
            None => 0,
        };

        let mut added = Vec::new();
        for &p in coords {
            if arena.contains(self.pair.base, p) {
                continue;
            }
            if !occupancy.is_free(p) {
                continue;
            }
            let _ = self.tiles.insert(p, stage_idx);
            painter.paint(p, &self.stages[stage_idx].key);
            self.insert_graphs(arena, p);
            added.push(p);
        }
        added
    }

    /// Disconnect `coords`, clearing their tiles.
    pub fn remove(
        &mut self,
        arena: &mut GraphArena,
        coords: &[Point],
        painter: &mut dyn TilePainter,
    ) {
        for &p in coords {
            if self.tiles.remove(&p).is_some() {
                painter.clear(p);
            }
            arena.remove(self.pair.base, p);
            arena.remove(self.pair.passable, p);
            let _ = self.blocked.remove(&p);
        }
    }

    /// Connect `coords` in the graphs only — no tile writes. Used to mirror
    /// an externally placed structure that counts as connective.
    pub fn register(&mut self, arena: &mut GraphArena, coords: &[Point]) {
        for &p in coords {
            if arena.contains(self.pair.base, p) {
                continue;
            }
            self.insert_graphs(arena, p);
        }
    }

    /// Undo [`register`](Self::register): disconnect `coords` from the
    /// graphs only.
    pub fn deregister(&mut self, arena: &mut GraphArena, coords: &[Point]) {
        for &p in coords {
            arena.remove(self.pair.base, p);
            arena.remove(self.pair.passable, p);
            let _ = self.blocked.remove(&p);
        }
    }

    /// Temporarily obstruct `coords`: they disappear from the passable
    /// graph only. Coordinates not connected in the base graph are ignored.
    pub fn block(&mut self, arena: &mut GraphArena, coords: &[Point]) {
        for &p in coords {
            if !arena.contains(self.pair.base, p) || self.blocked.contains_key(&p) {
                continue;
            }
            let kind = arena
                .take_node(self.pair.passable, p)
                .unwrap_or(NodeKind::Plain);
            let _ = self.blocked.insert(p, kind);
        }
    }

    /// Lift a temporary obstruction: restore `coords` into the passable
    /// graph exactly as they were.
    pub fn unblock(&mut self, arena: &mut GraphArena, coords: &[Point]) {
        for &p in coords {
            if let Some(kind) = self.blocked.remove(&p) {
                if arena.contains(self.pair.base, p) {
                    arena.put_node(self.pair.passable, p, kind);
                }
            }
        }
    }

    /// Wire a junction from this network onto `other`, in both the base
    /// and the passable graph pairs.
    pub fn link(&self, arena: &mut GraphArena, other: &RoadNetwork, junction: Junction) {
        match junction {
            Junction::Undirected { coord } => {
                arena.add_switch(self.pair.base, coord, other.pair.base);
                arena.add_switch(self.pair.passable, coord, other.pair.passable);
            }
            Junction::Directed { entry, coord, exit } => {
                arena.add_gate(self.pair.base, entry, coord, exit, other.pair.base);
                arena.add_gate(self.pair.passable, entry, coord, exit, other.pair.passable);
            }
        }
    }

    /// Re-derive the stage of each of `coords` from current layer values
    /// and repaint the ones that changed. Graph connectivity is untouched.
    pub fn check_layers(
        &mut self,
        coords: &[Point],
        layers: &dyn LayerQuery,
        painter: &mut dyn TilePainter,
    ) {
        for &p in coords {
            let Some(&current) = self.tiles.get(&p) else {
                continue;
            };
            let want = resolve_stage(&self.stages, layers, p);
            if want != current {
                let _ = self.tiles.insert(p, want);
                painter.paint(p, &self.stages[want].key);
            }
        }
    }

    /// Wipe the network: all tiles cleared, both graphs emptied. Blocked
    /// bookkeeping survives so a following [`load`](Self::load) can respect
    /// it.
    pub fn clear(&mut self, arena: &mut GraphArena, painter: &mut dyn TilePainter) {
        for &p in self.tiles.keys() {
            painter.clear(p);
        }
        self.tiles.clear();
        arena.clear(self.pair.base);
        arena.clear(self.pair.passable);
    }

    fn insert_graphs(&self, arena: &mut GraphArena, p: Point) {
        arena.add(self.pair.base, p);
        if !self.blocked.contains_key(&p) {
            arena.add(self.pair.passable, p);
        }
    }

    fn stage_index(&self, key: &str) -> Option<usize> {
        self.stages.iter().position(|s| s.key == key)
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    /// Snapshot the network as per-stage coordinate lists. Coordinates are
    /// sorted for deterministic output.
    pub fn save(&self) -> NetworkSave {
        let mut stages: Vec<StageSave> = self
            .stages
            .iter()
            .map(|s| StageSave {
                stage: s.key.clone(),
                coords: Vec::new(),
            })
            .collect();
        for (&p, &i) in &self.tiles {
            stages[i].coords.push(p);
        }
        for s in &mut stages {
            s.coords.sort();
        }
        NetworkSave {
            key: self.key.clone(),
            stages,
        }
    }

    /// Rebuild the network from a snapshot: clear everything, repaint each
    /// stage's coordinates, and reconnect them in both graph variants
    /// (respecting the current blocked set).
    pub fn load(
        &mut self,
        arena: &mut GraphArena,
        save: &NetworkSave,
        painter: &mut dyn TilePainter,
    ) {
        debug!(
            "network `{}`: loading {} stages",
            self.key,
            save.stages.len()
        );
        self.clear(arena, painter);
        for stage_save in &save.stages {
            let idx = match self.stage_index(&stage_save.stage) {
                Some(i) => i,
                None => {
                    warn!(
                        "network `{}`: saved stage `{}` unknown, using default",
                        self.key, stage_save.stage
                    );
                    0
                }
            };
            for &p in &stage_save.coords {
                let _ = self.tiles.insert(p, idx);
                painter.paint(p, &self.stages[idx].key);
                self.insert_graphs(arena, p);
            }
        }
    }
}

/// Saved form of one network: per-stage coordinate lists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkSave {
    pub key: String,
    pub stages: Vec<StageSave>,
}

/// The coordinates showing one stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageSave {
    pub stage: String,
    pub coords: Vec<Point>,
}
