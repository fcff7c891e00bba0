//! The network registry: single- and multi-network deployments.

use std::collections::HashMap;

use log::{debug, warn};
use thiserror::Error;

use polis_core::{LayerQuery, OccupancyQuery, Point};
use polis_paths::{GraphArena, GraphSearch};

use crate::network::{GraphPair, Junction, NetworkSave, RoadNetwork};
use crate::stage::{TilePainter, TileStage};

/// Configuration-contract violations. These indicate a misconfigured
/// deployment and should fail fast, unlike routing failures which are
/// plain `None` results.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Switch junctions were requested from a single-network registry.
    #[error("switch junctions require a multi-network registry")]
    SwitchUnsupported,
    /// A mutation named a network tag that does not exist.
    #[error("unknown network tag `{0}`")]
    UnknownNetwork(String),
}

enum Topology {
    /// One network serves every request regardless of tag.
    Single(RoadNetwork),
    /// Named networks plus the combined union pair for tag-agnostic
    /// queries.
    Multi {
        named: HashMap<String, RoadNetwork>,
        combined: GraphPair,
    },
}

/// Owner of the graph arena and every connectivity network.
///
/// All pathfinding requests and graph mutations route through here: a
/// request tag resolves to a named network, or — in multi-network
/// deployments — to the combined union pair when the tag is absent or
/// unknown. Cross-network routes exist only where junctions have been
/// registered explicitly.
pub struct NetworkRegistry {
    arena: GraphArena,
    search: GraphSearch,
    topology: Topology,
}

impl NetworkRegistry {
    /// A registry with exactly one network. Junction registration is
    /// unsupported in this mode.
    pub fn single(key: impl Into<String>, stages: Vec<TileStage>) -> Self {
        let mut arena = GraphArena::new();
        let net = RoadNetwork::new(key, stages, &mut arena);
        Self {
            arena,
            search: GraphSearch::new(),
            topology: Topology::Single(net),
        }
    }

    /// A registry with one named network per `(key, stages)` definition,
    /// plus the combined union pair.
    pub fn multi(defs: Vec<(String, Vec<TileStage>)>) -> Self {
        let mut arena = GraphArena::new();
        let combined = GraphPair::create(&mut arena);
        let named = defs
            .into_iter()
            .map(|(key, stages)| {
                let net = RoadNetwork::new(key.clone(), stages, &mut arena);
                (key, net)
            })
            .collect();
        Self {
            arena,
            search: GraphSearch::new(),
            topology: Topology::Multi { named, combined },
        }
    }

    /// The underlying arena, for read-only graph inspection.
    pub fn arena(&self) -> &GraphArena {
        &self.arena
    }

    /// Look up a network by tag.
    pub fn network(&self, tag: &str) -> Option<&RoadNetwork> {
        match &self.topology {
            Topology::Single(net) => (net.key() == tag).then_some(net),
            Topology::Multi { named, .. } => named.get(tag),
        }
    }

    /// The graph pair a query tag resolves to: a known tag routes to its
    /// network, anything else to the combined pair (or the sole network in
    /// single mode).
    pub fn resolve(&self, tag: Option<&str>) -> GraphPair {
        match &self.topology {
            Topology::Single(net) => net.pair(),
            Topology::Multi { named, combined } => tag
                .and_then(|t| named.get(t))
                .map(|n| n.pair())
                .unwrap_or(*combined),
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Route from `from` to `to` on the network `tag` resolves to.
    /// `avoid_blocked` routes around temporary obstructions.
    pub fn find_path(
        &mut self,
        tag: Option<&str>,
        from: Point,
        to: Point,
        avoid_blocked: bool,
    ) -> Option<Vec<Point>> {
        let graph = self.resolve(tag).graph(avoid_blocked);
        self.search.find_path(&self.arena, graph, from, to)
    }

    /// Multi-source / multi-sink variant of [`find_path`](Self::find_path).
    pub fn find_path_multi(
        &mut self,
        tag: Option<&str>,
        starts: &[Point],
        targets: &[Point],
        avoid_blocked: bool,
    ) -> Option<Vec<Point>> {
        let graph = self.resolve(tag).graph(avoid_blocked);
        self.search
            .find_path_multi(&self.arena, graph, starts, targets)
    }

    /// Whether `p` is connected on the network `tag` resolves to. With no
    /// tag this is the tag-agnostic "walkable at all" query.
    pub fn is_walkable(&self, tag: Option<&str>, p: Point, avoid_blocked: bool) -> bool {
        self.arena.contains(self.resolve(tag).graph(avoid_blocked), p)
    }

    // -----------------------------------------------------------------------
    // Mutation (routed by tag, combined pair kept in sync)
    // -----------------------------------------------------------------------

    /// Connect and paint coordinates on network `tag`. Returns the
    /// coordinates actually added.
    pub fn add(
        &mut self,
        tag: &str,
        coords: &[Point],
        stage: Option<&str>,
        occupancy: &dyn OccupancyQuery,
        painter: &mut dyn TilePainter,
    ) -> Result<Vec<Point>, RegistryError> {
        let added = self.with_network(tag, |arena, net| {
            net.add(arena, coords, stage, occupancy, painter)
        })?;
        self.sync_combined(coords);
        Ok(added)
    }

    /// Disconnect coordinates from network `tag`, clearing their tiles.
    pub fn remove(
        &mut self,
        tag: &str,
        coords: &[Point],
        painter: &mut dyn TilePainter,
    ) -> Result<(), RegistryError> {
        self.with_network(tag, |arena, net| net.remove(arena, coords, painter))?;
        self.sync_combined(coords);
        Ok(())
    }

    /// Graph-only connect on network `tag` (no tile writes).
    pub fn register(&mut self, tag: &str, coords: &[Point]) -> Result<(), RegistryError> {
        self.with_network(tag, |arena, net| net.register(arena, coords))?;
        self.sync_combined(coords);
        Ok(())
    }

    /// Graph-only disconnect on network `tag`.
    pub fn deregister(&mut self, tag: &str, coords: &[Point]) -> Result<(), RegistryError> {
        self.with_network(tag, |arena, net| net.deregister(arena, coords))?;
        self.sync_combined(coords);
        Ok(())
    }

    /// Temporarily obstruct coordinates on network `tag`.
    pub fn block(&mut self, tag: &str, coords: &[Point]) -> Result<(), RegistryError> {
        self.with_network(tag, |arena, net| net.block(arena, coords))?;
        self.sync_combined(coords);
        Ok(())
    }

    /// Lift temporary obstructions on network `tag`.
    pub fn unblock(&mut self, tag: &str, coords: &[Point]) -> Result<(), RegistryError> {
        self.with_network(tag, |arena, net| net.unblock(arena, coords))?;
        self.sync_combined(coords);
        Ok(())
    }

    /// Re-evaluate tile stages on network `tag` for coordinates whose
    /// layer inputs changed.
    pub fn check_layers(
        &mut self,
        tag: &str,
        coords: &[Point],
        layers: &dyn LayerQuery,
        painter: &mut dyn TilePainter,
    ) -> Result<(), RegistryError> {
        self.with_network(tag, |_, net| net.check_layers(coords, layers, painter))
    }

    /// Register a junction between two named networks, wired into both
    /// their base and passable graphs.
    ///
    /// Fails loudly in single-network mode: junctions there are a
    /// deployment misconfiguration, not a routing condition.
    pub fn register_switch(
        &mut self,
        from: &str,
        to: &str,
        junction: Junction,
    ) -> Result<(), RegistryError> {
        match &mut self.topology {
            Topology::Single(_) => {
                warn!("switch junction `{from}`->`{to}` refused: single-network registry");
                Err(RegistryError::SwitchUnsupported)
            }
            Topology::Multi { named, .. } => {
                let a = named
                    .get(from)
                    .ok_or_else(|| RegistryError::UnknownNetwork(from.into()))?;
                let b = named
                    .get(to)
                    .ok_or_else(|| RegistryError::UnknownNetwork(to.into()))?;
                a.link(&mut self.arena, b, junction);
                let coords = match junction {
                    Junction::Undirected { coord } => vec![coord],
                    Junction::Directed { coord, .. } => vec![coord],
                };
                self.sync_combined(&coords);
                Ok(())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    /// Snapshot every network, ordered by key.
    pub fn save(&self) -> Vec<NetworkSave> {
        match &self.topology {
            Topology::Single(net) => vec![net.save()],
            Topology::Multi { named, .. } => {
                let mut saves: Vec<NetworkSave> = named.values().map(|n| n.save()).collect();
                saves.sort_by(|a, b| a.key.cmp(&b.key));
                saves
            }
        }
    }

    /// Rebuild networks from snapshots. Saves naming unknown networks are
    /// skipped with a warning.
    pub fn load(&mut self, saves: &[NetworkSave], painter: &mut dyn TilePainter) {
        debug!("registry: loading {} network saves", saves.len());
        for save in saves {
            match &mut self.topology {
                Topology::Single(net) => {
                    if net.key() == save.key {
                        net.load(&mut self.arena, save, painter);
                    } else {
                        warn!("registry: no network `{}` to load into", save.key);
                    }
                }
                Topology::Multi { named, .. } => match named.get_mut(&save.key) {
                    Some(net) => net.load(&mut self.arena, save, painter),
                    None => warn!("registry: no network `{}` to load into", save.key),
                },
            }
        }
        self.rebuild_combined();
    }

    // -----------------------------------------------------------------------
    // Combined pair maintenance
    // -----------------------------------------------------------------------

    fn with_network<R>(
        &mut self,
        tag: &str,
        op: impl FnOnce(&mut GraphArena, &mut RoadNetwork) -> R,
    ) -> Result<R, RegistryError> {
        match &mut self.topology {
            Topology::Single(net) => {
                if net.key() == tag {
                    Ok(op(&mut self.arena, net))
                } else {
                    Err(RegistryError::UnknownNetwork(tag.into()))
                }
            }
            Topology::Multi { named, .. } => match named.get_mut(tag) {
                Some(net) => Ok(op(&mut self.arena, net)),
                None => Err(RegistryError::UnknownNetwork(tag.into())),
            },
        }
    }

    /// Re-derive combined membership for the given coordinates: a cell is
    /// in the combined base/passable graph iff it is in any network's.
    fn sync_combined(&mut self, coords: &[Point]) {
        let Topology::Multi { named, combined } = &self.topology else {
            return;
        };
        let combined = *combined;
        let mut changes: Vec<(Point, bool, bool)> = Vec::with_capacity(coords.len());
        for &p in coords {
            let in_base = named
                .values()
                .any(|n| self.arena.contains(n.pair().base, p));
            let in_passable = named
                .values()
                .any(|n| self.arena.contains(n.pair().passable, p));
            changes.push((p, in_base, in_passable));
        }
        for (p, in_base, in_passable) in changes {
            if in_base {
                self.arena.add(combined.base, p);
            } else {
                self.arena.remove(combined.base, p);
            }
            if in_passable {
                self.arena.add(combined.passable, p);
            } else {
                self.arena.remove(combined.passable, p);
            }
        }
    }

    /// Rebuild the combined pair from scratch (used after bulk loads).
    fn rebuild_combined(&mut self) {
        let Topology::Multi { named, combined } = &self.topology else {
            return;
        };
        let combined = *combined;
        let mut base: Vec<Point> = Vec::new();
        let mut passable: Vec<Point> = Vec::new();
        for net in named.values() {
            base.extend(self.arena.graph(net.pair().base).points());
            passable.extend(self.arena.graph(net.pair().passable).points());
        }
        self.arena.clear(combined.base);
        self.arena.clear(combined.passable);
        self.arena.add_all(combined.base, &base);
        self.arena.add_all(combined.passable, &passable);
    }
}
