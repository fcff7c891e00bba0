//! Road and connectivity networks for grid city-builders.
//!
//! A [`RoadNetwork`] binds a pair of grid graphs to the host's tile
//! visuals: a *base* graph holding every connected cell, and a *passable*
//! graph holding the same cells minus temporary obstructions, so routing
//! can avoid a blocked street without the network forgetting that the
//! street exists.
//!
//! A [`NetworkRegistry`] owns the graph arena and one or many named
//! networks. Multi-network deployments (say, footpaths and highways with
//! different speeds) additionally maintain a *combined* graph pair — the
//! set-union of every network — for tag-agnostic walkability queries.
//! Cross-network routing only ever happens through explicitly registered
//! [`Junction`]s.

mod network;
mod registry;
mod stage;

pub use network::{GraphPair, Junction, NetworkSave, RoadNetwork, StageSave};
pub use registry::{NetworkRegistry, RegistryError};
pub use stage::{LayerRule, NoPaint, TilePainter, TileStage};
