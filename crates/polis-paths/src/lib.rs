//! Pathfinding over mutable grid graphs for city-builder games.
//!
//! Unlike a fixed-rectangle pathfinder, the graphs here change constantly as
//! roads and structures are placed and demolished, so traversability is a
//! sparse coordinate set rather than a dense map:
//!
//! - **Grid graphs** ([`GridGraph`]) — a coordinate is traversable iff
//!   present; mutation is idempotent and O(1) amortized.
//! - **Switch junctions** — cells that bridge two otherwise-disjoint graphs,
//!   either in both directions ([`NodeKind::Switch`]) or one-way through an
//!   entry/exit pair ([`NodeKind::Gate`]).
//! - **A\*** shortest-path search ([`GraphSearch::find_path`]), including
//!   multi-source / multi-sink queries, with reusable scratch state so
//!   repeated queries incur few allocations after warm-up.
//! - **Flood-fill** reachability ([`flood`]) over the same neighbor rules.
//!
//! All graphs live in a [`GraphArena`] and are addressed by [`GraphId`]
//! handles, which keeps cross-graph junction references unambiguous and
//! mutation funnelled through one owner.

mod astar;
mod cost;
mod flood;
mod graph;

pub use astar::GraphSearch;
pub use cost::{CARDINAL_COST, DIAGONAL_COST, manhattan, octile};
pub use flood::flood;
pub use graph::{GraphArena, GraphId, GridGraph, NodeKind};
