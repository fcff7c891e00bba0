//! **polis-core** — Grid city-builder movement toolkit (core types).
//!
//! This crate provides the foundational types used across the *polis*
//! ecosystem: integer grid coordinates, world-space positions, and the
//! collaborator ports through which the toolkit talks to the host game
//! (coordinate transforms, structure occupancy, environmental layers, and
//! agent transform hooks).

pub mod geom;
pub mod ports;

pub use geom::{Point, WorldPos};
pub use ports::{AgentBody, GridTransform, LayerQuery, OccupancyQuery, UnitTransform};
