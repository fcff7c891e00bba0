//! Visual tile stages and layer-driven stage resolution.
//!
//! A network paints each of its cells with one *stage* — a symbolic tile
//! id the host's renderer maps to actual art. Which stage a cell shows can
//! depend on environmental layer values (elevation, moisture, proximity
//! fields); stages carry numeric-range rules evaluated against the host's
//! [`LayerQuery`].

use polis_core::{LayerQuery, Point};

/// An inclusive numeric-range requirement on one environmental layer.
#[derive(Debug, Clone)]
pub struct LayerRule {
    pub layer: String,
    pub min: f32,
    pub max: f32,
}

impl LayerRule {
    /// Create a rule requiring `layer` to be within `[min, max]`.
    pub fn new(layer: impl Into<String>, min: f32, max: f32) -> Self {
        Self {
            layer: layer.into(),
            min,
            max,
        }
    }

    fn passes(&self, layers: &dyn LayerQuery, p: Point) -> bool {
        let v = layers.value(&self.layer, p);
        self.min <= v && v <= self.max
    }
}

/// One visual stage of a network's tiles.
///
/// A stage with no rules always qualifies; ordering matters — resolution
/// picks the first qualifying stage, so put the most specific stages first
/// and a rule-less default last.
#[derive(Debug, Clone)]
pub struct TileStage {
    pub key: String,
    pub rules: Vec<LayerRule>,
}

impl TileStage {
    /// A stage with no layer requirements.
    pub fn plain(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            rules: Vec::new(),
        }
    }

    /// A stage gated on layer-range rules.
    pub fn with_rules(key: impl Into<String>, rules: Vec<LayerRule>) -> Self {
        Self {
            key: key.into(),
            rules,
        }
    }

    fn qualifies(&self, layers: &dyn LayerQuery, p: Point) -> bool {
        self.rules.iter().all(|r| r.passes(layers, p))
    }
}

/// Pick the stage index for `p`: the first stage whose rules all pass,
/// falling back to the first stage when none qualifies.
pub(crate) fn resolve_stage(stages: &[TileStage], layers: &dyn LayerQuery, p: Point) -> usize {
    stages
        .iter()
        .position(|s| s.qualifies(layers, p))
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// TilePainter
// ---------------------------------------------------------------------------

/// The host's tile-visual binding. Networks report what stage each of
/// their cells should show; rendering stays outside the toolkit.
pub trait TilePainter {
    /// Show `stage` at `p`.
    fn paint(&mut self, p: Point, stage: &str);
    /// Remove whatever this network painted at `p`.
    fn clear(&mut self, p: Point);
}

/// Painter for hosts with no visual layer (headless simulation, tests).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPaint;

impl TilePainter for NoPaint {
    fn paint(&mut self, _p: Point, _stage: &str) {}
    fn clear(&mut self, _p: Point) {}
}
