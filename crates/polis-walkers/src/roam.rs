//! Destination-less wandering with anti-backtracking memory.

use polis_core::{AgentBody, GridTransform, Point};
use rand::{Rng, RngExt};
use serde::{Deserialize, Serialize};

use crate::playback::Step;

/// Wandering playback state.
///
/// At each hop boundary the roamer picks a traversable 4-neighbor,
/// preferring cells absent from its bounded recent-memory buffer so it
/// does not immediately double back. When every candidate has been visited
/// recently it takes the least recently visited one; with no traversable
/// neighbor at all it stays in place and retries next tick. Completes
/// after `max_steps` hops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoamingState {
    /// The cell the current hop started from.
    pub current: Point,
    /// The cell the current hop moves toward (equal to `current` between
    /// hops).
    pub next: Point,
    /// Recently visited cells, oldest first, bounded by `memory_cap`.
    pub memory: Vec<Point>,
    /// Hops taken so far.
    pub steps: u32,
    /// World-space distance moved within the current hop.
    pub progress: f32,
    /// Hops after which roaming completes.
    pub max_steps: u32,
    /// Upper bound on the recent-memory buffer.
    pub memory_cap: usize,
}

impl RoamingState {
    /// Start roaming from `start`. The start cell counts as recently
    /// visited so the first hop already avoids doubling back onto it.
    pub fn new(start: Point, max_steps: u32, memory_cap: usize) -> Self {
        Self {
            current: start,
            next: start,
            memory: if memory_cap > 0 { vec![start] } else { Vec::new() },
            steps: 0,
            progress: 0.0,
            max_steps,
            memory_cap,
        }
    }

    /// Advance by `dt` seconds at `speed` world units per second. `open`
    /// reports whether a cell is currently traversable.
    pub fn advance<R: Rng>(
        &mut self,
        dt: f32,
        speed: f32,
        rng: &mut R,
        open: impl Fn(Point) -> bool,
        t: &dyn GridTransform,
        body: &mut dyn AgentBody,
    ) -> Step {
        if self.next == self.current && !self.begin_hop(rng, &open, t, body) {
            // Nowhere to go right now; hold position and retry next tick.
            body.set_cell(self.current);
            body.set_position(t.world_position(self.current));
            return Step::InProgress;
        }

        self.progress += speed * dt;

        loop {
            let hop_len = t
                .world_position(self.current)
                .distance(t.world_position(self.next));
            if self.progress < hop_len {
                break;
            }

            // Arrived.
            self.progress -= hop_len;
            self.current = self.next;
            self.remember(self.current);
            self.steps += 1;
            body.set_cell(self.current);

            if self.steps >= self.max_steps {
                self.progress = 0.0;
                body.set_position(t.world_position(self.current));
                return Step::Completed;
            }
            if !self.begin_hop(rng, &open, t, body) {
                self.progress = 0.0;
                body.set_position(t.world_position(self.current));
                return Step::InProgress;
            }
        }

        let a = t.world_position(self.current);
        let b = t.world_position(self.next);
        let hop_len = a.distance(b);
        if hop_len > f32::EPSILON {
            body.set_position(a.lerp(b, (self.progress / hop_len).clamp(0.0, 1.0)));
        } else {
            body.set_position(a);
        }
        Step::InProgress
    }

    /// Re-apply position, cell, and heading from the current (possibly just
    /// deserialized) state, without advancing it.
    pub fn resume(&self, t: &dyn GridTransform, body: &mut dyn AgentBody) {
        body.set_cell(self.current);
        let a = t.world_position(self.current);
        if self.next == self.current {
            body.set_position(a);
            return;
        }
        let b = t.world_position(self.next);
        let hop_len = a.distance(b);
        if hop_len > f32::EPSILON {
            body.face((b - a).normalized());
            body.set_position(a.lerp(b, (self.progress / hop_len).clamp(0.0, 1.0)));
        } else {
            body.set_position(a);
        }
    }

    /// Pick the next hop destination. Returns false when no neighbor is
    /// traversable.
    fn begin_hop<R: Rng>(
        &mut self,
        rng: &mut R,
        open: &impl Fn(Point) -> bool,
        t: &dyn GridTransform,
        body: &mut dyn AgentBody,
    ) -> bool {
        let Some(next) = self.pick_neighbor(rng, open) else {
            self.next = self.current;
            return false;
        };
        self.next = next;
        let a = t.world_position(self.current);
        let b = t.world_position(self.next);
        body.face((b - a).normalized());
        true
    }

    fn pick_neighbor<R: Rng>(&self, rng: &mut R, open: &impl Fn(Point) -> bool) -> Option<Point> {
        let mut candidates: Vec<Point> = Vec::with_capacity(4);
        for n in self.current.neighbors_4() {
            if open(n) {
                candidates.push(n);
            }
        }
        if candidates.is_empty() {
            return None;
        }

        let fresh: Vec<Point> = candidates
            .iter()
            .copied()
            .filter(|p| !self.memory.contains(p))
            .collect();
        if !fresh.is_empty() {
            return Some(fresh[rng.random_range(0..fresh.len())]);
        }

        // Every candidate was visited recently: take the least recent one.
        candidates
            .into_iter()
            .min_by_key(|p| self.memory.iter().rposition(|m| m == p))
    }

    fn remember(&mut self, p: Point) {
        if self.memory_cap == 0 {
            return;
        }
        self.memory.push(p);
        if self.memory.len() > self.memory_cap {
            let _ = self.memory.remove(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polis_core::{UnitTransform, WorldPos};
    use std::collections::HashSet;

    #[derive(Debug, Default)]
    struct Puppet {
        pos: WorldPos,
        cell: Point,
    }

    impl AgentBody for Puppet {
        fn set_position(&mut self, pos: WorldPos) {
            self.pos = pos;
        }
        fn set_cell(&mut self, cell: Point) {
            self.cell = cell;
        }
    }

    fn corridor() -> HashSet<Point> {
        (0..3).map(|x| Point::new(x, 0)).collect()
    }

    #[test]
    fn roams_corridor_without_immediate_backtracking() {
        let t = UnitTransform;
        let walkable = corridor();
        let open = |p: Point| walkable.contains(&p);
        let mut rng = rand::rng();
        let mut body = Puppet::default();
        let mut state = RoamingState::new(Point::new(0, 0), 4, 2);

        let mut visited = Vec::new();
        for _ in 0..200 {
            let step = state.advance(0.5, 1.0, &mut rng, open, &t, &mut body);
            if visited.last() != Some(&state.current) {
                visited.push(state.current);
            }
            if step == Step::Completed {
                break;
            }
        }

        // In a corridor the only non-backtracking walk is straight out and
        // back: 0 -> 1 -> 2 -> 1 -> 0 would revisit, memory forces the turn
        // at the dead end only.
        assert_eq!(state.steps, 4);
        assert_eq!(
            visited,
            vec![
                Point::new(0, 0),
                Point::new(1, 0),
                Point::new(2, 0),
                Point::new(1, 0),
                Point::new(0, 0),
            ]
        );
    }

    #[test]
    fn stays_put_when_isolated() {
        let t = UnitTransform;
        let open = |_: Point| false;
        let mut rng = rand::rng();
        let mut body = Puppet::default();
        let mut state = RoamingState::new(Point::new(5, 5), 3, 2);

        for _ in 0..10 {
            assert_eq!(
                state.advance(0.5, 1.0, &mut rng, open, &t, &mut body),
                Step::InProgress
            );
        }
        assert_eq!(state.current, Point::new(5, 5));
        assert_eq!(state.steps, 0);
        assert_eq!(body.cell, Point::new(5, 5));
    }

    #[test]
    fn completes_after_max_steps() {
        let t = UnitTransform;
        // A 2-cell loop: the roamer shuttles between them.
        let walkable: HashSet<Point> = [Point::new(0, 0), Point::new(1, 0)].into();
        let open = |p: Point| walkable.contains(&p);
        let mut rng = rand::rng();
        let mut body = Puppet::default();
        let mut state = RoamingState::new(Point::new(0, 0), 3, 1);

        let mut ticks = 0;
        loop {
            ticks += 1;
            assert!(ticks < 1000);
            if state.advance(0.5, 1.0, &mut rng, open, &t, &mut body) == Step::Completed {
                break;
            }
        }
        assert_eq!(state.steps, 3);
    }

    #[test]
    fn memory_is_bounded() {
        let t = UnitTransform;
        let walkable: HashSet<Point> = (0..10).map(|x| Point::new(x, 0)).collect();
        let open = |p: Point| walkable.contains(&p);
        let mut rng = rand::rng();
        let mut body = Puppet::default();
        let mut state = RoamingState::new(Point::new(0, 0), 8, 3);

        for _ in 0..200 {
            if state.advance(0.5, 1.0, &mut rng, open, &t, &mut body) == Step::Completed {
                break;
            }
            assert!(state.memory.len() <= 3);
        }
    }

    #[test]
    fn serde_round_trip_resumes_mid_hop() {
        let t = UnitTransform;
        let walkable = corridor();
        let open = |p: Point| walkable.contains(&p);
        let mut rng = rand::rng();
        let mut body = Puppet::default();
        let mut state = RoamingState::new(Point::new(0, 0), 4, 2);

        // Advance partway into a hop.
        let _ = state.advance(0.4, 1.0, &mut rng, open, &t, &mut body);
        assert!(state.progress > 0.0);

        let json = serde_json::to_string(&state).unwrap();
        let restored: RoamingState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.current, state.current);
        assert_eq!(restored.next, state.next);
        assert_eq!(restored.progress, state.progress);

        let mut body2 = Puppet::default();
        restored.resume(&t, &mut body2);
        assert_eq!(body2.pos, body.pos);
        assert_eq!(body2.cell, body.cell);
    }
}
