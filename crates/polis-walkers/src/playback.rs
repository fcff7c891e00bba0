//! Stepped path playback: walking and walk-with-retry.

use polis_core::{AgentBody, GridTransform, Point};
use serde::{Deserialize, Serialize};

use crate::path::Path;

/// Outcome of one playback tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// Still moving; call `advance` again next tick.
    InProgress,
    /// The route (or wait) finished naturally.
    Completed,
    /// Playback gave up — no route within the allowed wait, or nothing to
    /// play.
    Canceled,
}

/// Seconds between route attempts in [`TryWalkState`].
pub const RETRY_INTERVAL: f32 = 1.0;

// ---------------------------------------------------------------------------
// WalkingState
// ---------------------------------------------------------------------------

/// Mid-route playback state: which segment the agent is on and how far
/// into it it has moved.
///
/// Plain data: serializing mid-segment and resuming continues the exact
/// remaining trajectory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkingState {
    pub path: Path,
    /// Index of the segment currently being traversed.
    pub segment: usize,
    /// World-space distance moved within the current segment.
    pub progress: f32,
    /// Remaining start delay, used to desynchronize simultaneous agents.
    pub delay_left: f32,
    started: bool,
}

impl WalkingState {
    /// Begin playback of `path` after `delay` seconds.
    pub fn new(path: Path, delay: f32) -> Self {
        Self {
            path,
            segment: 0,
            progress: 0.0,
            delay_left: delay.max(0.0),
            started: false,
        }
    }

    /// Advance playback by `dt` seconds at `speed` world units per second.
    ///
    /// On the first moving tick the agent snaps to the path start and faces
    /// along the first segment. Crossing a segment boundary carries the
    /// remainder distance over; reaching the final waypoint completes.
    pub fn advance(
        &mut self,
        dt: f32,
        speed: f32,
        t: &dyn GridTransform,
        body: &mut dyn AgentBody,
    ) -> Step {
        if self.path.is_empty() {
            return Step::Canceled;
        }

        if self.delay_left > 0.0 {
            self.delay_left -= dt;
            if self.delay_left > 0.0 {
                return Step::InProgress;
            }
            self.delay_left = 0.0;
        }

        if !self.started {
            self.started = true;
            self.apply(t, body);
            if self.path.has_ended(self.segment) {
                return Step::Completed;
            }
        }

        self.progress += speed * dt;

        // Cross as many waypoints as the accumulated distance covers.
        loop {
            if self.path.has_ended(self.segment) {
                self.progress = 0.0;
                self.apply(t, body);
                return Step::Completed;
            }
            let Some(seg_len) = self.path.segment_length(self.segment, t) else {
                return Step::Canceled;
            };
            if self.progress < seg_len {
                break;
            }
            self.progress -= seg_len;
            self.segment += 1;
        }

        self.apply(t, body);
        Step::InProgress
    }

    /// Re-apply position, cell, and heading from the current (possibly just
    /// deserialized) state, without advancing it.
    pub fn resume(&self, t: &dyn GridTransform, body: &mut dyn AgentBody) {
        if self.started {
            self.apply(t, body);
        }
    }

    fn apply(&self, t: &dyn GridTransform, body: &mut dyn AgentBody) {
        if let Some(cell) = self.path.point(self.segment) {
            body.set_cell(cell);
        }
        let Some(a) = self.path.position(self.segment, t) else {
            return;
        };
        match self.path.next_position(self.segment, t) {
            Some(b) => {
                let seg_len = a.distance(b);
                let pos = if seg_len <= f32::EPSILON {
                    a
                } else {
                    a.lerp(b, (self.progress / seg_len).clamp(0.0, 1.0))
                };
                body.face((b - a).normalized());
                body.set_position(pos);
            }
            None => body.set_position(a),
        }
    }
}

// ---------------------------------------------------------------------------
// TryWalkState
// ---------------------------------------------------------------------------

/// Walk-with-retry: hold at a wait coordinate, ask a path supplier once
/// per [`RETRY_INTERVAL`], and give up after `max_wait` seconds of failed
/// attempts.
///
/// Callers distinguish arrival ([`Step::Completed`]) from giving up
/// ([`Step::Canceled`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TryWalkState {
    /// Where the agent holds while no route exists.
    pub wait_at: Point,
    /// Seconds spent waiting on failed attempts so far.
    pub waited: f32,
    since_attempt: f32,
    /// Active playback once a route was found.
    pub walking: Option<WalkingState>,
}

impl TryWalkState {
    /// Start waiting at `wait_at`. The first route attempt happens on the
    /// first tick.
    pub fn new(wait_at: Point) -> Self {
        Self {
            wait_at,
            waited: 0.0,
            since_attempt: RETRY_INTERVAL,
            walking: None,
        }
    }

    /// Advance by `dt` seconds. `supplier` is consulted at most once per
    /// retry interval until it yields a route; the timeout check is
    /// cooperative, once per elapsed interval.
    pub fn advance(
        &mut self,
        dt: f32,
        speed: f32,
        max_wait: f32,
        supplier: &mut dyn FnMut() -> Option<Path>,
        t: &dyn GridTransform,
        body: &mut dyn AgentBody,
    ) -> Step {
        if let Some(walking) = &mut self.walking {
            return walking.advance(dt, speed, t, body);
        }

        body.set_cell(self.wait_at);
        body.set_position(t.world_position(self.wait_at));

        self.since_attempt += dt;
        if self.since_attempt >= RETRY_INTERVAL {
            self.since_attempt = 0.0;
            match supplier() {
                Some(path) => {
                    self.walking = Some(WalkingState::new(path, 0.0));
                }
                None => {
                    self.waited += RETRY_INTERVAL;
                    if self.waited > max_wait {
                        return Step::Canceled;
                    }
                }
            }
        }
        Step::InProgress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polis_core::{UnitTransform, WorldPos};

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Puppet {
        pos: WorldPos,
        cell: Point,
        heading: WorldPos,
    }

    impl AgentBody for Puppet {
        fn set_position(&mut self, pos: WorldPos) {
            self.pos = pos;
        }
        fn set_cell(&mut self, cell: Point) {
            self.cell = cell;
        }
        fn face(&mut self, dir: WorldPos) {
            self.heading = dir;
        }
    }

    fn lane(n: i32) -> Path {
        Path::Points((0..n).map(|x| Point::new(x, 0)).collect())
    }

    /// Tick until completion, returning the tick count.
    fn run_to_end(state: &mut WalkingState, dt: f32, speed: f32, body: &mut Puppet) -> usize {
        let t = UnitTransform;
        for tick in 1..10_000 {
            match state.advance(dt, speed, &t, body) {
                Step::InProgress => {}
                Step::Completed => return tick,
                Step::Canceled => panic!("unexpected cancel"),
            }
        }
        panic!("never completed");
    }

    // -----------------------------------------------------------------------
    // Walking
    // -----------------------------------------------------------------------

    #[test]
    fn walks_lane_and_completes_at_end() {
        let mut body = Puppet::default();
        let mut state = WalkingState::new(lane(5), 0.0);
        let ticks = run_to_end(&mut state, 0.25, 1.0, &mut body);
        // 4 world units at 0.25 per tick.
        assert_eq!(ticks, 16);
        assert_eq!(body.cell, Point::new(4, 0));
        assert_eq!(body.pos, WorldPos::new(4.0, 0.0, 0.0));
    }

    #[test]
    fn interpolates_within_segment() {
        let t = UnitTransform;
        let mut body = Puppet::default();
        let mut state = WalkingState::new(lane(3), 0.0);
        assert_eq!(state.advance(0.5, 1.0, &t, &mut body), Step::InProgress);
        assert_eq!(body.pos, WorldPos::new(0.5, 0.0, 0.0));
        assert_eq!(body.heading, WorldPos::new(1.0, 0.0, 0.0));
        // Remainder carries across the waypoint.
        assert_eq!(state.advance(0.75, 1.0, &t, &mut body), Step::InProgress);
        assert_eq!(state.segment, 1);
        assert!((body.pos.x - 1.25).abs() < 1e-5);
    }

    #[test]
    fn start_delay_holds_playback() {
        let t = UnitTransform;
        let mut body = Puppet::default();
        let mut state = WalkingState::new(lane(2), 0.5);
        assert_eq!(state.advance(0.3, 1.0, &t, &mut body), Step::InProgress);
        // Still at the default position: nothing applied during the delay.
        assert_eq!(body, Puppet::default());
        assert_eq!(state.advance(0.3, 1.0, &t, &mut body), Step::InProgress);
        assert!(body.pos.x > 0.0);
    }

    #[test]
    fn single_point_path_completes_after_snap() {
        let t = UnitTransform;
        let mut body = Puppet::default();
        let mut state = WalkingState::new(Path::Points(vec![Point::new(3, 1)]), 0.0);
        assert_eq!(state.advance(0.1, 1.0, &t, &mut body), Step::Completed);
        assert_eq!(body.cell, Point::new(3, 1));
    }

    #[test]
    fn empty_path_cancels() {
        let t = UnitTransform;
        let mut body = Puppet::default();
        let mut state = WalkingState::new(Path::Points(Vec::new()), 0.0);
        assert_eq!(state.advance(0.1, 1.0, &t, &mut body), Step::Canceled);
    }

    #[test]
    fn fast_agent_crosses_multiple_waypoints_in_one_tick() {
        let t = UnitTransform;
        let mut body = Puppet::default();
        let mut state = WalkingState::new(lane(5), 0.0);
        // 5 world units of movement in a single tick covers the whole lane.
        assert_eq!(state.advance(0.1, 50.0, &t, &mut body), Step::Completed);
        assert_eq!(body.cell, Point::new(4, 0));
    }

    // -----------------------------------------------------------------------
    // Resumability
    // -----------------------------------------------------------------------

    #[test]
    fn serialized_state_resumes_identical_trajectory() {
        let t = UnitTransform;
        let dt = 0.3;
        let speed = 0.7;

        // Drive one walker partway.
        let mut body_a = Puppet::default();
        let mut live = WalkingState::new(lane(6), 0.0);
        for _ in 0..5 {
            assert_eq!(live.advance(dt, speed, &t, &mut body_a), Step::InProgress);
        }

        // Snapshot mid-segment, restore, and resume.
        let json = serde_json::to_string(&live).unwrap();
        let mut restored: WalkingState = serde_json::from_str(&json).unwrap();
        let mut body_b = Puppet::default();
        restored.resume(&t, &mut body_b);
        assert_eq!(body_a, body_b);
        assert_eq!(restored.segment, live.segment);

        // Both finish at the same place after the same number of ticks.
        let ticks_live = run_to_end(&mut live, dt, speed, &mut body_a);
        let ticks_restored = run_to_end(&mut restored, dt, speed, &mut body_b);
        assert_eq!(ticks_live, ticks_restored);
        assert_eq!(body_a, body_b);
        assert_eq!(body_a.cell, Point::new(5, 0));
    }

    // -----------------------------------------------------------------------
    // TryWalk
    // -----------------------------------------------------------------------

    #[test]
    fn try_walk_cancels_after_max_wait() {
        let t = UnitTransform;
        let mut body = Puppet::default();
        let mut state = TryWalkState::new(Point::new(2, 2));
        let mut attempts = 0;
        let mut supplier = || {
            attempts += 1;
            None
        };

        let dt = 0.5;
        let max_wait = 3.0;
        let mut elapsed = 0.0;
        let result = loop {
            match state.advance(dt, 1.0, max_wait, &mut supplier, &t, &mut body) {
                Step::InProgress => {
                    elapsed += dt;
                    assert!(elapsed < 60.0, "never canceled");
                }
                step => break step,
            }
        };

        assert_eq!(result, Step::Canceled);
        // Gave up roughly max_wait seconds of failed attempts in.
        assert!((3.0..=5.0).contains(&elapsed), "elapsed {elapsed}");
        assert!(attempts >= 4);
        // Held at the wait coordinate the whole time.
        assert_eq!(body.cell, Point::new(2, 2));
    }

    #[test]
    fn try_walk_switches_to_walking_when_route_appears() {
        let t = UnitTransform;
        let mut body = Puppet::default();
        let mut state = TryWalkState::new(Point::new(0, 0));
        let mut failures_left = 2;
        let mut supplier = || {
            if failures_left > 0 {
                failures_left -= 1;
                None
            } else {
                Some(Path::Points(vec![Point::new(0, 0), Point::new(1, 0)]))
            }
        };

        let mut completed = false;
        for _ in 0..200 {
            match state.advance(0.5, 1.0, 30.0, &mut supplier, &t, &mut body) {
                Step::InProgress => {}
                Step::Completed => {
                    completed = true;
                    break;
                }
                Step::Canceled => panic!("should not give up"),
            }
        }
        assert!(completed);
        assert!(state.walking.is_some());
        assert_eq!(body.cell, Point::new(1, 0));
    }
}
