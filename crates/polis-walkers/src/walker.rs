//! The walker movement state machine.

use polis_core::{AgentBody, GridTransform, Point, WorldPos};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::path::Path;
use crate::playback::{Step, WalkingState};
use crate::roam::RoamingState;

/// Identity of a walker.
pub type WalkerId = u32;

// ---------------------------------------------------------------------------
// Body
// ---------------------------------------------------------------------------

/// A walker's visual transform: logical cell, world position, and yaw.
///
/// Playback drives it through the [`AgentBody`] hooks; renderers read it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub cell: Point,
    pub position: WorldPos,
    /// Yaw in radians around the vertical axis; 0 faces +z.
    pub rotation: f32,
}

impl AgentBody for Body {
    fn set_position(&mut self, pos: WorldPos) {
        self.position = pos;
    }

    fn set_cell(&mut self, cell: Point) {
        self.cell = cell;
    }

    fn face(&mut self, dir: WorldPos) {
        if dir != WorldPos::ZERO {
            self.rotation = dir.x.atan2(dir.z);
        }
    }
}

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

/// Timed idling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitingState {
    /// Seconds to wait in total.
    pub target: f32,
    /// Seconds waited so far.
    pub elapsed: f32,
}

impl WaitingState {
    /// Wait for `seconds`.
    pub fn new(seconds: f32) -> Self {
        Self {
            target: seconds.max(0.0),
            elapsed: 0.0,
        }
    }

    /// Advance the wait by `dt` seconds.
    pub fn advance(&mut self, dt: f32) -> Step {
        self.elapsed += dt;
        if self.elapsed >= self.target {
            Step::Completed
        } else {
            Step::InProgress
        }
    }

    /// Seconds of waiting left.
    pub fn remaining(&self) -> f32 {
        (self.target - self.elapsed).max(0.0)
    }
}

/// What a walker is doing. Exactly one state is ever active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Activity {
    Inactive,
    Waiting(WaitingState),
    Walking(WalkingState),
    Roaming(RoamingState),
}

impl Activity {
    /// Whether this is the inactive state.
    pub fn is_inactive(&self) -> bool {
        matches!(self, Activity::Inactive)
    }
}

// ---------------------------------------------------------------------------
// Walker
// ---------------------------------------------------------------------------

/// A moving agent: identity, visual body, and the single active movement
/// state.
///
/// Advanced once per simulation tick; when the active state completes or
/// cancels, the walker drops back to [`Activity::Inactive`] and the caller
/// decides what happens next.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Walker {
    pub id: WalkerId,
    /// The building this walker belongs to, if any.
    pub home: Option<u32>,
    /// Where the walker entered the map.
    pub start: Point,
    pub body: Body,
    activity: Activity,
}

impl Walker {
    /// Create an idle walker at `start`.
    pub fn new(id: WalkerId, start: Point, t: &dyn GridTransform) -> Self {
        Self {
            id,
            home: None,
            start,
            body: Body {
                cell: start,
                position: t.world_position(start),
                rotation: 0.0,
            },
            activity: Activity::Inactive,
        }
    }

    /// The active movement state.
    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    /// Whether the walker has nothing to do.
    pub fn is_idle(&self) -> bool {
        self.activity.is_inactive()
    }

    /// Start walking `path`, optionally after a start delay.
    pub fn walk(&mut self, path: Path, delay: f32) {
        self.activity = Activity::Walking(WalkingState::new(path, delay));
    }

    /// Start roaming from the current cell.
    pub fn roam(&mut self, max_steps: u32, memory_cap: usize) {
        self.activity = Activity::Roaming(RoamingState::new(self.body.cell, max_steps, memory_cap));
    }

    /// Idle in place for `seconds`.
    pub fn wait(&mut self, seconds: f32) {
        self.activity = Activity::Waiting(WaitingState::new(seconds));
    }

    /// Drop whatever the walker was doing.
    pub fn cancel(&mut self) {
        self.activity = Activity::Inactive;
    }

    /// Advance the active state by `dt` seconds.
    ///
    /// `speed` is the walker's movement speed in world units per second;
    /// `open` reports cell traversability for roaming. Completion and
    /// cancellation return the walker to idle. Advancing an idle walker is
    /// a no-op reporting [`Step::Completed`].
    pub fn advance<R: Rng>(
        &mut self,
        dt: f32,
        speed: f32,
        rng: &mut R,
        open: impl Fn(Point) -> bool,
        t: &dyn GridTransform,
    ) -> Step {
        let step = match &mut self.activity {
            Activity::Inactive => return Step::Completed,
            Activity::Waiting(waiting) => waiting.advance(dt),
            Activity::Walking(walking) => walking.advance(dt, speed, t, &mut self.body),
            Activity::Roaming(roaming) => {
                roaming.advance(dt, speed, rng, open, t, &mut self.body)
            }
        };
        if step != Step::InProgress {
            self.activity = Activity::Inactive;
        }
        step
    }

    // -----------------------------------------------------------------------
    // Save / restore
    // -----------------------------------------------------------------------

    /// Snapshot the walker, mid-playback state included.
    pub fn save(&self) -> WalkerSave {
        WalkerSave {
            id: self.id,
            home: self.home,
            start: self.start,
            body: self.body,
            activity: self.activity.clone(),
        }
    }

    /// Rebuild a walker from a snapshot. Call [`resume`](Self::resume)
    /// afterwards to re-drive the body from the restored state.
    pub fn restore(save: WalkerSave) -> Self {
        Self {
            id: save.id,
            home: save.home,
            start: save.start,
            body: save.body,
            activity: save.activity,
        }
    }

    /// Re-apply body position, cell, and heading from the active state
    /// without advancing it. Playback then continues exactly where the
    /// snapshot left off — same segment or hop, same accumulated distance,
    /// same remaining wait.
    pub fn resume(&mut self, t: &dyn GridTransform) {
        match &self.activity {
            Activity::Walking(walking) => walking.resume(t, &mut self.body),
            Activity::Roaming(roaming) => roaming.resume(t, &mut self.body),
            Activity::Inactive | Activity::Waiting(_) => {}
        }
    }
}

/// Saved form of a walker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkerSave {
    pub id: WalkerId,
    pub home: Option<u32>,
    pub start: Point,
    pub body: Body,
    pub activity: Activity,
}

#[cfg(test)]
mod tests {
    use super::*;
    use polis_core::UnitTransform;
    use std::collections::HashSet;

    fn lane(n: i32) -> Path {
        Path::Points((0..n).map(|x| Point::new(x, 0)).collect())
    }

    fn open_everywhere(_: Point) -> bool {
        true
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    #[test]
    fn walker_walks_then_returns_to_idle() {
        let t = UnitTransform;
        let mut rng = rand::rng();
        let mut walker = Walker::new(1, Point::new(0, 0), &t);
        walker.walk(lane(3), 0.0);
        assert!(!walker.is_idle());

        let mut done = false;
        for _ in 0..100 {
            if walker.advance(0.5, 1.0, &mut rng, open_everywhere, &t) == Step::Completed {
                done = true;
                break;
            }
        }
        assert!(done);
        assert!(walker.is_idle());
        assert_eq!(walker.body.cell, Point::new(2, 0));
    }

    #[test]
    fn waiting_completes_after_target_seconds() {
        let t = UnitTransform;
        let mut rng = rand::rng();
        let mut walker = Walker::new(1, Point::ZERO, &t);
        walker.wait(1.0);

        let mut ticks = 0;
        while walker.advance(0.25, 1.0, &mut rng, open_everywhere, &t) == Step::InProgress {
            ticks += 1;
            assert!(ticks < 100);
        }
        assert_eq!(ticks, 3);
        assert!(walker.is_idle());
    }

    #[test]
    fn cancel_discards_active_state() {
        let t = UnitTransform;
        let mut walker = Walker::new(1, Point::ZERO, &t);
        walker.walk(lane(10), 0.0);
        walker.cancel();
        assert!(walker.is_idle());
    }

    #[test]
    fn starting_a_new_state_replaces_the_old() {
        let t = UnitTransform;
        let mut walker = Walker::new(1, Point::ZERO, &t);
        walker.walk(lane(10), 0.0);
        walker.wait(2.0);
        assert!(matches!(walker.activity(), Activity::Waiting(_)));
    }

    #[test]
    fn advancing_idle_walker_is_a_noop() {
        let t = UnitTransform;
        let mut rng = rand::rng();
        let mut walker = Walker::new(1, Point::new(4, 4), &t);
        assert_eq!(
            walker.advance(0.5, 1.0, &mut rng, open_everywhere, &t),
            Step::Completed
        );
        assert_eq!(walker.body.cell, Point::new(4, 4));
    }

    #[test]
    fn roam_starts_from_current_cell() {
        let t = UnitTransform;
        let walkable: HashSet<Point> = (0..5).map(|x| Point::new(x, 0)).collect();
        let mut rng = rand::rng();
        let mut walker = Walker::new(1, Point::new(2, 0), &t);
        walker.roam(2, 2);

        let mut done = false;
        for _ in 0..100 {
            let step = walker.advance(0.5, 1.0, &mut rng, |p| walkable.contains(&p), &t);
            if step == Step::Completed {
                done = true;
                break;
            }
        }
        assert!(done);
        assert!(walkable.contains(&walker.body.cell));
    }

    // -----------------------------------------------------------------------
    // Save / restore / resume
    // -----------------------------------------------------------------------

    #[test]
    fn save_restore_continues_walk_identically() {
        let t = UnitTransform;
        let mut rng = rand::rng();
        let mut live = Walker::new(7, Point::new(0, 0), &t);
        live.home = Some(42);
        live.walk(lane(6), 0.0);

        for _ in 0..4 {
            let _ = live.advance(0.3, 0.9, &mut rng, open_everywhere, &t);
        }

        let json = serde_json::to_string(&live.save()).unwrap();
        let save: WalkerSave = serde_json::from_str(&json).unwrap();
        let mut restored = Walker::restore(save);
        restored.resume(&t);

        assert_eq!(restored.id, 7);
        assert_eq!(restored.home, Some(42));
        assert_eq!(restored.body, live.body);

        // Lockstep to completion.
        loop {
            let a = live.advance(0.3, 0.9, &mut rng, open_everywhere, &t);
            let b = restored.advance(0.3, 0.9, &mut rng, open_everywhere, &t);
            assert_eq!(a, b);
            assert_eq!(live.body, restored.body);
            if a == Step::Completed {
                break;
            }
        }
        assert_eq!(live.body.cell, Point::new(5, 0));
    }

    #[test]
    fn save_restore_preserves_remaining_wait() {
        let t = UnitTransform;
        let mut rng = rand::rng();
        let mut walker = Walker::new(1, Point::ZERO, &t);
        walker.wait(2.0);
        let _ = walker.advance(0.75, 1.0, &mut rng, open_everywhere, &t);

        let save = walker.save();
        let mut restored = Walker::restore(save);
        restored.resume(&t);

        let Activity::Waiting(waiting) = restored.activity() else {
            panic!("expected waiting state");
        };
        assert!((waiting.remaining() - 1.25).abs() < 1e-6);

        // 1.25 s left at 0.5 s per tick: completes on the third tick.
        assert_eq!(
            restored.advance(0.5, 1.0, &mut rng, open_everywhere, &t),
            Step::InProgress
        );
        assert_eq!(
            restored.advance(0.5, 1.0, &mut rng, open_everywhere, &t),
            Step::InProgress
        );
        assert_eq!(
            restored.advance(0.5, 1.0, &mut rng, open_everywhere, &t),
            Step::Completed
        );
    }
}
