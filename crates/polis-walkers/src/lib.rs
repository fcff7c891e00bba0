//! Path playback and walker movement for grid city-builders.
//!
//! A [`Path`] is an immutable route — grid coordinates or raw world
//! positions. Playback is not a computation but a stepped advance: each
//! simulation tick the active state's `advance` moves the agent a little
//! further and reports a [`Step`], and the caller branches on completion or
//! cancellation. Suspension is simply "return, call again next tick".
//!
//! Every movement state — [`WalkingState`], [`RoamingState`],
//! [`WaitingState`], [`TryWalkState`] — is plain serializable data, and
//! playback resumes mid-segment from a deserialized snapshot without
//! re-deriving the route. [`Walker`] composes the states into the one-active
//! state machine a moving agent carries.

mod path;
mod playback;
mod roam;
mod walker;

pub use path::Path;
pub use playback::{RETRY_INTERVAL, Step, TryWalkState, WalkingState};
pub use roam::RoamingState;
pub use walker::{Activity, Body, WaitingState, Walker, WalkerId, WalkerSave};
