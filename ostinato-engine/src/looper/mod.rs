//! The looper core: engine state, control state machine, loop geometry,
//! command application and the per-sample perform loop.

mod commands;
mod engine;
mod geometry;
mod perform;
mod state;

pub use engine::{LoopSnapshot, LooperEngine, SpeedInput};
pub use state::ControlState;
