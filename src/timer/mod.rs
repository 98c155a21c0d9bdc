//! Focus timer state machine
//!
//! `Idle -> Running -> Idle`. The engine never reads the clock itself; every
//! transition takes `now` from the caller.

mod engine;
mod error;

pub use engine::{Recovery, RecoveryOptions, RecoveryPolicy, TimerEngine, TimerPhase, TimerState};
pub use error::TimerError;
