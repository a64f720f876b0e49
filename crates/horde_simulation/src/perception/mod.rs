//! Perception subsystem: sight/hearing, short-term memory, primary target
//!
//! - target: PerceptionTarget, TargetSource, scoring
//! - sensor: Perception (throttled sensing, eviction, alerts)

pub mod sensor;
pub mod target;


pub use sensor::*;
pub use target::*;
