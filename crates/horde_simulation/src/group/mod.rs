//! Group coordination: ограничение одновременных атакующих, shared targets, signals

pub mod coordinator;
pub mod registry;

#[cfg(test)]
mod coordinator_tests;

pub use coordinator::*;
pub use registry::*;
