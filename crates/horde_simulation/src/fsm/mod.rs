//! Generic finite state machine
//!
//! Ничего не знает про игру: state id непрозрачен (любой `Copy + Eq + Hash`),
//! контекст (blackboard) и world передаются в каждый вызов снаружи.
//! Используется AgentController, но тестируется отдельно.

pub mod machine;

#[cfg(test)]
mod machine_tests;

pub use machine::*;
