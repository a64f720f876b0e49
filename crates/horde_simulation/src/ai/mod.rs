//! Agent AI: controller, states, boss phases
//!
//! Архитектура:
//! - state: AgentState + таблица переходов + сборка machine
//! - context: AgentContext (blackboard), Services (env + groups + projectiles)
//! - states: реализации Idle / Patrol / Chase / Positioning / Attack / Hurt / Flee / Dead
//! - boss: пороги фаз + BossPhaseTransition
//! - locomotion: MoveIntent → Navigation → Kinematics
//! - controller: AgentController (spawn / tick / receive_damage / teardown)
//!
//! Порядок внутри tick агента:
//! 1. perception.update → primary target в blackboard
//! 2. group signals
//! 3. boss phase check (force BossPhaseTransition)
//! 4. machine.tick (state пишет MoveIntent, Attack тикает executor)
//! 5. locomotion

pub mod boss;
pub mod context;
pub mod controller;
pub mod events;
pub mod locomotion;
pub mod state;
pub mod states;

#[cfg(test)]
mod boss_tests;
#[cfg(test)]
mod state_tests;

pub use boss::{next_phase, phase_def, BossPhaseTransitionState};
pub use context::*;
pub use controller::*;
pub use events::*;
pub use state::*;
