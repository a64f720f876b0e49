//! Базовые данные агентов
//!
//! Организация по доменам:
//! - actor: ActorId, Health (vitality)
//! - movement: Kinematics, MoveIntent

pub mod actor;
pub mod movement;

// Re-exports для удобного импорта
pub use actor::*;
pub use movement::*;
