//! Combat module: ability execution и hit resolution
//!
//! Симуляция ответственна за:
//! - Timing: windup → execute → recovery, cooldowns
//! - Hit resolution: melee sphere, hitscan, projectiles
//! - Damage: base × phase multiplier → `DamageReceiver`
//!
//! Внешний мир ответственен за:
//! - Health целей (мы видим только acknowledged bool)
//! - Геометрию (`HitQuery`)
//! - Анимации/VFX (`PresentationSink` cues)

pub mod damage;
pub mod executor;
pub mod hit;
pub mod projectile;

// Tests (separate files with _tests suffix)
#[cfg(test)]
mod executor_tests;
#[cfg(test)]
mod projectile_tests;

pub use damage::{calculate_damage, deliver_damage, DamageDealt, EntityDied};
pub use executor::{AbilityExecutor, AbilityPhase, ActiveAbility, Attacker, ExecutorEvent};
pub use hit::{resolve_hitscan, resolve_melee, MeleeShape};
pub use projectile::{Projectile, ProjectileId, ProjectileOutcome, ProjectileStore};
