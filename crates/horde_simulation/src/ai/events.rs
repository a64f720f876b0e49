//! AI events — что агент сообщает наружу за tick
//!
//! Копятся в `AgentContext::events`, Simulation забирает их после update
//! (exactly-once, в порядке возникновения) и переводит в `SimEvent`.

use crate::combat::DamageDealt;
use crate::components::ActorId;

#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// Агент получил урон (после resistance)
    Damaged {
        amount: f32,
        source: Option<ActorId>,
        remaining: f32,
    },

    /// Агент нанёс урон (melee / hitscan; projectiles репортит ProjectileStore)
    DealtDamage(DamageDealt),

    /// Boss перешёл в новую фазу (multipliers уже применены)
    PhaseChanged { phase: usize, name: String },

    /// Death notification (ровно один раз)
    Died { killer: Option<ActorId> },
}
