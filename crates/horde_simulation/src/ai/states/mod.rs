//! Реализации AgentState
//!
//! Каждый state — `StateBehavior<AgentState, AgentContext, Services<E>>`.
//! States пишут MoveIntent / look_at в контекст и возвращают Transition,
//! переход применяет machine после возврата из hook.

use bevy::prelude::*;
use rand::Rng;

use crate::environment::Navigation;
use crate::group::GroupRegistry;

use super::AgentContext;

mod attack;
mod chase;
mod dead;
mod hurt;
mod idle;
mod patrol;
mod positioning;

pub use attack::AttackState;
pub use chase::ChaseState;
pub use dead::DeadState;
pub use hurt::{FleeState, HurtState};
pub use idle::{IdleState, InactiveState, InvestigateState};
pub use patrol::PatrolState;
pub use positioning::PositioningState;

/// Запросить attack slot (без группы — всегда да)
pub(crate) fn acquire_attack_slot(ctx: &mut AgentContext, groups: &mut GroupRegistry) -> bool {
    let granted = groups.request_attack_slot(ctx.group, ctx.id, ctx.kinematics.position);
    ctx.holds_attack_slot = granted && ctx.group.is_some();
    granted
}

pub(crate) fn release_attack_slot(ctx: &mut AgentContext, groups: &mut GroupRegistry) {
    if ctx.holds_attack_slot {
        groups.release_attack_slot(ctx.group, ctx.id);
        ctx.holds_attack_slot = false;
    }
}

/// Случайная reachable точка в круге `radius` вокруг `center`.
///
/// Пробуем `attempts` раз; None — ничего не нашли (логирует вызывающий).
pub(crate) fn pick_reachable_point<N>(
    ctx: &mut AgentContext,
    nav: &N,
    center: Vec3,
    radius: f32,
    attempts: u32,
) -> Option<Vec3>
where
    N: Navigation + ?Sized,
{
    let from = ctx.kinematics.position;
    for _ in 0..attempts.max(1) {
        let angle = ctx.rng.gen_range(0.0..std::f32::consts::TAU);
        // sqrt → равномерно по площади круга
        let distance = radius * ctx.rng.gen::<f32>().sqrt();
        let candidate = center + Vec3::new(angle.cos() * distance, 0.0, angle.sin() * distance);

        let Some(point) = nav.sample_walkable(candidate) else {
            continue;
        };
        if nav.is_reachable(from, point) {
            return Some(point);
        }
    }
    None
}
