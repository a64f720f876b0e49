//! Patrol — случайные точки вокруг spawn point на пониженной скорости
//!
//! Re-pick: arrival / timeout / stuck (нет прогресса дольше patrol_stuck_timeout)
//! / path failure. Цель → Chase немедленно.

use crate::ai::{AgentContext, AgentState, Services};
use crate::environment::Environment;
use crate::fsm::{StateBehavior, Transition};

use super::pick_reachable_point;

/// Меньше этого за tick — "не двигаемся"
const MIN_PROGRESS: f32 = 1e-3;

#[derive(Debug, Default)]
pub struct PatrolState {
    picked_at: f64,
}

impl PatrolState {
    fn repick<E: Environment>(&mut self, ctx: &mut AgentContext, world: &Services<E>) -> bool {
        let radius = ctx.archetype.patrol.radius;
        let attempts = ctx.timings().patrol_pick_attempts;
        let center = ctx.spawn_point;

        ctx.patrol_destination = pick_reachable_point(ctx, &world.env, center, radius, attempts);
        ctx.stuck_timer = 0.0;
        self.picked_at = ctx.now;

        if ctx.patrol_destination.is_none() {
            crate::logger::log_warning(&format!(
                "{}: no reachable patrol point after {} attempts",
                ctx.id, attempts
            ));
        }
        ctx.patrol_destination.is_some()
    }
}

impl<E: Environment> StateBehavior<AgentState, AgentContext, Services<E>> for PatrolState {
    fn on_enter(&mut self, ctx: &mut AgentContext, world: &mut Services<E>) {
        ctx.look_at = None;
        self.repick(ctx, world);
    }

    fn on_update(&mut self, ctx: &mut AgentContext, world: &mut Services<E>, dt: f32) -> Transition<AgentState> {
        if ctx.target.is_some() {
            return Transition::To(AgentState::Chase);
        }

        let timings = ctx.timings().clone();

        if ctx.locomotion.last_step < MIN_PROGRESS {
            ctx.stuck_timer += dt;
        } else {
            ctx.stuck_timer = 0.0;
        }

        let arrived = ctx
            .patrol_destination
            .map(|destination| ctx.flat_distance_to(destination) <= timings.arrival_tolerance)
            .unwrap_or(true);
        let timed_out = (ctx.now - self.picked_at) as f32 >= timings.patrol_repick_timeout;
        let stuck = ctx.stuck_timer > timings.patrol_stuck_timeout;

        if arrived || timed_out || stuck || ctx.locomotion.path_failed {
            if stuck {
                crate::logger::log(&format!("🚶 {}: patrol stuck, re-picking", ctx.id));
            }
            if !self.repick(ctx, world) {
                ctx.hold();
                return Transition::To(AgentState::Idle);
            }
        }

        match ctx.patrol_destination {
            Some(destination) => {
                let factor = ctx.archetype.patrol.speed_factor;
                ctx.move_to(destination, factor);
            }
            None => ctx.hold(),
        }
        Transition::Stay
    }

    fn on_exit(&mut self, ctx: &mut AgentContext, _world: &mut Services<E>) {
        ctx.patrol_destination = None;
        ctx.stuck_timer = 0.0;
    }
}
