//! Chase — сближение с целью
//!
//! - Цель потеряна (вышла из памяти) → Idle
//! - Ranged/Hybrid/Support в attack range → Positioning
//! - Melee в attack range + primary готов + attack slot → Attack
//! - Нет прогресса дольше chase_give_up_time или path failure → Idle

use crate::ai::{AgentContext, AgentState, Services};
use crate::environment::Environment;
use crate::fsm::{StateBehavior, Transition};

use super::acquire_attack_slot;

/// Melee не лезет вплотную: останавливаемся на этой доле attack range
const MELEE_STOP_FACTOR: f32 = 0.75;

#[derive(Debug, Default)]
pub struct ChaseState {
    best_distance: f32,
    last_progress_at: f64,
}

impl<E: Environment> StateBehavior<AgentState, AgentContext, Services<E>> for ChaseState {
    fn on_enter(&mut self, ctx: &mut AgentContext, world: &mut Services<E>) {
        self.best_distance = ctx.target.map(|target| target.distance).unwrap_or(f32::MAX);
        self.last_progress_at = ctx.now;

        if let Some(target) = ctx.target {
            if let Some(actor) = target.actor {
                world.groups.share_target(ctx.group, ctx.id, actor, target.position);
            }
            crate::logger::log(&format!(
                "🏃 {}: chasing {:?} ({:.1}m)",
                ctx.id, target.source, target.distance
            ));
        }
    }

    fn on_update(&mut self, ctx: &mut AgentContext, world: &mut Services<E>, _dt: f32) -> Transition<AgentState> {
        let Some(target) = ctx.target else {
            crate::logger::log(&format!("{}: target lost, back to Idle", ctx.id));
            return Transition::To(AgentState::Idle);
        };
        let timings = ctx.timings().clone();
        let attack_range = ctx.archetype.attack_range;

        ctx.look_at = Some(target.position);

        if target.distance < self.best_distance - timings.chase_progress_epsilon {
            self.best_distance = target.distance;
            self.last_progress_at = ctx.now;
        }

        if ctx.can_move() {
            if (ctx.now - self.last_progress_at) as f32 >= timings.chase_give_up_time {
                crate::logger::log_warning(&format!(
                    "{}: no progress for {:.1}s, giving up chase",
                    ctx.id, timings.chase_give_up_time
                ));
                return Transition::To(AgentState::Idle);
            }
            if ctx.locomotion.path_failed {
                crate::logger::log_warning(&format!("{}: path to target failed, giving up chase", ctx.id));
                return Transition::To(AgentState::Idle);
            }
        }

        let in_range = target.distance <= attack_range;

        if in_range && ctx.archetype.combat_style.uses_positioning() {
            return Transition::To(AgentState::Positioning);
        }

        if in_range && target.actor.is_some() {
            let usable = ctx.executor.is_primary_ready(ctx.now)
                && ctx.executor.select_ability(target.distance, ctx.now).is_some();
            if usable && acquire_attack_slot(ctx, &mut world.groups) {
                return Transition::To(AgentState::Attack);
            }
        }

        // Alert без актора: дошли до точки и ждём, пока запись не выйдет из памяти
        let stop_distance = match target.actor {
            Some(_) => attack_range * MELEE_STOP_FACTOR,
            None => timings.arrival_tolerance,
        };
        if ctx.can_move() && target.distance > stop_distance {
            ctx.move_to(target.position, 1.0);
        } else {
            ctx.hold();
        }

        Transition::Stay
    }

    fn on_exit(&mut self, ctx: &mut AgentContext, _world: &mut Services<E>) {
        ctx.look_at = None;
    }
}
