//! Inactive / Idle / Investigate

use crate::ai::{AgentContext, AgentState, Services};
use crate::environment::Environment;
use crate::fsm::{StateBehavior, Transition};

/// До initialize (spawn). Ничего не делает.
pub struct InactiveState;

impl<E: Environment> StateBehavior<AgentState, AgentContext, Services<E>> for InactiveState {
    fn on_update(&mut self, _ctx: &mut AgentContext, _world: &mut Services<E>, _dt: f32) -> Transition<AgentState> {
        Transition::Stay
    }
}

/// Idle: стоим; цель → Chase сразу, после grace period → Patrol
pub struct IdleState;

impl<E: Environment> StateBehavior<AgentState, AgentContext, Services<E>> for IdleState {
    fn on_enter(&mut self, ctx: &mut AgentContext, _world: &mut Services<E>) {
        ctx.hold();
        ctx.look_at = None;
    }

    fn on_update(&mut self, ctx: &mut AgentContext, _world: &mut Services<E>, _dt: f32) -> Transition<AgentState> {
        ctx.hold();

        if ctx.target.is_some() {
            return Transition::To(AgentState::Chase);
        }

        let patrol_allowed = ctx.archetype.patrol.enabled && ctx.can_move();
        if patrol_allowed && ctx.time_in_state() >= ctx.timings().idle_grace {
            return Transition::To(AgentState::Patrol);
        }

        Transition::Stay
    }
}

/// Investigate: идём к last-known position и стоим там.
///
/// Рёбер в таблице нет, state доступен только через force_transition.
pub struct InvestigateState;

impl<E: Environment> StateBehavior<AgentState, AgentContext, Services<E>> for InvestigateState {
    fn on_update(&mut self, ctx: &mut AgentContext, _world: &mut Services<E>, _dt: f32) -> Transition<AgentState> {
        match ctx.last_known_position {
            Some(position) if ctx.can_move() => {
                let factor = ctx.archetype.patrol.speed_factor;
                ctx.move_to(position, factor);
            }
            _ => ctx.hold(),
        }
        Transition::Stay
    }
}
