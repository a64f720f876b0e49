//! Hurt (stagger) + Flee

use crate::ai::{AgentContext, AgentState, Services};
use crate::environment::{Environment, PresentationCue, Vitality};
use crate::fsm::{StateBehavior, Transition};

use super::release_attack_slot;

/// Hurt: короткий stagger, прерывает ability, проверяет flee threshold
pub struct HurtState;

fn should_flee(ctx: &AgentContext) -> bool {
    let flee = &ctx.archetype.flee;
    flee.enabled && ctx.can_move() && ctx.health.fraction() <= flee.health_fraction
}

impl<E: Environment> StateBehavior<AgentState, AgentContext, Services<E>> for HurtState {
    fn on_enter(&mut self, ctx: &mut AgentContext, world: &mut Services<E>) {
        ctx.executor.interrupt(true);
        ctx.ability_in_progress = false;
        ctx.hold();
        release_attack_slot(ctx, &mut world.groups);
        world.env.cue(PresentationCue::Staggered { agent: ctx.id });
    }

    fn on_update(&mut self, ctx: &mut AgentContext, _world: &mut Services<E>, _dt: f32) -> Transition<AgentState> {
        ctx.hold();

        if should_flee(ctx) {
            return Transition::To(AgentState::Flee);
        }

        if ctx.time_in_state() >= ctx.timings().hurt_duration {
            return if ctx.target.is_some() {
                Transition::To(AgentState::Chase)
            } else {
                Transition::To(AgentState::Idle)
            };
        }

        Transition::Stay
    }
}

/// Flee: уходим от угрозы. Выход только через смерть или reset_to_idle.
#[derive(Debug, Default)]
pub struct FleeState {
    next_pick_at: f64,
    destination: Option<bevy::prelude::Vec3>,
}

impl<E: Environment> StateBehavior<AgentState, AgentContext, Services<E>> for FleeState {
    fn on_enter(&mut self, ctx: &mut AgentContext, world: &mut Services<E>) {
        release_attack_slot(ctx, &mut world.groups);
        self.next_pick_at = ctx.now;
        self.destination = None;
        ctx.look_at = None;
        crate::logger::log_info(&format!(
            "🏳️ {}: fleeing at {:.0}% health",
            ctx.id,
            ctx.health.fraction() * 100.0
        ));
    }

    fn on_update(&mut self, ctx: &mut AgentContext, world: &mut Services<E>, _dt: f32) -> Transition<AgentState> {
        let timings = ctx.timings().clone();
        let arrived = self
            .destination
            .map(|destination| ctx.flat_distance_to(destination) <= timings.arrival_tolerance)
            .unwrap_or(true);

        if ctx.now >= self.next_pick_at || arrived || ctx.locomotion.path_failed {
            self.next_pick_at = ctx.now + timings.flee_repick_interval as f64;
            let threat = ctx
                .target
                .map(|target| target.position)
                .or(ctx.last_known_position)
                .unwrap_or(ctx.spawn_point);
            let desired = ctx.kinematics.position + ctx.away_from(threat) * timings.flee_distance;
            self.destination = world.env.sample_walkable(desired);
        }

        match self.destination {
            Some(destination) => ctx.move_to(destination, 1.0),
            None => ctx.hold(),
        }
        Transition::Stay
    }

    fn on_exit(&mut self, _ctx: &mut AgentContext, _world: &mut Services<E>) {
        self.destination = None;
    }
}
