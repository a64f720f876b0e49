//! Attack — sequencing через AbilityExecutor
//!
//! enter: select + begin ability (windup cue)
//! update: track во время windup → executor.tick → hits в events
//! после recovery: re-attack на месте / Chase / Idle
//! exit: interrupt (force) + release attack slot
//!
//! Kamikaze умирает сразу после execute.

use crate::ai::{AgentContext, AgentEvent, AgentState, Services};
use crate::config::CombatStyle;
use crate::combat::ExecutorEvent;
use crate::environment::{Environment, PresentationCue, PresentationSink};
use crate::fsm::{StateBehavior, Transition};

use super::release_attack_slot;

pub struct AttackState;

/// Начать подходящую ability по текущей цели. false — нечего использовать.
fn start_ability<S: PresentationSink + ?Sized>(ctx: &mut AgentContext, sink: &mut S) -> bool {
    let Some(target) = ctx.target else {
        return false;
    };
    let Some(aim) = ctx.aim_point() else {
        return false;
    };
    let Some(index) = ctx.executor.select_ability(target.distance, ctx.now) else {
        return false;
    };
    if !ctx.executor.begin(index, target.actor, aim, ctx.now) {
        return false;
    }

    let ability_id = ctx.executor.abilities()[index].id.clone();
    crate::logger::log(&format!(
        "⚔️ {}: {} windup → {:?} ({:.1}m)",
        ctx.id, ability_id, target.source, target.distance
    ));
    sink.cue(PresentationCue::AbilityWindup {
        agent: ctx.id,
        ability: ability_id,
    });
    ctx.ability_in_progress = true;
    ctx.last_attack_at = Some(ctx.now);
    true
}

impl<E: Environment> StateBehavior<AgentState, AgentContext, Services<E>> for AttackState {
    fn on_enter(&mut self, ctx: &mut AgentContext, world: &mut Services<E>) {
        ctx.hold();
        if let Some(target) = ctx.target {
            ctx.look_at = Some(target.position);
        }
        start_ability(ctx, &mut world.env);
    }

    fn on_update(&mut self, ctx: &mut AgentContext, world: &mut Services<E>, dt: f32) -> Transition<AgentState> {
        ctx.hold();

        if let Some(target) = ctx.target {
            ctx.look_at = Some(target.position);
            if let Some(aim) = ctx.aim_point() {
                ctx.executor.track(aim);
            }
        }

        if ctx.executor.is_busy() {
            let attacker = ctx.attacker();
            let events = ctx
                .executor
                .tick(attacker, &mut world.env, &mut world.projectiles, ctx.now, dt);

            for event in events {
                match event {
                    ExecutorEvent::Executed { hits, .. } => {
                        for hit in hits {
                            ctx.emit(AgentEvent::DealtDamage(hit));
                        }
                        if ctx.archetype.combat_style == CombatStyle::Kamikaze {
                            crate::logger::log(&format!("💥 {}: kamikaze detonated", ctx.id));
                            // Самоподрыв: убийцы нет
                            ctx.last_damage_source = None;
                            return Transition::To(AgentState::Dead);
                        }
                    }
                    ExecutorEvent::RecoveryStarted { .. } => {}
                    ExecutorEvent::Completed { .. } => ctx.ability_in_progress = false,
                }
            }

            world
                .groups
                .update_attacker_position(ctx.group, ctx.id, ctx.kinematics.position);

            if ctx.executor.is_busy() {
                return Transition::Stay;
            }
        }

        ctx.ability_in_progress = false;

        // Post-recovery: re-attack если всё ещё можно
        let Some(target) = ctx.target else {
            return Transition::To(AgentState::Idle);
        };
        if target.actor.is_some() && target.distance <= ctx.archetype.attack_range && start_ability(ctx, &mut world.env) {
            return Transition::Stay;
        }
        Transition::To(AgentState::Chase)
    }

    fn on_exit(&mut self, ctx: &mut AgentContext, world: &mut Services<E>) {
        ctx.executor.interrupt(true);
        ctx.ability_in_progress = false;
        ctx.look_at = None;
        release_attack_slot(ctx, &mut world.groups);
    }
}
