//! Dead — terminal
//!
//! Останавливает движение и abilities, отпускает slot, выходит из группы,
//! шлёт death notification и ставит deadline внешнего cleanup.

use crate::ai::{AgentContext, AgentEvent, AgentState, Services};
use crate::environment::{Environment, PresentationCue, Vitality};
use crate::fsm::{StateBehavior, Transition};

use super::release_attack_slot;

pub struct DeadState;

impl<E: Environment> StateBehavior<AgentState, AgentContext, Services<E>> for DeadState {
    fn on_enter(&mut self, ctx: &mut AgentContext, world: &mut Services<E>) {
        ctx.executor.interrupt(true);
        ctx.ability_in_progress = false;
        ctx.hold();
        ctx.look_at = None;
        ctx.kinematics.stop();
        ctx.locomotion = Default::default();

        if ctx.health.is_alive() {
            // force_kill / kamikaze
            ctx.health.set_current(0.0);
        }
        ctx.health.set_invulnerable(false);

        release_attack_slot(ctx, &mut world.groups);
        if let Some(group) = ctx.group {
            world.groups.leave(group, ctx.id);
        }

        ctx.perception.clear();
        ctx.target = None;
        ctx.cleanup_at = Some(ctx.now + ctx.timings().death_cleanup_delay as f64);

        let killer = ctx.last_damage_source;
        crate::logger::log_info(&format!(
            "💀 {} ({}) died{}",
            ctx.id,
            ctx.archetype.id,
            killer.map(|id| format!(", killed by {}", id)).unwrap_or_default()
        ));
        ctx.emit(AgentEvent::Died { killer });
        world.env.cue(PresentationCue::Died { agent: ctx.id });
    }

    fn on_update(&mut self, ctx: &mut AgentContext, _world: &mut Services<E>, _dt: f32) -> Transition<AgentState> {
        ctx.hold();
        Transition::Stay
    }
}
