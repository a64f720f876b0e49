//! Boss phases
//!
//! Controller каждый tick (кроме BossPhaseTransition / Dead) сравнивает
//! health fraction с порогами. Первая недостигнутая фаза, порог которой
//! пробит, → boss_phase += 1 и force BossPhaseTransition.
//!
//! Transition state: неуязвимость + стоим + announce, по истечении
//! boss_transition_duration применяем multipliers / ability set фазы.
//! boss_phase никогда не уменьшается (хил не откатывает фазу).

use crate::config::BossPhaseDef;
use crate::environment::{Environment, PresentationCue, Vitality};
use crate::fsm::{StateBehavior, Transition};

use super::states::release_attack_slot;
use super::{AgentContext, AgentEvent, AgentState, Services};

/// Новое значение boss_phase, если fraction пробила следующий порог.
///
/// `reached` — сколько фаз уже пройдено. Пропустить фазу нельзя:
/// даже при падении сразу ниже нескольких порогов возвращается ближайшая.
pub fn next_phase(phases: &[BossPhaseDef], reached: usize, fraction: f32) -> Option<usize> {
    phases
        .get(reached)
        .filter(|phase| fraction < phase.health_threshold)
        .map(|_| reached + 1)
}

/// Определение текущей фазы (boss_phase = 1 → phases[0])
pub fn phase_def(phases: &[BossPhaseDef], reached: usize) -> Option<&BossPhaseDef> {
    reached.checked_sub(1).and_then(|index| phases.get(index))
}

pub struct BossPhaseTransitionState;

impl<E: Environment> StateBehavior<AgentState, AgentContext, Services<E>> for BossPhaseTransitionState {
    fn on_enter(&mut self, ctx: &mut AgentContext, world: &mut Services<E>) {
        ctx.executor.interrupt(true);
        ctx.ability_in_progress = false;
        ctx.hold();
        ctx.look_at = None;
        ctx.health.set_invulnerable(true);
        release_attack_slot(ctx, &mut world.groups);

        let phase = ctx.boss_phase;
        let name = phase_def(&ctx.archetype.boss_phases, phase)
            .map(|def| def.name.clone())
            .unwrap_or_default();

        crate::logger::log_info(&format!(
            "👑 {} ({}): phase {} '{}' at {:.0}% health",
            ctx.id,
            ctx.archetype.id,
            phase,
            name,
            ctx.health.fraction() * 100.0
        ));
        world.env.cue(PresentationCue::PhaseAnnounced {
            agent: ctx.id,
            phase,
            name,
        });
    }

    fn on_update(&mut self, ctx: &mut AgentContext, _world: &mut Services<E>, _dt: f32) -> Transition<AgentState> {
        ctx.hold();

        if ctx.time_in_state() < ctx.timings().boss_transition_duration {
            return Transition::Stay;
        }

        let archetype = ctx.archetype.clone();
        if let Some(def) = phase_def(&archetype.boss_phases, ctx.boss_phase) {
            ctx.speed_multiplier = def.speed_multiplier;
            ctx.executor.set_damage_multiplier(def.damage_multiplier);
            if let Some(abilities) = &def.abilities {
                ctx.executor.swap_abilities(abilities.clone(), def.primary_ability);
            }
            ctx.emit(AgentEvent::PhaseChanged {
                phase: ctx.boss_phase,
                name: def.name.clone(),
            });
        }

        if ctx.target.is_some() {
            Transition::To(AgentState::Chase)
        } else {
            Transition::To(AgentState::Idle)
        }
    }

    fn on_exit(&mut self, ctx: &mut AgentContext, _world: &mut Services<E>) {
        ctx.health.set_invulnerable(false);
    }
}
