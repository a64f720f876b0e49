//! Positioning — ranged агенты держат preferred range и атакуют только с LOS
//!
//! Раз в positioning_reevaluate_interval выбираем точку:
//! - нет LOS → strafe вбок (сторона чередуется)
//! - слишком близко/далеко → точка на preferred range по линии от цели
//! - в допуске → стоим

use bevy::prelude::*;

use crate::ai::{AgentContext, AgentState, Services};
use crate::environment::{Environment, Navigation};
use crate::fsm::{StateBehavior, Transition};
use crate::perception::TARGET_AIM_HEIGHT;

use super::acquire_attack_slot;

#[derive(Debug)]
pub struct PositioningState {
    next_evaluation_at: f64,
    strafe_sign: f32,
    spot: Option<Vec3>,
}

impl Default for PositioningState {
    fn default() -> Self {
        Self {
            next_evaluation_at: 0.0,
            strafe_sign: 1.0,
            spot: None,
        }
    }
}

impl PositioningState {
    fn evaluate<N>(&mut self, ctx: &AgentContext, nav: &N, target: Vec3, has_los: bool) -> Option<Vec3>
    where
        N: Navigation + ?Sized,
    {
        let position = ctx.kinematics.position;
        let preferred = ctx.archetype.preferred_range;
        let tolerance = preferred * ctx.timings().positioning_tolerance;
        let away = ctx.away_from(target);
        let distance = ctx.flat_distance_to(target);

        let desired = if !has_los {
            self.strafe_sign = -self.strafe_sign;
            let side = Vec3::new(-away.z, 0.0, away.x) * self.strafe_sign;
            position + side * (preferred * 0.5).max(1.0)
        } else if (distance - preferred).abs() > tolerance {
            target + away * preferred
        } else {
            return None;
        };

        nav.sample_walkable(desired)
    }
}

impl<E: Environment> StateBehavior<AgentState, AgentContext, Services<E>> for PositioningState {
    fn on_enter(&mut self, ctx: &mut AgentContext, _world: &mut Services<E>) {
        self.next_evaluation_at = ctx.now;
        self.spot = None;
    }

    fn on_update(&mut self, ctx: &mut AgentContext, world: &mut Services<E>, _dt: f32) -> Transition<AgentState> {
        let Some(target) = ctx.target else {
            return Transition::To(AgentState::Idle);
        };
        let timings = ctx.timings().clone();
        ctx.look_at = Some(target.position);

        // Гистерезис, чтобы не прыгать Chase ↔ Positioning на границе
        let leash = ctx.archetype.attack_range + ctx.archetype.preferred_range * timings.positioning_tolerance;
        if target.distance > leash && ctx.can_move() {
            return Transition::To(AgentState::Chase);
        }

        let eye = ctx.perception.eye_point(ctx.kinematics.position);
        let has_los = !world
            .env
            .is_blocked(eye, target.position + Vec3::Y * TARGET_AIM_HEIGHT);

        if has_los && target.actor.is_some() {
            let ready = ctx.executor.select_ability(target.distance, ctx.now).is_some();
            if ready && acquire_attack_slot(ctx, &mut world.groups) {
                return Transition::To(AgentState::Attack);
            }
        }

        if ctx.now >= self.next_evaluation_at {
            self.next_evaluation_at = ctx.now + timings.positioning_reevaluate_interval as f64;
            self.spot = self.evaluate(ctx, &world.env, target.position, has_los);
        }

        match self.spot {
            Some(spot) if ctx.can_move() && ctx.flat_distance_to(spot) > timings.arrival_tolerance => {
                ctx.move_to(spot, 1.0);
            }
            _ => {
                self.spot = None;
                ctx.hold();
            }
        }

        Transition::Stay
    }

    fn on_exit(&mut self, ctx: &mut AgentContext, _world: &mut Services<E>) {
        self.spot = None;
        ctx.look_at = None;
    }
}
