//! Locomotion: MoveIntent → steering → Kinematics
//!
//! States только пишут intent. Controller после state update:
//! 1. Перезапрашивает путь (throttled, либо сразу если destination сместился)
//! 2. Шагает к waypoint со скоростью move_speed × factor × phase multiplier
//! 3. Поворачивается к `look_at` (или по ходу движения) с turn_speed
//!
//! Flying агенты рулят напрямую без path requests, Stationary никогда не двигаются.

use crate::components::MoveIntent;
use crate::config::MovementStyle;
use crate::environment::Navigation;

use super::AgentContext;

/// Waypoint считается достигнутым ближе этого
const WAYPOINT_REACHED: f32 = 0.05;

pub fn drive<N>(ctx: &mut AgentContext, nav: &mut N, dt: f32)
where
    N: Navigation + ?Sized,
{
    let arrival_tolerance = ctx.timings().arrival_tolerance;
    let repath_interval = ctx.timings().chase_repath_interval as f64;
    let movement = ctx.archetype.movement;

    ctx.locomotion.last_step = 0.0;

    match ctx.move_intent {
        MoveIntent::Hold => halt(ctx),
        MoveIntent::MoveTo { .. } if !movement.can_move() => halt(ctx),
        MoveIntent::MoveTo {
            destination,
            speed_factor,
        } => {
            if ctx.flat_distance_to(destination) <= arrival_tolerance {
                ctx.kinematics.stop();
                ctx.locomotion.waypoint = None;
            } else {
                let position = ctx.kinematics.position;
                let destination_moved = ctx
                    .locomotion
                    .destination
                    .map(|previous| previous.distance(destination) > arrival_tolerance)
                    .unwrap_or(true);
                let waypoint_reached = ctx
                    .locomotion
                    .waypoint
                    .map(|waypoint| waypoint.distance(position) <= WAYPOINT_REACHED)
                    .unwrap_or(true);

                if destination_moved || waypoint_reached || ctx.now >= ctx.locomotion.next_repath_at {
                    let waypoint = match movement {
                        MovementStyle::Flying => Some(destination),
                        _ => nav.request_path(position, destination),
                    };

                    if waypoint.is_none() && !ctx.locomotion.path_failed {
                        crate::logger::log_warning(&format!(
                            "{}: no path {:?} → {:?}",
                            ctx.id, position, destination
                        ));
                    }
                    ctx.locomotion.path_failed = waypoint.is_none();
                    ctx.locomotion.waypoint = waypoint;
                    ctx.locomotion.destination = Some(destination);
                    ctx.locomotion.next_repath_at = ctx.now + repath_interval;
                }

                match ctx.locomotion.waypoint {
                    Some(waypoint) => {
                        let speed = ctx.archetype.move_speed * speed_factor * ctx.speed_multiplier;
                        ctx.locomotion.last_step = ctx.kinematics.step_towards(waypoint, speed, dt);
                    }
                    None => ctx.kinematics.stop(),
                }
            }
        }
    }

    let face = ctx.look_at.or(match ctx.move_intent {
        MoveIntent::MoveTo { .. } => ctx.locomotion.waypoint,
        MoveIntent::Hold => None,
    });
    if let Some(point) = face {
        let turn_speed = ctx.archetype.turn_speed_deg;
        ctx.kinematics.turn_towards(point, turn_speed, dt);
    }
}

fn halt(ctx: &mut AgentContext) {
    ctx.kinematics.stop();
    ctx.locomotion.waypoint = None;
    ctx.locomotion.destination = None;
    ctx.locomotion.path_failed = false;
}
