//! Hit resolution для Execute фазы (melee area, hitscan)

use bevy::prelude::*;

use crate::components::ActorId;
use crate::config::Ability;
use crate::environment::HitQuery;

/// Геометрия melee sphere относительно max_range ability
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeleeShape {
    pub offset_factor: f32,
    pub radius_factor: f32,
}

impl Default for MeleeShape {
    fn default() -> Self {
        Self {
            offset_factor: 0.5,
            radius_factor: 0.6,
        }
    }
}

impl MeleeShape {
    /// Центр и радиус sphere перед атакующим
    pub fn sphere(&self, position: Vec3, facing: Vec3, max_range: f32) -> (Vec3, f32) {
        let center = position + facing * (max_range * self.offset_factor);
        (center, max_range * self.radius_factor)
    }
}

/// Кого задела melee sphere. Себя и уже задетых исключаем.
pub fn resolve_melee<Q>(
    world: &Q,
    attacker: ActorId,
    position: Vec3,
    facing: Vec3,
    ability: &Ability,
    shape: MeleeShape,
    already_hit: &[ActorId],
) -> Vec<ActorId>
where
    Q: HitQuery + ?Sized,
{
    let (center, radius) = shape.sphere(position, facing, ability.max_range);
    let mut hits: Vec<ActorId> = Vec::new();
    for target in world.overlap_sphere(center, radius) {
        if target == attacker || already_hit.contains(&target) || hits.contains(&target) {
            continue;
        }
        hits.push(target);
    }
    hits
}

/// Мгновенный raycast от `origin` к `aim`. Попадание в геометрию — промах.
pub fn resolve_hitscan<Q>(world: &Q, attacker: ActorId, origin: Vec3, aim: Vec3, ability: &Ability) -> Option<ActorId>
where
    Q: HitQuery + ?Sized,
{
    let direction = (aim - origin).try_normalize()?;
    let hit = world.raycast(origin, direction, ability.max_range)?;
    hit.target.filter(|target| *target != attacker)
}
