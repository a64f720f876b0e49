//! Projectiles: летят по прямой, урон на первом qualifying collision
//!
//! Projectile несёт уже посчитанный урон (с phase multiplier на момент
//! выстрела), kind и source. Store двигает все projectiles раз в tick.

use bevy::prelude::*;

use crate::components::ActorId;
use crate::config::DamageKind;
use crate::environment::{DamageReceiver, HitQuery};

use super::{deliver_damage, DamageDealt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectileId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub id: ProjectileId,
    pub source: ActorId,
    pub ability: String,
    pub position: Vec3,
    pub velocity: Vec3,
    pub damage: f32,
    pub kind: DamageKind,
    /// Секунды до самоуничтожения
    pub remaining_life: f32,
}

/// Чем закончился полёт projectile
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectileOutcome {
    Hit(DamageDealt),
    /// Попал в геометрию
    Blocked { id: ProjectileId, point: Vec3 },
    Expired { id: ProjectileId },
}

#[derive(Debug, Default)]
pub struct ProjectileStore {
    live: Vec<Projectile>,
    next_id: u64,
}

impl ProjectileStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        &mut self,
        source: ActorId,
        ability: &str,
        origin: Vec3,
        direction: Vec3,
        speed: f32,
        lifetime: f32,
        damage: f32,
        kind: DamageKind,
    ) -> ProjectileId {
        self.next_id += 1;
        let id = ProjectileId(self.next_id);
        self.live.push(Projectile {
            id,
            source,
            ability: ability.to_string(),
            position: origin,
            velocity: direction.normalize_or_zero() * speed,
            damage,
            kind,
            remaining_life: lifetime,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.live.iter()
    }

    /// Снять все projectiles владельца (teardown)
    pub fn remove_from(&mut self, source: ActorId) {
        self.live.retain(|projectile| projectile.source != source);
    }

    /// Шаг всех projectiles: sweep `position → position + velocity × dt`.
    pub fn advance<E>(&mut self, world: &mut E, dt: f32) -> Vec<ProjectileOutcome>
    where
        E: HitQuery + DamageReceiver + ?Sized,
    {
        let mut outcomes = Vec::new();
        let mut survivors = Vec::with_capacity(self.live.len());

        for mut projectile in self.live.drain(..) {
            let step = projectile.velocity * dt;
            let distance = step.length();

            // Источник пролетаем насквозь
            let hit = step
                .try_normalize()
                .and_then(|direction| world.raycast(projectile.position, direction, distance))
                .filter(|hit| hit.target != Some(projectile.source));

            match hit {
                Some(hit) => match hit.target {
                    Some(target) => {
                        let report = deliver_damage(
                            world,
                            projectile.source,
                            target,
                            projectile.damage,
                            projectile.kind,
                            &projectile.ability,
                        );
                        outcomes.push(ProjectileOutcome::Hit(report));
                    }
                    None => outcomes.push(ProjectileOutcome::Blocked {
                        id: projectile.id,
                        point: hit.point,
                    }),
                },
                None => {
                    projectile.position += step;
                    projectile.remaining_life -= dt;
                    if projectile.remaining_life <= 0.0 {
                        outcomes.push(ProjectileOutcome::Expired { id: projectile.id });
                    } else {
                        survivors.push(projectile);
                    }
                }
            }
        }

        self.live = survivors;
        outcomes
    }
}
