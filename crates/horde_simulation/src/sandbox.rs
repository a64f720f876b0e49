//! OpenArena — headless environment для demo и тестов
//!
//! Плоский квадрат `[-half_extent, half_extent]²` на y = 0, сферические
//! obstacles (блокируют LOS, навигацию и выстрелы), damageable targets
//! (игроки, турели) и "острова" — walkable зоны, недостижимые снаружи.
//!
//! Навигация: прямая линия с простым обходом одного obstacle по касательной.
//! Настоящий pathfinding не нужен: симуляция потребляет только steering точку.

use bevy::prelude::*;

use crate::components::{ActorId, Health};
use crate::config::DamageKind;
use crate::environment::{
    DamageReceiver, HitQuery, LineOfSight, Navigation, Perceivable, PerceivableSource, PresentationCue,
    PresentationSink, RayHit, Vitality,
};
use crate::perception::TARGET_AIM_HEIGHT;

/// Зазор при обходе obstacle / выталкивании из него
const CLEARANCE: f32 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub center: Vec3,
    pub radius: f32,
}

/// Walkable зона, недостижимая снаружи (и наоборот)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Island {
    pub center: Vec3,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArenaTarget {
    pub id: ActorId,
    pub position: Vec3,
    pub radius: f32,
    pub health: Health,
    pub noise_level: f32,
    pub priority: f32,
    pub perceivable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DamageRecord {
    pub target: ActorId,
    pub amount: f32,
    pub kind: DamageKind,
    pub source: ActorId,
    pub acknowledged: bool,
}

#[derive(Debug, Clone)]
pub struct OpenArena {
    pub half_extent: f32,
    pub obstacles: Vec<Obstacle>,
    pub islands: Vec<Island>,
    pub targets: Vec<ArenaTarget>,
    pub damage_log: Vec<DamageRecord>,
    pub cues: Vec<PresentationCue>,
    pub record_cues: bool,
}

impl Default for OpenArena {
    fn default() -> Self {
        Self::new(50.0)
    }
}

impl OpenArena {
    pub fn new(half_extent: f32) -> Self {
        Self {
            half_extent,
            obstacles: Vec::new(),
            islands: Vec::new(),
            targets: Vec::new(),
            damage_log: Vec::new(),
            cues: Vec::new(),
            record_cues: true,
        }
    }

    pub fn with_obstacle(mut self, center: Vec3, radius: f32) -> Self {
        self.obstacles.push(Obstacle { center, radius });
        self
    }

    pub fn with_island(mut self, center: Vec3, radius: f32) -> Self {
        self.islands.push(Island { center, radius });
        self
    }

    /// Damageable target (игрок/турель) с priority 1.0
    pub fn add_target(&mut self, id: ActorId, position: Vec3, max_health: f32) -> &mut ArenaTarget {
        self.targets.push(ArenaTarget {
            id,
            position,
            radius: 0.5,
            health: Health::new(max_health),
            noise_level: 0.5,
            priority: 1.0,
            perceivable: true,
        });
        let last = self.targets.len() - 1;
        &mut self.targets[last]
    }

    pub fn target(&self, id: ActorId) -> Option<&ArenaTarget> {
        self.targets.iter().find(|target| target.id == id)
    }

    pub fn target_mut(&mut self, id: ActorId) -> Option<&mut ArenaTarget> {
        self.targets.iter_mut().find(|target| target.id == id)
    }

    pub fn move_target(&mut self, id: ActorId, position: Vec3) {
        if let Some(target) = self.target_mut(id) {
            target.position = position;
        }
    }

    /// Урон, принятый целью (только acknowledged)
    pub fn damage_taken(&self, id: ActorId) -> f32 {
        self.damage_log
            .iter()
            .filter(|record| record.target == id && record.acknowledged)
            .map(|record| record.amount)
            .sum()
    }

    pub fn hits_on(&self, id: ActorId) -> usize {
        self.damage_log
            .iter()
            .filter(|record| record.target == id && record.acknowledged)
            .count()
    }

    pub fn in_bounds(&self, point: Vec3) -> bool {
        point.x.abs() <= self.half_extent && point.z.abs() <= self.half_extent
    }

    pub fn is_walkable(&self, point: Vec3) -> bool {
        self.in_bounds(point)
            && !self
                .obstacles
                .iter()
                .any(|obstacle| flat_distance(point, obstacle.center) < obstacle.radius)
    }

    fn island_of(&self, point: Vec3) -> Option<usize> {
        self.islands
            .iter()
            .position(|island| flat_distance(point, island.center) <= island.radius)
    }

    /// Первый obstacle, пересекающий отрезок на уровне земли
    fn obstacle_on_path(&self, from: Vec3, to: Vec3) -> Option<&Obstacle> {
        let from = Vec3::new(from.x, 0.0, from.z);
        let to = Vec3::new(to.x, 0.0, to.z);
        self.obstacles
            .iter()
            .filter(|obstacle| {
                let center = Vec3::new(obstacle.center.x, 0.0, obstacle.center.z);
                segment_sphere_distance(from, to, center) < obstacle.radius
            })
            .min_by(|a, b| {
                flat_distance(from, a.center)
                    .partial_cmp(&flat_distance(from, b.center))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }
}

impl Navigation for OpenArena {
    fn request_path(&mut self, from: Vec3, to: Vec3) -> Option<Vec3> {
        if !self.is_reachable(from, to) {
            return None;
        }

        match self.obstacle_on_path(from, to) {
            None => Some(to),
            Some(obstacle) => {
                // Обход по касательной: в сторону, ближайшую к цели
                let forward = (to - from).with_y(0.0).try_normalize()?;
                let side = Vec3::new(-forward.z, 0.0, forward.x);
                let offset = obstacle.radius + CLEARANCE;
                let left = obstacle.center.with_y(from.y) + side * offset;
                let right = obstacle.center.with_y(from.y) - side * offset;
                let pick = if left.distance(to) <= right.distance(to) { left } else { right };
                Some(pick)
            }
        }
    }

    fn is_reachable(&self, from: Vec3, to: Vec3) -> bool {
        self.is_walkable(from) && self.is_walkable(to) && self.island_of(from) == self.island_of(to)
    }

    fn sample_walkable(&self, near: Vec3) -> Option<Vec3> {
        let limit = self.half_extent;
        let mut point = Vec3::new(near.x.clamp(-limit, limit), 0.0, near.z.clamp(-limit, limit));

        if let Some(obstacle) = self
            .obstacles
            .iter()
            .find(|obstacle| flat_distance(point, obstacle.center) < obstacle.radius)
        {
            let outward = (point - obstacle.center).with_y(0.0).try_normalize().unwrap_or(Vec3::X);
            point = obstacle.center.with_y(0.0) + outward * (obstacle.radius + CLEARANCE);
        }

        self.is_walkable(point).then_some(point)
    }
}

impl LineOfSight for OpenArena {
    fn is_blocked(&self, from: Vec3, to: Vec3) -> bool {
        self.obstacles
            .iter()
            .any(|obstacle| segment_sphere_distance(from, to, obstacle.center) <= obstacle.radius)
    }
}

impl PerceivableSource for OpenArena {
    fn perceivables_near(&self, center: Vec3, radius: f32) -> Vec<Perceivable> {
        self.targets
            .iter()
            .filter(|target| target.position.distance(center) <= radius)
            .map(|target| Perceivable {
                id: target.id,
                position: target.position,
                perceivable: target.perceivable && target.health.is_alive(),
                noise_level: target.noise_level,
                priority: target.priority,
            })
            .collect()
    }
}

impl HitQuery for OpenArena {
    fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<ActorId> {
        self.targets
            .iter()
            .filter(|target| target.health.is_alive())
            .filter(|target| flat_distance(target.position, center) <= radius + target.radius)
            .map(|target| target.id)
            .collect()
    }

    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        let direction = direction.try_normalize()?;
        let mut best: Option<RayHit> = None;
        let mut consider = |distance: Option<f32>, target: Option<ActorId>| {
            if let Some(distance) = distance.filter(|d| *d <= max_distance) {
                if best.map(|hit| distance < hit.distance).unwrap_or(true) {
                    best = Some(RayHit {
                        target,
                        point: origin + direction * distance,
                        distance,
                    });
                }
            }
        };

        for obstacle in &self.obstacles {
            consider(ray_sphere(origin, direction, obstacle.center, obstacle.radius), None);
        }
        for target in self.targets.iter().filter(|target| target.health.is_alive()) {
            let center = target.position + Vec3::Y * TARGET_AIM_HEIGHT;
            // Цилиндр высотой ~2м аппроксимируем сферой с запасом по высоте
            consider(
                ray_sphere(origin, direction, center, target.radius + 0.5),
                Some(target.id),
            );
        }
        best
    }
}

impl DamageReceiver for OpenArena {
    fn take_damage(&mut self, target: ActorId, amount: f32, kind: DamageKind, source: ActorId) -> bool {
        let acknowledged = match self.target_mut(target) {
            Some(entry) if entry.health.is_alive() => {
                entry.health.take_damage(amount);
                true
            }
            _ => false,
        };
        self.damage_log.push(DamageRecord {
            target,
            amount,
            kind,
            source,
            acknowledged,
        });
        acknowledged
    }
}

impl PresentationSink for OpenArena {
    fn cue(&mut self, cue: PresentationCue) {
        if self.record_cues {
            self.cues.push(cue);
        }
    }
}

fn flat_distance(a: Vec3, b: Vec3) -> f32 {
    Vec2::new(a.x - b.x, a.z - b.z).length()
}

/// Кратчайшая дистанция от точки до отрезка
fn segment_sphere_distance(from: Vec3, to: Vec3, center: Vec3) -> f32 {
    let segment = to - from;
    let length_sq = segment.length_squared();
    if length_sq <= f32::EPSILON {
        return from.distance(center);
    }
    let t = ((center - from).dot(segment) / length_sq).clamp(0.0, 1.0);
    (from + segment * t).distance(center)
}

/// Дистанция вдоль луча до первого пересечения со сферой
fn ray_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let to_center = center - origin;
    let along = to_center.dot(direction);
    let closest_sq = to_center.length_squared() - along * along;
    let radius_sq = radius * radius;
    if closest_sq > radius_sq {
        return None;
    }
    let half_chord = (radius_sq - closest_sq).sqrt();
    let near = along - half_chord;
    let far = along + half_chord;
    if far < 0.0 {
        return None;
    }
    Some(near.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_los_blocked_by_obstacle() {
        let arena = OpenArena::new(20.0).with_obstacle(Vec3::new(0.0, 1.0, 5.0), 1.0);
        assert!(arena.is_blocked(Vec3::new(0.0, 1.6, 0.0), Vec3::new(0.0, 1.0, 10.0)));
        assert!(!arena.is_blocked(Vec3::new(5.0, 1.6, 0.0), Vec3::new(5.0, 1.0, 10.0)));
    }

    #[test]
    fn test_islands_are_unreachable_from_outside() {
        let arena = OpenArena::new(20.0).with_island(Vec3::new(10.0, 0.0, 10.0), 3.0);
        let outside = Vec3::ZERO;
        let inside = Vec3::new(10.0, 0.0, 11.0);
        assert!(arena.is_walkable(inside));
        assert!(!arena.is_reachable(outside, inside));
        assert!(arena.is_reachable(inside, Vec3::new(11.0, 0.0, 10.0)));
    }

    #[test]
    fn test_damage_is_logged_and_dead_targets_reject() {
        let mut arena = OpenArena::new(20.0);
        arena.add_target(ActorId(1), Vec3::ZERO, 20.0);

        assert!(arena.take_damage(ActorId(1), 15.0, DamageKind::Physical, ActorId(99)));
        assert!(arena.take_damage(ActorId(1), 15.0, DamageKind::Physical, ActorId(99)));
        assert!(!arena.take_damage(ActorId(1), 15.0, DamageKind::Physical, ActorId(99)));
        assert!(!arena.take_damage(ActorId(2), 15.0, DamageKind::Physical, ActorId(99)));

        assert_eq!(arena.damage_taken(ActorId(1)), 30.0);
        assert_eq!(arena.damage_log.len(), 4);
    }

    #[test]
    fn test_raycast_hits_nearest() {
        let mut arena = OpenArena::new(20.0).with_obstacle(Vec3::new(0.0, 1.0, 8.0), 1.0);
        arena.add_target(ActorId(1), Vec3::new(0.0, 0.0, 4.0), 10.0);

        let hit = arena
            .raycast(Vec3::new(0.0, 1.0, 0.0), Vec3::Z, 20.0)
            .unwrap();
        assert_eq!(hit.target, Some(ActorId(1)));

        arena.move_target(ActorId(1), Vec3::new(0.0, 0.0, 12.0));
        let hit = arena
            .raycast(Vec3::new(0.0, 1.0, 0.0), Vec3::Z, 20.0)
            .unwrap();
        assert_eq!(hit.target, None);
    }

    #[test]
    fn test_path_detours_around_obstacle() {
        let mut arena = OpenArena::new(20.0).with_obstacle(Vec3::new(0.0, 0.0, 5.0), 1.0);
        let steer = arena.request_path(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0)).unwrap();
        assert!(steer.x.abs() > 1.0, "steer = {:?}", steer);

        let direct = arena.request_path(Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0)).unwrap();
        assert_eq!(direct, Vec3::new(5.0, 0.0, 0.0));

        assert!(arena.request_path(Vec3::ZERO, Vec3::new(0.0, 0.0, 30.0)).is_none());
    }
}
