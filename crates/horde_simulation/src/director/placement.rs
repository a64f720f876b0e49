//! Выбор точки спавна вокруг anchor
//!
//! Кольцо [min_distance, max_distance] по горизонтали, ограниченное число попыток.
//! Точки вне view cone anchor предпочтительнее; если нашлись только точки
//! внутри конуса — берём первую из них.

use bevy::prelude::*;
use rand::Rng;

use crate::config::EncounterDef;
use crate::environment::Navigation;

/// Погрешность snap'а навмеша при проверке кольца
const BAND_EPSILON: f32 = 0.05;

/// Точка, вокруг которой строится encounter (обычно игрок)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub position: Vec3,
    /// Направление взгляда (для view cone). Нулевой вектор — конуса нет.
    pub forward: Vec3,
}

impl Anchor {
    pub fn new(position: Vec3, forward: Vec3) -> Self {
        Self { position, forward }
    }

    /// Точка в конусе взгляда (угол от forward ≤ half_angle_deg)
    pub fn sees(&self, point: Vec3, half_angle_deg: f32) -> bool {
        let Some(forward) = self.forward.with_y(0.0).try_normalize() else {
            return false;
        };
        let Some(to_point) = (point - self.position).with_y(0.0).try_normalize() else {
            return true;
        };
        forward.dot(to_point) >= half_angle_deg.to_radians().cos()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementRules {
    pub min_distance: f32,
    pub max_distance: f32,
    pub avoid_view_cone: bool,
    pub view_half_angle_deg: f32,
    pub require_reachable: bool,
    pub max_attempts: u32,
}

impl From<&EncounterDef> for PlacementRules {
    fn from(def: &EncounterDef) -> Self {
        Self {
            min_distance: def.min_distance,
            max_distance: def.max_distance,
            avoid_view_cone: def.avoid_view_cone,
            view_half_angle_deg: def.view_half_angle_deg,
            require_reachable: def.require_reachable,
            max_attempts: def.max_spawn_attempts,
        }
    }
}

impl PlacementRules {
    fn in_band(&self, anchor: &Anchor, point: Vec3) -> bool {
        let distance = (point - anchor.position).with_y(0.0).length();
        distance >= self.min_distance - BAND_EPSILON && distance <= self.max_distance + BAND_EPSILON
    }
}

/// Найти walkable точку спавна. None — за `max_attempts` ничего не подошло.
pub fn find_spawn_point<N, R>(anchor: &Anchor, rules: &PlacementRules, nav: &N, rng: &mut R) -> Option<Vec3>
where
    N: Navigation + ?Sized,
    R: Rng + ?Sized,
{
    let mut in_view_fallback = None;

    for _ in 0..rules.max_attempts.max(1) {
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let distance = rng.gen_range(rules.min_distance..=rules.max_distance);
        let candidate = anchor.position + Vec3::new(angle.cos(), 0.0, angle.sin()) * distance;

        let Some(point) = nav.sample_walkable(candidate) else {
            continue;
        };
        // sample_walkable может сдвинуть точку за пределы кольца
        if !rules.in_band(anchor, point) {
            continue;
        }
        if rules.require_reachable && !nav.is_reachable(point, anchor.position) {
            continue;
        }
        if rules.avoid_view_cone && anchor.sees(point, rules.view_half_angle_deg) {
            in_view_fallback.get_or_insert(point);
            continue;
        }
        return Some(point);
    }

    in_view_fallback
}
