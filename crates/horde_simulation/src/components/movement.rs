//! Movement: kinematic state агента и high-level intent от states

use bevy::prelude::*;

/// Команда движения (пишет текущий state, исполняет AgentController)
///
/// Архитектура:
/// - State пишет MoveIntent (high-level intent)
/// - Controller спрашивает Navigation steering точку
/// - Kinematics интегрирует позицию (move speed × phase multiplier)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveIntent {
    /// Стоять на месте
    Hold,
    /// Двигаться к позиции; `speed_factor` — доля от move_speed (patrol ходит медленнее)
    MoveTo { destination: Vec3, speed_factor: f32 },
}

impl Default for MoveIntent {
    fn default() -> Self {
        Self::Hold
    }
}

/// Позиция и ориентация агента (симуляция authoritative)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    pub position: Vec3,
    /// Горизонтальный unit vector "вперёд"
    pub facing: Vec3,
    pub velocity: Vec3,
}

impl Kinematics {
    pub fn new(position: Vec3, facing: Vec3) -> Self {
        Self {
            position,
            facing: flat_direction(facing).unwrap_or(Vec3::Z),
            velocity: Vec3::ZERO,
        }
    }

    /// Поворот к точке не быстрее `turn_speed_deg` градусов в секунду.
    pub fn turn_towards(&mut self, point: Vec3, turn_speed_deg: f32, dt: f32) {
        let Some(desired) = flat_direction(point - self.position) else {
            return;
        };

        let angle = self.facing.angle_between(desired);
        let max_step = turn_speed_deg.to_radians() * dt;
        if angle <= max_step || angle <= f32::EPSILON {
            self.facing = desired;
            return;
        }

        // Знак вокруг Y; ровно противоположное направление (cross = 0) крутим влево
        let sign = if self.facing.cross(desired).y < 0.0 { -1.0 } else { 1.0 };
        let rotated = Quat::from_rotation_y(sign * max_step) * self.facing;
        self.facing = flat_direction(rotated).unwrap_or(desired);
    }

    /// Шаг к `waypoint`, не перелетая его. Возвращает пройденную дистанцию.
    pub fn step_towards(&mut self, waypoint: Vec3, speed: f32, dt: f32) -> f32 {
        let offset = waypoint - self.position;
        let distance = offset.length();
        if distance <= f32::EPSILON || speed <= 0.0 || dt <= 0.0 {
            self.velocity = Vec3::ZERO;
            return 0.0;
        }

        let step = (speed * dt).min(distance);
        let direction = offset / distance;
        self.position += direction * step;
        self.velocity = direction * (step / dt);
        step
    }

    pub fn stop(&mut self) {
        self.velocity = Vec3::ZERO;
    }
}

/// Горизонтальная проекция направления (y = 0), normalized.
pub fn flat_direction(v: Vec3) -> Option<Vec3> {
    let flat = Vec3::new(v.x, 0.0, v.z);
    flat.try_normalize()
}
