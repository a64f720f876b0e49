//! Базовые данные актора: ActorId, Health

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::environment::Vitality;

/// Stable ID актора (агент симуляции или внешняя сущность: игрок, турель)
///
/// Агенты получают ID из диапазона `BehaviorTimings::agent_id_base..`,
/// внешние сущности — из своего пула. Пересечения не проверяем.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Здоровье агента
///
/// Инвариант: 0 ≤ current ≤ max
/// `resistance` — множитель входящего урона (0.5 = половина урона)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Health {
    pub current: f32,
    pub max: f32,
    pub resistance: f32,
    pub invulnerable: bool,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0) // Default 100 HP
    }
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self {
            current: max,
            max,
            resistance: 1.0,
            invulnerable: false,
        }
    }

    pub fn with_resistance(mut self, resistance: f32) -> Self {
        self.resistance = resistance.max(0.0);
        self
    }

    /// Применяет урон с учётом resistance. Возвращает фактически снятое HP.
    ///
    /// Invulnerable или мёртвый актор урон не принимает (0.0).
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        if self.invulnerable || !self.is_alive() || amount <= 0.0 {
            return 0.0;
        }
        let effective = (amount * self.resistance).min(self.current);
        self.current -= effective;
        effective
    }

    pub fn heal(&mut self, amount: f32) {
        if !self.is_alive() {
            return;
        }
        self.current = (self.current + amount.max(0.0)).min(self.max);
    }

    /// Прямая установка (debug, тесты boss phases)
    pub fn set_current(&mut self, value: f32) {
        self.current = value.clamp(0.0, self.max);
    }
}

impl Vitality for Health {
    fn current(&self) -> f32 {
        self.current
    }

    fn max(&self) -> f32 {
        self.max
    }

    fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    fn is_invulnerable(&self) -> bool {
        self.invulnerable
    }

    fn set_invulnerable(&mut self, invulnerable: bool) {
        self.invulnerable = invulnerable;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_damage() {
        let mut health = Health::new(100.0);
        assert_eq!(health.current, 100.0);

        health.take_damage(30.0);
        assert_eq!(health.current, 70.0);
        assert!(health.is_alive());

        let dealt = health.take_damage(100.0); // clamp к нулю
        assert_eq!(dealt, 70.0);
        assert_eq!(health.current, 0.0);
        assert!(!health.is_alive());
    }

    #[test]
    fn test_health_resistance_and_invulnerability() {
        let mut health = Health::new(100.0).with_resistance(0.5);
        assert_eq!(health.take_damage(40.0), 20.0);
        assert_eq!(health.current, 80.0);

        health.set_invulnerable(true);
        assert_eq!(health.take_damage(40.0), 0.0);
        assert_eq!(health.current, 80.0);
    }

    #[test]
    fn test_health_heal() {
        let mut health = Health::new(100.0);
        health.take_damage(50.0);

        health.heal(30.0);
        assert_eq!(health.current, 80.0);

        health.heal(100.0); // Clamped to max
        assert_eq!(health.current, 100.0);
        assert_eq!(health.fraction(), 1.0);
    }

    #[test]
    fn test_dead_cannot_be_healed() {
        let mut health = Health::new(10.0);
        health.take_damage(10.0);
        health.heal(5.0);
        assert!(!health.is_alive());
    }
}
