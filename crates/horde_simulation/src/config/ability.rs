//! Ability definitions (immutable, referenced by Archetype)

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Тип урона (для resistances/VFX на стороне получателя)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageKind {
    #[default]
    Physical,
    Fire,
    Poison,
    Energy,
    Explosive,
}

/// Как ability доставляет урон в Execute фазе
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AbilityDelivery {
    /// Overlap sphere перед агентом (радиус от max_range)
    #[default]
    MeleeArea,
    /// Мгновенный raycast
    Hitscan,
    /// Projectile, урон на первом qualifying collision
    Projectile {
        /// м/с
        speed: f32,
        /// секунды до самоуничтожения
        lifetime: f32,
    },
}

/// Ability
///
/// Фазы: windup (замах) → execute (удар/выстрел) → recovery (восстановление).
/// Cooldown считается от начала recovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ability {
    pub id: String,
    /// Cooldown между использованиями (секунды)
    pub cooldown: f32,
    pub windup: f32,
    pub execute: f32,
    pub recovery: f32,
    pub min_range: f32,
    pub max_range: f32,
    pub base_damage: f32,
    pub damage_kind: DamageKind,
    pub delivery: AbilityDelivery,
    /// Можно ли прервать windup (stagger, hurt)
    pub interruptible: bool,
    /// Доворачиваться к цели во время windup
    pub track_target: bool,
}

impl Default for Ability {
    fn default() -> Self {
        Self {
            id: "strike".to_string(),
            cooldown: 1.5,
            windup: 0.3,
            execute: 0.1,
            recovery: 0.4,
            min_range: 0.0,
            max_range: 2.0,
            base_damage: 10.0,
            damage_kind: DamageKind::Physical,
            delivery: AbilityDelivery::MeleeArea,
            interruptible: true,
            track_target: true,
        }
    }
}

impl Ability {
    pub fn melee(id: impl Into<String>, base_damage: f32, max_range: f32) -> Self {
        Self {
            id: id.into(),
            base_damage,
            max_range,
            ..Default::default()
        }
    }

    pub fn hitscan(id: impl Into<String>, base_damage: f32, max_range: f32) -> Self {
        Self {
            id: id.into(),
            base_damage,
            max_range,
            delivery: AbilityDelivery::Hitscan,
            ..Default::default()
        }
    }

    pub fn projectile(id: impl Into<String>, base_damage: f32, max_range: f32, speed: f32) -> Self {
        let lifetime = if speed > 0.0 { max_range / speed * 1.5 } else { 1.0 };
        Self {
            id: id.into(),
            base_damage,
            max_range,
            delivery: AbilityDelivery::Projectile { speed, lifetime },
            ..Default::default()
        }
    }

    pub fn with_timings(mut self, windup: f32, execute: f32, recovery: f32) -> Self {
        self.windup = windup;
        self.execute = execute;
        self.recovery = recovery;
        self
    }

    pub fn with_cooldown(mut self, cooldown: f32) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_min_range(mut self, min_range: f32) -> Self {
        self.min_range = min_range;
        self
    }

    pub fn with_kind(mut self, kind: DamageKind) -> Self {
        self.damage_kind = kind;
        self
    }

    pub fn uninterruptible(mut self) -> Self {
        self.interruptible = false;
        self
    }

    /// Полная длительность одного использования
    pub fn total_duration(&self) -> f32 {
        self.windup + self.execute + self.recovery
    }

    pub fn in_range(&self, distance: f32) -> bool {
        distance >= self.min_range && distance <= self.max_range
    }

    pub fn validate(&self, archetype: &str) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidAbility {
            archetype: archetype.to_string(),
            ability: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.windup < 0.0 || self.execute < 0.0 || self.recovery < 0.0 || self.cooldown < 0.0 {
            return Err(invalid("negative duration"));
        }
        if self.max_range <= 0.0 || self.min_range < 0.0 || self.min_range > self.max_range {
            return Err(invalid("range band is empty"));
        }
        if self.base_damage < 0.0 {
            return Err(invalid("negative base damage"));
        }
        if let AbilityDelivery::Projectile { speed, lifetime } = self.delivery {
            if speed <= 0.0 || lifetime <= 0.0 {
                return Err(invalid("projectile needs positive speed and lifetime"));
            }
        }
        Ok(())
    }
}
