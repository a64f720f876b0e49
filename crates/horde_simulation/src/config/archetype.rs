//! Archetype — immutable шаблон одного вида агентов
//!
//! Создаётся content pipeline, в runtime только читается (`Arc<Archetype>`
//! разделяется всеми экземплярами).

use serde::{Deserialize, Serialize};

use super::{Ability, ConfigError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementStyle {
    #[default]
    Ground,
    /// Летает напрямую, навмеш не спрашивает
    Flying,
    /// Турели, тотемы: поворачиваются, но не двигаются
    Stationary,
    Burrowing,
}

impl MovementStyle {
    pub fn can_move(&self) -> bool {
        !matches!(self, MovementStyle::Stationary)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatStyle {
    #[default]
    Melee,
    Ranged,
    Hybrid,
    Support,
    /// Взрывается после первого execute
    Kamikaze,
}

impl CombatStyle {
    /// Ranged-стили держат дистанцию через Positioning вместо лобовой атаки
    pub fn uses_positioning(&self) -> bool {
        matches!(self, CombatStyle::Ranged | CombatStyle::Hybrid | CombatStyle::Support)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionParams {
    pub sight_range: f32,
    /// Половина угла обзора (градусы)
    pub sight_half_angle_deg: f32,
    pub hearing_range: f32,
    /// Сколько секунд помним цель после последнего восприятия
    pub memory_duration: f32,
    pub eye_height: f32,
}

impl Default for PerceptionParams {
    fn default() -> Self {
        Self {
            sight_range: 20.0,
            sight_half_angle_deg: 60.0,
            hearing_range: 10.0,
            memory_duration: 5.0,
            eye_height: 1.6,
        }
    }
}

impl PerceptionParams {
    pub fn max_range(&self) -> f32 {
        self.sight_range.max(self.hearing_range)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatrolParams {
    pub enabled: bool,
    /// Радиус вокруг spawn точки
    pub radius: f32,
    /// Доля от move_speed
    pub speed_factor: f32,
}

impl Default for PatrolParams {
    fn default() -> Self {
        Self {
            enabled: true,
            radius: 8.0,
            speed_factor: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleeParams {
    pub enabled: bool,
    /// Бежим когда health fraction ≤ этого значения
    pub health_fraction: f32,
}

impl Default for FleeParams {
    fn default() -> Self {
        Self {
            enabled: false,
            health_fraction: 0.2,
        }
    }
}

/// Одна boss phase. Порядок в списке = порядок срабатывания.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossPhaseDef {
    pub name: String,
    /// Фаза срабатывает когда health fraction падает НИЖЕ порога
    pub health_threshold: f32,
    pub speed_multiplier: f32,
    pub damage_multiplier: f32,
    /// Новый набор abilities (None — оставляем текущий)
    pub abilities: Option<Vec<Ability>>,
    pub primary_ability: usize,
}

impl Default for BossPhaseDef {
    fn default() -> Self {
        Self {
            name: "enraged".to_string(),
            health_threshold: 0.5,
            speed_multiplier: 1.0,
            damage_multiplier: 1.0,
            abilities: None,
            primary_ability: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Archetype {
    pub id: String,
    pub max_health: f32,
    /// Множитель входящего урона
    pub damage_resistance: f32,
    pub movement: MovementStyle,
    /// м/с
    pub move_speed: f32,
    /// градусы/сек
    pub turn_speed_deg: f32,
    pub combat_style: CombatStyle,
    pub preferred_range: f32,
    pub attack_range: f32,
    pub perception: PerceptionParams,
    pub abilities: Vec<Ability>,
    pub primary_ability: usize,
    pub boss_phases: Vec<BossPhaseDef>,
    pub patrol: PatrolParams,
    pub flee: FleeParams,
    /// Шанс stagger (Hurt) на любой полученный урон
    pub stagger_chance: f32,
}

impl Default for Archetype {
    fn default() -> Self {
        Self {
            id: "grunt".to_string(),
            max_health: 100.0,
            damage_resistance: 1.0,
            movement: MovementStyle::Ground,
            move_speed: 3.5,
            turn_speed_deg: 360.0,
            combat_style: CombatStyle::Melee,
            preferred_range: 1.5,
            attack_range: 2.0,
            perception: PerceptionParams::default(),
            abilities: vec![Ability::default()],
            primary_ability: 0,
            boss_phases: Vec::new(),
            patrol: PatrolParams::default(),
            flee: FleeParams::default(),
            stagger_chance: 0.3,
        }
    }
}

impl Archetype {
    pub fn primary(&self) -> Option<&Ability> {
        self.abilities.get(self.primary_ability)
    }

    pub fn is_boss(&self) -> bool {
        !self.boss_phases.is_empty()
    }

    /// Проверка authoring ошибок. Вызывается на spawn, ошибки не глотаем.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidArchetype {
            archetype: self.id.clone(),
            reason,
        };

        if self.abilities.is_empty() || self.primary().is_none() {
            return Err(ConfigError::MissingPrimaryAbility {
                archetype: self.id.clone(),
            });
        }
        for ability in &self.abilities {
            ability.validate(&self.id)?;
        }

        if self.max_health <= 0.0 {
            return Err(invalid(format!("max_health must be positive, got {}", self.max_health)));
        }
        if self.damage_resistance < 0.0 {
            return Err(invalid("damage_resistance must not be negative".to_string()));
        }
        if self.move_speed < 0.0 || self.turn_speed_deg <= 0.0 {
            return Err(invalid("move/turn speed out of range".to_string()));
        }
        if self.attack_range <= 0.0 {
            return Err(invalid("attack_range must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&self.stagger_chance) {
            return Err(invalid(format!("stagger_chance {} outside [0, 1]", self.stagger_chance)));
        }
        if self.perception.memory_duration < 0.0 || self.perception.sight_half_angle_deg < 0.0 {
            return Err(invalid("perception parameters must not be negative".to_string()));
        }

        let mut last_threshold = 1.0;
        for (index, phase) in self.boss_phases.iter().enumerate() {
            let threshold = phase.health_threshold;
            if threshold <= 0.0 || threshold >= last_threshold {
                return Err(ConfigError::InvalidBossPhase {
                    archetype: self.id.clone(),
                    phase: index,
                    reason: format!(
                        "threshold {} must be in (0, {}) and strictly descending",
                        threshold, last_threshold
                    ),
                });
            }
            last_threshold = threshold;

            if phase.speed_multiplier <= 0.0 || phase.damage_multiplier < 0.0 {
                return Err(ConfigError::InvalidBossPhase {
                    archetype: self.id.clone(),
                    phase: index,
                    reason: "multipliers out of range".to_string(),
                });
            }

            if let Some(abilities) = &phase.abilities {
                if abilities.get(phase.primary_ability).is_none() {
                    return Err(ConfigError::MissingPrimaryAbility {
                        archetype: format!("{} (phase {})", self.id, index),
                    });
                }
                for ability in abilities {
                    ability.validate(&self.id)?;
                }
            }
        }

        Ok(())
    }
}
