//! Encounter definitions (spawn pool, placement, end conditions)

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Одна запись spawn pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnEntry {
    pub archetype: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
    /// Максимум экземпляров этого типа за encounter (None — без лимита)
    #[serde(default)]
    pub max_count: Option<u32>,
}

fn default_weight() -> u32 {
    1
}

impl SpawnEntry {
    pub fn new(archetype: impl Into<String>, weight: u32) -> Self {
        Self {
            archetype: archetype.into(),
            weight,
            max_count: None,
        }
    }

    pub fn with_cap(mut self, max_count: u32) -> Self {
        self.max_count = Some(max_count);
        self
    }
}

/// Настройки группы, которую director создаёт под encounter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupSettings {
    pub max_attackers: usize,
    /// Минимальная дистанция между двумя атакующими
    pub min_attacker_spacing: f32,
    pub share_targets: bool,
    /// Максимум участников группы
    pub capacity: usize,
}

impl Default for GroupSettings {
    fn default() -> Self {
        Self {
            max_attackers: 2,
            min_attacker_spacing: 1.5,
            share_targets: true,
            capacity: 32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterDef {
    pub id: String,
    pub spawn_pool: Vec<SpawnEntry>,
    pub min_count: u32,
    pub max_count: u32,
    /// Пауза между спавнами (0 — все сразу)
    pub stagger_interval: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Предпочитать точки вне поля зрения anchor
    pub avoid_view_cone: bool,
    pub view_half_angle_deg: f32,
    pub require_reachable: bool,
    pub max_spawn_attempts: u32,
    /// Лимит длительности (секунды)
    pub max_duration: Option<f32>,
    pub end_on_all_dead: bool,
    pub group: Option<GroupSettings>,
}

impl Default for EncounterDef {
    fn default() -> Self {
        Self {
            id: "encounter".to_string(),
            spawn_pool: Vec::new(),
            min_count: 1,
            max_count: 1,
            stagger_interval: 0.0,
            min_distance: 10.0,
            max_distance: 20.0,
            avoid_view_cone: true,
            view_half_angle_deg: 45.0,
            require_reachable: true,
            max_spawn_attempts: 12,
            max_duration: None,
            end_on_all_dead: true,
            group: None,
        }
    }
}

impl EncounterDef {
    /// Проверка без знания archetypes (их проверяет director по ContentLibrary)
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spawn_pool.is_empty() || self.spawn_pool.iter().all(|entry| entry.weight == 0) {
            return Err(ConfigError::EmptySpawnPool {
                encounter: self.id.clone(),
            });
        }
        if self.max_count == 0 || self.min_count > self.max_count {
            return Err(ConfigError::InvalidCountRange {
                encounter: self.id.clone(),
                min: self.min_count,
                max: self.max_count,
            });
        }
        if self.min_distance < 0.0 || self.max_distance < self.min_distance {
            return Err(ConfigError::InvalidDistanceBand {
                encounter: self.id.clone(),
                min: self.min_distance,
                max: self.max_distance,
            });
        }
        if self.stagger_interval < 0.0 {
            return Err(ConfigError::InvalidEncounter {
                encounter: self.id.clone(),
                reason: "stagger_interval must not be negative".to_string(),
            });
        }
        if self.max_spawn_attempts == 0 {
            return Err(ConfigError::InvalidEncounter {
                encounter: self.id.clone(),
                reason: "max_spawn_attempts must be at least 1".to_string(),
            });
        }
        if let Some(group) = &self.group {
            if group.max_attackers == 0 || group.capacity == 0 {
                return Err(ConfigError::InvalidEncounter {
                    encounter: self.id.clone(),
                    reason: "group needs at least one attacker slot and member".to_string(),
                });
            }
        }
        Ok(())
    }
}
