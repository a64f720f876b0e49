//! Runtime settings симуляции (tick rate, seed, тайминги поведения)

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Глобальные настройки одного `Simulation`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Fixed tick rate (Hz)
    pub tick_hz: f32,
    /// Perception throttle (Hz), независимо от tick rate
    pub perception_hz: f32,
    pub seed: u64,
    pub timings: BehaviorTimings,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            tick_hz: 60.0,
            perception_hz: 10.0,
            seed: 42,
            timings: BehaviorTimings::default(),
        }
    }
}

impl SimulationSettings {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn tick_dt(&self) -> f32 {
        1.0 / self.tick_hz
    }

    pub fn perception_interval(&self) -> f32 {
        1.0 / self.perception_hz
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_hz <= 0.0 || self.perception_hz <= 0.0 {
            return Err(ConfigError::InvalidSettings(format!(
                "tick_hz ({}) and perception_hz ({}) must be positive",
                self.tick_hz, self.perception_hz
            )));
        }
        if self.timings.arrival_tolerance <= 0.0 {
            return Err(ConfigError::InvalidSettings(
                "arrival_tolerance must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Тайминги и пороги поведения states (секунды / метры)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorTimings {
    /// Idle → Patrol
    pub idle_grace: f32,
    /// Patrol: нет прогресса дольше → re-pick
    pub patrol_stuck_timeout: f32,
    /// Patrol: точка не достигнута за это время → re-pick
    pub patrol_repick_timeout: f32,
    pub patrol_pick_attempts: u32,
    pub chase_repath_interval: f32,
    /// Chase без сокращения дистанции → Idle
    pub chase_give_up_time: f32,
    /// Минимальное сокращение дистанции, которое считаем прогрессом
    pub chase_progress_epsilon: f32,
    pub positioning_reevaluate_interval: f32,
    /// Доля preferred_range, внутри которой позиция считается удержанной
    pub positioning_tolerance: f32,
    pub hurt_duration: f32,
    pub flee_distance: f32,
    pub flee_repick_interval: f32,
    pub death_cleanup_delay: f32,
    pub boss_transition_duration: f32,
    pub arrival_tolerance: f32,
    /// Melee sphere: центр = position + facing × (max_range × offset)
    pub melee_offset_factor: f32,
    /// Melee sphere: радиус = max_range × radius_factor
    pub melee_radius_factor: f32,
    /// Priority alert'а на атакующего после получения урона
    pub damage_alert_priority: f32,
    /// Первый ActorId, выдаваемый агентам
    pub agent_id_base: u64,
}

impl Default for BehaviorTimings {
    fn default() -> Self {
        Self {
            idle_grace: 1.0,
            patrol_stuck_timeout: 2.0,
            patrol_repick_timeout: 8.0,
            patrol_pick_attempts: 6,
            chase_repath_interval: 0.25,
            chase_give_up_time: 8.0,
            chase_progress_epsilon: 0.25,
            positioning_reevaluate_interval: 1.0,
            positioning_tolerance: 0.25,
            hurt_duration: 0.4,
            flee_distance: 12.0,
            flee_repick_interval: 1.5,
            death_cleanup_delay: 3.0,
            boss_transition_duration: 1.5,
            arrival_tolerance: 0.5,
            melee_offset_factor: 0.5,
            melee_radius_factor: 0.6,
            damage_alert_priority: 1.0,
            agent_id_base: 1 << 32,
        }
    }
}
