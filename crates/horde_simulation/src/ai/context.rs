//! AgentContext (blackboard) + Services
//!
//! Контекст принадлежит одному контроллеру. States читают и пишут его,
//! но никогда не трогают чужие контексты: всё межагентное идёт через
//! `Services::groups` и perception alerts.

use std::sync::Arc;

use bevy::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::combat::{AbilityExecutor, Attacker, ProjectileStore};
use crate::components::{flat_direction, ActorId, Health, Kinematics, MoveIntent};
use crate::config::{Archetype, BehaviorTimings, SimulationSettings};
use crate::group::{GroupId, GroupRegistry};
use crate::perception::{Observer, Perception, PerceptionTarget, TargetSource, TARGET_AIM_HEIGHT};

use super::AgentEvent;

/// Shared services, доступные states через `W` параметр state machine
pub struct Services<E> {
    pub env: E,
    pub groups: GroupRegistry,
    pub projectiles: ProjectileStore,
}

impl<E> Services<E> {
    pub fn new(env: E) -> Self {
        Self {
            env,
            groups: GroupRegistry::new(),
            projectiles: ProjectileStore::new(),
        }
    }
}

/// Primary target на этот tick (копия из Perception)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetSnapshot {
    pub source: TargetSource,
    pub actor: Option<ActorId>,
    pub position: Vec3,
    pub visible: bool,
    pub distance: f32,
}

impl From<&PerceptionTarget> for TargetSnapshot {
    fn from(record: &PerceptionTarget) -> Self {
        Self {
            source: record.source,
            actor: record.source.actor(),
            position: record.position,
            visible: record.visible,
            distance: record.distance,
        }
    }
}

/// Кэш locomotion (пишет только controller)
#[derive(Debug, Clone, Default)]
pub struct LocomotionState {
    /// Steering точка от Navigation
    pub waypoint: Option<Vec3>,
    /// Destination, под который запрошен waypoint
    pub destination: Option<Vec3>,
    pub next_repath_at: f64,
    /// Последний request_path вернул None
    pub path_failed: bool,
    /// Пройдено за прошлый tick (stuck detection)
    pub last_step: f32,
}

pub struct AgentContext {
    pub id: ActorId,
    pub archetype: Arc<Archetype>,
    pub settings: Arc<SimulationSettings>,

    pub kinematics: Kinematics,
    pub spawn_point: Vec3,
    pub health: Health,
    pub perception: Perception,
    pub executor: AbilityExecutor,

    /// Куда идти (пишет state)
    pub move_intent: MoveIntent,
    /// Куда смотреть; None — по направлению движения
    pub look_at: Option<Vec3>,
    pub locomotion: LocomotionState,

    /// Время текущего tick
    pub now: f64,

    // Blackboard
    pub target: Option<TargetSnapshot>,
    pub last_known_position: Option<Vec3>,
    pub time_since_target_seen: f32,
    pub last_attack_at: Option<f64>,
    pub ability_in_progress: bool,
    pub patrol_destination: Option<Vec3>,
    pub stuck_timer: f32,
    /// Сколько boss phases достигнуто (0 — базовая)
    pub boss_phase: usize,
    pub state_entered_at: f64,
    pub holds_attack_slot: bool,
    pub group: Option<GroupId>,
    pub pending_signals: Vec<String>,
    /// Deadline внешнего cleanup после смерти
    pub cleanup_at: Option<f64>,
    pub last_damage_source: Option<ActorId>,

    /// Phase speed multiplier
    pub speed_multiplier: f32,
    pub rng: ChaCha8Rng,
    pub events: Vec<AgentEvent>,
}

impl AgentContext {
    pub fn timings(&self) -> &BehaviorTimings {
        &self.settings.timings
    }

    pub fn position(&self) -> Vec3 {
        self.kinematics.position
    }

    pub fn time_in_state(&self) -> f32 {
        (self.now - self.state_entered_at) as f32
    }

    pub fn observer(&self) -> Observer {
        Observer {
            id: self.id,
            position: self.kinematics.position,
            facing: self.kinematics.facing,
        }
    }

    pub fn attacker(&self) -> Attacker {
        Attacker {
            id: self.id,
            position: self.kinematics.position,
            facing: self.kinematics.facing,
            muzzle: self.perception.eye_point(self.kinematics.position),
        }
    }

    /// Куда целиться по цели (центр корпуса)
    pub fn aim_point(&self) -> Option<Vec3> {
        self.target.map(|target| target.position + Vec3::Y * TARGET_AIM_HEIGHT)
    }

    pub fn can_move(&self) -> bool {
        self.archetype.movement.can_move()
    }

    pub fn move_to(&mut self, destination: Vec3, speed_factor: f32) {
        self.move_intent = MoveIntent::MoveTo {
            destination,
            speed_factor,
        };
    }

    pub fn hold(&mut self) {
        self.move_intent = MoveIntent::Hold;
    }

    /// Горизонтальная дистанция до точки
    pub fn flat_distance_to(&self, point: Vec3) -> f32 {
        let offset = point - self.kinematics.position;
        Vec3::new(offset.x, 0.0, offset.z).length()
    }

    /// Направление "от угрозы" (fallback — назад от facing)
    pub fn away_from(&self, threat: Vec3) -> Vec3 {
        flat_direction(self.kinematics.position - threat).unwrap_or(-self.kinematics.facing)
    }

    /// Перенести primary target из perception в blackboard.
    pub fn apply_primary(&mut self, primary: Option<TargetSnapshot>, dt: f32) {
        match primary {
            Some(snapshot) => {
                self.last_known_position = Some(snapshot.position);
                if snapshot.visible {
                    self.time_since_target_seen = 0.0;
                } else {
                    self.time_since_target_seen += dt;
                }
                self.target = Some(snapshot);
            }
            None => {
                self.time_since_target_seen += dt;
                self.target = None;
            }
        }
    }

    pub fn emit(&mut self, event: AgentEvent) {
        self.events.push(event);
    }
}
