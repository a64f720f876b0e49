//! Perception Target — запомненная (возможно устаревшая) запись о цели

use bevy::prelude::*;

use crate::components::ActorId;

/// Кого помним: реальную сущность или точку alert'а (выстрел, крик союзника)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TargetSource {
    Actor(ActorId),
    Position,
}

impl TargetSource {
    pub fn actor(&self) -> Option<ActorId> {
        match self {
            TargetSource::Actor(id) => Some(*id),
            TargetSource::Position => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerceptionTarget {
    pub source: TargetSource,
    /// Last-known position
    pub position: Vec3,
    pub last_seen: Option<f64>,
    pub last_heard: Option<f64>,
    /// Последнее восприятие любого вида (sight, hearing, alert)
    pub last_perceived: f64,
    pub visible: bool,
    pub audible: bool,
    pub distance: f32,
    pub priority: f32,
    pub score: f32,
    /// Монотонный счётчик обновлений (tie-break при равном score)
    pub sequence: u64,
}

impl PerceptionTarget {
    pub fn new(source: TargetSource, position: Vec3, priority: f32, now: f64, sequence: u64) -> Self {
        Self {
            source,
            position,
            last_seen: None,
            last_heard: None,
            last_perceived: now,
            visible: false,
            audible: false,
            distance: 0.0,
            priority,
            score: 0.0,
            sequence,
        }
    }

    pub fn age(&self, now: f64) -> f64 {
        now - self.last_perceived
    }

    /// Запись вышла за пределы памяти
    pub fn is_expired(&self, now: f64, memory_duration: f32) -> bool {
        self.age(now) > memory_duration as f64
    }

    /// score = priority × 100 + 50 (visible) + 25 (audible) − distance
    pub fn compute_score(&self) -> f32 {
        let mut score = self.priority * 100.0 - self.distance;
        if self.visible {
            score += 50.0;
        }
        if self.audible {
            score += 25.0;
        }
        score
    }

    /// Выше score побеждает; при равенстве — запись с более свежим обновлением
    pub fn outranks(&self, other: &PerceptionTarget) -> bool {
        if self.score != other.score {
            return self.score > other.score;
        }
        self.sequence > other.sequence
    }
}
