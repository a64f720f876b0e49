//! Perception — sight/hearing sensing, память и выбор primary target
//!
//! # Update flow (каждый tick)
//!
//! ```text
//! sensing due? (perception_hz) → sense(): candidates → sight/hearing → records
//!   ↓
//! refresh(): evict (age > memory_duration) → score → primary
//! ```
//!
//! Sensing throttled, а eviction и выбор primary идут каждый tick, поэтому
//! граница памяти точная и не зависит от частоты sensing.

use bevy::prelude::*;

use crate::components::{flat_direction, ActorId};
use crate::config::PerceptionParams;
use crate::environment::{LineOfSight, PerceivableSource};

use super::{PerceptionTarget, TargetSource};

/// Высота точки прицеливания над позицией цели (sight check, hitscan)
pub const TARGET_AIM_HEIGHT: f32 = 1.0;

/// Кто смотрит
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observer {
    pub id: ActorId,
    pub position: Vec3,
    pub facing: Vec3,
}

#[derive(Debug, Clone)]
pub struct Perception {
    params: PerceptionParams,
    interval: f64,
    next_sense_at: f64,
    records: Vec<PerceptionTarget>,
    sequence: u64,
    primary: Option<TargetSource>,
}

impl Perception {
    /// `interval` — период sensing (1 / perception_hz)
    pub fn new(params: PerceptionParams, interval: f32) -> Self {
        Self {
            params,
            interval: interval.max(0.0) as f64,
            next_sense_at: 0.0,
            records: Vec::new(),
            sequence: 0,
            primary: None,
        }
    }

    pub fn params(&self) -> &PerceptionParams {
        &self.params
    }

    pub fn records(&self) -> &[PerceptionTarget] {
        &self.records
    }

    pub fn record(&self, source: TargetSource) -> Option<&PerceptionTarget> {
        self.records.iter().find(|record| record.source == source)
    }

    pub fn primary(&self) -> Option<&PerceptionTarget> {
        self.primary.and_then(|source| self.record(source))
    }

    pub fn is_sensing_due(&self, now: f64) -> bool {
        now >= self.next_sense_at
    }

    /// Полный per-tick update: throttled sensing + eviction + selection.
    pub fn update<P>(&mut self, now: f64, observer: Observer, world: &P) -> Option<&PerceptionTarget>
    where
        P: PerceivableSource + LineOfSight + ?Sized,
    {
        if self.is_sensing_due(now) {
            self.sense(now, observer, world);
            self.next_sense_at = now + self.interval;
        }
        self.refresh(now, observer.position)
    }

    /// Один проход sensing. Флаги visible/audible отражают последний проход.
    pub fn sense<P>(&mut self, now: f64, observer: Observer, world: &P)
    where
        P: PerceivableSource + LineOfSight + ?Sized,
    {
        for record in &mut self.records {
            record.visible = false;
            record.audible = false;
        }

        let radius = self.params.max_range();
        for candidate in world.perceivables_near(observer.position, radius) {
            if candidate.id == observer.id || !candidate.perceivable {
                continue;
            }

            let visible = self.can_see(observer, candidate.position, world);
            let audible = self.can_hear(observer.position, candidate.position, candidate.noise_level);
            if !visible && !audible {
                continue;
            }

            self.sequence += 1;
            let sequence = self.sequence;
            let source = TargetSource::Actor(candidate.id);
            let record = match self.records.iter().position(|record| record.source == source) {
                Some(index) => &mut self.records[index],
                None => {
                    self.records.push(PerceptionTarget::new(
                        source,
                        candidate.position,
                        candidate.priority,
                        now,
                        sequence,
                    ));
                    let last = self.records.len() - 1;
                    &mut self.records[last]
                }
            };

            record.position = candidate.position;
            record.priority = candidate.priority;
            record.last_perceived = now;
            record.sequence = sequence;
            record.visible = visible;
            record.audible = audible;
            if visible {
                record.last_seen = Some(now);
            }
            if audible {
                record.last_heard = Some(now);
            }
        }
    }

    /// Eviction + scoring + выбор primary.
    pub fn refresh(&mut self, now: f64, observer_position: Vec3) -> Option<&PerceptionTarget> {
        let memory = self.params.memory_duration;
        self.records.retain(|record| !record.is_expired(now, memory));

        let mut best: Option<usize> = None;
        for index in 0..self.records.len() {
            let record = &mut self.records[index];
            record.distance = record.position.distance(observer_position);
            record.score = record.compute_score();

            best = match best {
                Some(current) if !self.records[index].outranks(&self.records[current]) => Some(current),
                _ => Some(index),
            };
        }

        self.primary = best.map(|index| self.records[index].source);
        best.map(|index| &self.records[index])
    }

    /// Alert без реального восприятия (выстрел, крик союзника).
    ///
    /// Держим одну position-запись: новый alert заменяет предыдущий.
    pub fn alert_to_position(&mut self, now: f64, position: Vec3, priority: f32) {
        self.sequence += 1;
        let sequence = self.sequence;
        self.records.retain(|record| record.source != TargetSource::Position);
        self.records.push(PerceptionTarget::new(
            TargetSource::Position,
            position,
            priority,
            now,
            sequence,
        ));
    }

    /// Alert о конкретном акторе (атакующий, shared target группы)
    pub fn alert_to_actor(&mut self, now: f64, actor: ActorId, position: Vec3, priority: f32) {
        self.sequence += 1;
        let sequence = self.sequence;
        let source = TargetSource::Actor(actor);
        match self.records.iter_mut().find(|record| record.source == source) {
            Some(record) => {
                record.position = position;
                record.priority = record.priority.max(priority);
                record.last_perceived = now;
                record.sequence = sequence;
            }
            None => self
                .records
                .push(PerceptionTarget::new(source, position, priority, now, sequence)),
        }
    }

    pub fn forget(&mut self, source: TargetSource) {
        self.records.retain(|record| record.source != source);
        if self.primary == Some(source) {
            self.primary = None;
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.primary = None;
    }

    /// range ∧ half-angle ∧ нет occluder между eye point и целью
    pub fn can_see<L>(&self, observer: Observer, target: Vec3, los: &L) -> bool
    where
        L: LineOfSight + ?Sized,
    {
        let offset = target - observer.position;
        if offset.length() > self.params.sight_range {
            return false;
        }

        if let Some(direction) = flat_direction(offset) {
            let angle = observer.facing.angle_between(direction).to_degrees();
            if angle > self.params.sight_half_angle_deg {
                return false;
            }
        }

        let eye = self.eye_point(observer.position);
        !los.is_blocked(eye, target + Vec3::Y * TARGET_AIM_HEIGHT)
    }

    /// Слышимость: distance ≤ hearing_range × noise (noise clamp в [0, 1])
    pub fn can_hear(&self, listener: Vec3, target: Vec3, noise_level: f32) -> bool {
        let range = self.params.hearing_range * noise_level.clamp(0.0, 1.0);
        range > 0.0 && listener.distance(target) <= range
    }

    pub fn eye_point(&self, position: Vec3) -> Vec3 {
        position + Vec3::Y * self.params.eye_height
    }
}
