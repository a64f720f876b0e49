//! GroupCoordinator — attack slots + обмен целями внутри группы
//!
//! Агенты не трогают чужие контексты. Всё, что группа "говорит" участникам,
//! копится в outbox (`GroupDelivery`) и доставляется симуляцией в начале
//! следующего tick, до update агентов.

use std::collections::{BTreeMap, BTreeSet};

use bevy::prelude::*;

use crate::components::ActorId;
use crate::config::GroupSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub u32);

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "group#{}", self.0)
    }
}

/// Что группа доставляет участнику
#[derive(Debug, Clone, PartialEq)]
pub enum GroupDelivery {
    /// Shared target: применяется только если у участника нет своей цели
    Alert { target: ActorId, position: Vec3 },
    /// Именованный сигнал ("retreat", ...), интерпретирует сам агент
    Signal(String),
}

#[derive(Debug, Clone)]
pub struct GroupCoordinator {
    id: GroupId,
    settings: GroupSettings,
    members: BTreeSet<ActorId>,
    /// Держатели attack slot → позиция на момент последнего обновления
    attackers: BTreeMap<ActorId, Vec3>,
    shared_target: Option<(ActorId, Vec3)>,
    outbox: Vec<(ActorId, GroupDelivery)>,
}

impl GroupCoordinator {
    pub fn new(id: GroupId, settings: GroupSettings) -> Self {
        Self {
            id,
            settings,
            members: BTreeSet::new(),
            attackers: BTreeMap::new(),
            shared_target: None,
            outbox: Vec::new(),
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn settings(&self) -> &GroupSettings {
        &self.settings
    }

    pub fn members(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.members.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, agent: ActorId) -> bool {
        self.members.contains(&agent)
    }

    pub fn shared_target(&self) -> Option<(ActorId, Vec3)> {
        self.shared_target
    }

    /// false — группа заполнена
    pub fn join(&mut self, agent: ActorId) -> bool {
        if self.members.contains(&agent) {
            return true;
        }
        if self.members.len() >= self.settings.capacity {
            crate::logger::log_warning(&format!(
                "{}: {} rejected, group is full ({})",
                self.id, agent, self.settings.capacity
            ));
            return false;
        }
        self.members.insert(agent);
        true
    }

    /// Выход (смерть, teardown). Slot освобождается.
    pub fn leave(&mut self, agent: ActorId) {
        self.members.remove(&agent);
        self.attackers.remove(&agent);
        self.outbox.retain(|(recipient, _)| *recipient != agent);
    }

    pub fn active_attackers(&self) -> usize {
        self.attackers.len()
    }

    pub fn holds_slot(&self, agent: ActorId) -> bool {
        self.attackers.contains_key(&agent)
    }

    /// Slot выдаётся если атакующих меньше лимита и агент дальше
    /// `min_attacker_spacing` от каждого текущего атакующего.
    pub fn request_attack_slot(&mut self, agent: ActorId, position: Vec3) -> bool {
        if !self.members.contains(&agent) {
            return false;
        }
        if let Some(held) = self.attackers.get_mut(&agent) {
            *held = position;
            return true;
        }
        if self.attackers.len() >= self.settings.max_attackers {
            return false;
        }

        let spacing = self.settings.min_attacker_spacing;
        let crowded = self
            .attackers
            .values()
            .any(|other| other.distance(position) <= spacing);
        if crowded {
            return false;
        }

        self.attackers.insert(agent, position);
        crate::logger::log(&format!(
            "🎟️ {}: attack slot → {} ({}/{})",
            self.id,
            agent,
            self.attackers.len(),
            self.settings.max_attackers
        ));
        true
    }

    pub fn release_attack_slot(&mut self, agent: ActorId) {
        if self.attackers.remove(&agent).is_some() {
            crate::logger::log(&format!("🎟️ {}: attack slot released by {}", self.id, agent));
        }
    }

    pub fn update_attacker_position(&mut self, agent: ActorId, position: Vec3) {
        if let Some(held) = self.attackers.get_mut(&agent) {
            *held = position;
        }
    }

    /// Shared target → alert всем участникам кроме `from`.
    ///
    /// Участник применяет alert только если у него нет своей цели.
    pub fn share_target(&mut self, from: Option<ActorId>, target: ActorId, position: Vec3) {
        if !self.settings.share_targets {
            return;
        }
        let changed = self.shared_target.map(|(id, _)| id) != Some(target);
        self.shared_target = Some((target, position));
        if !changed {
            return;
        }

        for member in self.members.iter().copied() {
            if Some(member) == from {
                continue;
            }
            self.outbox.push((member, GroupDelivery::Alert { target, position }));
        }
    }

    pub fn clear_shared_target(&mut self) {
        self.shared_target = None;
    }

    /// Сигнал всем живым участникам
    pub fn broadcast(&mut self, signal: &str) {
        crate::logger::log_info(&format!(
            "📣 {}: broadcast '{}' to {} members",
            self.id,
            signal,
            self.members.len()
        ));
        for member in self.members.iter().copied() {
            self.outbox.push((member, GroupDelivery::Signal(signal.to_string())));
        }
    }

    pub fn drain_deliveries(&mut self) -> Vec<(ActorId, GroupDelivery)> {
        std::mem::take(&mut self.outbox)
    }
}
