//! GroupRegistry — владение группами по GroupId

use std::collections::BTreeMap;

use bevy::prelude::*;

use crate::components::ActorId;
use crate::config::GroupSettings;

use super::{GroupCoordinator, GroupDelivery, GroupId};

#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: BTreeMap<GroupId, GroupCoordinator>,
    next_id: u32,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, settings: GroupSettings) -> GroupId {
        self.next_id += 1;
        let id = GroupId(self.next_id);
        self.groups.insert(id, GroupCoordinator::new(id, settings));
        crate::logger::log_info(&format!(
            "👥 {} created (max attackers {}, spacing {:.1})",
            id, settings.max_attackers, settings.min_attacker_spacing
        ));
        id
    }

    pub fn get(&self, id: GroupId) -> Option<&GroupCoordinator> {
        self.groups.get(&id)
    }

    pub fn get_mut(&mut self, id: GroupId) -> Option<&mut GroupCoordinator> {
        self.groups.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn join(&mut self, id: GroupId, agent: ActorId) -> bool {
        self.groups
            .get_mut(&id)
            .map(|group| group.join(agent))
            .unwrap_or(false)
    }

    pub fn leave(&mut self, id: GroupId, agent: ActorId) {
        if let Some(group) = self.groups.get_mut(&id) {
            group.leave(agent);
        }
    }

    /// Агент без группы атакует без ограничений
    pub fn request_attack_slot(&mut self, id: Option<GroupId>, agent: ActorId, position: Vec3) -> bool {
        match id.and_then(|id| self.groups.get_mut(&id)) {
            Some(group) => group.request_attack_slot(agent, position),
            None => true,
        }
    }

    pub fn release_attack_slot(&mut self, id: Option<GroupId>, agent: ActorId) {
        if let Some(group) = id.and_then(|id| self.groups.get_mut(&id)) {
            group.release_attack_slot(agent);
        }
    }

    pub fn update_attacker_position(&mut self, id: Option<GroupId>, agent: ActorId, position: Vec3) {
        if let Some(group) = id.and_then(|id| self.groups.get_mut(&id)) {
            group.update_attacker_position(agent, position);
        }
    }

    pub fn share_target(&mut self, id: Option<GroupId>, from: ActorId, target: ActorId, position: Vec3) {
        if let Some(group) = id.and_then(|id| self.groups.get_mut(&id)) {
            group.share_target(Some(from), target, position);
        }
    }

    pub fn broadcast(&mut self, id: GroupId, signal: &str) -> bool {
        match self.groups.get_mut(&id) {
            Some(group) => {
                group.broadcast(signal);
                true
            }
            None => false,
        }
    }

    /// Все накопленные deliveries всех групп (в порядке GroupId)
    pub fn drain_deliveries(&mut self) -> Vec<(ActorId, GroupDelivery)> {
        self.groups
            .values_mut()
            .flat_map(|group| group.drain_deliveries())
            .collect()
    }

    /// Удалить группу целиком (encounter закончился)
    pub fn dissolve(&mut self, id: GroupId) -> Option<GroupCoordinator> {
        self.groups.remove(&id)
    }
}
