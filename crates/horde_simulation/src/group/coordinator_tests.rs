//! Tests for GroupCoordinator (attack slots, spacing, shared targets, signals).

#[cfg(test)]
mod tests {
    use crate::components::ActorId;
    use crate::config::GroupSettings;
    use crate::group::*;
    use bevy::prelude::*;

    fn group(max_attackers: usize, spacing: f32) -> GroupCoordinator {
        let settings = GroupSettings {
            max_attackers,
            min_attacker_spacing: spacing,
            ..Default::default()
        };
        let mut group = GroupCoordinator::new(GroupId(1), settings);
        for id in 1..=4 {
            assert!(group.join(ActorId(id)));
        }
        group
    }

    #[test]
    fn test_attack_slots_capped() {
        let mut group = group(2, 1.5);

        assert!(group.request_attack_slot(ActorId(1), Vec3::new(0.0, 0.0, 0.0)));
        assert!(group.request_attack_slot(ActorId(2), Vec3::new(4.0, 0.0, 0.0)));
        assert!(!group.request_attack_slot(ActorId(3), Vec3::new(8.0, 0.0, 0.0)));
        assert_eq!(group.active_attackers(), 2);

        group.release_attack_slot(ActorId(1));
        assert!(group.request_attack_slot(ActorId(3), Vec3::new(8.0, 0.0, 0.0)));
    }

    #[test]
    fn test_attack_slot_respects_spacing() {
        let mut group = group(3, 1.5);

        assert!(group.request_attack_slot(ActorId(1), Vec3::ZERO));
        // 1м от держателя — слишком близко
        assert!(!group.request_attack_slot(ActorId(2), Vec3::new(1.0, 0.0, 0.0)));
        assert!(group.request_attack_slot(ActorId(2), Vec3::new(2.0, 0.0, 0.0)));

        // Повторный запрос держателя не считается новым слотом
        assert!(group.request_attack_slot(ActorId(1), Vec3::new(0.5, 0.0, 0.0)));
        assert_eq!(group.active_attackers(), 2);
    }

    #[test]
    fn test_leave_releases_slot_and_pending_deliveries() {
        let mut group = group(1, 1.5);
        assert!(group.request_attack_slot(ActorId(1), Vec3::ZERO));
        group.broadcast("retreat");

        group.leave(ActorId(1));
        assert!(!group.holds_slot(ActorId(1)));
        assert!(group.request_attack_slot(ActorId(2), Vec3::ZERO));
        assert!(group
            .drain_deliveries()
            .iter()
            .all(|(recipient, _)| *recipient != ActorId(1)));
    }

    #[test]
    fn test_non_member_gets_no_slot() {
        let mut group = group(2, 1.5);
        assert!(!group.request_attack_slot(ActorId(99), Vec3::ZERO));
    }

    #[test]
    fn test_share_target_skips_sender_and_repeats() {
        let mut group = group(2, 1.5);
        let player = ActorId(100);

        group.share_target(Some(ActorId(1)), player, Vec3::new(5.0, 0.0, 5.0));
        let deliveries = group.drain_deliveries();
        assert_eq!(deliveries.len(), 3);
        assert!(deliveries.iter().all(|(recipient, delivery)| {
            *recipient != ActorId(1) && matches!(delivery, GroupDelivery::Alert { target, .. } if *target == player)
        }));

        // Та же цель повторно — без новых alert
        group.share_target(Some(ActorId(2)), player, Vec3::new(6.0, 0.0, 5.0));
        assert!(group.drain_deliveries().is_empty());
        assert_eq!(group.shared_target(), Some((player, Vec3::new(6.0, 0.0, 5.0))));
    }

    #[test]
    fn test_share_target_disabled() {
        let settings = GroupSettings {
            share_targets: false,
            ..Default::default()
        };
        let mut group = GroupCoordinator::new(GroupId(2), settings);
        group.join(ActorId(1));
        group.join(ActorId(2));

        group.share_target(Some(ActorId(1)), ActorId(100), Vec3::ZERO);
        assert!(group.drain_deliveries().is_empty());
        assert_eq!(group.shared_target(), None);
    }

    #[test]
    fn test_capacity_limits_membership() {
        let settings = GroupSettings {
            capacity: 2,
            ..Default::default()
        };
        let mut group = GroupCoordinator::new(GroupId(3), settings);
        assert!(group.join(ActorId(1)));
        assert!(group.join(ActorId(2)));
        assert!(!group.join(ActorId(3)));
        assert_eq!(group.len(), 2);
    }

    #[test]
    fn test_registry_without_group_always_grants() {
        let mut registry = GroupRegistry::new();
        assert!(registry.request_attack_slot(None, ActorId(1), Vec3::ZERO));

        let id = registry.create(GroupSettings {
            max_attackers: 1,
            ..Default::default()
        });
        registry.join(id, ActorId(1));
        registry.join(id, ActorId(2));
        assert!(registry.request_attack_slot(Some(id), ActorId(1), Vec3::ZERO));
        assert!(!registry.request_attack_slot(Some(id), ActorId(2), Vec3::new(9.0, 0.0, 0.0)));

        assert!(registry.broadcast(id, "retreat"));
        assert_eq!(registry.drain_deliveries().len(), 2);
    }
}
