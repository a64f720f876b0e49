//! Tests for ProjectileStore (expiry, geometry, source pass-through).

#[cfg(test)]
mod tests {
    use crate::combat::*;
    use crate::components::ActorId;
    use crate::config::DamageKind;
    use crate::sandbox::OpenArena;
    use bevy::prelude::*;

    const SHOOTER: ActorId = ActorId(1 << 32);
    const PLAYER: ActorId = ActorId(1);

    fn fire(store: &mut ProjectileStore, source: ActorId, origin: Vec3, lifetime: f32) -> ProjectileId {
        store.spawn(source, "acid", origin, Vec3::Z, 10.0, lifetime, 5.0, DamageKind::Poison)
    }

    #[test]
    fn test_projectile_expires() {
        let mut arena = OpenArena::new(50.0);
        let mut projectiles = ProjectileStore::new();
        let id = fire(&mut projectiles, SHOOTER, Vec3::Y, 0.5);

        assert!(projectiles.advance(&mut arena, 0.25).is_empty());
        let second = projectiles.advance(&mut arena, 0.25);
        assert_eq!(second, vec![ProjectileOutcome::Expired { id }]);
        assert!(projectiles.is_empty());
    }

    #[test]
    fn test_projectile_stops_at_geometry() {
        let mut arena = OpenArena::new(50.0).with_obstacle(Vec3::new(0.0, 1.0, 3.0), 1.0);
        arena.add_target(PLAYER, Vec3::new(0.0, 0.0, 8.0), 100.0);
        let mut projectiles = ProjectileStore::new();
        fire(&mut projectiles, SHOOTER, Vec3::Y, 5.0);

        let mut outcomes = Vec::new();
        for _ in 0..4 {
            outcomes.extend(projectiles.advance(&mut arena, 0.25));
        }

        assert!(matches!(outcomes[0], ProjectileOutcome::Blocked { .. }));
        assert_eq!(arena.hits_on(PLAYER), 0);
        assert!(projectiles.is_empty());
    }

    #[test]
    fn test_projectile_ignores_its_source() {
        let mut arena = OpenArena::new(50.0);
        // Стрелок стоит на линии выстрела
        arena.add_target(SHOOTER, Vec3::new(0.0, 0.0, 1.0), 100.0);
        let mut projectiles = ProjectileStore::new();
        fire(&mut projectiles, SHOOTER, Vec3::Y, 5.0);

        let outcomes = projectiles.advance(&mut arena, 0.25);
        assert!(outcomes.is_empty());
        assert_eq!(arena.hits_on(SHOOTER), 0);
        assert_eq!(projectiles.len(), 1);
    }

    #[test]
    fn test_remove_from_drops_only_owner_projectiles() {
        let mut projectiles = ProjectileStore::new();
        fire(&mut projectiles, SHOOTER, Vec3::Y, 5.0);
        fire(&mut projectiles, ActorId(7), Vec3::Y, 5.0);

        projectiles.remove_from(SHOOTER);
        assert_eq!(projectiles.len(), 1);
        assert!(projectiles.iter().all(|projectile| projectile.source == ActorId(7)));
    }
}
