//! Tests for AbilityExecutor (phases, cooldown, damage multiplier, interrupts).

#[cfg(test)]
mod tests {
    use crate::combat::*;
    use crate::components::ActorId;
    use crate::config::{Ability, AbilityDelivery};
    use crate::sandbox::OpenArena;
    use bevy::prelude::*;

    const AGENT: ActorId = ActorId(1 << 32);
    const PLAYER: ActorId = ActorId(1);
    const BYSTANDER: ActorId = ActorId(2);

    fn attacker() -> Attacker {
        Attacker {
            id: AGENT,
            position: Vec3::ZERO,
            facing: Vec3::Z,
            muzzle: Vec3::new(0.0, 1.2, 0.0),
        }
    }

    /// windup 0.5 / execute 0.25 / recovery 0.5, шаг 0.25 — точные f32
    fn claw() -> Ability {
        Ability::melee("claw", 15.0, 2.0)
            .with_timings(0.5, 0.25, 0.5)
            .with_cooldown(1.5)
    }

    fn arena_with_player(distance: f32) -> OpenArena {
        let mut arena = OpenArena::new(30.0);
        arena.add_target(PLAYER, Vec3::new(0.0, 0.0, distance), 100.0);
        arena
    }

    fn run(
        executor: &mut AbilityExecutor,
        arena: &mut OpenArena,
        projectiles: &mut ProjectileStore,
        now: &mut f64,
        ticks: usize,
    ) -> Vec<ExecutorEvent> {
        let mut events = Vec::new();
        for _ in 0..ticks {
            *now += 0.25;
            events.extend(executor.tick(attacker(), arena, projectiles, *now, 0.25));
        }
        events
    }

    #[test]
    fn test_phase_sequence_and_single_hit() {
        let mut arena = arena_with_player(1.5);
        let mut projectiles = ProjectileStore::new();
        let mut executor = AbilityExecutor::new(vec![claw()], 0, MeleeShape::default());
        let mut now = 0.0;

        assert!(executor.begin(0, Some(PLAYER), Vec3::new(0.0, 0.0, 1.5), now));
        assert_eq!(executor.phase(), Some(AbilityPhase::Windup));

        // 0.25: ещё windup
        assert!(run(&mut executor, &mut arena, &mut projectiles, &mut now, 1).is_empty());
        assert_eq!(arena.hits_on(PLAYER), 0);

        // 0.5: execute, удар ровно один раз
        let events = run(&mut executor, &mut arena, &mut projectiles, &mut now, 1);
        assert_eq!(executor.phase(), Some(AbilityPhase::Execute));
        assert!(matches!(&events[0], ExecutorEvent::Executed { hits, .. } if hits.len() == 1));
        assert_eq!(arena.damage_taken(PLAYER), 15.0);

        // 0.75: recovery, cooldown зафиксирован
        let events = run(&mut executor, &mut arena, &mut projectiles, &mut now, 1);
        assert!(matches!(events[0], ExecutorEvent::RecoveryStarted { .. }));
        assert_eq!(executor.last_used("claw"), Some(0.75));

        // 1.25: completed
        let events = run(&mut executor, &mut arena, &mut projectiles, &mut now, 2);
        assert!(matches!(events.last(), Some(ExecutorEvent::Completed { .. })));
        assert!(!executor.is_busy());
        assert_eq!(arena.hits_on(PLAYER), 1);
    }

    #[test]
    fn test_cooldown_counts_from_recovery_start() {
        let mut executor = AbilityExecutor::new(vec![claw()], 0, MeleeShape::default());
        let mut arena = arena_with_player(1.5);
        let mut projectiles = ProjectileStore::new();
        let mut now = 0.0;

        executor.begin(0, Some(PLAYER), Vec3::ZERO, now);
        run(&mut executor, &mut arena, &mut projectiles, &mut now, 5);
        assert!(!executor.is_busy());

        // recovery стартовал в 0.75 → готов в 2.25
        assert!(!executor.is_ready(0, 2.0));
        assert!(!executor.begin(0, Some(PLAYER), Vec3::ZERO, 2.0));
        assert!(executor.is_ready(0, 2.25));
    }

    #[test]
    fn test_damage_uses_phase_multiplier() {
        for multiplier in [1.0, 1.5, 2.0] {
            let mut arena = arena_with_player(1.5);
            let mut projectiles = ProjectileStore::new();
            let mut executor = AbilityExecutor::new(vec![claw()], 0, MeleeShape::default());
            executor.set_damage_multiplier(multiplier);
            let mut now = 0.0;

            executor.begin(0, Some(PLAYER), Vec3::ZERO, now);
            run(&mut executor, &mut arena, &mut projectiles, &mut now, 2);
            assert_eq!(arena.damage_taken(PLAYER), 15.0 * multiplier);
        }
    }

    #[test]
    fn test_melee_hits_each_target_once() {
        let mut arena = arena_with_player(1.5);
        arena.add_target(BYSTANDER, Vec3::new(0.6, 0.0, 1.2), 100.0);
        // За спиной — не задеваем
        arena.add_target(ActorId(3), Vec3::new(0.0, 0.0, -1.5), 100.0);
        let mut projectiles = ProjectileStore::new();
        let mut executor = AbilityExecutor::new(vec![claw()], 0, MeleeShape::default());
        let mut now = 0.0;

        executor.begin(0, None, Vec3::ZERO, now);
        run(&mut executor, &mut arena, &mut projectiles, &mut now, 5);

        assert_eq!(arena.hits_on(PLAYER), 1);
        assert_eq!(arena.hits_on(BYSTANDER), 1);
        assert_eq!(arena.hits_on(ActorId(3)), 0);
    }

    #[test]
    fn test_windup_interrupt_respects_flag() {
        let mut executor = AbilityExecutor::new(vec![claw().uninterruptible()], 0, MeleeShape::default());
        executor.begin(0, None, Vec3::ZERO, 0.0);

        assert!(!executor.can_interrupt());
        assert!(!executor.interrupt(false));
        assert!(executor.is_busy());

        assert!(executor.interrupt(true));
        assert!(!executor.is_busy());

        let mut executor = AbilityExecutor::new(vec![claw()], 0, MeleeShape::default());
        executor.begin(0, None, Vec3::ZERO, 0.0);
        assert!(executor.interrupt(false));
        // Прерванное использование не ставит cooldown
        assert!(executor.is_ready(0, 0.0));
    }

    #[test]
    fn test_select_ability_falls_back_by_range() {
        let spit = Ability::hitscan("spit", 5.0, 10.0).with_min_range(3.0);
        let executor = AbilityExecutor::new(vec![claw(), spit], 0, MeleeShape::default());

        assert_eq!(executor.select_ability(1.5, 0.0), Some(0));
        assert_eq!(executor.select_ability(6.0, 0.0), Some(1));
        assert_eq!(executor.select_ability(20.0, 0.0), None);
    }

    #[test]
    fn test_hitscan_blocked_by_obstacle() {
        let mut arena = arena_with_player(8.0).with_obstacle(Vec3::new(0.0, 1.0, 4.0), 1.0);
        let mut projectiles = ProjectileStore::new();
        let zap = Ability::hitscan("zap", 10.0, 12.0).with_timings(0.0, 0.25, 0.25);
        let mut executor = AbilityExecutor::new(vec![zap], 0, MeleeShape::default());
        let mut now = 0.0;

        executor.begin(0, Some(PLAYER), Vec3::new(0.0, 1.0, 8.0), now);
        run(&mut executor, &mut arena, &mut projectiles, &mut now, 1);
        assert_eq!(arena.hits_on(PLAYER), 0);

        arena.obstacles.clear();
        let mut executor = AbilityExecutor::new(
            vec![Ability::hitscan("zap", 10.0, 12.0).with_timings(0.0, 0.25, 0.25)],
            0,
            MeleeShape::default(),
        );
        executor.begin(0, Some(PLAYER), Vec3::new(0.0, 1.0, 8.0), now);
        run(&mut executor, &mut arena, &mut projectiles, &mut now, 1);
        assert_eq!(arena.hits_on(PLAYER), 1);
    }

    #[test]
    fn test_projectile_carries_damage_until_impact() {
        let mut arena = arena_with_player(10.0);
        let mut projectiles = ProjectileStore::new();
        let acid = Ability::projectile("acid", 8.0, 12.0, 20.0).with_timings(0.0, 0.25, 0.25);
        assert!(matches!(acid.delivery, AbilityDelivery::Projectile { .. }));
        let mut executor = AbilityExecutor::new(vec![acid], 0, MeleeShape::default());
        executor.set_damage_multiplier(1.5);
        let mut now = 0.0;

        executor.begin(0, Some(PLAYER), Vec3::new(0.0, 1.0, 10.0), now);
        run(&mut executor, &mut arena, &mut projectiles, &mut now, 1);
        assert_eq!(projectiles.len(), 1);
        assert_eq!(arena.hits_on(PLAYER), 0);

        // 20 м/с × 0.25 = 5м за шаг → попадание на втором шаге
        let mut outcomes = Vec::new();
        for _ in 0..3 {
            outcomes.extend(projectiles.advance(&mut arena, 0.25));
        }
        assert!(projectiles.is_empty());
        assert!(matches!(&outcomes[0], ProjectileOutcome::Hit(report) if report.target == PLAYER));
        assert_eq!(arena.damage_taken(PLAYER), 12.0);
    }

    #[test]
    fn test_swap_abilities_interrupts_and_keeps_cooldowns() {
        let mut executor = AbilityExecutor::new(vec![claw()], 0, MeleeShape::default());
        executor.begin(0, None, Vec3::ZERO, 0.0);

        executor.swap_abilities(vec![claw(), Ability::melee("slam", 40.0, 3.0)], 1);
        assert!(!executor.is_busy());
        assert_eq!(executor.primary().unwrap().id, "slam");
    }
}
