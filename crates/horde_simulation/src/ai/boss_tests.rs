//! Tests for boss phase thresholds and BossPhaseTransition.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::ai::*;
    use crate::components::ActorId;
    use crate::config::{Ability, Archetype, BossPhaseDef, DamageKind, SimulationSettings};
    use crate::environment::Vitality;
    use crate::sandbox::OpenArena;
    use bevy::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn phases() -> Vec<BossPhaseDef> {
        vec![
            BossPhaseDef {
                name: "enraged".to_string(),
                health_threshold: 0.7,
                speed_multiplier: 1.3,
                damage_multiplier: 1.5,
                ..Default::default()
            },
            BossPhaseDef {
                name: "desperate".to_string(),
                health_threshold: 0.3,
                speed_multiplier: 1.6,
                damage_multiplier: 2.0,
                abilities: Some(vec![Ability::melee("slam", 40.0, 3.0)]),
                primary_ability: 0,
            },
        ]
    }

    fn spawn_boss(services: &mut Services<OpenArena>) -> AgentController<OpenArena> {
        let archetype = Archetype {
            id: "warlord".to_string(),
            max_health: 100.0,
            stagger_chance: 0.0,
            boss_phases: phases(),
            ..Default::default()
        };
        let request = SpawnRequest {
            id: ActorId(1 << 32),
            archetype: Arc::new(archetype),
            position: Vec3::ZERO,
            facing: Vec3::Z,
            group: None,
        };
        AgentController::spawn(
            request,
            Arc::new(SimulationSettings::default()),
            ChaCha8Rng::seed_from_u64(3),
            services,
            0.0,
        )
        .unwrap()
    }

    fn run(agent: &mut AgentController<OpenArena>, services: &mut Services<OpenArena>, now: &mut f64, ticks: usize) {
        for _ in 0..ticks {
            *now += 0.25;
            agent.tick(services, *now, 0.25).unwrap();
        }
    }

    fn phase_changes(agent: &mut AgentController<OpenArena>) -> usize {
        agent
            .drain_changes()
            .iter()
            .filter(|change| change.to == AgentState::BossPhaseTransition)
            .count()
    }

    #[test]
    fn test_next_phase_scans_in_order() {
        let phases = phases();
        assert_eq!(next_phase(&phases, 0, 0.75), None);
        assert_eq!(next_phase(&phases, 0, 0.7), None);
        assert_eq!(next_phase(&phases, 0, 0.65), Some(1));
        assert_eq!(next_phase(&phases, 1, 0.4), None);
        assert_eq!(next_phase(&phases, 1, 0.25), Some(2));
        assert_eq!(next_phase(&phases, 2, 0.05), None);
        // Сразу ниже обоих порогов: фазы не пропускаются
        assert_eq!(next_phase(&phases, 0, 0.1), Some(1));
    }

    #[test]
    fn test_phase_def_lookup() {
        let phases = phases();
        assert!(phase_def(&phases, 0).is_none());
        assert_eq!(phase_def(&phases, 1).unwrap().name, "enraged");
        assert_eq!(phase_def(&phases, 2).unwrap().name, "desperate");
        assert!(phase_def(&phases, 3).is_none());
    }

    #[test]
    fn test_thresholds_trigger_once_each() {
        let mut services = Services::new(OpenArena::new(30.0));
        let mut boss = spawn_boss(&mut services);
        let mut now = 0.0;
        boss.drain_changes();

        // 100% → 65%: phase 1
        boss.receive_damage(&mut services, 35.0, DamageKind::Physical, None, now).unwrap();
        run(&mut boss, &mut services, &mut now, 1);
        assert_eq!(boss.state(), AgentState::BossPhaseTransition);
        assert_eq!(boss.boss_phase(), 1);
        assert!(boss.health().is_invulnerable());

        // Неуязвим во время перехода
        let dealt = boss.receive_damage(&mut services, 10.0, DamageKind::Physical, None, now).unwrap();
        assert_eq!(dealt, 0.0);

        // boss_transition_duration = 1.5
        run(&mut boss, &mut services, &mut now, 7);
        assert_eq!(boss.state(), AgentState::Idle);
        assert!(!boss.health().is_invulnerable());
        assert!((boss.context().speed_multiplier - 1.3).abs() < 1e-6);
        assert_eq!(boss.context().executor.damage_multiplier(), 1.5);
        assert_eq!(phase_changes(&mut boss), 1);
        assert!(boss
            .drain_events()
            .iter()
            .any(|event| matches!(event, AgentEvent::PhaseChanged { phase: 1, .. })));

        // 65% → 40%: ничего
        boss.receive_damage(&mut services, 25.0, DamageKind::Physical, None, now).unwrap();
        run(&mut boss, &mut services, &mut now, 4);
        assert_eq!(phase_changes(&mut boss), 0);
        assert_eq!(boss.boss_phase(), 1);

        // 40% → 25%: phase 2 со сменой abilities
        boss.receive_damage(&mut services, 15.0, DamageKind::Physical, None, now).unwrap();
        run(&mut boss, &mut services, &mut now, 8);
        assert_eq!(boss.boss_phase(), 2);
        assert_eq!(phase_changes(&mut boss), 1);
        assert_eq!(boss.context().executor.primary().unwrap().id, "slam");
        assert_eq!(boss.context().executor.damage_multiplier(), 2.0);
    }

    #[test]
    fn test_healing_never_reverts_phase() {
        let mut services = Services::new(OpenArena::new(30.0));
        let mut boss = spawn_boss(&mut services);
        let mut now = 0.0;

        boss.receive_damage(&mut services, 40.0, DamageKind::Physical, None, now).unwrap();
        run(&mut boss, &mut services, &mut now, 8);
        assert_eq!(boss.boss_phase(), 1);

        boss.context_mut().health.heal(100.0);
        run(&mut boss, &mut services, &mut now, 4);
        assert_eq!(boss.boss_phase(), 1);
        assert_ne!(boss.state(), AgentState::BossPhaseTransition);
    }

    #[test]
    fn test_force_kill_during_transition() {
        let mut services = Services::new(OpenArena::new(30.0));
        let mut boss = spawn_boss(&mut services);
        let mut now = 0.0;

        boss.receive_damage(&mut services, 35.0, DamageKind::Physical, None, now).unwrap();
        run(&mut boss, &mut services, &mut now, 1);
        assert_eq!(boss.state(), AgentState::BossPhaseTransition);

        boss.force_kill(&mut services, now).unwrap();
        assert_eq!(boss.state(), AgentState::Dead);
        assert!(!boss.health().is_invulnerable());
    }
}
