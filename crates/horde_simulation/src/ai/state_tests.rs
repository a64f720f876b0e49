//! Tests for the agent transition table (validated requests, Dead terminal).

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::ai::*;
    use crate::components::ActorId;
    use crate::config::{Archetype, BossPhaseDef, SimulationSettings};
    use crate::sandbox::OpenArena;
    use bevy::prelude::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn spawn(services: &mut Services<OpenArena>, archetype: Archetype) -> AgentController<OpenArena> {
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
            ChaCha8Rng::seed_from_u64(1),
            services,
            0.0,
        )
        .unwrap()
    }

    fn boss() -> Archetype {
        Archetype {
            id: "brute".to_string(),
            boss_phases: vec![BossPhaseDef {
                health_threshold: 0.5,
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_table_matches_declared_edges() {
        let table = transition_table(false);
        assert!(table.contains(&(AgentState::Inactive, AgentState::Idle)));
        assert!(table.contains(&(AgentState::Hurt, AgentState::Flee)));
        assert!(!table.contains(&(AgentState::Flee, AgentState::Chase)));
        assert!(!table.contains(&(AgentState::Attack, AgentState::Positioning)));
        // Investigate без рёбер
        assert!(table
            .iter()
            .all(|(from, to)| *from != AgentState::Investigate && *to != AgentState::Investigate));
        // Из Dead никуда
        assert!(table.iter().all(|(from, _)| *from != AgentState::Dead));
        // Boss рёбра только для боссов
        assert!(!table.iter().any(|(_, to)| *to == AgentState::BossPhaseTransition));

        let boss_table = transition_table(true);
        assert!(boss_table.contains(&(AgentState::Idle, AgentState::BossPhaseTransition)));
        assert!(boss_table.contains(&(AgentState::BossPhaseTransition, AgentState::Chase)));
        assert!(!boss_table.contains(&(AgentState::Patrol, AgentState::BossPhaseTransition)));
    }

    #[test]
    fn test_spawn_enters_idle_through_inactive() {
        let mut services = Services::new(OpenArena::new(30.0));
        let mut agent = spawn(&mut services, Archetype::default());

        assert_eq!(agent.state(), AgentState::Idle);
        assert_eq!(agent.previous_state(), Some(AgentState::Inactive));
        let changes = agent.drain_changes();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].from, None);
        assert_eq!(changes[1].to, AgentState::Idle);
    }

    #[test]
    fn test_dead_rejects_everything_but_dead() {
        let mut services = Services::new(OpenArena::new(30.0));
        let mut agent = spawn(&mut services, Archetype::default());
        agent.force_kill(&mut services, 0.0).unwrap();

        for state in AgentState::ALL {
            let result = agent.request_transition(&mut services, state, 0.1);
            if state == AgentState::Dead {
                assert!(result.is_ok());
            } else {
                assert!(result.is_err(), "Dead → {:?} must fail", state);
            }
            assert_eq!(agent.state(), AgentState::Dead);
        }
        assert!(agent.reset_to_idle(&mut services, 0.2).is_err());
        assert_eq!(agent.state(), AgentState::Dead);
    }

    proptest! {
        #[test]
        fn prop_requests_follow_table(
            requests in prop::collection::vec(0usize..AgentState::ALL.len(), 1..40),
            is_boss in any::<bool>(),
        ) {
            let mut services = Services::new(OpenArena::new(30.0));
            let archetype = if is_boss { boss() } else { Archetype::default() };
            let mut agent = spawn(&mut services, archetype);
            let table = transition_table(is_boss);

            for (step, index) in requests.into_iter().enumerate() {
                let to = AgentState::ALL[index];
                let from = agent.state();
                let result = agent.request_transition(&mut services, to, step as f64 * 0.1);

                let allowed = from == to || (from != AgentState::Dead && table.contains(&(from, to)));
                if allowed {
                    prop_assert!(result.is_ok());
                    prop_assert_eq!(agent.state(), to);
                } else {
                    prop_assert!(result.is_err());
                    prop_assert_eq!(agent.state(), from);
                }
            }
        }
    }
}
