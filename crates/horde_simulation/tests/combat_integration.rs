//! Combat integration tests
//!
//! Полные сценарии через Simulation<OpenArena>:
//! - chase → attack с cooldown, смерть и cleanup
//! - boss phases (пороги, multipliers)
//! - лимит одновременных атакующих в группе

use std::sync::Arc;

use bevy::prelude::*;
use horde_simulation::ai::AgentState;
use horde_simulation::config::{Ability, Archetype, BossPhaseDef, DamageKind, GroupSettings, PatrolParams, PerceptionParams};
use horde_simulation::sandbox::OpenArena;
use horde_simulation::*;

const PLAYER: ActorId = ActorId(1);
const DT: f32 = 0.25;

fn claw() -> Ability {
    Ability::melee("claw", 15.0, 2.0)
        .with_timings(0.5, 0.25, 0.5)
        .with_cooldown(1.5)
}

fn ghoul() -> Archetype {
    Archetype {
        id: "ghoul".to_string(),
        max_health: 50.0,
        attack_range: 2.0,
        abilities: vec![claw()],
        stagger_chance: 0.0,
        perception: PerceptionParams {
            sight_range: 30.0,
            ..Default::default()
        },
        patrol: PatrolParams {
            enabled: false,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn boss(phases: Vec<BossPhaseDef>, ability: Ability) -> Archetype {
    Archetype {
        id: "warlord".to_string(),
        max_health: 100.0,
        abilities: vec![ability],
        boss_phases: phases,
        ..ghoul()
    }
}

fn simulation(player_at: Vec3) -> Simulation<OpenArena> {
    let mut arena = OpenArena::new(40.0);
    arena.add_target(PLAYER, player_at, 10_000.0);
    Simulation::new(arena, ContentLibrary::new(), SimulationSettings::default()).unwrap()
}

/// Прогнать `ticks` тиков, вернуть события с временем tick'а
fn run(sim: &mut Simulation<OpenArena>, ticks: usize) -> Vec<(f64, SimEvent)> {
    let mut collected = Vec::new();
    for _ in 0..ticks {
        sim.tick(DT).unwrap();
        let now = sim.now();
        collected.extend(sim.drain_events().into_iter().map(|event| (now, event)));
    }
    collected
}

fn hits_on_player(events: &[(f64, SimEvent)]) -> Vec<(f64, f32)> {
    events
        .iter()
        .filter_map(|(at, event)| match event {
            SimEvent::DamageDealt(report) if report.target == PLAYER => Some((*at, report.amount)),
            _ => None,
        })
        .collect()
}

#[test]
fn test_ghoul_closes_distance_and_attacks_on_cooldown() {
    let mut sim = simulation(Vec3::new(0.0, 0.0, 20.0));
    let ghoul = sim
        .spawn_archetype(Arc::new(ghoul()), Vec3::ZERO, Vec3::Z, None)
        .unwrap();

    let events = run(&mut sim, 120);
    let hits = hits_on_player(&events);

    assert!(hits.len() >= 3, "expected repeated attacks, got {:?}", hits);
    assert!(hits.iter().all(|(_, amount)| *amount == 15.0));
    for pair in hits.windows(2) {
        assert!(pair[1].0 - pair[0].0 >= 1.5 - 1e-6, "cooldown violated: {:?}", pair);
    }
    assert!(sim.agent(ghoul).unwrap().position().distance(Vec3::new(0.0, 0.0, 20.0)) <= 2.0);
    assert!(events.iter().any(|(_, event)| matches!(
        event,
        SimEvent::StateChanged {
            from: Some(AgentState::Chase),
            to: AgentState::Attack,
            ..
        }
    )));
}

#[test]
fn test_ghoul_hit_from_behind_turns_and_strikes_back() {
    let mut sim = simulation(Vec3::new(0.0, 0.0, -1.5));
    let ghoul = sim
        .spawn_archetype(
            Arc::new(Archetype {
                turn_speed_deg: 90.0,
                ..ghoul()
            }),
            Vec3::ZERO,
            Vec3::Z,
            None,
        )
        .unwrap();
    run(&mut sim, 2);

    // Игрок за спиной: не виден, но урон выдаёт его позицию
    sim.apply_damage(ghoul, 5.0, DamageKind::Physical, Some(PLAYER)).unwrap();
    let events = run(&mut sim, 40);

    let facing = sim.agent(ghoul).unwrap().context().kinematics.facing;
    assert!(facing.distance(Vec3::NEG_Z) < 1e-3, "facing = {:?}", facing);
    assert!(!hits_on_player(&events).is_empty());
}

#[test]
fn test_death_is_reported_once_and_corpse_removed() {
    let mut sim = simulation(Vec3::new(0.0, 0.0, 5.0));
    let ghoul = sim
        .spawn_archetype(Arc::new(ghoul()), Vec3::ZERO, Vec3::Z, None)
        .unwrap();
    run(&mut sim, 4);

    let dealt = sim.apply_damage(ghoul, 80.0, DamageKind::Physical, Some(PLAYER)).unwrap();
    assert_eq!(dealt, 50.0);
    assert_eq!(sim.state_of(ghoul), Some(AgentState::Dead));
    // Мёртвые урон не получают
    assert_eq!(sim.apply_damage(ghoul, 10.0, DamageKind::Physical, None).unwrap(), 0.0);

    let mut events: Vec<SimEvent> = sim.drain_events();
    events.extend(run(&mut sim, 16).into_iter().map(|(_, event)| event));

    let deaths: Vec<_> = events
        .iter()
        .filter(|event| matches!(event, SimEvent::AgentDied { .. }))
        .collect();
    assert_eq!(
        deaths,
        vec![&SimEvent::AgentDied {
            agent: ghoul,
            killer: Some(PLAYER)
        }]
    );
    assert!(events.contains(&SimEvent::AgentRemoved { agent: ghoul }));
    assert!(sim.agent(ghoul).is_none());
    assert!(matches!(
        sim.force_kill(ghoul),
        Err(SimulationError::UnknownAgent(_))
    ));
}

#[test]
fn test_boss_phases_trigger_in_order() {
    let phases = vec![
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
            ..Default::default()
        },
    ];
    // Игрок далеко за пределами восприятия
    let mut sim = simulation(Vec3::new(35.0, 0.0, 35.0));
    let warlord = sim
        .spawn_archetype(Arc::new(boss(phases, claw())), Vec3::ZERO, Vec3::Z, None)
        .unwrap();

    sim.apply_damage(warlord, 35.0, DamageKind::Physical, None).unwrap();
    let mut events = run(&mut sim, 8);
    assert_eq!(sim.agent(warlord).unwrap().boss_phase(), 1);
    assert!((sim.agent(warlord).unwrap().context().speed_multiplier - 1.3).abs() < 1e-6);

    // 65% → 40%: порог 0.3 ещё не пройден
    sim.apply_damage(warlord, 25.0, DamageKind::Physical, None).unwrap();
    events.extend(run(&mut sim, 8));
    assert_eq!(sim.agent(warlord).unwrap().boss_phase(), 1);

    sim.apply_damage(warlord, 15.0, DamageKind::Physical, None).unwrap();
    events.extend(run(&mut sim, 8));

    let phases: Vec<usize> = events
        .iter()
        .filter_map(|(_, event)| match event {
            SimEvent::BossPhaseChanged { phase, .. } => Some(*phase),
            _ => None,
        })
        .collect();
    assert_eq!(phases, vec![1, 2]);
    assert_eq!(sim.agent(warlord).unwrap().boss_phase(), 2);
    assert!((sim.agent(warlord).unwrap().context().speed_multiplier - 1.6).abs() < 1e-6);
}

#[test]
fn test_phase_damage_multiplier_applies_to_hits() {
    let phases = vec![BossPhaseDef {
        name: "enraged".to_string(),
        health_threshold: 0.5,
        damage_multiplier: 2.0,
        ..Default::default()
    }];
    let smash = Ability::melee("smash", 10.0, 2.0)
        .with_timings(0.5, 0.25, 0.5)
        .with_cooldown(1.0);
    let mut sim = simulation(Vec3::new(0.0, 0.0, 1.5));
    let warlord = sim
        .spawn_archetype(Arc::new(boss(phases, smash)), Vec3::ZERO, Vec3::Z, None)
        .unwrap();

    let mut before = Vec::new();
    for _ in 0..40 {
        before.extend(hits_on_player(&run(&mut sim, 1)));
        if !before.is_empty() {
            break;
        }
    }
    assert_eq!(before.first().map(|(_, amount)| *amount), Some(10.0));

    sim.apply_damage(warlord, 60.0, DamageKind::Physical, Some(PLAYER)).unwrap();
    let events = run(&mut sim, 40);

    let phase_at = events
        .iter()
        .position(|(_, event)| matches!(event, SimEvent::BossPhaseChanged { phase: 1, .. }))
        .expect("phase change event");
    let after = hits_on_player(&events[phase_at..]);
    assert!(!after.is_empty());
    assert!(after.iter().all(|(_, amount)| *amount == 20.0), "{:?}", after);
}

#[test]
fn test_group_limits_simultaneous_attackers() {
    let mut sim = simulation(Vec3::ZERO);
    let group = sim.create_group(GroupSettings {
        max_attackers: 1,
        min_attacker_spacing: 0.0,
        share_targets: true,
        capacity: 8,
    });

    for index in 0..4 {
        let angle = index as f32 * std::f32::consts::FRAC_PI_2;
        let position = Vec3::new(angle.cos(), 0.0, angle.sin()) * 5.0;
        sim.spawn_archetype(Arc::new(ghoul()), position, -position.normalize(), Some(group))
            .unwrap();
    }
    assert_eq!(sim.groups().get(group).unwrap().len(), 4);

    let mut total_hits = 0;
    for _ in 0..80 {
        total_hits += hits_on_player(&run(&mut sim, 1)).len();
        let attacking = sim
            .agents()
            .filter(|agent| agent.state() == AgentState::Attack)
            .count();
        assert!(attacking <= 1, "{} agents attacking at once", attacking);
        assert!(sim.groups().get(group).unwrap().active_attackers() <= 1);
    }
    assert!(total_hits > 0);
}
