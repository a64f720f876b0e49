//! Headless симуляция HORDE
//!
//! Загружает встроенный content pack, запускает encounter вокруг игрока
//! в OpenArena и печатает, что происходило.

use bevy::prelude::*;
use horde_simulation::sandbox::OpenArena;
use horde_simulation::{init_logger, set_log_level, ActorId, Anchor, ContentLibrary, DamageKind, LogLevel, SimEvent, Simulation};

const PLAYER: ActorId = ActorId(1);

const CONTENT: &str = r#"
[settings]
seed = 42
tick_hz = 60.0
perception_hz = 10.0

[[archetypes]]
id = "ghoul"
max_health = 50.0
move_speed = 4.0
attack_range = 2.0
combat_style = "melee"

[[archetypes.abilities]]
id = "claw"
base_damage = 15.0
cooldown = 1.5
max_range = 2.0

[[archetypes]]
id = "spitter"
max_health = 35.0
combat_style = "ranged"
preferred_range = 8.0
attack_range = 12.0

[[archetypes.abilities]]
id = "acid"
base_damage = 6.0
cooldown = 2.0
max_range = 12.0
damage_kind = "poison"
delivery = { type = "projectile", speed = 18.0, lifetime = 2.0 }

[[archetypes]]
id = "warlord"
max_health = 300.0
damage_resistance = 0.8
move_speed = 3.0
attack_range = 2.5
stagger_chance = 0.0

[[archetypes.abilities]]
id = "cleave"
base_damage = 25.0
cooldown = 2.0
max_range = 2.5

[[archetypes.boss_phases]]
name = "enraged"
health_threshold = 0.7
speed_multiplier = 1.3
damage_multiplier = 1.5

[[archetypes.boss_phases]]
name = "desperate"
health_threshold = 0.3
speed_multiplier = 1.6
damage_multiplier = 2.0

[[encounters]]
id = "crypt"
min_count = 4
max_count = 6
stagger_interval = 1.5
min_distance = 12.0
max_distance = 22.0
max_duration = 90.0
spawn_pool = [
    { archetype = "ghoul", weight = 4 },
    { archetype = "spitter", weight = 2 },
    { archetype = "warlord", weight = 1, max_count = 1 },
]
group = { max_attackers = 2, min_attacker_spacing = 1.5 }
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logger();
    set_log_level(LogLevel::Info);

    let library = ContentLibrary::from_toml_str(CONTENT)?;
    let mut arena = OpenArena::new(40.0).with_obstacle(Vec3::new(6.0, 0.0, 6.0), 2.0);
    arena.add_target(PLAYER, Vec3::ZERO, 500.0);

    let mut sim = Simulation::from_library(arena, library)?;
    println!("Starting HORDE headless simulation (seed: {})", sim.settings().seed);

    let planned = sim.start_encounter("crypt", Anchor::new(Vec3::ZERO, Vec3::Z))?;
    println!("Encounter 'crypt': {} agents planned", planned);

    let mut deaths = 0;
    let mut hits = 0;
    for tick in 0..3600 {
        sim.step()?;

        // Игрок стреляет в ближайшего живого агента раз в полсекунды
        if tick % 30 == 0 {
            let nearest = sim
                .agents()
                .filter(|agent| agent.is_alive())
                .min_by(|a, b| a.position().length().total_cmp(&b.position().length()))
                .map(|agent| agent.id());
            if let Some(id) = nearest {
                sim.apply_damage(id, 20.0, DamageKind::Physical, Some(PLAYER))?;
            }
        }

        for event in sim.drain_events() {
            match event {
                SimEvent::DamageDealt(report) if report.target == PLAYER => hits += 1,
                SimEvent::AgentDied { .. } => deaths += 1,
                SimEvent::EncounterEnded(report) => {
                    println!(
                        "Encounter ended at tick {} ({:?}): spawned {}, killed {}, skipped {}",
                        tick, report.reason, report.spawned, report.killed, report.skipped
                    );
                }
                _ => {}
            }
        }

        if tick % 600 == 0 {
            println!(
                "Tick {}: {} agents alive, player took {:.1} damage",
                tick,
                sim.living_count(),
                sim.env().damage_taken(PLAYER)
            );
        }

        if !sim.director().is_active() && sim.living_count() == 0 {
            break;
        }
    }

    if let Some(report) = sim.end_encounter(true)? {
        println!("Encounter stopped: {} agents killed on cleanup", report.to_kill.len());
    }

    println!(
        "Simulation complete! ticks: {}, deaths: {}, hits on player: {}",
        sim.tick_count(),
        deaths,
        hits
    );
    Ok(())
}
