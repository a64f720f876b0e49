//! Bevy integration: Simulation как Resource, tick в FixedUpdate
//!
//! Один прогон FixedUpdate = один `Simulation::step()` (dt из settings),
//! поэтому результат не зависит от wall clock. События симуляции
//! публикуются как Bevy events: полный поток `SimulationEvent` плюс
//! `DamageDealt` / `EntityDied` для систем, которым нужен только бой.

use std::marker::PhantomData;

use bevy::prelude::*;

use crate::combat::{DamageDealt, EntityDied};
use crate::environment::Environment;
use crate::simulation::{SimEvent, Simulation};

/// Обёртка SimEvent для Bevy event queue
#[derive(Event, Debug, Clone, PartialEq)]
pub struct SimulationEvent(pub SimEvent);

#[derive(Resource)]
pub struct SimulationRunner<E: Environment> {
    simulation: Simulation<E>,
    paused: bool,
}

impl<E: Environment> SimulationRunner<E> {
    pub fn new(simulation: Simulation<E>) -> Self {
        Self {
            simulation,
            paused: false,
        }
    }

    pub fn simulation(&self) -> &Simulation<E> {
        &self.simulation
    }

    pub fn simulation_mut(&mut self) -> &mut Simulation<E> {
        &mut self.simulation
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

/// Horde plugin (generic по environment)
///
/// Runner вставляется отдельно: `app.insert_resource(SimulationRunner::new(sim))`.
/// Без runner'а система просто ничего не делает.
pub struct HordeSimulationPlugin<E> {
    tick_hz: f64,
    _env: PhantomData<fn() -> E>,
}

impl<E> HordeSimulationPlugin<E> {
    pub fn new() -> Self {
        Self {
            tick_hz: 60.0,
            _env: PhantomData,
        }
    }

    /// Частота FixedUpdate (должна совпадать с `SimulationSettings::tick_hz`)
    pub fn with_tick_hz(mut self, tick_hz: f64) -> Self {
        self.tick_hz = tick_hz;
        self
    }
}

impl<E> Default for HordeSimulationPlugin<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Environment> Plugin for HordeSimulationPlugin<E> {
    fn build(&self, app: &mut App) {
        app.insert_resource(Time::<Fixed>::from_hz(self.tick_hz))
            .add_event::<SimulationEvent>()
            .add_event::<DamageDealt>()
            .add_event::<EntityDied>()
            .add_systems(FixedUpdate, advance_simulation::<E>);
    }
}

/// Tick симуляции + публикация её событий
pub fn advance_simulation<E: Environment>(
    runner: Option<ResMut<SimulationRunner<E>>>,
    mut sim_events: EventWriter<SimulationEvent>,
    mut damage_events: EventWriter<DamageDealt>,
    mut death_events: EventWriter<EntityDied>,
) {
    let Some(mut runner) = runner else {
        return;
    };
    if runner.paused {
        return;
    }

    if let Err(err) = runner.simulation.step() {
        crate::logger::log_error(&format!("❌ Simulation tick {} failed: {}", runner.simulation.tick_count(), err));
    }

    for event in runner.simulation.drain_events() {
        match &event {
            SimEvent::DamageDealt(report) => {
                damage_events.write(report.clone());
            }
            SimEvent::AgentDied { agent, killer } => {
                death_events.write(EntityDied {
                    entity: *agent,
                    killer: *killer,
                });
            }
            _ => {}
        }
        sim_events.write(SimulationEvent(event));
    }
}
