//! Simulation — владелец всего мира агентов
//!
//! Один tick:
//! 1. clock
//! 2. group deliveries → агенты (до их update)
//! 3. agents tick (в порядке ActorId) → их events
//! 4. projectiles
//! 5. director: новые спавны, проверка конца encounter
//! 6. cleanup мёртвых после death_cleanup_delay
//!
//! Всё, что происходит, копится в `SimEvent` очереди; вызывающий забирает
//! её через `drain_events` (каждое событие ровно один раз, по порядку).

use std::collections::BTreeMap;
use std::sync::Arc;

use bevy::prelude::*;
use thiserror::Error;

use crate::ai::{AgentController, AgentEvent, AgentState, Services, SpawnError, SpawnRequest};
use crate::combat::{DamageDealt, ProjectileOutcome};
use crate::components::ActorId;
use crate::config::{Archetype, ConfigError, ContentError, ContentLibrary, DamageKind, EncounterDef, GroupSettings, SimulationSettings};
use crate::director::{Anchor, DirectorError, EncounterDirector, EncounterReport, SkipReason, SpawnOrder, SpawnOutcome};
use crate::environment::Environment;
use crate::fsm::FsmError;
use crate::group::{GroupId, GroupRegistry};
use crate::DeterministicRng;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Fsm(#[from] FsmError),

    #[error(transparent)]
    Spawn(#[from] SpawnError),

    #[error(transparent)]
    Director(#[from] DirectorError),

    #[error("unknown agent {0}")]
    UnknownAgent(ActorId),

    #[error("unknown archetype '{0}'")]
    UnknownArchetype(String),

    #[error("unknown encounter '{0}'")]
    UnknownEncounter(String),
}

/// Всё наблюдаемое снаружи
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    AgentSpawned {
        agent: ActorId,
        archetype: String,
        position: Vec3,
        encounter: Option<String>,
    },
    StateChanged {
        agent: ActorId,
        from: Option<AgentState>,
        to: AgentState,
        forced: bool,
    },
    /// Агент получил урон (после resistance)
    AgentDamaged {
        agent: ActorId,
        amount: f32,
        source: Option<ActorId>,
        remaining: f32,
    },
    /// Агент (или его projectile) нанёс урон внешней цели
    DamageDealt(DamageDealt),
    AgentDied {
        agent: ActorId,
        killer: Option<ActorId>,
    },
    BossPhaseChanged {
        agent: ActorId,
        phase: usize,
        name: String,
    },
    EncounterStarted {
        encounter: String,
        planned: u32,
        group: Option<GroupId>,
    },
    SpawnSkipped {
        encounter: String,
        archetype: Option<String>,
        reason: SkipReason,
    },
    EncounterEnded(EncounterReport),
    /// Труп убран после cleanup delay
    AgentRemoved {
        agent: ActorId,
    },
}

/// Состояние одного агента для сравнения прогонов
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSnapshot {
    pub id: ActorId,
    pub archetype: String,
    pub state: AgentState,
    pub position: Vec3,
    pub health: f32,
    pub boss_phase: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSnapshot {
    pub tick: u64,
    pub now: f64,
    pub agents: Vec<AgentSnapshot>,
}

pub struct Simulation<E: Environment> {
    settings: Arc<SimulationSettings>,
    library: ContentLibrary,
    services: Services<E>,
    agents: BTreeMap<ActorId, AgentController<E>>,
    director: EncounterDirector,
    rng: DeterministicRng,
    now: f64,
    tick_count: u64,
    next_agent_id: u64,
    events: Vec<SimEvent>,
}

impl<E: Environment> Simulation<E> {
    pub fn new(env: E, library: ContentLibrary, settings: SimulationSettings) -> Result<Self, SimulationError> {
        settings.validate()?;
        crate::logger::log_info(&format!(
            "🌍 Simulation created: {:.0} Hz, perception {:.0} Hz, seed {}",
            settings.tick_hz, settings.perception_hz, settings.seed
        ));

        Ok(Self {
            rng: DeterministicRng::new(settings.seed),
            next_agent_id: settings.timings.agent_id_base,
            settings: Arc::new(settings),
            library,
            services: Services::new(env),
            agents: BTreeMap::new(),
            director: EncounterDirector::new(),
            now: 0.0,
            tick_count: 0,
            events: Vec::new(),
        })
    }

    /// Settings из content pack (если есть), иначе default
    pub fn from_library(env: E, library: ContentLibrary) -> Result<Self, SimulationError> {
        let settings = library.settings().cloned().unwrap_or_default();
        Self::new(env, library, settings)
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    pub fn library(&self) -> &ContentLibrary {
        &self.library
    }

    pub fn env(&self) -> &E {
        &self.services.env
    }

    pub fn env_mut(&mut self) -> &mut E {
        &mut self.services.env
    }

    pub fn groups(&self) -> &GroupRegistry {
        &self.services.groups
    }

    pub fn director(&self) -> &EncounterDirector {
        &self.director
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn agent(&self, id: ActorId) -> Option<&AgentController<E>> {
        self.agents.get(&id)
    }

    pub fn agent_mut(&mut self, id: ActorId) -> Option<&mut AgentController<E>> {
        self.agents.get_mut(&id)
    }

    pub fn agents(&self) -> impl Iterator<Item = &AgentController<E>> {
        self.agents.values()
    }

    pub fn agent_ids(&self) -> Vec<ActorId> {
        self.agents.keys().copied().collect()
    }

    pub fn living_count(&self) -> usize {
        self.agents.values().filter(|agent| agent.is_alive()).count()
    }

    pub fn state_of(&self, id: ActorId) -> Option<AgentState> {
        self.agents.get(&id).map(|agent| agent.state())
    }

    // ============================================================================
    // Agents
    // ============================================================================

    /// Заспавнить агента по id archetype из library
    pub fn spawn_agent(
        &mut self,
        archetype: &str,
        position: Vec3,
        facing: Vec3,
        group: Option<GroupId>,
    ) -> Result<ActorId, SimulationError> {
        let archetype = self
            .library
            .archetype(archetype)
            .ok_or_else(|| SimulationError::UnknownArchetype(archetype.to_string()))?;
        self.spawn_archetype(archetype, position, facing, group)
    }

    /// Заспавнить агента из готового archetype (не обязательно из library)
    pub fn spawn_archetype(
        &mut self,
        archetype: Arc<Archetype>,
        position: Vec3,
        facing: Vec3,
        group: Option<GroupId>,
    ) -> Result<ActorId, SimulationError> {
        Ok(self.spawn_internal(archetype, position, facing, group, None)?)
    }

    fn spawn_internal(
        &mut self,
        archetype: Arc<Archetype>,
        position: Vec3,
        facing: Vec3,
        group: Option<GroupId>,
        encounter: Option<String>,
    ) -> Result<ActorId, SpawnError> {
        let id = ActorId(self.next_agent_id);
        let archetype_id = archetype.id.clone();
        let request = SpawnRequest {
            id,
            archetype,
            position,
            facing,
            group,
        };

        let agent = AgentController::spawn(
            request,
            self.settings.clone(),
            self.rng.fork(),
            &mut self.services,
            self.now,
        )?;
        self.next_agent_id += 1;
        self.agents.insert(id, agent);

        self.events.push(SimEvent::AgentSpawned {
            agent: id,
            archetype: archetype_id,
            position,
            encounter,
        });
        self.collect_agent_output(id);
        Ok(id)
    }

    /// Урон агенту от внешнего мира. Возвращает фактически снятое HP.
    pub fn apply_damage(
        &mut self,
        id: ActorId,
        amount: f32,
        kind: DamageKind,
        source: Option<ActorId>,
    ) -> Result<f32, SimulationError> {
        let now = self.now;
        let agent = self.agents.get_mut(&id).ok_or(SimulationError::UnknownAgent(id))?;
        let dealt = agent.receive_damage(&mut self.services, amount, kind, source, now)?;
        self.collect_agent_output(id);
        Ok(dealt)
    }

    pub fn force_kill(&mut self, id: ActorId) -> Result<(), SimulationError> {
        let now = self.now;
        let agent = self.agents.get_mut(&id).ok_or(SimulationError::UnknownAgent(id))?;
        agent.force_kill(&mut self.services, now)?;
        self.collect_agent_output(id);
        Ok(())
    }

    pub fn reset_to_idle(&mut self, id: ActorId) -> Result<(), SimulationError> {
        let now = self.now;
        let agent = self.agents.get_mut(&id).ok_or(SimulationError::UnknownAgent(id))?;
        agent.reset_to_idle(&mut self.services, now)?;
        self.collect_agent_output(id);
        Ok(())
    }

    /// Validated переход снаружи (скрипты, debug)
    pub fn request_transition(&mut self, id: ActorId, to: AgentState) -> Result<(), SimulationError> {
        let now = self.now;
        let agent = self.agents.get_mut(&id).ok_or(SimulationError::UnknownAgent(id))?;
        let result = agent.request_transition(&mut self.services, to, now);
        self.collect_agent_output(id);
        result.map_err(SimulationError::from)
    }

    /// Alert одного агента к позиции
    pub fn alert_agent(&mut self, id: ActorId, position: Vec3, priority: f32) -> Result<(), SimulationError> {
        let now = self.now;
        let agent = self.agents.get_mut(&id).ok_or(SimulationError::UnknownAgent(id))?;
        agent.alert_to_position(position, priority, now);
        Ok(())
    }

    /// Шум: alert всех живых агентов в радиусе. Возвращает сколько услышали.
    pub fn alert_nearby(&mut self, position: Vec3, radius: f32, priority: f32) -> usize {
        let now = self.now;
        let mut alerted = 0;
        for agent in self.agents.values_mut().filter(|agent| agent.is_alive()) {
            if agent.position().distance(position) <= radius {
                agent.alert_to_position(position, priority, now);
                alerted += 1;
            }
        }
        crate::logger::log(&format!(
            "📢 Noise at ({:.1}, {:.1}, {:.1}) r={:.1}: {} agents alerted",
            position.x, position.y, position.z, radius, alerted
        ));
        alerted
    }

    // ============================================================================
    // Groups
    // ============================================================================

    pub fn create_group(&mut self, settings: GroupSettings) -> GroupId {
        self.services.groups.create(settings)
    }

    pub fn broadcast(&mut self, group: GroupId, signal: &str) -> bool {
        self.services.groups.broadcast(group, signal)
    }

    // ============================================================================
    // Encounters
    // ============================================================================

    /// Запустить encounter из library
    pub fn start_encounter(&mut self, encounter: &str, anchor: Anchor) -> Result<u32, SimulationError> {
        let def = self
            .library
            .encounter(encounter)
            .cloned()
            .ok_or_else(|| SimulationError::UnknownEncounter(encounter.to_string()))?;
        self.start_encounter_def(&def, anchor)
    }

    /// Запустить encounter из готового определения. Первый спавн — сразу.
    pub fn start_encounter_def(&mut self, def: &EncounterDef, anchor: Anchor) -> Result<u32, SimulationError> {
        if let Some(active) = self.director.active_encounter() {
            crate::logger::log_warning(&format!(
                "⚠️ Cannot start '{}': encounter '{}' is still active",
                def.id, active
            ));
            return Err(DirectorError::AlreadyActive {
                active: active.to_string(),
            }
            .into());
        }
        self.library.check_encounter(def)?;

        let group = def.group.map(|settings| self.services.groups.create(settings));
        let mut rng = self.rng.fork();
        let planned = match self.director.start(def, anchor, &self.library, group, self.now, &mut rng) {
            Ok(planned) => planned,
            Err(err) => {
                if let Some(group) = group {
                    self.services.groups.dissolve(group);
                }
                return Err(err.into());
            }
        };

        self.events.push(SimEvent::EncounterStarted {
            encounter: def.id.clone(),
            planned,
            group,
        });
        self.run_director();
        Ok(planned)
    }

    /// Anchor encounter'а следует за игроком
    pub fn set_encounter_anchor(&mut self, anchor: Anchor) {
        self.director.set_anchor(anchor);
    }

    /// Остановить encounter. `kill_remaining` — живые агенты encounter'а умирают.
    pub fn end_encounter(&mut self, kill_remaining: bool) -> Result<Option<EncounterReport>, SimulationError> {
        let Some(report) = self.director.end(kill_remaining, self.now) else {
            return Ok(None);
        };
        self.finish_encounter(report.clone())?;
        Ok(Some(report))
    }

    fn finish_encounter(&mut self, report: EncounterReport) -> Result<(), SimulationError> {
        for id in &report.to_kill {
            if self.agents.contains_key(id) {
                self.force_kill(*id)?;
            }
        }
        // Группа живёт, пока в ней есть отпущенные агенты
        if let Some(group) = report.group {
            if report.detached.is_empty() {
                self.services.groups.dissolve(group);
            }
        }
        self.events.push(SimEvent::EncounterEnded(report));
        Ok(())
    }

    fn run_director(&mut self) {
        let Some(encounter) = self.director.active_encounter().map(str::to_string) else {
            return;
        };

        let mut rng = self.rng.fork();
        let outcomes = self
            .director
            .due_spawns(self.now, &self.services.env, &self.library, &mut rng);

        for outcome in outcomes {
            match outcome {
                SpawnOutcome::Spawn(order) => self.spawn_order(&encounter, order),
                SpawnOutcome::Skipped { archetype, reason } => self.events.push(SimEvent::SpawnSkipped {
                    encounter: encounter.clone(),
                    archetype,
                    reason,
                }),
            }
        }
    }

    fn spawn_order(&mut self, encounter: &str, order: SpawnOrder) {
        let archetype = order.archetype.id.clone();
        match self.spawn_internal(order.archetype, order.position, order.facing, order.group, Some(encounter.to_string())) {
            Ok(id) => self.director.track(id),
            Err(err) => {
                crate::logger::log_error(&format!("❌ Encounter '{}': spawn of '{}' failed: {}", encounter, archetype, err));
                self.director.record_failed_spawn(&archetype);
                self.events.push(SimEvent::SpawnSkipped {
                    encounter: encounter.to_string(),
                    archetype: Some(archetype),
                    reason: SkipReason::SpawnFailed,
                });
            }
        }
    }

    // ============================================================================
    // Tick
    // ============================================================================

    /// Один tick с фиксированным dt из settings
    pub fn step(&mut self) -> Result<(), SimulationError> {
        let dt = self.settings.tick_dt();
        self.tick(dt)
    }

    pub fn tick(&mut self, dt: f32) -> Result<(), SimulationError> {
        self.now += f64::from(dt);
        self.tick_count += 1;
        let now = self.now;

        for (id, delivery) in self.services.groups.drain_deliveries() {
            if let Some(agent) = self.agents.get_mut(&id) {
                agent.deliver(delivery, now);
            }
        }

        let ids: Vec<ActorId> = self.agents.keys().copied().collect();
        for id in ids {
            if let Some(agent) = self.agents.get_mut(&id) {
                if let Err(err) = agent.tick(&mut self.services, now, dt) {
                    crate::logger::log_error(&format!("❌ {} tick failed: {}", id, err));
                }
            }
            self.collect_agent_output(id);
        }

        for outcome in self.services.projectiles.advance(&mut self.services.env, dt) {
            if let ProjectileOutcome::Hit(report) = outcome {
                self.events.push(SimEvent::DamageDealt(report));
            }
        }

        self.run_director();
        if let Some(report) = self.director.check_end(now) {
            self.finish_encounter(report)?;
        }

        self.cleanup_dead(now);
        Ok(())
    }

    fn cleanup_dead(&mut self, now: f64) {
        let expired: Vec<ActorId> = self
            .agents
            .iter()
            .filter(|(_, agent)| agent.ready_for_cleanup(now))
            .map(|(id, _)| *id)
            .collect();

        for id in expired {
            if let Some(mut agent) = self.agents.remove(&id) {
                let group = agent.group();
                agent.teardown(&mut self.services);
                crate::logger::log(&format!("🧹 {} removed", id));
                self.events.push(SimEvent::AgentRemoved { agent: id });
                if let Some(group) = group {
                    self.dissolve_if_orphaned(group);
                }
            }
        }
    }

    /// Пустая группа без активного encounter больше никому не нужна
    fn dissolve_if_orphaned(&mut self, group: GroupId) {
        if self.director.group() == Some(group) {
            return;
        }
        let empty = self.services.groups.get(group).map(|g| g.is_empty()).unwrap_or(false);
        if empty {
            self.services.groups.dissolve(group);
            crate::logger::log(&format!("👥 {} dissolved (no members left)", group));
        }
    }

    /// Забрать state changes и events агента в общую очередь
    fn collect_agent_output(&mut self, id: ActorId) {
        let Some(agent) = self.agents.get_mut(&id) else {
            return;
        };

        for change in agent.drain_changes() {
            self.events.push(SimEvent::StateChanged {
                agent: id,
                from: change.from,
                to: change.to,
                forced: change.forced,
            });
        }

        for event in agent.drain_events() {
            match event {
                AgentEvent::Damaged {
                    amount,
                    source,
                    remaining,
                } => self.events.push(SimEvent::AgentDamaged {
                    agent: id,
                    amount,
                    source,
                    remaining,
                }),
                AgentEvent::DealtDamage(report) => self.events.push(SimEvent::DamageDealt(report)),
                AgentEvent::PhaseChanged { phase, name } => {
                    self.events.push(SimEvent::BossPhaseChanged { agent: id, phase, name })
                }
                AgentEvent::Died { killer } => {
                    self.director.on_agent_died(id);
                    self.events.push(SimEvent::AgentDied { agent: id, killer });
                }
            }
        }
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> SimulationSnapshot {
        SimulationSnapshot {
            tick: self.tick_count,
            now: self.now,
            agents: self
                .agents
                .values()
                .map(|agent| AgentSnapshot {
                    id: agent.id(),
                    archetype: agent.archetype().id.clone(),
                    state: agent.state(),
                    position: agent.position(),
                    health: agent.health().current,
                    boss_phase: agent.boss_phase(),
                })
                .collect(),
        }
    }
}
