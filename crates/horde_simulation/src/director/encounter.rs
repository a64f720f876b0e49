//! EncounterDirector — жизненный цикл одного encounter
//!
//! start → (due_spawns → track)* → on_agent_died* → check_end / end.
//! Stagger реализован как timestamp следующего спавна: Simulation каждый tick
//! вызывает `due_spawns(now)`, director отдаёт всё, что уже пора.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use bevy::prelude::*;
use rand::Rng;
use thiserror::Error;

use crate::components::ActorId;
use crate::config::{Archetype, ConfigError, ContentLibrary, EncounterDef};
use crate::environment::Navigation;
use crate::group::GroupId;

use super::placement::{find_spawn_point, Anchor, PlacementRules};
use super::selection::pick_entry;

#[derive(Debug, Error)]
pub enum DirectorError {
    #[error("encounter '{active}' is already active")]
    AlreadyActive { active: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Почему encounter закончился
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Все заспавненные мертвы и спавнов больше не будет
    AllDead,
    /// Истёк max_duration
    TimedOut,
    /// Остановлен вызовом `end`
    Cancelled,
}

/// Почему спавн пропущен
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Все записи pool исчерпали лимиты
    PoolExhausted,
    /// За max_spawn_attempts не нашлось подходящей точки
    NoSpawnPoint,
    /// Archetype пропал из library после start
    MissingArchetype,
    /// Simulation не смогла создать агента
    SpawnFailed,
}

/// Приказ Simulation: создать агента
#[derive(Debug, Clone)]
pub struct SpawnOrder {
    pub archetype: Arc<Archetype>,
    pub position: Vec3,
    /// Лицом к anchor
    pub facing: Vec3,
    pub group: Option<GroupId>,
}

#[derive(Debug, Clone)]
pub enum SpawnOutcome {
    Spawn(SpawnOrder),
    Skipped { archetype: Option<String>, reason: SkipReason },
}

/// Итог encounter
#[derive(Debug, Clone, PartialEq)]
pub struct EncounterReport {
    pub encounter: String,
    pub reason: EndReason,
    pub planned: u32,
    pub spawned: u32,
    pub skipped: u32,
    pub killed: u32,
    pub duration: f64,
    /// Живые агенты, которых надо убить (end с kill_remaining)
    pub to_kill: Vec<ActorId>,
    /// Живые агенты, отпущенные на свободу
    pub detached: Vec<ActorId>,
    pub group: Option<GroupId>,
}

#[derive(Debug)]
struct ActiveEncounter {
    def: EncounterDef,
    anchor: Anchor,
    rules: PlacementRules,
    group: Option<GroupId>,
    started_at: f64,
    planned: u32,
    /// Спавны, по которым уже принято решение (заказан или пропущен)
    resolved: u32,
    spawned: u32,
    skipped: u32,
    killed: u32,
    next_spawn_at: f64,
    per_type: HashMap<String, u32>,
    alive: BTreeSet<ActorId>,
}

impl ActiveEncounter {
    fn spawns_resolved(&self) -> bool {
        self.resolved >= self.planned
    }
}

#[derive(Debug, Default)]
pub struct EncounterDirector {
    active: Option<ActiveEncounter>,
    completed: u32,
}

impl EncounterDirector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_encounter(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.def.id.as_str())
    }

    /// Сколько encounter'ов завершено за время жизни director
    pub fn completed(&self) -> u32 {
        self.completed
    }

    pub fn anchor(&self) -> Option<Anchor> {
        self.active.as_ref().map(|active| active.anchor)
    }

    /// Anchor следует за игроком: новые спавны считаются от свежей позиции
    pub fn set_anchor(&mut self, anchor: Anchor) {
        if let Some(active) = &mut self.active {
            active.anchor = anchor;
        }
    }

    pub fn group(&self) -> Option<GroupId> {
        self.active.as_ref().and_then(|active| active.group)
    }

    /// Живые агенты текущего encounter
    pub fn alive(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.active.iter().flat_map(|active| active.alive.iter().copied())
    }

    pub fn is_tracking(&self, id: ActorId) -> bool {
        self.active.as_ref().is_some_and(|active| active.alive.contains(&id))
    }

    /// Спавны, которые ещё впереди
    pub fn pending_spawns(&self) -> u32 {
        self.active
            .as_ref()
            .map(|active| active.planned.saturating_sub(active.resolved))
            .unwrap_or(0)
    }

    /// Запустить encounter. Возвращает выпавшее количество агентов.
    ///
    /// Первый спавн доступен сразу (`due_spawns(now)` в том же tick).
    pub fn start<R: Rng + ?Sized>(
        &mut self,
        def: &EncounterDef,
        anchor: Anchor,
        library: &ContentLibrary,
        group: Option<GroupId>,
        now: f64,
        rng: &mut R,
    ) -> Result<u32, DirectorError> {
        if let Some(active) = &self.active {
            crate::logger::log_warning(&format!(
                "⚠️ Encounter '{}' rejected: '{}' is still active",
                def.id, active.def.id
            ));
            return Err(DirectorError::AlreadyActive {
                active: active.def.id.clone(),
            });
        }
        library.check_encounter(def)?;

        let planned = rng.gen_range(def.min_count..=def.max_count);
        crate::logger::log_info(&format!(
            "🎬 Encounter '{}' started: {} agents, band {:.1}..{:.1}, stagger {:.2}s",
            def.id, planned, def.min_distance, def.max_distance, def.stagger_interval
        ));

        self.active = Some(ActiveEncounter {
            def: def.clone(),
            anchor,
            rules: PlacementRules::from(def),
            group,
            started_at: now,
            planned,
            resolved: 0,
            spawned: 0,
            skipped: 0,
            killed: 0,
            next_spawn_at: now,
            per_type: HashMap::new(),
            alive: BTreeSet::new(),
        });
        Ok(planned)
    }

    /// Все спавны, время которых наступило к `now`
    pub fn due_spawns<N, R>(&mut self, now: f64, nav: &N, library: &ContentLibrary, rng: &mut R) -> Vec<SpawnOutcome>
    where
        N: Navigation + ?Sized,
        R: Rng + ?Sized,
    {
        let mut outcomes = Vec::new();
        let Some(active) = &mut self.active else {
            return outcomes;
        };

        while !active.spawns_resolved() && now >= active.next_spawn_at {
            active.resolved += 1;
            active.next_spawn_at += f64::from(active.def.stagger_interval);

            let outcome = Self::plan_spawn(active, nav, library, rng);
            if let SpawnOutcome::Skipped { archetype, reason } = &outcome {
                active.skipped += 1;
                crate::logger::log_warning(&format!(
                    "⚠️ Encounter '{}': spawn {}/{} skipped ({:?}, archetype {:?})",
                    active.def.id, active.resolved, active.planned, reason, archetype
                ));
            }
            outcomes.push(outcome);
        }
        outcomes
    }

    fn plan_spawn<N, R>(active: &mut ActiveEncounter, nav: &N, library: &ContentLibrary, rng: &mut R) -> SpawnOutcome
    where
        N: Navigation + ?Sized,
        R: Rng + ?Sized,
    {
        let Some(entry) = pick_entry(&active.def.spawn_pool, &active.per_type, rng) else {
            return SpawnOutcome::Skipped {
                archetype: None,
                reason: SkipReason::PoolExhausted,
            };
        };
        let Some(archetype) = library.archetype(&entry.archetype) else {
            return SpawnOutcome::Skipped {
                archetype: Some(entry.archetype.clone()),
                reason: SkipReason::MissingArchetype,
            };
        };
        let Some(position) = find_spawn_point(&active.anchor, &active.rules, nav, rng) else {
            return SpawnOutcome::Skipped {
                archetype: Some(entry.archetype.clone()),
                reason: SkipReason::NoSpawnPoint,
            };
        };

        *active.per_type.entry(entry.archetype.clone()).or_insert(0) += 1;
        let facing = (active.anchor.position - position)
            .with_y(0.0)
            .try_normalize()
            .unwrap_or(Vec3::Z);

        SpawnOutcome::Spawn(SpawnOrder {
            archetype,
            position,
            facing,
            group: active.group,
        })
    }

    /// Агент из SpawnOrder создан
    pub fn track(&mut self, id: ActorId) {
        if let Some(active) = &mut self.active {
            active.spawned += 1;
            active.alive.insert(id);
        }
    }

    /// Simulation не смогла создать агента по SpawnOrder
    pub fn record_failed_spawn(&mut self, archetype: &str) {
        if let Some(active) = &mut self.active {
            active.skipped += 1;
            if let Some(count) = active.per_type.get_mut(archetype) {
                *count = count.saturating_sub(1);
            }
            crate::logger::log_warning(&format!(
                "⚠️ Encounter '{}': failed to spawn '{}'",
                active.def.id, archetype
            ));
        }
    }

    /// Смерть агента. true — агент принадлежал encounter.
    pub fn on_agent_died(&mut self, id: ActorId) -> bool {
        let Some(active) = &mut self.active else {
            return false;
        };
        if !active.alive.remove(&id) {
            return false;
        }
        active.killed += 1;
        crate::logger::log(&format!(
            "Encounter '{}': {} down, {} alive, {} pending",
            active.def.id,
            id,
            active.alive.len(),
            active.planned.saturating_sub(active.resolved)
        ));
        true
    }

    /// Проверить условия окончания. Some — encounter завершён (живые отпускаются).
    pub fn check_end(&mut self, now: f64) -> Option<EncounterReport> {
        let active = self.active.as_ref()?;

        let timed_out = active
            .def
            .max_duration
            .is_some_and(|limit| now - active.started_at >= f64::from(limit));
        let all_dead = active.def.end_on_all_dead && active.spawns_resolved() && active.alive.is_empty();

        if timed_out {
            self.finish(EndReason::TimedOut, false, now)
        } else if all_dead {
            self.finish(EndReason::AllDead, false, now)
        } else {
            None
        }
    }

    /// Остановить encounter вручную.
    ///
    /// `kill_remaining` — живые попадают в `to_kill`, иначе в `detached`.
    pub fn end(&mut self, kill_remaining: bool, now: f64) -> Option<EncounterReport> {
        self.finish(EndReason::Cancelled, kill_remaining, now)
    }

    fn finish(&mut self, reason: EndReason, kill_remaining: bool, now: f64) -> Option<EncounterReport> {
        let active = self.active.take()?;
        self.completed += 1;

        let survivors: Vec<ActorId> = active.alive.into_iter().collect();
        let (to_kill, detached) = if kill_remaining {
            (survivors, Vec::new())
        } else {
            (Vec::new(), survivors)
        };

        let report = EncounterReport {
            encounter: active.def.id,
            reason,
            planned: active.planned,
            spawned: active.spawned,
            skipped: active.skipped,
            killed: active.killed,
            duration: now - active.started_at,
            to_kill,
            detached,
            group: active.group,
        };
        crate::logger::log_info(&format!(
            "🏁 Encounter '{}' ended ({:?}): spawned {}/{}, killed {}, skipped {}, {:.1}s",
            report.encounter, report.reason, report.spawned, report.planned, report.killed, report.skipped, report.duration
        ));
        Some(report)
    }
}
