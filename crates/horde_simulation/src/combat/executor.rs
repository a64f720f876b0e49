//! AbilityExecutor — windup → execute → recovery sequencing
//!
//! # Phases
//!
//! 1. **Windup**: telegraph, опционально доворачиваемся к цели.
//!    Прерывается только если ability interruptible (или force).
//! 2. **Execute**: hit resolution ровно один раз на входе в фазу
//!    (melee sphere / hitscan / spawn projectile).
//! 3. **Recovery**: cooldown фиксируется на входе в фазу.
//!    По завершении решение (re-attack / chase / idle) принимает вызывающий state.
//!
//! Остаток dt переносится между фазами, поэтому нулевые длительности
//! проходятся за один tick.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::components::ActorId;
use crate::config::{Ability, AbilityDelivery};
use crate::environment::{DamageReceiver, HitQuery, PresentationCue, PresentationSink};

use super::{calculate_damage, deliver_damage, resolve_hitscan, resolve_melee, DamageDealt, MeleeShape, ProjectileStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbilityPhase {
    Windup,
    Execute,
    Recovery,
}

/// Ability в процессе выполнения
#[derive(Debug, Clone)]
pub struct ActiveAbility {
    pub index: usize,
    pub ability: Ability,
    pub phase: AbilityPhase,
    /// Время до конца текущей фазы
    pub phase_timer: f32,
    pub target: Option<ActorId>,
    pub aim_point: Vec3,
    /// Задетые за это использование (дедупликация)
    pub hit_actors: Vec<ActorId>,
}

/// Откуда бьём (snapshot агента на этот tick)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attacker {
    pub id: ActorId,
    pub position: Vec3,
    pub facing: Vec3,
    /// Точка вылета hitscan/projectile
    pub muzzle: Vec3,
}

/// Что произошло за tick
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutorEvent {
    Executed { ability: String, hits: Vec<DamageDealt> },
    RecoveryStarted { ability: String },
    Completed { ability: String },
}

#[derive(Debug, Clone)]
pub struct AbilityExecutor {
    abilities: Vec<Ability>,
    primary: usize,
    damage_multiplier: f32,
    shape: MeleeShape,
    /// ability id → время последнего использования (переживает swap набора)
    last_used: HashMap<String, f64>,
    active: Option<ActiveAbility>,
}

impl AbilityExecutor {
    pub fn new(abilities: Vec<Ability>, primary: usize, shape: MeleeShape) -> Self {
        Self {
            abilities,
            primary,
            damage_multiplier: 1.0,
            shape,
            last_used: HashMap::new(),
            active: None,
        }
    }

    pub fn abilities(&self) -> &[Ability] {
        &self.abilities
    }

    pub fn primary_index(&self) -> usize {
        self.primary
    }

    pub fn primary(&self) -> Option<&Ability> {
        self.abilities.get(self.primary)
    }

    pub fn damage_multiplier(&self) -> f32 {
        self.damage_multiplier
    }

    pub fn set_damage_multiplier(&mut self, multiplier: f32) {
        self.damage_multiplier = multiplier.max(0.0);
    }

    pub fn active(&self) -> Option<&ActiveAbility> {
        self.active.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    pub fn phase(&self) -> Option<AbilityPhase> {
        self.active.as_ref().map(|active| active.phase)
    }

    pub fn last_used(&self, ability_id: &str) -> Option<f64> {
        self.last_used.get(ability_id).copied()
    }

    /// Off cooldown (cooldown отсчитывается от начала recovery)
    pub fn is_ready(&self, index: usize, now: f64) -> bool {
        let Some(ability) = self.abilities.get(index) else {
            return false;
        };
        match self.last_used.get(&ability.id) {
            Some(last) => now - last >= ability.cooldown as f64,
            None => true,
        }
    }

    pub fn is_primary_ready(&self, now: f64) -> bool {
        self.is_ready(self.primary, now)
    }

    /// Primary если готов и дистанция в его range band, иначе первый готовый подходящий.
    pub fn select_ability(&self, distance: f32, now: f64) -> Option<usize> {
        let usable = |index: usize| {
            self.abilities
                .get(index)
                .map(|ability| ability.in_range(distance) && self.is_ready(index, now))
                .unwrap_or(false)
        };

        if usable(self.primary) {
            return Some(self.primary);
        }
        (0..self.abilities.len()).find(|index| usable(*index))
    }

    /// Старт ability (Windup). false — уже занят, на cooldown или нет такого индекса.
    pub fn begin(&mut self, index: usize, target: Option<ActorId>, aim_point: Vec3, now: f64) -> bool {
        if self.active.is_some() || !self.is_ready(index, now) {
            return false;
        }
        let Some(ability) = self.abilities.get(index).cloned() else {
            return false;
        };

        self.active = Some(ActiveAbility {
            index,
            phase_timer: ability.windup,
            ability,
            phase: AbilityPhase::Windup,
            target,
            aim_point,
            hit_actors: Vec::new(),
        });
        true
    }

    /// Обновить точку прицеливания (только в Windup и если ability трекает цель)
    pub fn track(&mut self, aim_point: Vec3) -> bool {
        match self.active.as_mut() {
            Some(active) if active.phase == AbilityPhase::Windup && active.ability.track_target => {
                active.aim_point = aim_point;
                true
            }
            _ => false,
        }
    }

    /// Можно ли прервать без force
    pub fn can_interrupt(&self) -> bool {
        match &self.active {
            Some(active) => active.phase != AbilityPhase::Windup || active.ability.interruptible,
            None => true,
        }
    }

    /// Прервать текущее использование. Возвращает true если что-то было прервано.
    pub fn interrupt(&mut self, force: bool) -> bool {
        if self.active.is_none() || (!force && !self.can_interrupt()) {
            return false;
        }
        if let Some(active) = self.active.take() {
            crate::logger::log(&format!(
                "✋ ability '{}' interrupted in {:?}{}",
                active.ability.id,
                active.phase,
                if force { " (forced)" } else { "" }
            ));
        }
        true
    }

    /// Замена набора abilities (boss phase). Текущее использование прерывается.
    pub fn swap_abilities(&mut self, abilities: Vec<Ability>, primary: usize) {
        self.interrupt(true);
        self.abilities = abilities;
        self.primary = primary;
    }

    /// Продвинуть фазы на dt.
    pub fn tick<E>(
        &mut self,
        attacker: Attacker,
        world: &mut E,
        projectiles: &mut ProjectileStore,
        now: f64,
        dt: f32,
    ) -> Vec<ExecutorEvent>
    where
        E: HitQuery + DamageReceiver + PresentationSink + ?Sized,
    {
        let mut events = Vec::new();
        let Some(mut active) = self.active.take() else {
            return events;
        };

        active.phase_timer -= dt;
        let finished = loop {
            if active.phase_timer > 0.0 {
                break false;
            }
            match active.phase {
                AbilityPhase::Windup => {
                    active.phase = AbilityPhase::Execute;
                    active.phase_timer += active.ability.execute;
                    let hits = self.execute(&mut active, attacker, world, projectiles);
                    events.push(ExecutorEvent::Executed {
                        ability: active.ability.id.clone(),
                        hits,
                    });
                }
                AbilityPhase::Execute => {
                    active.phase = AbilityPhase::Recovery;
                    active.phase_timer += active.ability.recovery;
                    self.last_used.insert(active.ability.id.clone(), now);
                    events.push(ExecutorEvent::RecoveryStarted {
                        ability: active.ability.id.clone(),
                    });
                }
                AbilityPhase::Recovery => {
                    events.push(ExecutorEvent::Completed {
                        ability: active.ability.id.clone(),
                    });
                    break true;
                }
            }
        };

        if !finished {
            self.active = Some(active);
        }
        events
    }

    /// Hit resolution (один раз на использование)
    fn execute<E>(
        &self,
        active: &mut ActiveAbility,
        attacker: Attacker,
        world: &mut E,
        projectiles: &mut ProjectileStore,
    ) -> Vec<DamageDealt>
    where
        E: HitQuery + DamageReceiver + PresentationSink + ?Sized,
    {
        let ability = &active.ability;
        let damage = calculate_damage(ability.base_damage, self.damage_multiplier);
        world.cue(PresentationCue::AbilityExecuted {
            agent: attacker.id,
            ability: ability.id.clone(),
        });

        let targets = match ability.delivery {
            AbilityDelivery::MeleeArea => resolve_melee(
                &*world,
                attacker.id,
                attacker.position,
                attacker.facing,
                ability,
                self.shape,
                &active.hit_actors,
            ),
            AbilityDelivery::Hitscan => resolve_hitscan(&*world, attacker.id, attacker.muzzle, active.aim_point, ability)
                .filter(|target| !active.hit_actors.contains(target))
                .into_iter()
                .collect(),
            AbilityDelivery::Projectile { speed, lifetime } => {
                let direction = (active.aim_point - attacker.muzzle)
                    .try_normalize()
                    .unwrap_or(attacker.facing);
                projectiles.spawn(
                    attacker.id,
                    &ability.id,
                    attacker.muzzle,
                    direction,
                    speed,
                    lifetime,
                    damage,
                    ability.damage_kind,
                );
                world.cue(PresentationCue::ProjectileLaunched {
                    agent: attacker.id,
                    ability: ability.id.clone(),
                    origin: attacker.muzzle,
                });
                Vec::new()
            }
        };

        let mut hits = Vec::with_capacity(targets.len());
        for target in targets {
            hits.push(deliver_damage(
                world,
                attacker.id,
                target,
                damage,
                ability.damage_kind,
                &ability.id,
            ));
            active.hit_actors.push(target);
        }
        hits
    }
}
