//! AgentController — владелец state machine и контекста одного агента
//!
//! # Lifecycle
//!
//! ```text
//! spawn()   → validate archetype → build machine → Inactive → Idle
//! tick()    → perception → group signals → boss check → state update → locomotion
//! receive_damage() → resistance → alert → Dead (force) / Hurt (roll)
//! teardown() → release slot, leave group, drop projectiles
//! ```
//!
//! Все переходы, инициированные снаружи, проходят через machine, поэтому
//! exit hooks (interrupt ability, release slot) выполняются всегда.

use std::sync::Arc;

use bevy::prelude::*;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

use crate::combat::{AbilityExecutor, MeleeShape};
use crate::components::{ActorId, Health, Kinematics, MoveIntent};
use crate::config::{Archetype, ConfigError, DamageKind, SimulationSettings};
use crate::environment::{Environment, PresentationCue, Vitality};
use crate::fsm::{FsmError, StateChange};
use crate::group::{GroupDelivery, GroupId};
use crate::perception::Perception;

use super::boss::next_phase;
use super::context::LocomotionState;
use super::locomotion;
use super::state::{build_agent_machine, AgentMachine};
use super::{AgentContext, AgentEvent, AgentState, Services, TargetSnapshot};

/// Радиус поиска атакующего для damage alert
const DAMAGE_ALERT_RADIUS: f32 = 200.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpawnError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fsm(#[from] FsmError),
}

/// Параметры спавна одного агента
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    pub id: ActorId,
    pub archetype: Arc<Archetype>,
    pub position: Vec3,
    pub facing: Vec3,
    pub group: Option<GroupId>,
}

pub struct AgentController<E: Environment> {
    machine: AgentMachine<E>,
    ctx: AgentContext,
    changes: Vec<StateChange<AgentState>>,
}

impl<E: Environment> AgentController<E> {
    pub fn spawn(
        request: SpawnRequest,
        settings: Arc<SimulationSettings>,
        rng: ChaCha8Rng,
        services: &mut Services<E>,
        now: f64,
    ) -> Result<Self, SpawnError> {
        let archetype = request.archetype;
        archetype.validate()?;

        let mut machine = build_agent_machine::<E>(format!("agent {}", request.id), archetype.is_boss())?;

        let timings = &settings.timings;
        let shape = MeleeShape {
            offset_factor: timings.melee_offset_factor,
            radius_factor: timings.melee_radius_factor,
        };
        let executor = AbilityExecutor::new(archetype.abilities.clone(), archetype.primary_ability, shape);
        let perception = Perception::new(archetype.perception, settings.perception_interval());
        let health = Health::new(archetype.max_health).with_resistance(archetype.damage_resistance);

        let mut group = request.group;
        if let Some(id) = group {
            if !services.groups.join(id, request.id) {
                crate::logger::log_warning(&format!("{}: could not join {}, acting alone", request.id, id));
                group = None;
            }
        }

        let mut ctx = AgentContext {
            id: request.id,
            archetype: archetype.clone(),
            settings: settings.clone(),
            kinematics: Kinematics::new(request.position, request.facing),
            spawn_point: request.position,
            health,
            perception,
            executor,
            move_intent: MoveIntent::Hold,
            look_at: None,
            locomotion: LocomotionState::default(),
            now,
            target: None,
            last_known_position: None,
            time_since_target_seen: 0.0,
            last_attack_at: None,
            ability_in_progress: false,
            patrol_destination: None,
            stuck_timer: 0.0,
            boss_phase: 0,
            state_entered_at: now,
            holds_attack_slot: false,
            group,
            pending_signals: Vec::new(),
            cleanup_at: None,
            last_damage_source: None,
            speed_multiplier: 1.0,
            rng,
            events: Vec::new(),
        };

        machine.initialize(AgentState::Inactive, &mut ctx, services)?;
        machine.request_transition(AgentState::Idle, &mut ctx, services)?;

        crate::logger::log_info(&format!(
            "🧟 {} spawned: '{}' at ({:.1}, {:.1}, {:.1}){}",
            request.id,
            archetype.id,
            request.position.x,
            request.position.y,
            request.position.z,
            group.map(|id| format!(" in {}", id)).unwrap_or_default()
        ));

        let mut controller = Self {
            machine,
            ctx,
            changes: Vec::new(),
        };
        controller.flush_changes(services);
        Ok(controller)
    }

    pub fn id(&self) -> ActorId {
        self.ctx.id
    }

    pub fn state(&self) -> AgentState {
        self.machine.current().unwrap_or(AgentState::Inactive)
    }

    pub fn previous_state(&self) -> Option<AgentState> {
        self.machine.previous()
    }

    pub fn context(&self) -> &AgentContext {
        &self.ctx
    }

    /// Прямой доступ к blackboard (debug tooling, тесты)
    pub fn context_mut(&mut self) -> &mut AgentContext {
        &mut self.ctx
    }

    pub fn archetype(&self) -> &Arc<Archetype> {
        &self.ctx.archetype
    }

    pub fn health(&self) -> &Health {
        &self.ctx.health
    }

    pub fn position(&self) -> Vec3 {
        self.ctx.kinematics.position
    }

    pub fn is_alive(&self) -> bool {
        self.state() != AgentState::Dead
    }

    pub fn boss_phase(&self) -> usize {
        self.ctx.boss_phase
    }

    pub fn group(&self) -> Option<GroupId> {
        self.ctx.group
    }

    pub fn can_transition(&self, to: AgentState) -> bool {
        self.machine.can_transition(self.state(), to)
    }

    /// Validated переход снаружи (скрипты, debug). Ошибка — state не поменялся.
    pub fn request_transition(&mut self, services: &mut Services<E>, to: AgentState, now: f64) -> Result<(), FsmError> {
        self.ctx.now = now;
        let result = self.machine.request_transition(to, &mut self.ctx, services);
        self.flush_changes(services);
        result
    }

    /// Один шаг агента
    pub fn tick(&mut self, services: &mut Services<E>, now: f64, dt: f32) -> Result<(), FsmError> {
        self.ctx.now = now;

        if self.state() == AgentState::Dead {
            self.machine.tick(&mut self.ctx, services, dt)?;
            self.flush_changes(services);
            return Ok(());
        }

        // Perception → blackboard
        let observer = self.ctx.observer();
        let primary = self
            .ctx
            .perception
            .update(now, observer, &services.env)
            .map(TargetSnapshot::from);
        self.ctx.apply_primary(primary, dt);

        self.process_signals(services)?;
        self.check_boss_phase(services)?;
        // state_entered_at должен быть свежим до update нового state
        self.flush_changes(services);

        self.machine.tick(&mut self.ctx, services, dt)?;
        locomotion::drive(&mut self.ctx, &mut services.env, dt);

        if self.ctx.holds_attack_slot {
            services
                .groups
                .update_attacker_position(self.ctx.group, self.ctx.id, self.ctx.kinematics.position);
        }

        self.flush_changes(services);
        Ok(())
    }

    /// Урон от внешнего мира. Возвращает фактически снятое HP.
    pub fn receive_damage(
        &mut self,
        services: &mut Services<E>,
        amount: f32,
        kind: DamageKind,
        source: Option<ActorId>,
        now: f64,
    ) -> Result<f32, FsmError> {
        self.ctx.now = now;

        let state = self.state();
        if matches!(state, AgentState::Dead | AgentState::Inactive) || self.ctx.health.is_invulnerable() {
            return Ok(0.0);
        }

        let dealt = self.ctx.health.take_damage(amount);
        if dealt <= 0.0 {
            return Ok(0.0);
        }
        self.ctx.last_damage_source = source;
        self.ctx.emit(AgentEvent::Damaged {
            amount: dealt,
            source,
            remaining: self.ctx.health.current,
        });
        crate::logger::log(&format!(
            "🩸 {} took {:.1} {:?} damage ({:.1}/{:.1})",
            self.ctx.id, dealt, kind, self.ctx.health.current, self.ctx.health.max
        ));

        if let Some(attacker) = source {
            self.alert_to_attacker(services, attacker, now);
        }

        if !self.ctx.health.is_alive() {
            self.machine.force_transition(AgentState::Dead, &mut self.ctx, services)?;
            self.flush_changes(services);
            return Ok(dealt);
        }

        let archetype = self.ctx.archetype.clone();
        let staggered = self.ctx.rng.gen::<f32>() < archetype.stagger_chance;
        let flee_threshold = archetype.flee.enabled && self.ctx.health.fraction() <= archetype.flee.health_fraction;

        if (staggered || flee_threshold) && self.can_transition(AgentState::Hurt) && self.ctx.executor.can_interrupt() {
            self.machine.request_transition(AgentState::Hurt, &mut self.ctx, services)?;
        }

        self.flush_changes(services);
        Ok(dealt)
    }

    /// Смерть без урона (end encounter, скрипт)
    pub fn force_kill(&mut self, services: &mut Services<E>, now: f64) -> Result<(), FsmError> {
        if self.state() == AgentState::Dead {
            return Ok(());
        }
        self.ctx.now = now;
        self.machine.force_transition(AgentState::Dead, &mut self.ctx, services)?;
        self.flush_changes(services);
        Ok(())
    }

    /// Ручной сброс в Idle (единственный выход из Flee кроме смерти)
    pub fn reset_to_idle(&mut self, services: &mut Services<E>, now: f64) -> Result<(), FsmError> {
        self.ctx.now = now;
        self.ctx.perception.clear();
        self.ctx.target = None;
        self.machine.force_transition(AgentState::Idle, &mut self.ctx, services)?;
        self.flush_changes(services);
        Ok(())
    }

    /// Alert к позиции (выстрел, шум) без реального восприятия
    pub fn alert_to_position(&mut self, position: Vec3, priority: f32, now: f64) {
        if self.is_alive() {
            self.ctx.perception.alert_to_position(now, position, priority);
        }
    }

    /// Доставка от group coordinator
    pub fn deliver(&mut self, delivery: GroupDelivery, now: f64) {
        if !self.is_alive() {
            return;
        }
        match delivery {
            GroupDelivery::Alert { target, position } => {
                if self.ctx.target.is_none() {
                    self.ctx.perception.alert_to_actor(now, target, position, 1.0);
                }
            }
            GroupDelivery::Signal(signal) => self.ctx.pending_signals.push(signal),
        }
    }

    /// Снять агента со всех shared ресурсов
    pub fn teardown(&mut self, services: &mut Services<E>) {
        if let Some(group) = self.ctx.group.take() {
            services.groups.release_attack_slot(Some(group), self.ctx.id);
            services.groups.leave(group, self.ctx.id);
        }
        self.ctx.holds_attack_slot = false;
        services.projectiles.remove_from(self.ctx.id);
        self.ctx.executor.interrupt(true);
    }

    pub fn ready_for_cleanup(&self, now: f64) -> bool {
        self.ctx.cleanup_at.map(|at| now >= at).unwrap_or(false)
    }

    pub fn drain_events(&mut self) -> Vec<AgentEvent> {
        std::mem::take(&mut self.ctx.events)
    }

    pub fn drain_changes(&mut self) -> Vec<StateChange<AgentState>> {
        std::mem::take(&mut self.changes)
    }

    fn alert_to_attacker(&mut self, services: &Services<E>, attacker: ActorId, now: f64) {
        let priority = self.ctx.timings().damage_alert_priority;
        let found = services
            .env
            .perceivables_near(self.ctx.kinematics.position, DAMAGE_ALERT_RADIUS)
            .into_iter()
            .find(|candidate| candidate.id == attacker);

        if let Some(candidate) = found {
            self.ctx
                .perception
                .alert_to_actor(now, attacker, candidate.position, priority);
            let position = self.ctx.kinematics.position;
            let primary = self.ctx.perception.refresh(now, position).map(TargetSnapshot::from);
            self.ctx.apply_primary(primary, 0.0);
        }
    }

    /// Named signals от группы. Сейчас понимаем только "retreat".
    fn process_signals(&mut self, services: &mut Services<E>) -> Result<(), FsmError> {
        let signals = std::mem::take(&mut self.ctx.pending_signals);
        for signal in signals {
            match signal.as_str() {
                "retreat" => {
                    crate::logger::log(&format!("📣 {}: retreat signal", self.ctx.id));
                    self.ctx.perception.clear();
                    self.ctx.target = None;
                    if self.can_transition(AgentState::Idle) {
                        self.machine.request_transition(AgentState::Idle, &mut self.ctx, services)?;
                    }
                }
                other => crate::logger::log(&format!("{}: ignoring signal '{}'", self.ctx.id, other)),
            }
        }
        Ok(())
    }

    fn check_boss_phase(&mut self, services: &mut Services<E>) -> Result<(), FsmError> {
        if !self.ctx.archetype.is_boss() {
            return Ok(());
        }
        if matches!(
            self.state(),
            AgentState::BossPhaseTransition | AgentState::Dead | AgentState::Inactive
        ) {
            return Ok(());
        }

        let fraction = self.ctx.health.fraction();
        if let Some(phase) = next_phase(&self.ctx.archetype.boss_phases, self.ctx.boss_phase, fraction) {
            self.ctx.boss_phase = phase;
            self.machine
                .force_transition(AgentState::BossPhaseTransition, &mut self.ctx, services)?;
        }
        Ok(())
    }

    /// Notifications → presentation cues + state_entered_at
    fn flush_changes(&mut self, services: &mut Services<E>) {
        for change in self.machine.drain_changes() {
            self.ctx.state_entered_at = self.ctx.now;
            crate::logger::log(&format!(
                "🤖 {}: {:?} → {:?}{}",
                self.ctx.id,
                change.from,
                change.to,
                if change.forced { " (forced)" } else { "" }
            ));
            services.env.cue(PresentationCue::StateEntered {
                agent: self.ctx.id,
                state: change.to,
            });
            self.changes.push(change);
        }
    }
}
