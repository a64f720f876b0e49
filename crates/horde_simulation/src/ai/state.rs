//! AgentState + таблица переходов
//!
//! ```text
//! Inactive → Idle
//! Idle        → Patrol, Chase, Hurt, Dead
//! Patrol      → Idle, Chase, Hurt, Dead
//! Chase       → Idle, Attack, Positioning, Hurt, Dead
//! Positioning → Idle, Attack, Chase, Hurt, Dead
//! Attack      → Idle, Chase, Hurt, Dead
//! Hurt        → Idle, Chase, Flee, Dead
//! Flee        → Idle, Dead
//! (boss) Chase/Attack/Idle → BossPhaseTransition → Chase, Idle
//! ```
//!
//! Investigate объявлен, но рёбер у него нет. Dead — terminal.

use serde::{Deserialize, Serialize};

use crate::environment::Environment;
use crate::fsm::{FsmError, StateMachine};

use super::states::{
    AttackState, ChaseState, DeadState, FleeState, HurtState, IdleState, InactiveState, InvestigateState,
    PatrolState, PositioningState,
};
use super::{AgentContext, BossPhaseTransitionState, Services};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgentState {
    Inactive,
    Idle,
    Patrol,
    Investigate,
    Chase,
    Positioning,
    Attack,
    Hurt,
    Flee,
    Dead,
    BossPhaseTransition,
}

impl AgentState {
    pub const ALL: [AgentState; 11] = [
        AgentState::Inactive,
        AgentState::Idle,
        AgentState::Patrol,
        AgentState::Investigate,
        AgentState::Chase,
        AgentState::Positioning,
        AgentState::Attack,
        AgentState::Hurt,
        AgentState::Flee,
        AgentState::Dead,
        AgentState::BossPhaseTransition,
    ];

    /// Агент занят боем (держит/может держать attack slot)
    pub fn is_engaged(&self) -> bool {
        matches!(self, AgentState::Chase | AgentState::Positioning | AgentState::Attack)
    }
}

/// Рёбра для всех агентов
pub fn base_transitions(from: AgentState) -> &'static [AgentState] {
    use AgentState::*;
    match from {
        Inactive => &[Idle],
        Idle => &[Patrol, Chase, Hurt, Dead],
        Patrol => &[Idle, Chase, Hurt, Dead],
        Chase => &[Idle, Attack, Positioning, Hurt, Dead],
        Positioning => &[Idle, Attack, Chase, Hurt, Dead],
        Attack => &[Idle, Chase, Hurt, Dead],
        Hurt => &[Idle, Chase, Flee, Dead],
        Flee => &[Idle, Dead],
        Investigate | Dead | BossPhaseTransition => &[],
    }
}

/// Дополнительные рёбра для боссов
pub fn boss_transitions(from: AgentState) -> &'static [AgentState] {
    use AgentState::*;
    match from {
        Chase | Attack | Idle => &[BossPhaseTransition],
        BossPhaseTransition => &[Chase, Idle],
        _ => &[],
    }
}

/// Плоский список рёбер (from, to)
pub fn transition_table(is_boss: bool) -> Vec<(AgentState, AgentState)> {
    let mut edges = Vec::new();
    for from in AgentState::ALL {
        for to in base_transitions(from) {
            edges.push((from, *to));
        }
        if is_boss {
            for to in boss_transitions(from) {
                edges.push((from, *to));
            }
        }
    }
    edges
}

pub type AgentMachine<E> = StateMachine<AgentState, AgentContext, Services<E>>;

/// Регистрирует все states и рёбра; Dead помечается terminal.
pub fn build_agent_machine<E: Environment>(label: impl Into<String>, is_boss: bool) -> Result<AgentMachine<E>, FsmError> {
    let mut machine = AgentMachine::<E>::new(label);

    machine.register_state(AgentState::Inactive, InactiveState)?;
    machine.register_state(AgentState::Idle, IdleState)?;
    machine.register_state(AgentState::Patrol, PatrolState::default())?;
    machine.register_state(AgentState::Investigate, InvestigateState)?;
    machine.register_state(AgentState::Chase, ChaseState::default())?;
    machine.register_state(AgentState::Positioning, PositioningState::default())?;
    machine.register_state(AgentState::Attack, AttackState)?;
    machine.register_state(AgentState::Hurt, HurtState)?;
    machine.register_state(AgentState::Flee, FleeState::default())?;
    machine.register_state(AgentState::Dead, DeadState)?;
    machine.register_state(AgentState::BossPhaseTransition, BossPhaseTransitionState)?;

    for (from, to) in transition_table(is_boss) {
        machine.register_transition(from, to)?;
    }
    machine.mark_terminal(AgentState::Dead)?;

    Ok(machine)
}
