//! StateMachine — transition-validated runtime.
//!
//! # Transition flow
//!
//! ```text
//! state.on_update() → Transition::To(next)
//!   ↓
//! machine validates (registered? allowed by table? terminal?)
//!   ↓
//! old.on_exit() → previous/current bookkeeping → new.on_enter()
//!   ↓
//! StateChange pushed into notification queue (drain_changes)
//! ```
//!
//! State hooks never get `&mut StateMachine`, so a transition cannot start
//! while another one is running. Requested transitions are applied only after
//! the hook returns.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;

use thiserror::Error;

use crate::logger;

/// Opaque state identifier.
pub trait StateId: Copy + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> StateId for T where T: Copy + Eq + Hash + Debug + Send + Sync + 'static {}

/// Что state хочет сделать после update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition<S> {
    /// Остаёмся в текущем state
    Stay,
    /// Validated transition (через таблицу)
    To(S),
    /// Bypass таблицы (death, boss phase)
    Force(S),
}

/// Реализация одного state.
///
/// `C` — per-agent контекст (blackboard), `W` — shared services (environment, groups).
pub trait StateBehavior<S, C, W>: Send + Sync {
    fn on_enter(&mut self, _ctx: &mut C, _world: &mut W) {}

    fn on_update(&mut self, ctx: &mut C, world: &mut W, dt: f32) -> Transition<S>;

    fn on_fixed_update(&mut self, _ctx: &mut C, _world: &mut W, _dt: f32) -> Transition<S> {
        Transition::Stay
    }

    fn on_exit(&mut self, _ctx: &mut C, _world: &mut W) {}
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FsmError {
    #[error("state machine '{0}' is not initialized")]
    NotInitialized(String),

    #[error("state machine '{0}' is already initialized")]
    AlreadyInitialized(String),

    #[error("state {state} is registered twice in '{machine}'")]
    DuplicateState { machine: String, state: String },

    #[error("state {state} is not registered in '{machine}'")]
    UnregisteredState { machine: String, state: String },

    #[error("transition {from} → {to} is not allowed in '{machine}'")]
    TransitionNotAllowed {
        machine: String,
        from: String,
        to: String,
    },

    #[error("'{machine}' is in terminal state {state}")]
    TerminalState { machine: String, state: String },
}

impl FsmError {
    /// Ошибка конфигурации (authoring mistake), а не отказ в переходе.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            FsmError::DuplicateState { .. }
                | FsmError::UnregisteredState { .. }
                | FsmError::AlreadyInitialized(_)
        )
    }
}

/// Notification: state поменялся.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange<S> {
    /// None — первый enter (initialize)
    pub from: Option<S>,
    pub to: S,
    pub forced: bool,
}

pub struct StateMachine<S: StateId, C, W = ()> {
    label: String,
    states: HashMap<S, Box<dyn StateBehavior<S, C, W>>>,
    transitions: HashMap<S, HashSet<S>>,
    terminal: HashSet<S>,
    current: Option<S>,
    previous: Option<S>,
    changes: Vec<StateChange<S>>,
    _marker: PhantomData<fn(&mut C, &mut W)>,
}

impl<S: StateId, C, W> StateMachine<S, C, W> {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            states: HashMap::new(),
            transitions: HashMap::new(),
            terminal: HashSet::new(),
            current: None,
            previous: None,
            changes: Vec::new(),
            _marker: PhantomData,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn register_state<B>(&mut self, id: S, behavior: B) -> Result<(), FsmError>
    where
        B: StateBehavior<S, C, W> + 'static,
    {
        if self.states.contains_key(&id) {
            return Err(FsmError::DuplicateState {
                machine: self.label.clone(),
                state: format!("{:?}", id),
            });
        }
        self.states.insert(id, Box::new(behavior));
        Ok(())
    }

    /// Оба конца должны быть зарегистрированы заранее.
    pub fn register_transition(&mut self, from: S, to: S) -> Result<(), FsmError> {
        self.ensure_registered(from)?;
        self.ensure_registered(to)?;
        self.transitions.entry(from).or_default().insert(to);
        Ok(())
    }

    /// Terminal state нельзя покинуть даже через force_transition.
    pub fn mark_terminal(&mut self, id: S) -> Result<(), FsmError> {
        self.ensure_registered(id)?;
        self.terminal.insert(id);
        Ok(())
    }

    pub fn is_registered(&self, id: S) -> bool {
        self.states.contains_key(&id)
    }

    pub fn can_transition(&self, from: S, to: S) -> bool {
        self.transitions
            .get(&from)
            .map(|targets| targets.contains(&to))
            .unwrap_or(false)
    }

    pub fn is_initialized(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<S> {
        self.current
    }

    pub fn previous(&self) -> Option<S> {
        self.previous
    }

    pub fn is_terminal(&self) -> bool {
        self.current
            .map(|state| self.terminal.contains(&state))
            .unwrap_or(false)
    }

    /// Забрать накопленные notifications (exactly-once, в порядке переходов).
    pub fn drain_changes(&mut self) -> Vec<StateChange<S>> {
        std::mem::take(&mut self.changes)
    }

    pub fn initialize(&mut self, start: S, ctx: &mut C, world: &mut W) -> Result<(), FsmError> {
        if self.current.is_some() {
            return Err(FsmError::AlreadyInitialized(self.label.clone()));
        }
        self.ensure_registered(start)?;

        self.current = Some(start);
        if let Some(state) = self.states.get_mut(&start) {
            state.on_enter(ctx, world);
        }
        self.changes.push(StateChange {
            from: None,
            to: start,
            forced: false,
        });
        Ok(())
    }

    /// Validated transition.
    ///
    /// - уже в `to` → Ok (no-op)
    /// - `to` не зарегистрирован → configuration error
    /// - нет ребра в таблице → warning + Err, state не меняется
    pub fn request_transition(&mut self, to: S, ctx: &mut C, world: &mut W) -> Result<(), FsmError> {
        let from = self.require_current()?;
        self.ensure_registered(to)?;

        if from == to {
            return Ok(());
        }

        if self.terminal.contains(&from) || !self.can_transition(from, to) {
            logger::log_warning(&format!(
                "FSM '{}': rejected transition {:?} → {:?}",
                self.label, from, to
            ));
            return Err(FsmError::TransitionNotAllowed {
                machine: self.label.clone(),
                from: format!("{:?}", from),
                to: format!("{:?}", to),
            });
        }

        self.apply(from, to, false, ctx, world);
        Ok(())
    }

    /// Bypass таблицы. Только для terminal переходов (death) и boss phases.
    pub fn force_transition(&mut self, to: S, ctx: &mut C, world: &mut W) -> Result<(), FsmError> {
        let from = self.require_current()?;
        self.ensure_registered(to)?;

        if from == to {
            return Ok(());
        }

        if self.terminal.contains(&from) {
            logger::log_warning(&format!(
                "FSM '{}': forced transition {:?} → {:?} refused, {:?} is terminal",
                self.label, from, to, from
            ));
            return Err(FsmError::TerminalState {
                machine: self.label.clone(),
                state: format!("{:?}", from),
            });
        }

        self.apply(from, to, true, ctx, world);
        Ok(())
    }

    pub fn tick(&mut self, ctx: &mut C, world: &mut W, dt: f32) -> Result<(), FsmError> {
        let current = self.require_current()?;
        let request = match self.states.get_mut(&current) {
            Some(state) => state.on_update(ctx, world, dt),
            None => Transition::Stay,
        };
        self.resolve(request, ctx, world)
    }

    pub fn fixed_tick(&mut self, ctx: &mut C, world: &mut W, dt: f32) -> Result<(), FsmError> {
        let current = self.require_current()?;
        let request = match self.states.get_mut(&current) {
            Some(state) => state.on_fixed_update(ctx, world, dt),
            None => Transition::Stay,
        };
        self.resolve(request, ctx, world)
    }

    /// Rejected transition уже залогирован — tick продолжается.
    /// Configuration errors пробрасываем наверх.
    fn resolve(&mut self, request: Transition<S>, ctx: &mut C, world: &mut W) -> Result<(), FsmError> {
        let result = match request {
            Transition::Stay => Ok(()),
            Transition::To(next) => self.request_transition(next, ctx, world),
            Transition::Force(next) => self.force_transition(next, ctx, world),
        };

        match result {
            Err(FsmError::TransitionNotAllowed { .. }) | Err(FsmError::TerminalState { .. }) => Ok(()),
            other => other,
        }
    }

    fn apply(&mut self, from: S, to: S, forced: bool, ctx: &mut C, world: &mut W) {
        if let Some(state) = self.states.get_mut(&from) {
            state.on_exit(ctx, world);
        }

        self.previous = Some(from);
        self.current = Some(to);

        if let Some(state) = self.states.get_mut(&to) {
            state.on_enter(ctx, world);
        }

        self.changes.push(StateChange {
            from: Some(from),
            to,
            forced,
        });
    }

    fn require_current(&self) -> Result<S, FsmError> {
        self.current
            .ok_or_else(|| FsmError::NotInitialized(self.label.clone()))
    }

    fn ensure_registered(&self, id: S) -> Result<(), FsmError> {
        if self.states.contains_key(&id) {
            Ok(())
        } else {
            Err(FsmError::UnregisteredState {
                machine: self.label.clone(),
                state: format!("{:?}", id),
            })
        }
    }
}
