//! Tests for generic StateMachine.

#[cfg(test)]
mod tests {
    use super::super::machine::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Door {
        Closed,
        Open,
        Locked,
        Broken,
        Ghost,
    }

    const ALL: [Door; 4] = [Door::Closed, Door::Open, Door::Locked, Door::Broken];

    /// Журнал hooks (порядок exit/enter проверяем по нему)
    #[derive(Default)]
    struct Journal {
        entries: Vec<String>,
        updates: u32,
        next: Option<Transition<Door>>,
    }

    struct Hooks(Door);

    impl StateBehavior<Door, Journal, ()> for Hooks {
        fn on_enter(&mut self, ctx: &mut Journal, _world: &mut ()) {
            ctx.entries.push(format!("enter {:?}", self.0));
        }

        fn on_update(&mut self, ctx: &mut Journal, _world: &mut (), _dt: f32) -> Transition<Door> {
            ctx.updates += 1;
            ctx.next.take().unwrap_or(Transition::Stay)
        }

        fn on_fixed_update(&mut self, ctx: &mut Journal, _world: &mut (), _dt: f32) -> Transition<Door> {
            ctx.entries.push(format!("fixed {:?}", self.0));
            Transition::Stay
        }

        fn on_exit(&mut self, ctx: &mut Journal, _world: &mut ()) {
            ctx.entries.push(format!("exit {:?}", self.0));
        }
    }

    fn door_machine() -> StateMachine<Door, Journal> {
        let mut fsm = StateMachine::new("door");
        for door in ALL {
            fsm.register_state(door, Hooks(door)).unwrap();
        }
        fsm.register_transition(Door::Closed, Door::Open).unwrap();
        fsm.register_transition(Door::Open, Door::Closed).unwrap();
        fsm.register_transition(Door::Closed, Door::Locked).unwrap();
        fsm.register_transition(Door::Locked, Door::Closed).unwrap();
        fsm.mark_terminal(Door::Broken).unwrap();
        fsm
    }

    fn allowed(from: Door, to: Door) -> bool {
        matches!(
            (from, to),
            (Door::Closed, Door::Open)
                | (Door::Open, Door::Closed)
                | (Door::Closed, Door::Locked)
                | (Door::Locked, Door::Closed)
        )
    }

    #[test]
    fn test_uninitialized_rejects_everything() {
        let mut fsm = door_machine();
        let mut journal = Journal::default();

        assert!(matches!(
            fsm.request_transition(Door::Open, &mut journal, &mut ()),
            Err(FsmError::NotInitialized(_))
        ));
        assert!(matches!(
            fsm.force_transition(Door::Broken, &mut journal, &mut ()),
            Err(FsmError::NotInitialized(_))
        ));
        assert!(matches!(
            fsm.tick(&mut journal, &mut (), 0.1),
            Err(FsmError::NotInitialized(_))
        ));
        assert!(matches!(
            fsm.fixed_tick(&mut journal, &mut (), 0.1),
            Err(FsmError::NotInitialized(_))
        ));
        assert_eq!(fsm.current(), None);
        assert!(journal.entries.is_empty());
    }

    #[test]
    fn test_initialize_enters_start_state_once() {
        let mut fsm = door_machine();
        let mut journal = Journal::default();

        fsm.initialize(Door::Closed, &mut journal, &mut ()).unwrap();
        assert_eq!(fsm.current(), Some(Door::Closed));
        assert_eq!(fsm.previous(), None);
        assert_eq!(journal.entries, vec!["enter Closed"]);

        assert!(matches!(
            fsm.initialize(Door::Open, &mut journal, &mut ()),
            Err(FsmError::AlreadyInitialized(_))
        ));
    }

    #[test]
    fn test_transition_runs_exit_then_enter() {
        let mut fsm = door_machine();
        let mut journal = Journal::default();
        fsm.initialize(Door::Closed, &mut journal, &mut ()).unwrap();

        fsm.request_transition(Door::Open, &mut journal, &mut ()).unwrap();

        assert_eq!(fsm.current(), Some(Door::Open));
        assert_eq!(fsm.previous(), Some(Door::Closed));
        assert_eq!(journal.entries, vec!["enter Closed", "exit Closed", "enter Open"]);

        let changes = fsm.drain_changes();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0], StateChange { from: None, to: Door::Closed, forced: false });
        assert_eq!(changes[1], StateChange { from: Some(Door::Closed), to: Door::Open, forced: false });

        // drain — exactly once
        assert!(fsm.drain_changes().is_empty());
    }

    #[test]
    fn test_same_state_is_noop_success() {
        let mut fsm = door_machine();
        let mut journal = Journal::default();
        fsm.initialize(Door::Closed, &mut journal, &mut ()).unwrap();
        fsm.drain_changes();

        assert!(fsm.request_transition(Door::Closed, &mut journal, &mut ()).is_ok());
        assert_eq!(journal.entries, vec!["enter Closed"]);
        assert!(fsm.drain_changes().is_empty());
    }

    #[test]
    fn test_unregistered_target_is_configuration_error() {
        let mut fsm = door_machine();
        let mut journal = Journal::default();
        fsm.initialize(Door::Closed, &mut journal, &mut ()).unwrap();

        let err = fsm
            .request_transition(Door::Ghost, &mut journal, &mut ())
            .unwrap_err();
        assert!(matches!(err, FsmError::UnregisteredState { .. }));
        assert!(err.is_configuration());

        assert!(matches!(
            fsm.register_transition(Door::Closed, Door::Ghost),
            Err(FsmError::UnregisteredState { .. })
        ));
        assert!(matches!(
            fsm.register_state(Door::Open, Hooks(Door::Open)),
            Err(FsmError::DuplicateState { .. })
        ));
    }

    #[test]
    fn test_force_bypasses_table_but_not_terminal() {
        let mut fsm = door_machine();
        let mut journal = Journal::default();
        fsm.initialize(Door::Open, &mut journal, &mut ()).unwrap();

        assert!(!fsm.can_transition(Door::Open, Door::Broken));
        fsm.force_transition(Door::Broken, &mut journal, &mut ()).unwrap();
        assert_eq!(fsm.current(), Some(Door::Broken));
        assert!(fsm.is_terminal());

        // Broken — terminal: ни request, ни force не выводят
        assert!(fsm.request_transition(Door::Closed, &mut journal, &mut ()).is_err());
        assert!(matches!(
            fsm.force_transition(Door::Closed, &mut journal, &mut ()),
            Err(FsmError::TerminalState { .. })
        ));
        // idempotent re-enter
        assert!(fsm.request_transition(Door::Broken, &mut journal, &mut ()).is_ok());
        assert_eq!(fsm.current(), Some(Door::Broken));

        let last = fsm.drain_changes().pop().unwrap();
        assert!(last.forced);
    }

    #[test]
    fn test_tick_applies_requested_transition() {
        let mut fsm = door_machine();
        let mut journal = Journal::default();
        fsm.initialize(Door::Closed, &mut journal, &mut ()).unwrap();

        journal.next = Some(Transition::To(Door::Locked));
        fsm.tick(&mut journal, &mut (), 0.016).unwrap();
        assert_eq!(fsm.current(), Some(Door::Locked));
        assert_eq!(journal.updates, 1);

        // Locked → Open нет в таблице: tick не падает, state не меняется
        journal.next = Some(Transition::To(Door::Open));
        fsm.tick(&mut journal, &mut (), 0.016).unwrap();
        assert_eq!(fsm.current(), Some(Door::Locked));

        // unregistered из update — ошибка конфигурации наверх
        journal.next = Some(Transition::To(Door::Ghost));
        assert!(fsm.tick(&mut journal, &mut (), 0.016).is_err());

        journal.next = Some(Transition::Force(Door::Broken));
        fsm.tick(&mut journal, &mut (), 0.016).unwrap();
        assert_eq!(fsm.current(), Some(Door::Broken));
    }

    #[test]
    fn test_fixed_tick_delegates_to_current_state() {
        let mut fsm = door_machine();
        let mut journal = Journal::default();
        fsm.initialize(Door::Open, &mut journal, &mut ()).unwrap();

        fsm.fixed_tick(&mut journal, &mut (), 1.0 / 60.0).unwrap();
        assert_eq!(journal.entries.last().map(String::as_str), Some("fixed Open"));
        assert_eq!(journal.updates, 0);
    }

    fn door_strategy() -> impl Strategy<Value = Door> {
        prop::sample::select(ALL.to_vec())
    }

    proptest! {
        /// Для любой пары вне таблицы request_transition падает и current не меняется.
        #[test]
        fn prop_pairs_outside_table_are_rejected(from in door_strategy(), to in door_strategy()) {
            let mut fsm = door_machine();
            let mut journal = Journal::default();
            fsm.initialize(from, &mut journal, &mut ()).unwrap();

            let result = fsm.request_transition(to, &mut journal, &mut ());

            if from == to {
                prop_assert!(result.is_ok());
                prop_assert_eq!(fsm.current(), Some(from));
            } else if allowed(from, to) {
                prop_assert!(result.is_ok());
                prop_assert_eq!(fsm.current(), Some(to));
            } else {
                prop_assert!(result.is_err());
                prop_assert_eq!(fsm.current(), Some(from));
            }
        }
    }
}
