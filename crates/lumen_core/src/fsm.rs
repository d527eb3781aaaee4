//! Flat state machines
//!
//! Widgets describe their interaction states as small enums and drive them
//! through a [`StateMachine`]. A transition may carry a guard that is
//! checked every time its event arrives, and states may run entry actions.

use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::FxHashMap;

/// Decides whether a matching transition may fire
pub type Guard = Box<dyn Fn() -> bool>;

/// Runs when a state is entered
pub type Action = Box<dyn FnMut()>;

/// Marker for types usable as states or events
pub trait FsmKey: Copy + Eq + Hash + Debug + 'static {}

impl<T: Copy + Eq + Hash + Debug + 'static> FsmKey for T {}

pub struct Transition<S, E> {
    pub from_state: S,
    pub event: E,
    pub to_state: S,
    pub guard: Option<Guard>,
}

impl<S: FsmKey, E: FsmKey> Transition<S, E> {
    pub fn new(from: S, event: E, to: S) -> Self {
        Self {
            from_state: from,
            event,
            to_state: to,
            guard: None,
        }
    }

    pub fn with_guard<F: Fn() -> bool + 'static>(mut self, guard: F) -> Self {
        self.guard = Some(Box::new(guard));
        self
    }

    fn accepts(&self, state: S, event: E) -> bool {
        self.from_state == state
            && self.event == event
            && self.guard.as_ref().map_or(true, |guard| guard())
    }
}

pub struct StateMachineBuilder<S, E> {
    initial_state: S,
    transitions: Vec<Transition<S, E>>,
    entry_callbacks: FxHashMap<S, Vec<Action>>,
}

impl<S: FsmKey, E: FsmKey> StateMachineBuilder<S, E> {
    pub fn new(initial_state: S) -> Self {
        Self {
            initial_state,
            transitions: Vec::new(),
            entry_callbacks: FxHashMap::default(),
        }
    }

    pub fn transition(mut self, transition: Transition<S, E>) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Unguarded `from --event--> to`
    pub fn on(self, from: S, event: E, to: S) -> Self {
        self.transition(Transition::new(from, event, to))
    }

    pub fn on_enter<F: FnMut() + 'static>(mut self, state: S, action: F) -> Self {
        self.entry_callbacks
            .entry(state)
            .or_default()
            .push(Box::new(action));
        self
    }

    pub fn build(self) -> StateMachine<S, E> {
        StateMachine {
            current_state: self.initial_state,
            transitions: self.transitions,
            entry_callbacks: self.entry_callbacks,
        }
    }
}

pub struct StateMachine<S, E> {
    current_state: S,
    transitions: Vec<Transition<S, E>>,
    entry_callbacks: FxHashMap<S, Vec<Action>>,
}

impl<S: FsmKey, E: FsmKey> StateMachine<S, E> {
    pub fn builder(initial_state: S) -> StateMachineBuilder<S, E> {
        StateMachineBuilder::new(initial_state)
    }

    pub fn current_state(&self) -> S {
        self.current_state
    }

    pub fn is_in(&self, state: S) -> bool {
        self.current_state == state
    }

    /// Feed `event`, returning the state afterwards
    ///
    /// Without an accepting transition the state stays put.
    pub fn send(&mut self, event: E) -> S {
        let current = self.current_state;
        let Some(to_state) = self
            .transitions
            .iter()
            .find(|t| t.accepts(current, event))
            .map(|t| t.to_state)
        else {
            return current;
        };

        self.current_state = to_state;
        tracing::trace!(from = ?current, ?event, to = ?to_state, "state transition");

        if let Some(callbacks) = self.entry_callbacks.get_mut(&to_state) {
            for callback in callbacks.iter_mut() {
                callback();
            }
        }
        to_state
    }
}
