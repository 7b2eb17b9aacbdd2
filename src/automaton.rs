//! This module defines the static structure of a multi-tape automaton: its states, alphabet,
//! start and accepting states, and the ordered table of outgoing transitions per state.

use crate::guard::Guard;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A directed edge between two states, fired when its guard matches the tapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// The state this transition leaves.
    pub from: String,
    /// The condition over all tapes that must hold for the transition to fire.
    pub guard: Guard,
    /// The state the automaton moves to.
    pub to: String,
}

impl Transition {
    pub fn new(from: impl Into<String>, guard: impl Into<Guard>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            guard: guard.into(),
            to: to.into(),
        }
    }
}

/// A nondeterministic automaton reading several tapes in lockstep.
///
/// The model stores what it is given; consistency checks live in the
/// [`analyzer`](crate::analyzer). Outgoing transitions are kept in registration order,
/// which decides the order the search tries them in.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Automaton {
    states: BTreeSet<String>,
    alphabet: BTreeSet<char>,
    transitions: BTreeMap<String, Vec<Transition>>,
    start: Option<String>,
    accept: BTreeSet<String>,
}

impl Automaton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `state` to the state set, marking it accepting if `is_accept` is set.
    pub fn add_state(&mut self, state: impl Into<String>, is_accept: bool) {
        let state = state.into();
        if is_accept {
            self.accept.insert(state.clone());
        }
        self.states.insert(state);
    }

    /// Makes `state` the start state, adding it to the state set if needed.
    pub fn set_start(&mut self, state: impl Into<String>) {
        let state = state.into();
        self.states.insert(state.clone());
        self.start = Some(state);
    }

    pub fn add_symbol(&mut self, symbol: char) {
        self.alphabet.insert(symbol);
    }

    /// Appends `transition` to the outgoing list of its source state.
    pub fn add_transition(&mut self, transition: Transition) {
        self.transitions
            .entry(transition.from.clone())
            .or_default()
            .push(transition);
    }

    /// Drops every transition and registers `transitions` in the given order.
    pub fn replace_transitions(&mut self, transitions: impl IntoIterator<Item = Transition>) {
        self.transitions.clear();
        for transition in transitions {
            self.add_transition(transition);
        }
    }

    /// Renames a state everywhere it occurs: the state set, the accepting set, the start
    /// pointer, and both endpoints of every transition.
    pub fn rename_state(&mut self, old: &str, new: &str) {
        if old == new {
            return;
        }

        if self.states.remove(old) {
            self.states.insert(new.to_string());
        }
        if self.accept.remove(old) {
            self.accept.insert(new.to_string());
        }
        if self.start.as_deref() == Some(old) {
            self.start = Some(new.to_string());
        }

        if let Some(mut outgoing) = self.transitions.remove(old) {
            for transition in &mut outgoing {
                transition.from = new.to_string();
            }
            self.transitions
                .entry(new.to_string())
                .or_default()
                .extend(outgoing);
        }

        for transition in self.transitions.values_mut().flatten() {
            if transition.to == old {
                transition.to = new.to_string();
            }
        }
    }

    /// Removes every state and transition, keeping the alphabet.
    pub fn clear(&mut self) {
        self.states.clear();
        self.transitions.clear();
        self.accept.clear();
        self.start = None;
    }

    /// Returns the outgoing transitions of `state` in registration order.
    ///
    /// A state without transitions yields an empty slice; it is a dead end, not an error.
    pub fn transitions_from(&self, state: &str) -> &[Transition] {
        self.transitions
            .get(state)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Iterates over every transition, grouped by source state in state order.
    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.values().flatten()
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.values().map(Vec::len).sum()
    }

    pub fn states(&self) -> &BTreeSet<String> {
        &self.states
    }

    pub fn alphabet(&self) -> &BTreeSet<char> {
        &self.alphabet
    }

    pub fn start(&self) -> Option<&str> {
        self.start.as_deref()
    }

    pub fn accept_states(&self) -> &BTreeSet<String> {
        &self.accept
    }

    pub fn is_accepting(&self, state: &str) -> bool {
        self.accept.contains(state)
    }

    pub fn has_state(&self, state: &str) -> bool {
        self.states.contains(state)
    }
}
