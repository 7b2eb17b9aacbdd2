//! This module defines the plain, order-preserving records used to save and restore an
//! automaton and a run, and their conversion to and from the live model.

use crate::automaton::{Automaton, Transition};
use crate::guard::Guard;
use crate::types::{AutomatonError, Snapshot};
use serde::{Deserialize, Serialize};

/// A state together with its start/accept flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    pub name: String,
    #[serde(default)]
    pub is_start: bool,
    #[serde(default)]
    pub is_accept: bool,
}

/// A transition with its guard in notation form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub source: String,
    pub target: String,
    pub guard: Guard,
}

/// The structural description of an automaton.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomatonRecord {
    pub states: Vec<StateRecord>,
    #[serde(default)]
    pub alphabet: Vec<char>,
    pub transitions: Vec<TransitionRecord>,
}

/// Everything needed to restore a run: the automaton, the words, and the history so far.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub automaton: AutomatonRecord,
    pub words: Vec<String>,
    #[serde(default)]
    pub history: Vec<Snapshot>,
}

impl RunRecord {
    pub fn to_json(&self) -> Result<String, AutomatonError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, AutomatonError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Automaton {
    /// Describes the automaton as a record.
    ///
    /// States come out in name order; transitions are grouped by source state in the
    /// same order and keep their registration order within each state.
    pub fn to_record(&self) -> AutomatonRecord {
        AutomatonRecord {
            states: self
                .states()
                .iter()
                .map(|name| StateRecord {
                    name: name.clone(),
                    is_start: self.start() == Some(name.as_str()),
                    is_accept: self.is_accepting(name),
                })
                .collect(),
            alphabet: self.alphabet().iter().copied().collect(),
            transitions: self
                .transitions()
                .map(|t| TransitionRecord {
                    source: t.from.clone(),
                    target: t.to.clone(),
                    guard: t.guard.clone(),
                })
                .collect(),
        }
    }

    /// Rebuilds an automaton from a record.
    ///
    /// # Returns
    ///
    /// * `Err(AutomatonError::ValidationError)` if more than one state is flagged as start.
    pub fn from_record(record: &AutomatonRecord) -> Result<Self, AutomatonError> {
        let starts: Vec<&str> = record
            .states
            .iter()
            .filter(|s| s.is_start)
            .map(|s| s.name.as_str())
            .collect();
        if starts.len() > 1 {
            return Err(AutomatonError::ValidationError(format!(
                "More than one start state: {:?}",
                starts
            )));
        }

        let mut automaton = Automaton::new();
        for state in &record.states {
            automaton.add_state(state.name.clone(), state.is_accept);
            if state.is_start {
                automaton.set_start(state.name.clone());
            }
        }
        for &symbol in &record.alphabet {
            automaton.add_symbol(symbol);
        }
        for t in &record.transitions {
            automaton.add_transition(Transition {
                from: t.source.clone(),
                guard: t.guard.clone(),
                to: t.target.clone(),
            });
        }

        Ok(automaton)
    }
}
