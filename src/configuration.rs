//! This module defines the `Configuration`, one node of the search graph: an automaton state,
//! the tape set at that point, and the path of snapshots that led there.

use crate::automaton::Transition;
use crate::tape::Tape;
use crate::types::Snapshot;

/// A node of the configuration graph.
///
/// Each configuration owns its tapes and its path outright; exploring a successor never
/// touches the tapes of the configuration it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    state: String,
    tapes: Vec<Tape>,
    path: Vec<Snapshot>,
}

impl Configuration {
    /// Builds a root configuration whose path consists of its own snapshot only.
    pub fn seed(state: impl Into<String>, tapes: Vec<Tape>) -> Self {
        let state = state.into();
        let snapshot = Snapshot::new(state.clone(), positions(&tapes));
        Self {
            state,
            tapes,
            path: vec![snapshot],
        }
    }

    /// Rebuilds the configuration at the end of `prefix`, keeping `prefix` as its history.
    ///
    /// Tape cursors are moved to the positions recorded in the last snapshot, clamped to
    /// the word lengths; the last snapshot is rewritten to match. Returns `None` for an
    /// empty prefix.
    pub fn resume(mut prefix: Vec<Snapshot>, words: &[String]) -> Option<Self> {
        let last = prefix.last_mut()?;
        let tapes: Vec<Tape> = words
            .iter()
            .enumerate()
            .map(|(i, word)| Tape::at(word, last.positions.get(i).copied().unwrap_or(0)))
            .collect();
        last.positions = positions(&tapes);

        Some(Self {
            state: last.state.clone(),
            tapes,
            path: prefix,
        })
    }

    /// Tries `transition` from this configuration.
    ///
    /// The guard runs against a private copy of the tapes. On success the copy becomes the
    /// successor's tape set and the successor's path is this path plus one snapshot.
    pub fn successor(&self, transition: &Transition) -> Option<Self> {
        let tapes = transition.guard.apply(&self.tapes)?;

        let mut path = self.path.clone();
        path.push(Snapshot::new(transition.to.clone(), positions(&tapes)));

        Some(Self {
            state: transition.to.clone(),
            tapes,
            path,
        })
    }

    /// Returns the deduplication key of this configuration: its state and tape positions.
    pub fn key(&self) -> Snapshot {
        Snapshot::new(self.state.clone(), positions(&self.tapes))
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn tapes(&self) -> &[Tape] {
        &self.tapes
    }

    pub fn path(&self) -> &[Snapshot] {
        &self.path
    }

    pub fn into_path(self) -> Vec<Snapshot> {
        self.path
    }

    /// Returns `true` when every tape has been read to its end.
    pub fn is_fully_read(&self) -> bool {
        self.tapes.iter().all(Tape::is_exhausted)
    }
}

fn positions(tapes: &[Tape]) -> Vec<usize> {
    tapes.iter().map(Tape::position).collect()
}
