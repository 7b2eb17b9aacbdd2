//! This module defines the shared data structures and types used throughout the automaton
//! simulator, including path snapshots, search outcomes, run modes, and error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::automaton::Automaton;
use crate::Rule;

/// The symbol used in guard notation for a component that tests "this tape is exhausted".
pub const BLANK_SYMBOL: char = '_';
/// The symbol used in guard notation for a component that matches anything and never advances.
pub const WILDCARD_SYMBOL: char = '#';
/// The maximum allowed size for an automaton program in bytes.
pub const MAX_PROGRAM_SIZE: usize = 65536; // 64KB
/// The maximum number of configurations expanded before a search gives up.
pub const MAX_EXPANSIONS: usize = 1_000_000;

/// Returns `true` if `symbol` has a fixed meaning in guard notation and cannot be used as input.
pub fn is_reserved(symbol: char) -> bool {
    symbol == BLANK_SYMBOL || symbol == WILDCARD_SYMBOL
}

/// A named automaton together with the words it should be run on.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// The name of the program.
    pub name: String,
    /// The automaton's structure.
    pub automaton: Automaton,
    /// The input words, one per tape.
    pub words: Vec<String>,
}

impl Program {
    /// Returns the number of tapes the program runs on.
    pub fn tape_count(&self) -> usize {
        self.words.len()
    }
}

/// One entry of a run's history: the automaton state plus every tape's cursor position.
///
/// This is also the deduplication key of the search: two configurations with equal
/// snapshots are the same node of the configuration graph, whatever their history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Snapshot {
    /// The automaton state.
    pub state: String,
    /// Cursor position of each tape, in tape order.
    pub positions: Vec<usize>,
}

impl Snapshot {
    pub fn new(state: impl Into<String>, positions: Vec<usize>) -> Self {
        Self {
            state: state.into(),
            positions,
        }
    }
}

impl std::fmt::Display for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:?}", self.state, self.positions)
    }
}

/// The lifecycle of a single search run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchMode {
    /// The search has been seeded and is (or can be) running.
    #[default]
    Searching,
    /// An accepting configuration with every tape consumed was reached.
    Accepted,
    /// The queue emptied without reaching acceptance.
    Exhausted,
    /// The caller's cancel token was raised mid-search.
    Cancelled,
    /// The configured expansion budget ran out.
    LimitReached,
}

impl SearchMode {
    /// Returns `true` once the search can make no further progress.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SearchMode::Searching)
    }
}

/// Counters collected while a search runs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Configurations popped from the queue and expanded.
    pub expanded: usize,
    /// Configurations pushed onto the queue, including the seed.
    pub enqueued: usize,
    /// Successor configurations discarded because their key was already visited.
    pub duplicates: usize,
}

/// The result of a search: how it ended and the path it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// The terminal mode the search ended in.
    pub mode: SearchMode,
    /// The accepting path, or the best-effort path of the last popped configuration.
    pub path: Vec<Snapshot>,
    /// Counters for the run.
    pub stats: SearchStats,
}

impl SearchOutcome {
    /// Returns `true` if the search reached an accepting, fully-read configuration.
    pub fn is_accepted(&self) -> bool {
        self.mode == SearchMode::Accepted
    }

    /// Returns the final snapshot of the path, if any.
    pub fn last(&self) -> Option<&Snapshot> {
        self.path.last()
    }
}

/// Whether the surrounding application is editing the automaton or playing back a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppMode {
    #[default]
    Drawing,
    Running,
}

/// Represents various errors that can occur while building, loading, or running an automaton.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AutomatonError {
    /// The automaton has no start state, so no search can be seeded.
    #[error("Automaton has no start state")]
    MissingStartState,
    /// A word contains a symbol that is not part of the automaton's alphabet.
    #[error("Word {word:?} contains symbol {symbol:?} which is not in the alphabet")]
    SymbolNotInAlphabet { word: String, symbol: char },
    /// A word index does not refer to an existing word.
    #[error("Word index {0} is out of range")]
    InvalidWordIndex(usize),
    /// Indicates an error during the parsing of an automaton program.
    #[error("Program parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// Indicates an error during the validation of a program's structure.
    #[error("Program validation error: {0}")]
    ValidationError(String),
    /// Indicates an error related to file system operations.
    #[error("File error: {0}")]
    FileError(String),
    /// Indicates a run record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for AutomatonError {
    fn from(error: serde_json::Error) -> Self {
        AutomatonError::SerializationError(error.to_string())
    }
}
