//! This crate provides the core logic for a multi-tape nondeterministic automaton simulator.
//! It includes modules for parsing automaton programs, searching for accepting runs,
//! resuming a run after its words or transitions are edited, and saving runs as records.

pub mod analyzer;
pub mod automaton;
pub mod configuration;
pub mod guard;
pub mod loader;
pub mod parser;
pub mod programs;
pub mod record;
pub mod run;
pub mod search;
pub mod tape;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the analysis entry points from the analyzer module.
pub use analyzer::{analyze, check_preconditions, unreachable_states, AnalysisError};
/// Re-exports the automaton model.
pub use automaton::{Automaton, Transition};
pub use configuration::Configuration;
pub use guard::{Guard, GuardSymbol};
/// Re-exports the `ProgramLoader` struct from the loader module.
pub use loader::ProgramLoader;
/// Re-exports the `parse` function from the parser module.
pub use parser::parse;
/// Re-exports `ProgramInfo`, `ProgramManager`, and `PROGRAMS` from the programs module.
pub use programs::{ProgramInfo, ProgramManager, PROGRAMS};
pub use record::{AutomatonRecord, RunRecord, StateRecord, TransitionRecord};
/// Re-exports the `RunCoordinator` struct from the run module.
pub use run::RunCoordinator;
/// Re-exports the search engine and its entry points.
pub use search::{search, search_with, CancelToken, SearchEngine, SearchOptions};
pub use tape::Tape;
/// Re-exports the shared types, constants, and error enum from the types module.
pub use types::{
    AppMode, AutomatonError, Program, SearchMode, SearchOutcome, SearchStats, Snapshot,
    BLANK_SYMBOL, MAX_EXPANSIONS, MAX_PROGRAM_SIZE, WILDCARD_SYMBOL,
};
