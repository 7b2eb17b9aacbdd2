//! This module defines the `SearchEngine`, a breadth-first search over the configuration
//! graph of an automaton that looks for a run consuming every tape and ending in an
//! accepting state.

use crate::automaton::Automaton;
use crate::configuration::Configuration;
use crate::tape::Tape;
use crate::types::{
    AutomatonError, SearchMode, SearchOutcome, SearchStats, Snapshot, MAX_EXPANSIONS,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Tunables for a single search run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// The maximum number of configurations to expand, or `None` for no limit.
    pub max_expansions: Option<usize>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_expansions: Some(MAX_EXPANSIONS),
        }
    }
}

/// A flag a caller can raise from elsewhere to stop a running search.
///
/// The engine checks it once per expanded configuration.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Breadth-first search over configurations of one automaton.
///
/// Configurations are expanded in FIFO order and the transitions of each state are tried
/// in registration order, so an uninterrupted run is fully deterministic.
pub struct SearchEngine<'a> {
    automaton: &'a Automaton,
    options: SearchOptions,
    cancel: Option<CancelToken>,
    queue: VecDeque<Configuration>,
    visited: HashSet<Snapshot>,
    expanded: Vec<Snapshot>,
    stats: SearchStats,
    mode: SearchMode,
}

impl<'a> SearchEngine<'a> {
    /// Creates an engine with an empty working set.
    pub fn new(automaton: &'a Automaton) -> Self {
        Self {
            automaton,
            options: SearchOptions::default(),
            cancel: None,
            queue: VecDeque::new(),
            visited: HashSet::new(),
            expanded: Vec::new(),
            stats: SearchStats::default(),
            mode: SearchMode::Searching,
        }
    }

    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Clears the working set and seeds it with `config` as the only pending configuration.
    pub fn seed(&mut self, config: Configuration) {
        self.queue.clear();
        self.visited.clear();
        self.expanded.clear();
        self.stats = SearchStats::default();
        self.mode = SearchMode::Searching;

        self.visited.insert(config.key());
        self.queue.push_back(config);
        self.stats.enqueued = 1;
    }

    /// Seeds the engine at the automaton's start state with every tape at position 0.
    ///
    /// # Returns
    ///
    /// * `Err(AutomatonError::MissingStartState)` if the automaton has no start state.
    pub fn seed_from_start(&mut self, tapes: Vec<Tape>) -> Result<(), AutomatonError> {
        let start = self
            .automaton
            .start()
            .ok_or(AutomatonError::MissingStartState)?;

        self.seed(Configuration::seed(start, tapes));
        Ok(())
    }

    /// Runs the search until it accepts, exhausts the queue, or is interrupted.
    ///
    /// # Returns
    ///
    /// * The accepting path when an accepting state is reached with every tape consumed.
    /// * Otherwise the path of the last configuration taken from the queue.
    pub fn run(&mut self) -> SearchOutcome {
        debug!(pending = self.queue.len(), "search started");

        let mut last: Option<Configuration> = None;

        let mode = loop {
            if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                break SearchMode::Cancelled;
            }
            if self
                .options
                .max_expansions
                .is_some_and(|max| self.stats.expanded >= max)
            {
                break SearchMode::LimitReached;
            }

            let Some(current) = self.queue.pop_front() else {
                break SearchMode::Exhausted;
            };

            if self.automaton.is_accepting(current.state()) && current.is_fully_read() {
                last = Some(current);
                break SearchMode::Accepted;
            }

            self.expand(&current);
            last = Some(current);
        };

        self.mode = mode;

        let path = last.map(Configuration::into_path).unwrap_or_default();

        debug!(
            mode = ?mode,
            expanded = self.stats.expanded,
            enqueued = self.stats.enqueued,
            duplicates = self.stats.duplicates,
            path_len = path.len(),
            "search finished"
        );

        SearchOutcome {
            mode,
            path,
            stats: self.stats,
        }
    }

    /// Pushes every unvisited successor of `current` onto the queue.
    fn expand(&mut self, current: &Configuration) {
        self.stats.expanded += 1;
        self.expanded.push(current.key());

        for transition in self.automaton.transitions_from(current.state()) {
            let Some(next) = current.successor(transition) else {
                continue;
            };

            if self.visited.insert(next.key()) {
                self.queue.push_back(next);
                self.stats.enqueued += 1;
            } else {
                self.stats.duplicates += 1;
            }
        }
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Returns the keys of every configuration expanded so far, in expansion order.
    pub fn expanded(&self) -> &[Snapshot] {
        &self.expanded
    }

    /// Returns the keys of every configuration ever enqueued.
    pub fn visited(&self) -> &HashSet<Snapshot> {
        &self.visited
    }
}

/// Searches for an accepting run of `automaton` over `words` from its start state.
pub fn search(automaton: &Automaton, words: &[String]) -> Result<SearchOutcome, AutomatonError> {
    search_with(automaton, words, SearchOptions::default())
}

/// Like [`search`], with explicit options.
pub fn search_with(
    automaton: &Automaton,
    words: &[String],
    options: SearchOptions,
) -> Result<SearchOutcome, AutomatonError> {
    let tapes = words.iter().map(|w| Tape::new(w)).collect();
    let mut engine = SearchEngine::new(automaton).with_options(options);
    engine.seed_from_start(tapes)?;
    Ok(engine.run())
}
