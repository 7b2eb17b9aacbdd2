//! This module provides functions for analyzing automaton programs to detect common errors
//! and inconsistencies before a search is run. This includes checks for known states,
//! guard arity, alphabet membership of guards and words, and the presence of a start state.

use crate::automaton::Automaton;
use crate::types::{is_reserved, AutomatonError, Program, Snapshot};
use std::collections::{BTreeSet, VecDeque};

/// Represents various errors that can be found during the analysis of a program.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AnalysisError {
    /// The automaton has no start state.
    MissingStartState,
    /// A word uses a symbol outside the alphabet.
    SymbolNotInAlphabet { word: String, symbol: char },
    /// The alphabet contains symbols that are reserved for guard notation.
    ReservedSymbols(Vec<char>),
    /// Transitions reference states that are not part of the automaton.
    UnknownStates(Vec<String>),
    /// Guards use concrete symbols that are not part of the alphabet.
    UndeclaredGuardSymbols(Vec<char>),
    /// A guard's length differs from the number of tapes.
    GuardArity {
        state: String,
        expected: usize,
        found: usize,
    },
    /// A history snapshot has a different number of positions than there are words.
    SnapshotArity {
        step: usize,
        expected: usize,
        found: usize,
    },
    /// A history snapshot places a tape past the end of its word.
    PositionPastEnd {
        step: usize,
        tape: usize,
        position: usize,
        length: usize,
    },
}

impl From<AnalysisError> for AutomatonError {
    /// Converts an `AnalysisError` into the matching `AutomatonError`.
    fn from(error: AnalysisError) -> Self {
        match error {
            AnalysisError::MissingStartState => AutomatonError::MissingStartState,
            AnalysisError::SymbolNotInAlphabet { word, symbol } => {
                AutomatonError::SymbolNotInAlphabet { word, symbol }
            }
            AnalysisError::ReservedSymbols(symbols) => AutomatonError::ValidationError(format!(
                "Alphabet contains reserved symbols: {:?}",
                symbols
            )),
            AnalysisError::UnknownStates(states) => AutomatonError::ValidationError(format!(
                "Transitions reference undefined states: {:?}",
                states
            )),
            AnalysisError::UndeclaredGuardSymbols(symbols) => {
                AutomatonError::ValidationError(format!(
                    "Guards use symbols not in the alphabet: {:?}",
                    symbols
                ))
            }
            AnalysisError::GuardArity {
                state,
                expected,
                found,
            } => AutomatonError::ValidationError(format!(
                "Transition from state '{}' has {} guard symbols, expected {}",
                state, found, expected
            )),
            AnalysisError::SnapshotArity {
                step,
                expected,
                found,
            } => AutomatonError::ValidationError(format!(
                "Snapshot {} has {} positions, expected {}",
                step, found, expected
            )),
            AnalysisError::PositionPastEnd {
                step,
                tape,
                position,
                length,
            } => AutomatonError::ValidationError(format!(
                "Snapshot {} puts tape {} at position {} past the end of its word (length {})",
                step, tape, position, length
            )),
        }
    }
}

/// Analyzes a `Program` for structural errors and unmet preconditions.
///
/// # Returns
///
/// * `Ok(())` if no errors are found.
/// * `Err(AutomatonError)` for the first check that fails.
pub fn analyze(program: &Program) -> Result<(), AutomatonError> {
    let automaton = &program.automaton;

    check_reserved_symbols(automaton)?;
    check_known_states(automaton)?;
    check_guard_symbols(automaton)?;
    check_guard_arity(automaton, program.words.len())?;
    check_preconditions(automaton, &program.words)?;

    Ok(())
}

/// Checks the conditions that must hold before any search can start: a start state
/// exists and every word is spelled over the alphabet.
pub fn check_preconditions(automaton: &Automaton, words: &[String]) -> Result<(), AutomatonError> {
    if automaton.start().is_none() {
        return Err(AnalysisError::MissingStartState.into());
    }

    for word in words {
        check_word(automaton, word)?;
    }

    Ok(())
}

/// Checks that every symbol of `word` belongs to the alphabet.
pub fn check_word(automaton: &Automaton, word: &str) -> Result<(), AutomatonError> {
    match word
        .chars()
        .find(|c| is_reserved(*c) || !automaton.alphabet().contains(c))
    {
        Some(symbol) => Err(AnalysisError::SymbolNotInAlphabet {
            word: word.to_string(),
            symbol,
        }
        .into()),
        None => Ok(()),
    }
}

/// Checks that every snapshot of `history` fits `words`: one position per word, none past
/// the end of its word.
pub fn check_history(history: &[Snapshot], words: &[String]) -> Result<(), AutomatonError> {
    let lengths: Vec<usize> = words.iter().map(|w| w.chars().count()).collect();

    for (step, snapshot) in history.iter().enumerate() {
        if snapshot.positions.len() != lengths.len() {
            return Err(AnalysisError::SnapshotArity {
                step,
                expected: lengths.len(),
                found: snapshot.positions.len(),
            }
            .into());
        }

        if let Some((tape, (&position, &length))) = snapshot
            .positions
            .iter()
            .zip(&lengths)
            .enumerate()
            .find(|(_, (position, length))| position > length)
        {
            return Err(AnalysisError::PositionPastEnd {
                step,
                tape,
                position,
                length,
            }
            .into());
        }
    }

    Ok(())
}

fn check_reserved_symbols(automaton: &Automaton) -> Result<(), AnalysisError> {
    let reserved: Vec<char> = automaton
        .alphabet()
        .iter()
        .copied()
        .filter(|c| is_reserved(*c))
        .collect();

    if !reserved.is_empty() {
        return Err(AnalysisError::ReservedSymbols(reserved));
    }

    Ok(())
}

/// Checks that both endpoints of every transition are states of the automaton.
fn check_known_states(automaton: &Automaton) -> Result<(), AnalysisError> {
    let unknown: BTreeSet<String> = automaton
        .transitions()
        .flat_map(|t| [&t.from, &t.to])
        .filter(|state| !automaton.has_state(state))
        .cloned()
        .collect();

    if !unknown.is_empty() {
        return Err(AnalysisError::UnknownStates(unknown.into_iter().collect()));
    }

    Ok(())
}

fn check_guard_symbols(automaton: &Automaton) -> Result<(), AnalysisError> {
    let undeclared: BTreeSet<char> = automaton
        .transitions()
        .flat_map(|t| t.guard.symbols().iter().filter_map(|s| s.symbol()))
        .filter(|c| !automaton.alphabet().contains(c))
        .collect();

    if !undeclared.is_empty() {
        return Err(AnalysisError::UndeclaredGuardSymbols(
            undeclared.into_iter().collect(),
        ));
    }

    Ok(())
}

/// Checks that every guard has one component per tape.
///
/// A program without words has no tape count to check against and is skipped.
fn check_guard_arity(automaton: &Automaton, tapes: usize) -> Result<(), AnalysisError> {
    if tapes == 0 {
        return Ok(());
    }

    automaton
        .transitions()
        .find(|t| t.guard.len() != tapes)
        .map_or(Ok(()), |t| {
            Err(AnalysisError::GuardArity {
                state: t.from.clone(),
                expected: tapes,
                found: t.guard.len(),
            })
        })
}

/// Returns the states that cannot be reached from the start state by following
/// transitions, ignoring guards. Every state is unreachable without a start state.
pub fn unreachable_states(automaton: &Automaton) -> Vec<String> {
    let mut reached = BTreeSet::new();
    let mut queue = VecDeque::new();

    if let Some(start) = automaton.start() {
        reached.insert(start.to_string());
        queue.push_back(start.to_string());
    }

    while let Some(state) = queue.pop_front() {
        for transition in automaton.transitions_from(&state) {
            if reached.insert(transition.to.clone()) {
                queue.push_back(transition.to.clone());
            }
        }
    }

    automaton
        .states()
        .iter()
        .filter(|state| !reached.contains(*state))
        .cloned()
        .collect()
}
