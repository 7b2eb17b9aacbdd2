//! This module defines the `Guard`, the per-transition condition over every tape's current
//! symbol, and the matching rules that decide whether a transition fires and which tapes
//! it advances.

use crate::tape::Tape;
use crate::types::{BLANK_SYMBOL, WILDCARD_SYMBOL};
use serde::{Deserialize, Serialize};

/// One component of a guard, tested against a single tape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardSymbol {
    /// Matches when the tape reads exactly this symbol, then advances the tape.
    Symbol(char),
    /// Matches only an exhausted tape.
    Blank,
    /// Always matches and leaves the tape where it is.
    Any,
}

impl GuardSymbol {
    /// Returns the concrete alphabet symbol, if this component tests for one.
    pub fn symbol(&self) -> Option<char> {
        match self {
            GuardSymbol::Symbol(c) => Some(*c),
            _ => None,
        }
    }
}

impl From<char> for GuardSymbol {
    fn from(c: char) -> Self {
        match c {
            WILDCARD_SYMBOL => GuardSymbol::Any,
            BLANK_SYMBOL => GuardSymbol::Blank,
            c => GuardSymbol::Symbol(c),
        }
    }
}

impl From<GuardSymbol> for char {
    fn from(symbol: GuardSymbol) -> Self {
        match symbol {
            GuardSymbol::Symbol(c) => c,
            GuardSymbol::Blank => BLANK_SYMBOL,
            GuardSymbol::Any => WILDCARD_SYMBOL,
        }
    }
}

/// An ordered tuple of per-tape conditions, one per tape.
///
/// Serialized as the list of its notation characters, e.g. `['0', '#']`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<char>", into = "Vec<char>")]
pub struct Guard(Vec<GuardSymbol>);

impl Guard {
    pub fn new(symbols: Vec<GuardSymbol>) -> Self {
        Self(symbols)
    }

    pub fn symbols(&self) -> &[GuardSymbol] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Evaluates the guard against `tapes` in component order, advancing every tape whose
    /// concrete or blank component matched.
    ///
    /// Tapes past the end of the guard are treated as wildcards. On failure the tapes may
    /// already be partially advanced, so callers must pass a copy they are prepared to
    /// throw away; see [`Guard::apply`].
    pub fn matches(&self, tapes: &mut [Tape]) -> bool {
        for (component, tape) in self.0.iter().zip(tapes.iter_mut()) {
            match component {
                GuardSymbol::Any => continue,
                GuardSymbol::Symbol(expected) if tape.current() == Some(*expected) => {
                    tape.advance()
                }
                GuardSymbol::Blank if tape.is_exhausted() => tape.advance(),
                _ => return false,
            }
        }

        true
    }

    /// Tries the guard on an independent copy of `tapes`.
    ///
    /// Returns the advanced copy on success; on failure the copy is dropped and `tapes`
    /// is untouched.
    pub fn apply(&self, tapes: &[Tape]) -> Option<Vec<Tape>> {
        let mut copy = tapes.to_vec();
        self.matches(&mut copy).then_some(copy)
    }
}

impl From<Vec<char>> for Guard {
    fn from(chars: Vec<char>) -> Self {
        Self(chars.into_iter().map(GuardSymbol::from).collect())
    }
}

impl From<Guard> for Vec<char> {
    fn from(guard: Guard) -> Self {
        guard.0.into_iter().map(char::from).collect()
    }
}

impl std::fmt::Display for Guard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts = self
            .0
            .iter()
            .map(|s| char::from(*s).to_string())
            .collect::<Vec<_>>();
        write!(f, "[{}]", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tapes(words: &[&str]) -> Vec<Tape> {
        words.iter().map(|w| Tape::new(w)).collect()
    }

    fn positions(tapes: &[Tape]) -> Vec<usize> {
        tapes.iter().map(Tape::position).collect()
    }

    #[test]
    fn test_notation_round_trip() {
        let guard = Guard::from(vec!['0', '#', '_']);
        assert_eq!(
            guard.symbols(),
            &[
                GuardSymbol::Symbol('0'),
                GuardSymbol::Any,
                GuardSymbol::Blank
            ]
        );
        assert_eq!(guard.to_string(), "[0, #, _]");
        assert_eq!(Vec::<char>::from(guard), vec!['0', '#', '_']);
    }

    #[test]
    fn test_symbol_match_advances() {
        let mut set = tapes(&["01", "1"]);
        let guard = Guard::from(vec!['0', '1']);

        assert!(guard.matches(&mut set));
        assert_eq!(positions(&set), vec![1, 1]);
    }

    #[test]
    fn test_wildcard_does_not_advance() {
        let mut set = tapes(&["0", "1"]);
        let guard = Guard::from(vec!['0', '#']);

        assert!(guard.matches(&mut set));
        assert_eq!(positions(&set), vec![1, 0]);
    }

    #[test]
    fn test_blank_matches_only_exhausted_tape() {
        let guard = Guard::from(vec!['_']);

        let mut set = tapes(&[""]);
        assert!(guard.matches(&mut set));
        assert_eq!(positions(&set), vec![0]);

        let mut set = tapes(&["0"]);
        assert!(!guard.matches(&mut set));
    }

    #[test]
    fn test_symbol_does_not_match_exhausted_tape() {
        let mut set = tapes(&[""]);
        assert!(!Guard::from(vec!['0']).matches(&mut set));
    }

    #[test]
    fn test_apply_leaves_input_untouched_on_failure() {
        let set = tapes(&["0", "0"]);
        // First component matches and would advance tape 0, second fails
        let guard = Guard::from(vec!['0', '1']);

        assert!(guard.apply(&set).is_none());
        assert_eq!(positions(&set), vec![0, 0]);
    }

    #[test]
    fn test_apply_returns_advanced_copy() {
        let set = tapes(&["0", "1"]);
        let advanced = Guard::from(vec!['#', '1']).apply(&set).unwrap();

        assert_eq!(positions(&advanced), vec![0, 1]);
        assert_eq!(positions(&set), vec![0, 0]);
    }

    #[test]
    fn test_short_guard_treats_missing_components_as_wildcards() {
        let mut set = tapes(&["0", "1", "2"]);
        assert!(Guard::from(vec!['0']).matches(&mut set));
        assert_eq!(positions(&set), vec![1, 0, 0]);
    }

    #[test]
    fn test_guard_serialization() {
        let guard = Guard::from(vec!['a', '#']);
        let json = serde_json::to_string(&guard).unwrap();
        assert_eq!(json, r##"["a","#"]"##);

        let back: Guard = serde_json::from_str(&json).unwrap();
        assert_eq!(back, guard);
    }
}
