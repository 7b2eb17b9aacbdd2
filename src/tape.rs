//! This module defines the `Tape`, a forward-only read head over one input word.

use std::rc::Rc;

/// A read head over a single, immutable input word.
///
/// The word itself is shared between clones, so copying a tape set to explore a branch
/// only copies the cursors. `position` never decreases; once it reaches the word length
/// the tape is exhausted and reads blank forever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    symbols: Rc<[char]>,
    position: usize,
}

impl Tape {
    /// Creates a tape over `word` with the cursor at position 0.
    pub fn new(word: &str) -> Self {
        Self {
            symbols: word.chars().collect(),
            position: 0,
        }
    }

    /// Creates a tape over `word` with the cursor moved to `position`, clamped to the word length.
    pub fn at(word: &str, position: usize) -> Self {
        let mut tape = Self::new(word);
        tape.position = position.min(tape.len());
        tape
    }

    /// Moves the cursor one symbol forward. A no-op on an exhausted tape.
    pub fn advance(&mut self) {
        if self.position < self.symbols.len() {
            self.position += 1;
        }
    }

    /// Returns the symbol under the cursor, or `None` (blank) once the tape is exhausted.
    pub fn current(&self) -> Option<char> {
        self.symbols.get(self.position).copied()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_exhausted(&self) -> bool {
        self.position >= self.symbols.len()
    }

    /// Returns the length of the underlying word in symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }
}
