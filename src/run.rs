//! This module provides the `RunCoordinator`, which keeps one live automaton and word list
//! in sync with editor changes and re-runs the search only over the part of the history an
//! edit invalidates.

use crate::analyzer::{check_history, check_preconditions, check_word};
use crate::automaton::{Automaton, Transition};
use crate::configuration::Configuration;
use crate::record::RunRecord;
use crate::search::{SearchEngine, SearchOptions};
use crate::tape::Tape;
use crate::types::{AppMode, AutomatonError, Program, SearchMode, Snapshot};
use tracing::{debug, info, warn};

/// Owns the automaton, the words, and the history of the current run.
///
/// The history is produced by a search and then played back one snapshot at a time with
/// [`step`](RunCoordinator::step). `current_step` counts the snapshots already played;
/// they form the prefix that survives an edit made while running.
#[derive(Debug, Clone, Default)]
pub struct RunCoordinator {
    automaton: Automaton,
    words: Vec<String>,
    history: Vec<Snapshot>,
    current_step: usize,
    running: bool,
    mode: AppMode,
    options: SearchOptions,
    search_mode: Option<SearchMode>,
}

impl RunCoordinator {
    /// Creates a coordinator for `automaton` with no words.
    pub fn new(automaton: Automaton) -> Self {
        Self {
            automaton,
            ..Self::default()
        }
    }

    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    /// Creates a coordinator for a parsed program and its words.
    pub fn from_program(program: Program) -> Self {
        Self {
            automaton: program.automaton,
            words: program.words,
            ..Self::default()
        }
    }

    /// Runs a fresh search from the start state and rewinds playback.
    ///
    /// # Returns
    ///
    /// * `Err(AutomatonError::MissingStartState)` if the automaton has no start state.
    /// * `Err(AutomatonError::SymbolNotInAlphabet)` if a word is not over the alphabet.
    ///
    /// Nothing is changed when an error is returned.
    pub fn start(&mut self) -> Result<&[Snapshot], AutomatonError> {
        if let Err(e) = check_preconditions(&self.automaton, &self.words) {
            warn!(error = %e, "cannot start run");
            return Err(e);
        }

        self.search_from(Vec::new())?;
        self.current_step = 0;
        self.running = true;
        self.mode = AppMode::Running;

        info!(
            words = self.words.len(),
            history = self.history.len(),
            accepted = self.is_accepted(),
            "run started"
        );

        Ok(&self.history)
    }

    /// Plays back the next snapshot of the history.
    ///
    /// Returns `None` and leaves running mode once every snapshot has been played.
    pub fn step(&mut self) -> Option<Snapshot> {
        self.running = true;
        self.mode = AppMode::Running;

        match self.history.get(self.current_step) {
            Some(snapshot) => {
                self.current_step += 1;
                debug!(step = self.current_step, snapshot = %snapshot, "playback step");
                Some(snapshot.clone())
            }
            None => {
                self.running = false;
                self.mode = AppMode::Drawing;
                info!("playback finished");
                None
            }
        }
    }

    /// Moves playback to `step`, clamped to the history length.
    pub fn seek(&mut self, step: usize) {
        self.current_step = step.min(self.history.len());
    }

    pub fn pause(&mut self) {
        self.running = false;
        info!(step = self.current_step, "run paused");
    }

    pub fn resume(&mut self) {
        self.running = true;
        self.mode = AppMode::Running;
        info!(step = self.current_step, "run resumed");
    }

    /// Drops the history and returns to drawing mode, keeping the automaton and words.
    pub fn restart(&mut self) {
        self.history.clear();
        self.current_step = 0;
        self.running = false;
        self.mode = AppMode::Drawing;
        self.search_mode = None;
        info!("run restarted");
    }

    /// Drops the history, the words, and every state and transition.
    pub fn clear(&mut self) {
        self.restart();
        self.words.clear();
        self.automaton.clear();
        info!("run cleared");
    }

    /// Appends a word and its tape.
    ///
    /// Every snapshot of the history gains position 0 for the new tape. While running, the
    /// search then resumes from the last played snapshot.
    pub fn add_word(&mut self, word: &str) -> Result<(), AutomatonError> {
        check_word(&self.automaton, word)?;

        self.words.push(word.to_string());
        debug!(word, tapes = self.words.len(), "word added");

        self.edit_history(|snapshot| snapshot.positions.push(0))
    }

    /// Replaces the word at `index`.
    ///
    /// The changed tape's position is reset to 0 in every snapshot of the history. While
    /// running, the search then resumes from the last played snapshot.
    pub fn change_word(&mut self, index: usize, word: &str) -> Result<(), AutomatonError> {
        if index >= self.words.len() {
            return Err(AutomatonError::InvalidWordIndex(index));
        }
        check_word(&self.automaton, word)?;

        let old = std::mem::replace(&mut self.words[index], word.to_string());
        debug!(index, old = %old, new = word, "word changed");

        self.edit_history(|snapshot| {
            if let Some(position) = snapshot.positions.get_mut(index) {
                *position = 0;
            }
        })
    }

    /// Removes the word at `index` and returns it.
    ///
    /// The tape is dropped from every snapshot of the history. While running, the search
    /// then resumes from the last played snapshot.
    pub fn remove_word(&mut self, index: usize) -> Result<String, AutomatonError> {
        if index >= self.words.len() {
            return Err(AutomatonError::InvalidWordIndex(index));
        }

        let removed = self.words.remove(index);
        debug!(index, word = %removed, "word removed");

        self.edit_history(|snapshot| {
            if index < snapshot.positions.len() {
                snapshot.positions.remove(index);
            }
        })?;

        Ok(removed)
    }

    /// Rebuilds the transition table from `transitions`, in the given order.
    ///
    /// While running, the search resumes from the last played snapshot.
    pub fn replace_transitions(
        &mut self,
        transitions: impl IntoIterator<Item = Transition>,
    ) -> Result<(), AutomatonError> {
        self.automaton.replace_transitions(transitions);
        debug!(
            transitions = self.automaton.transition_count(),
            "transitions replaced"
        );

        if self.running {
            self.resimulate()?;
        }

        Ok(())
    }

    /// Re-runs the search from the last played snapshot, keeping the played prefix.
    pub fn resimulate(&mut self) -> Result<(), AutomatonError> {
        let prefix = self.played().collect();
        self.resimulate_from(prefix)
    }

    /// Returns `true` if the history ends in an accepting state with every word fully read.
    pub fn is_accepted(&self) -> bool {
        let Some(last) = self.history.last() else {
            return false;
        };

        self.automaton.is_accepting(&last.state)
            && last.positions.len() == self.words.len()
            && last
                .positions
                .iter()
                .zip(&self.words)
                .all(|(&position, word)| position == word.chars().count())
    }

    /// Describes the automaton, words, and history as a record for an external store.
    pub fn save(&self) -> RunRecord {
        RunRecord {
            automaton: self.automaton.to_record(),
            words: self.words.clone(),
            history: self.history.clone(),
        }
    }

    /// Restores a coordinator from a record, with playback rewound to the first step.
    ///
    /// # Returns
    ///
    /// * `Err(AutomatonError::ValidationError)` if a history snapshot does not fit the words.
    pub fn load(record: &RunRecord) -> Result<Self, AutomatonError> {
        let automaton = Automaton::from_record(&record.automaton)?;
        check_history(&record.history, &record.words)?;
        info!(
            words = record.words.len(),
            history = record.history.len(),
            "run loaded"
        );

        Ok(Self {
            automaton,
            words: record.words.clone(),
            history: record.history.clone(),
            ..Self::default()
        })
    }

    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    /// Gives the editor direct access to states and the alphabet.
    pub fn automaton_mut(&mut self) -> &mut Automaton {
        &mut self.automaton
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn history(&self) -> &[Snapshot] {
        &self.history
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn app_mode(&self) -> AppMode {
        self.mode
    }

    /// Returns how the most recent search ended, if one has run since the last restart.
    pub fn search_mode(&self) -> Option<SearchMode> {
        self.search_mode
    }

    /// Copies of the snapshots already played back.
    fn played(&self) -> impl Iterator<Item = Snapshot> + '_ {
        self.history[..self.current_step.min(self.history.len())]
            .iter()
            .cloned()
    }

    /// Applies `edit` to every snapshot of the history after the words changed, then
    /// resumes the search if the run is playing.
    fn edit_history(&mut self, edit: impl FnMut(&mut Snapshot)) -> Result<(), AutomatonError> {
        self.history.iter_mut().for_each(edit);

        if self.running {
            self.resimulate()?;
        }

        Ok(())
    }

    /// Searches forward from the end of `prefix` and puts playback right after it.
    fn resimulate_from(&mut self, prefix: Vec<Snapshot>) -> Result<(), AutomatonError> {
        check_history(&prefix, &self.words)?;

        let retained = prefix.len();
        self.search_from(prefix)?;
        self.current_step = retained;

        debug!(
            retained,
            history = self.history.len(),
            "resimulated from prefix"
        );
        Ok(())
    }

    /// Replaces the history with the result of a search seeded at the end of `prefix`,
    /// or at the start state when `prefix` is empty.
    fn search_from(&mut self, prefix: Vec<Snapshot>) -> Result<(), AutomatonError> {
        let mut engine = SearchEngine::new(&self.automaton).with_options(self.options);

        match Configuration::resume(prefix, &self.words) {
            Some(config) => engine.seed(config),
            None => engine.seed_from_start(self.words.iter().map(|w| Tape::new(w)).collect())?,
        }

        let outcome = engine.run();
        self.search_mode = Some(outcome.mode);
        self.history = outcome.path;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// q0 -[0,#]-> q1 -[#,1]-> q2 (accepting)
    fn two_tape_automaton() -> Automaton {
        let mut automaton = Automaton::new();
        automaton.set_start("q0");
        automaton.add_state("q1", false);
        automaton.add_state("q2", true);
        automaton.add_symbol('0');
        automaton.add_symbol('1');
        automaton.add_transition(Transition::new("q0", vec!['0', '#'], "q1"));
        automaton.add_transition(Transition::new("q1", vec!['#', '1'], "q2"));
        automaton
    }

    fn coordinator(words: &[&str]) -> RunCoordinator {
        let mut run = RunCoordinator::new(two_tape_automaton());
        for word in words {
            run.add_word(word).unwrap();
        }
        run
    }

    #[test]
    fn test_start_runs_search() {
        let mut run = coordinator(&["0", "1"]);
        let history = run.start().unwrap().to_vec();

        assert_eq!(
            history,
            vec![
                Snapshot::new("q0", vec![0, 0]),
                Snapshot::new("q1", vec![1, 0]),
                Snapshot::new("q2", vec![1, 1]),
            ]
        );
        assert!(run.is_accepted());
        assert!(run.is_running());
        assert_eq!(run.app_mode(), AppMode::Running);
        assert_eq!(run.search_mode(), Some(SearchMode::Accepted));
    }

    #[test]
    fn test_start_without_start_state() {
        let mut run = RunCoordinator::new(Automaton::new());
        assert_eq!(run.start(), Err(AutomatonError::MissingStartState));
        assert!(run.history().is_empty());
        assert!(!run.is_running());
    }

    #[test]
    fn test_add_word_outside_alphabet() {
        let mut run = coordinator(&["0"]);
        let result = run.add_word("02");

        assert!(matches!(
            result,
            Err(AutomatonError::SymbolNotInAlphabet { symbol: '2', .. })
        ));
        assert_eq!(run.words(), &["0"]);
    }

    #[test]
    fn test_playback() {
        let mut run = coordinator(&["0", "1"]);
        run.start().unwrap();

        assert_eq!(run.step(), Some(Snapshot::new("q0", vec![0, 0])));
        assert_eq!(run.step(), Some(Snapshot::new("q1", vec![1, 0])));
        assert_eq!(run.step(), Some(Snapshot::new("q2", vec![1, 1])));
        assert_eq!(run.current_step(), 3);

        assert_eq!(run.step(), None);
        assert!(!run.is_running());
        assert_eq!(run.app_mode(), AppMode::Drawing);
    }

    #[test]
    fn test_add_word_mid_run_keeps_prefix() {
        let mut run = coordinator(&["0", "1"]);
        run.start().unwrap();
        run.step();
        run.step();
        let before = run.history()[..2].to_vec();

        run.add_word("1").unwrap();

        let history = run.history();
        assert_eq!(run.current_step(), 2);
        for (old, new) in before.iter().zip(&history[..2]) {
            assert_eq!(old.state, new.state);
            assert_eq!(&new.positions[..2], old.positions.as_slice());
            assert_eq!(new.positions[2], 0);
        }
        // The existing guards never touch the third tape, so the run cannot accept
        assert_eq!(history.last(), Some(&Snapshot::new("q2", vec![1, 1, 0])));
        assert!(!run.is_accepted());
        assert_eq!(run.search_mode(), Some(SearchMode::Exhausted));
    }

    #[test]
    fn test_transitions_edited_mid_run() {
        let mut run = coordinator(&["0", "1"]);
        run.start().unwrap();
        run.step();
        run.step();
        run.add_word("1").unwrap();

        let mut transitions: Vec<_> = run.automaton().transitions().cloned().collect();
        transitions.push(Transition::new("q2", vec!['#', '#', '1'], "q2"));
        run.replace_transitions(transitions).unwrap();

        assert!(run.is_accepted());
        assert_eq!(
            run.history(),
            &[
                Snapshot::new("q0", vec![0, 0, 0]),
                Snapshot::new("q1", vec![1, 0, 0]),
                Snapshot::new("q2", vec![1, 1, 0]),
                Snapshot::new("q2", vec![1, 1, 1]),
            ]
        );
    }

    #[test]
    fn test_change_word_mid_run_resets_tape() {
        // q0 reads zeros from tape 0 in a loop, then tape 1 once
        let mut automaton = Automaton::new();
        automaton.set_start("q0");
        automaton.add_state("q1", true);
        automaton.add_symbol('0');
        automaton.add_symbol('1');
        automaton.add_transition(Transition::new("q0", vec!['0', '#'], "q0"));
        automaton.add_transition(Transition::new("q0", vec!['_', '1'], "q1"));

        let mut run = RunCoordinator::new(automaton);
        run.add_word("00").unwrap();
        run.add_word("1").unwrap();
        run.start().unwrap();
        run.step();
        run.step();
        assert_eq!(run.history()[1], Snapshot::new("q0", vec![1, 0]));

        run.change_word(0, "000").unwrap();

        assert_eq!(
            &run.history()[..2],
            &[
                Snapshot::new("q0", vec![0, 0]),
                Snapshot::new("q0", vec![0, 0]),
            ]
        );
        assert_eq!(run.history().last(), Some(&Snapshot::new("q1", vec![3, 1])));
        assert!(run.is_accepted());
    }

    #[test]
    fn test_change_word_invalid_index() {
        let mut run = coordinator(&["0"]);
        assert_eq!(
            run.change_word(3, "0"),
            Err(AutomatonError::InvalidWordIndex(3))
        );
    }

    #[test]
    fn test_remove_word_mid_run() {
        let mut run = coordinator(&["0", "1"]);
        run.add_word("").unwrap();
        run.start().unwrap();
        assert!(run.is_accepted());
        run.step();
        run.step();

        let removed = run.remove_word(2).unwrap();

        assert_eq!(removed, "");
        assert_eq!(run.words(), &["0", "1"]);
        assert_eq!(
            run.history(),
            &[
                Snapshot::new("q0", vec![0, 0]),
                Snapshot::new("q1", vec![1, 0]),
                Snapshot::new("q2", vec![1, 1]),
            ]
        );
        assert!(run.is_accepted());
    }

    #[test]
    fn test_edit_before_playback_searches_from_start() {
        let mut run = coordinator(&["0", "1"]);
        run.start().unwrap();

        run.change_word(1, "11").unwrap();

        assert_eq!(run.current_step(), 0);
        assert_eq!(run.history()[0], Snapshot::new("q0", vec![0, 0]));
        assert!(!run.is_accepted());
    }

    #[test]
    fn test_edits_while_paused_rewrite_history_without_searching() {
        let mut run = coordinator(&["0", "1"]);
        run.start().unwrap();
        run.pause();

        run.add_word("0").unwrap();

        assert_eq!(
            run.history(),
            &[
                Snapshot::new("q0", vec![0, 0, 0]),
                Snapshot::new("q1", vec![1, 0, 0]),
                Snapshot::new("q2", vec![1, 1, 0]),
            ]
        );
        assert_eq!(run.search_mode(), Some(SearchMode::Accepted));
    }

    fn assert_history_fits(run: &RunCoordinator) {
        for snapshot in run.history() {
            assert_eq!(snapshot.positions.len(), run.words().len(), "{}", snapshot);
            for (position, word) in snapshot.positions.iter().zip(run.words()) {
                assert!(*position <= word.chars().count(), "{}", snapshot);
            }
        }
    }

    #[test]
    fn test_remove_word_while_paused_then_resimulate() {
        let mut run = coordinator(&["0", "1"]);
        run.start().unwrap();
        run.step();
        run.step();
        run.pause();

        run.remove_word(0).unwrap();
        assert_history_fits(&run);

        run.resimulate().unwrap();

        assert_eq!(run.words(), &["1"]);
        assert_eq!(
            run.history(),
            &[
                Snapshot::new("q0", vec![0]),
                Snapshot::new("q1", vec![0]),
                Snapshot::new("q2", vec![0]),
            ]
        );
        assert_history_fits(&run);
        // The remaining word is never read
        assert!(!run.is_accepted());
        assert_eq!(run.search_mode(), Some(SearchMode::Exhausted));
    }

    #[test]
    fn test_change_word_while_paused_then_resume() {
        let mut run = coordinator(&["0", "1"]);
        run.start().unwrap();
        run.step();
        run.step();
        run.pause();

        run.change_word(1, "").unwrap();
        assert_eq!(run.history()[2], Snapshot::new("q2", vec![1, 0]));

        run.resume();
        run.add_word("").unwrap();

        assert_eq!(
            run.history(),
            &[
                Snapshot::new("q0", vec![0, 0, 0]),
                Snapshot::new("q1", vec![1, 0, 0]),
            ]
        );
        assert_history_fits(&run);
        assert!(!run.is_accepted());
    }

    #[test]
    fn test_load_rejects_history_that_does_not_fit_words() {
        let mut run = coordinator(&["0", "1"]);
        run.start().unwrap();

        let mut record = run.save();
        record.words[1] = String::new();
        assert!(matches!(
            RunCoordinator::load(&record),
            Err(AutomatonError::ValidationError(_))
        ));

        let mut record = run.save();
        record.history[1].positions.pop();
        assert!(matches!(
            RunCoordinator::load(&record),
            Err(AutomatonError::ValidationError(_))
        ));
    }

    #[test]
    fn test_search_mode_agrees_with_acceptance_after_edit() {
        let mut run = coordinator(&["0", "1"]);
        run.start().unwrap();
        run.seek(3);
        run.resume();

        run.change_word(1, "").unwrap();

        assert_eq!(run.current_step(), 3);
        assert_eq!(run.history().last(), Some(&Snapshot::new("q2", vec![1, 0])));
        assert_eq!(run.search_mode(), Some(SearchMode::Accepted));
        assert!(run.is_accepted());
        assert_history_fits(&run);
    }

    #[test]
    fn test_restart_and_clear() {
        let mut run = coordinator(&["0", "1"]);
        run.start().unwrap();
        run.step();

        run.restart();
        assert!(run.history().is_empty());
        assert_eq!(run.current_step(), 0);
        assert_eq!(run.words().len(), 2);
        assert_eq!(run.search_mode(), None);

        run.clear();
        assert!(run.words().is_empty());
        assert_eq!(run.automaton().start(), None);
    }

    #[test]
    fn test_save_and_load_then_resume() {
        let mut run = coordinator(&["0", "1"]);
        run.start().unwrap();

        let json = run.save().to_json().unwrap();
        let mut restored = RunCoordinator::load(&RunRecord::from_json(&json).unwrap()).unwrap();

        assert_eq!(restored.history(), run.history());
        assert_eq!(restored.current_step(), 0);
        assert!(!restored.is_running());
        assert!(restored.is_accepted());

        restored.seek(2);
        restored.resume();
        restored.change_word(1, "").unwrap();

        assert_eq!(restored.history().len(), 2);
        assert_eq!(restored.history()[1], Snapshot::new("q1", vec![1, 0]));
        assert!(!restored.is_accepted());
    }

    #[test]
    fn test_resimulate_is_deterministic() {
        let mut run = coordinator(&["0", "1"]);
        run.start().unwrap();
        let first = run.history().to_vec();

        run.seek(1);
        run.resimulate().unwrap();

        assert_eq!(run.history(), first.as_slice());
        assert_eq!(run.current_step(), 1);
    }
}
