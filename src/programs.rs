use crate::search::search;
use crate::types::{AutomatonError, Program};

use std::sync::RwLock;

// Default embedded programs
const PROGRAM_TEXTS: [&str; 5] = [
    include_str!("../demos/zeros.mta"),
    include_str!("../demos/read-in-turn.mta"),
    include_str!("../demos/equal-words.mta"),
    include_str!("../demos/same-count.mta"),
    include_str!("../demos/concatenation.mta"),
];

lazy_static::lazy_static! {
    pub static ref PROGRAMS: RwLock<Vec<Program>> = RwLock::new(Vec::new());
}

pub struct ProgramManager;

impl ProgramManager {
    /// Parses the embedded demo programs into the shared list.
    pub fn load() -> Result<(), AutomatonError> {
        let mut programs = Vec::new();

        for program_text in PROGRAM_TEXTS {
            match crate::parser::parse(program_text) {
                Ok(program) => programs.push(program),
                Err(e) => tracing::error!(error = %e, "failed to parse embedded program"),
            }
        }

        if let Ok(mut write_guard) = PROGRAMS.write() {
            *write_guard = programs;
        } else {
            return Err(AutomatonError::FileError(
                "Failed to acquire write lock".to_string(),
            ));
        }

        Ok(())
    }

    /// Loads the demos on first use.
    fn ensure_loaded() {
        let empty = PROGRAMS.read().map(|p| p.is_empty()).unwrap_or(true);
        if empty {
            let _ = Self::load();
        }
    }

    pub fn get_program_count() -> usize {
        Self::ensure_loaded();

        PROGRAMS.read().map(|programs| programs.len()).unwrap_or(0)
    }

    pub fn get_program_by_index(index: usize) -> Result<Program, AutomatonError> {
        Self::ensure_loaded();

        PROGRAMS
            .read()
            .map_err(|_| AutomatonError::FileError("Failed to acquire read lock".to_string()))?
            .get(index)
            .cloned()
            .ok_or_else(|| {
                AutomatonError::ValidationError(format!("Program index {} out of range", index))
            })
    }

    /// Looks a program up by name, ignoring case.
    pub fn get_program_by_name(name: &str) -> Result<Program, AutomatonError> {
        Self::ensure_loaded();

        PROGRAMS
            .read()
            .map_err(|_| AutomatonError::FileError("Failed to acquire read lock".to_string()))?
            .iter()
            .find(|program| program.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| {
                AutomatonError::ValidationError(format!("Program '{}' not found", name))
            })
    }

    pub fn list_program_names() -> Vec<String> {
        Self::ensure_loaded();

        PROGRAMS
            .read()
            .map(|programs| {
                programs
                    .iter()
                    .map(|program| program.name.clone())
                    .collect()
            })
            .unwrap_or_else(|_| Vec::new())
    }

    /// Summarizes a program, running its search to report whether its words are accepted.
    pub fn get_program_info(index: usize) -> Result<ProgramInfo, AutomatonError> {
        let program = Self::get_program_by_index(index)?;
        let accepted = search(&program.automaton, &program.words)?.is_accepted();

        Ok(ProgramInfo {
            index,
            name: program.name.clone(),
            start_state: program.automaton.start().unwrap_or_default().to_string(),
            words: program.words.clone(),
            state_count: program.automaton.states().len(),
            transition_count: program.automaton.transition_count(),
            accepted,
        })
    }

    pub fn get_program_text_by_index(index: usize) -> Result<&'static str, AutomatonError> {
        PROGRAM_TEXTS.get(index).copied().ok_or_else(|| {
            AutomatonError::ValidationError(format!("Program text index {} out of range", index))
        })
    }
}

#[derive(Debug, Clone)]
pub struct ProgramInfo {
    pub index: usize,
    pub name: String,
    pub start_state: String,
    pub words: Vec<String>,
    pub state_count: usize,
    pub transition_count: usize,
    pub accepted: bool,
}
