//! This module provides the `ProgramLoader` struct, responsible for loading automaton
//! programs from `.mta` files and saved runs from `.json` run records.

use crate::parser::parse;
use crate::record::RunRecord;
use crate::types::{AutomatonError, Program};
use std::fs;
use std::path::{Path, PathBuf};

/// `ProgramLoader` is a utility struct for loading automaton programs and saved runs.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Loads a single program from the specified `.mta` file.
    ///
    /// # Returns
    ///
    /// * `Ok(Program)` if the file is successfully read and parsed.
    /// * `Err(AutomatonError::FileError)` if the file cannot be read.
    /// * `Err(AutomatonError::ParseError)` if the file content is not a valid program.
    pub fn load_program(path: &Path) -> Result<Program, AutomatonError> {
        parse(&read(path)?)
    }

    /// Loads a single program from the provided string content.
    pub fn load_program_from_string(content: &str) -> Result<Program, AutomatonError> {
        parse(content)
    }

    /// Loads a saved run from a JSON run record.
    pub fn load_run(path: &Path) -> Result<RunRecord, AutomatonError> {
        RunRecord::from_json(&read(path)?)
    }

    /// Writes `record` to `path` as pretty-printed JSON.
    pub fn save_run(path: &Path, record: &RunRecord) -> Result<(), AutomatonError> {
        fs::write(path, record.to_json()?).map_err(|e| {
            AutomatonError::FileError(format!("Failed to write file {}: {}", path.display(), e))
        })
    }

    /// Loads all program files (`.mta` extension) from a given directory.
    ///
    /// Directories and other files are skipped. Each element of the result is either the
    /// path and program of a successfully loaded file, or the error for a file that failed.
    pub fn load_programs(directory: &Path) -> Vec<Result<(PathBuf, Program), AutomatonError>> {
        if !directory.exists() {
            return vec![Err(AutomatonError::FileError(format!(
                "Directory {} does not exist",
                directory.display()
            )))];
        }

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(AutomatonError::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| !path.is_dir() && path.extension().is_some_and(|ext| ext == "mta"))
            .collect();

        // Directory order is platform dependent
        paths.sort();

        paths
            .into_iter()
            .map(|path| match Self::load_program(&path) {
                Ok(program) => Ok((path, program)),
                Err(e) => Err(AutomatonError::FileError(format!(
                    "Failed to load program from {}: {}",
                    path.display(),
                    e
                ))),
            })
            .collect()
    }
}

fn read(path: &Path) -> Result<String, AutomatonError> {
    fs::read_to_string(path).map_err(|e| {
        AutomatonError::FileError(format!("Failed to read file {}: {}", path.display(), e))
    })
}
