use clap::Parser;
use lockstep::{
    check_preconditions, unreachable_states, AutomatonError, ProgramLoader, ProgramManager,
    RunCoordinator, SearchOptions, MAX_EXPANSIONS,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    /// The automaton program (.mta) or saved run (.json) to execute
    #[clap(short, long, conflicts_with = "demo")]
    program: Option<PathBuf>,

    /// Run a built-in demo program by name
    #[clap(short, long)]
    demo: Option<String>,

    /// List the built-in demo programs
    #[clap(short, long)]
    list: bool,

    /// Replace the program's words; repeat once per tape
    #[clap(short, long = "word")]
    words: Vec<String>,

    /// Resume a saved run after this many played snapshots instead of searching from scratch
    #[clap(long)]
    resume_at: Option<usize>,

    /// Give up after expanding this many configurations
    #[clap(long, default_value_t = MAX_EXPANSIONS)]
    max_expansions: usize,

    /// Search without an expansion limit
    #[clap(long, conflicts_with = "max_expansions")]
    unlimited: bool,

    /// Print the run as a JSON record instead of one snapshot per line
    #[clap(long)]
    json: bool,

    /// Save the run as a JSON record to this file
    #[clap(long)]
    save: Option<PathBuf>,

    /// Log more (repeat for more detail); RUST_LOG takes precedence
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.list {
        for (index, name) in ProgramManager::list_program_names().iter().enumerate() {
            println!("{index}: {name}");
        }
        return ExitCode::SUCCESS;
    }

    match execute(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}

/// Installs a stderr subscriber; `-v` raises the default level from `warn`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the run, searches, and prints the result. Returns whether the run accepted.
fn execute(cli: &Cli) -> Result<bool, AutomatonError> {
    let options = SearchOptions {
        max_expansions: (!cli.unlimited).then_some(cli.max_expansions),
    };

    let mut run = match (&cli.program, &cli.demo) {
        (Some(path), _) if is_json(path) => {
            let record = ProgramLoader::load_run(path)?;
            RunCoordinator::load(&record)?.with_options(options)
        }
        (Some(path), _) => {
            RunCoordinator::from_program(ProgramLoader::load_program(path)?).with_options(options)
        }
        (None, Some(name)) => {
            RunCoordinator::from_program(ProgramManager::get_program_by_name(name)?)
                .with_options(options)
        }
        (None, None) => {
            return Err(AutomatonError::ValidationError(
                "Either --program or --demo is required".to_string(),
            ))
        }
    };

    for state in unreachable_states(run.automaton()) {
        warn!(state = %state, "state is unreachable from the start state");
    }

    if !cli.words.is_empty() {
        let automaton = run.automaton();
        check_preconditions(automaton, &cli.words)?;
        while !run.words().is_empty() {
            run.remove_word(run.words().len() - 1)?;
        }
        for word in &cli.words {
            run.add_word(word)?;
        }
    }

    match cli.resume_at {
        Some(step) if !run.history().is_empty() => {
            run.seek(step);
            run.resume();
            run.resimulate()?;
        }
        _ => {
            run.start()?;
        }
    }

    if let Some(path) = &cli.save {
        ProgramLoader::save_run(path, &run.save())?;
    }

    if cli.json {
        println!("{}", run.save().to_json()?);
    } else {
        for (i, snapshot) in run.history().iter().enumerate() {
            println!("{i:>4}: {snapshot}");
        }
        let verdict = if run.is_accepted() {
            "accepted"
        } else {
            "not accepted"
        };
        match run.search_mode() {
            Some(mode) => println!("\n{verdict} ({mode:?})"),
            None => println!("\n{verdict}"),
        }
    }

    Ok(run.is_accepted())
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}
