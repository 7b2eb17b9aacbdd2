//! This module provides the parser for automaton programs, utilizing the `pest` crate.
//! It defines the grammar for `.mta` files and functions to parse the input into a `Program` struct.

use crate::{
    analyzer::analyze,
    automaton::{Automaton, Transition},
    guard::{Guard, GuardSymbol},
    types::{AutomatonError, Program, MAX_PROGRAM_SIZE},
};
use pest::{
    error::{Error, ErrorVariant},
    iterators::Pair,
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;
use std::collections::{BTreeSet, HashSet};

/// Derives a `PestParser` for the automaton grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct AutomatonParser;

/// Parses the given input string into a `Program` struct.
///
/// This is the main entry point for parsing automaton program definitions. The parsed
/// program is validated with [`analyze`] before being returned.
///
/// # Returns
///
/// * `Ok(Program)` if the input is successfully parsed and validated.
/// * `Err(AutomatonError::ParseError)` if there are any syntax errors.
/// * `Err(AutomatonError::ValidationError)` if the program fails validation.
pub fn parse(input: &str) -> Result<Program, AutomatonError> {
    if input.len() > MAX_PROGRAM_SIZE {
        return Err(AutomatonError::ValidationError(format!(
            "Program is {} bytes, the limit is {}",
            input.len(),
            MAX_PROGRAM_SIZE
        )));
    }

    let root = AutomatonParser::parse(Rule::program, input.trim())
        .map_err(|e| AutomatonError::ParseError(e.into()))?
        .next()
        .ok_or_else(|| AutomatonError::ValidationError("Empty program".to_string()))?;

    let program = parse_program(root)?;

    analyze(&program)?;

    Ok(program)
}

/// A rule block as written: the source state and its transitions in order.
type Block = (String, Vec<(Guard, String)>);

/// Parses the top-level structure of a program from a `Pair<Rule::program>`.
fn parse_program(pair: Pair<Rule>) -> Result<Program, AutomatonError> {
    let mut name: Option<String> = None;
    let mut alphabet: Option<Vec<char>> = None;
    let mut words: Option<Vec<String>> = None;
    let mut start: Option<String> = None;
    let mut accept: Option<Vec<String>> = None;
    let mut blocks: Option<Vec<Block>> = None;
    let mut seen = HashSet::new();

    for p in pair.into_inner() {
        let span = p.as_span();
        let rule = p.as_rule();

        check_unique_rule(rule, span, &mut seen)?;

        match rule {
            Rule::name => name = Some(parse_text(p)),
            Rule::alphabet => alphabet = Some(p.into_inner().map(parse_symbol).collect()),
            Rule::words => words = Some(p.into_inner().map(parse_word).collect()),
            Rule::start => start = parse_states(p).into_iter().next(),
            Rule::accept => accept = Some(parse_states(p)),
            Rule::rules => blocks = Some(parse_blocks(p)?),
            _ => {} // EOI
        }
    }

    let name = check_required_rule(name, "name")?;
    let blocks = check_required_rule(blocks, "rules")?;

    let automaton = build_automaton(
        blocks,
        alphabet,
        start,
        accept.unwrap_or_default(),
    );

    Ok(Program {
        name,
        automaton,
        words: words.unwrap_or_default(),
    })
}

/// Assembles the automaton from the parsed sections.
///
/// The first rule block is the start state unless `start:` names one. Without an
/// `alphabet:` section the alphabet is every concrete symbol used by a guard.
fn build_automaton(
    blocks: Vec<Block>,
    alphabet: Option<Vec<char>>,
    start: Option<String>,
    accept: Vec<String>,
) -> Automaton {
    let mut automaton = Automaton::new();

    if let Some(start) = start.or_else(|| blocks.first().map(|(state, _)| state.clone())) {
        automaton.set_start(start);
    }

    for state in accept {
        automaton.add_state(state, true);
    }

    let alphabet = alphabet.unwrap_or_else(|| {
        blocks
            .iter()
            .flat_map(|(_, transitions)| transitions)
            .flat_map(|(guard, _)| guard.symbols().iter().filter_map(GuardSymbol::symbol))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    });
    for symbol in alphabet {
        automaton.add_symbol(symbol);
    }

    for (state, transitions) in blocks {
        automaton.add_state(state.clone(), false);
        for (guard, target) in transitions {
            automaton.add_state(target.clone(), false);
            automaton.add_transition(Transition {
                from: state.clone(),
                guard,
                to: target,
            });
        }
    }

    automaton
}

/// Parses the rule blocks of a `Pair<Rule::rules>`, rejecting a state declared twice.
fn parse_blocks(pair: Pair<Rule>) -> Result<Vec<Block>, AutomatonError> {
    let mut blocks: Vec<Block> = Vec::new();

    for block_pair in pair.into_inner() {
        let span = block_pair.as_span();
        let mut pairs = block_pair.into_inner();
        let state = pairs
            .next()
            .map(|p| p.as_str().to_string())
            .unwrap_or_default();

        if blocks.iter().any(|(existing, _)| *existing == state) {
            return Err(parse_error(
                &format!("Duplicate transition rule: {state}"),
                span,
            ));
        }

        let transitions = pairs.map(parse_transition).collect();
        blocks.push((state, transitions));
    }

    Ok(blocks)
}

/// Parses a single `guard -> state` transition.
fn parse_transition(pair: Pair<Rule>) -> (Guard, String) {
    let mut guard = Vec::new();
    let mut target = String::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::guard => {
                guard = inner
                    .into_inner()
                    .map(|s| GuardSymbol::from(parse_symbol(s)))
                    .collect()
            }
            Rule::state => target = inner.as_str().to_string(),
            _ => {}
        }
    }

    (Guard::new(guard), target)
}

/// Parses a single character symbol, handling quoted and unquoted symbols.
fn parse_symbol(pair: Pair<Rule>) -> char {
    let text = pair.as_str();
    let inner = text
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .unwrap_or(text);

    inner.chars().next().unwrap_or_default()
}

fn parse_word(pair: Pair<Rule>) -> String {
    pair.into_inner()
        .next()
        .map(|inner| inner.as_str().to_string())
        .unwrap_or_default()
}

fn parse_states(pair: Pair<Rule>) -> Vec<String> {
    pair.into_inner().map(|p| p.as_str().to_string()).collect()
}

fn parse_text(pair: Pair<Rule>) -> String {
    pair.into_inner()
        .next()
        .map(|p| p.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Creates an `AutomatonError::ParseError` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> AutomatonError {
    AutomatonError::ParseError(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}

/// Checks if a given section has already been declared.
fn check_unique_rule(
    rule: Rule,
    span: Span,
    seen: &mut HashSet<Rule>,
) -> Result<(), AutomatonError> {
    if !matches!(
        rule,
        Rule::name | Rule::alphabet | Rule::words | Rule::start | Rule::accept | Rule::rules
    ) {
        return Ok(());
    };

    if !seen.insert(rule) {
        return Err(parse_error(
            &format!("Duplicate \"{rule:?}:\" declaration"),
            span,
        ));
    }

    Ok(())
}

/// Checks if a required section is present, returning an `Err` if it's missing.
fn check_required_rule<T>(value: Option<T>, name: &str) -> Result<T, AutomatonError> {
    value.ok_or_else(|| AutomatonError::ValidationError(format!("Missing '{name}' section")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Snapshot;

    #[test]
    fn test_parse_simple_program() {
        let input = r#"
name: Zeros
alphabet: 0
words: "00"
accept: q0
rules:
  q0:
    0 -> q0
"#;

        let program = parse(input).unwrap();
        assert_eq!(program.name, "Zeros");
        assert_eq!(program.words, vec!["00"]);
        assert_eq!(program.automaton.start(), Some("q0"));
        assert!(program.automaton.is_accepting("q0"));
        assert_eq!(
            program.automaton.transitions_from("q0"),
            &[Transition::new("q0", vec!['0'], "q0")]
        );
    }

    #[test]
    fn test_parse_multi_tape_program() {
        let input = r#"
name: Scenario C
alphabet: 0, 1
words: "0", "1"
start: q0
accept: q2
rules:
  q0:
    [0, #] -> q1
  q1:
    [#, 1] -> q2
  q2:
"#;

        let program = parse(input).unwrap();
        assert_eq!(program.tape_count(), 2);
        assert_eq!(
            program.automaton.transitions_from("q0")[0].guard,
            Guard::from(vec!['0', '#'])
        );
        assert!(program.automaton.has_state("q2"));

        let outcome = crate::search::search(&program.automaton, &program.words).unwrap();
        assert!(outcome.is_accepted());
        assert_eq!(outcome.last(), Some(&Snapshot::new("q2", vec![1, 1])));
    }

    #[test]
    fn test_parse_inferred_alphabet() {
        let input = r#"
name: Inferred
words: "ab"
accept: done
rules:
  start_here:
    a -> mid
  mid:
    b -> done
"#;

        let program = parse(input).unwrap();
        assert_eq!(
            program.automaton.alphabet().iter().copied().collect::<Vec<_>>(),
            vec!['a', 'b']
        );
        assert_eq!(program.automaton.start(), Some("start_here"));
    }

    #[test]
    fn test_parse_blank_and_quoted_symbols() {
        let input = r#"
name: Quoted
alphabet: ',', a
words: "a,", ""
accept: q1
rules:
  q0:
    [a, _] -> q0
    [',', _] -> q1
"#;

        let program = parse(input).unwrap();
        let guards: Vec<_> = program
            .automaton
            .transitions_from("q0")
            .iter()
            .map(|t| t.guard.to_string())
            .collect();
        assert_eq!(guards, vec!["[a, _]", "[,, _]"]);
        assert_eq!(program.words, vec!["a,", ""]);
    }

    #[test]
    fn test_parse_comments() {
        let input = r#"
// A comment before anything
name: Commented // trailing note
words: "a"
accept: q0
rules:
  // rules follow
  q0:
    a -> q0 // loop
"#;

        let program = parse(input).unwrap();
        assert_eq!(program.name, "Commented");
        assert_eq!(program.automaton.transition_count(), 1);
    }

    #[test]
    fn test_parse_duplicate_section() {
        let input = r#"
name: First Name
name: Second Name
rules:
  q0:
    a -> q0
"#;
        let error = parse(input).unwrap_err();
        assert!(matches!(error, AutomatonError::ParseError(_)));
        assert!(error
            .to_string()
            .contains("Duplicate \"name:\" declaration"));
    }

    #[test]
    fn test_parse_duplicate_transition_rule() {
        let input = r#"
name: Duplicate Block
rules:
  q0:
    a -> q1
  q0:
    b -> q1
"#;
        let error = parse(input).unwrap_err();
        assert!(matches!(error, AutomatonError::ParseError(_)));
        assert!(error.to_string().contains("Duplicate transition rule: q0"));
    }

    #[test]
    fn test_parse_missing_name() {
        let input = r#"
rules:
  q0:
    a -> q0
"#;
        let error = parse(input).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Program validation error: Missing 'name' section"
        );
    }

    #[test]
    fn test_parse_missing_rules() {
        let input = r#"
name: No Rules
words: "a"
"#;
        let error = parse(input).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Program validation error: Missing 'rules' section"
        );
    }

    #[test]
    fn test_parse_syntax_error() {
        let input = r#"
name: Bad Arrow
rules:
  q0:
    [a, b] => q1
"#;
        let error = parse(input).unwrap_err();
        assert!(matches!(error, AutomatonError::ParseError(_)));
    }

    #[test]
    fn test_parse_word_outside_alphabet() {
        let input = r#"
name: Bad Word
alphabet: a
words: "ab"
rules:
  q0:
    a -> q0
"#;
        let error = parse(input).unwrap_err();
        assert!(matches!(
            error,
            AutomatonError::SymbolNotInAlphabet { symbol: 'b', .. }
        ));
    }

    #[test]
    fn test_parse_too_large() {
        let input = "x".repeat(MAX_PROGRAM_SIZE + 1);
        assert!(matches!(
            parse(&input),
            Err(AutomatonError::ValidationError(_))
        ));
    }
}
