//! Usage-grammar parser: docstring → [`UsageGrammar`].
//!
//! Parsing happens once, at registration time. The docstring is cleaned
//! (dedented, surrounding blank lines dropped), split into sections, and each
//! usage entry is tokenized and parsed into one branch of the grammar's
//! pattern. The options catalog is built from the `Options:` section first,
//! then completed by inline sightings in the usage lines, so value-arity
//! declared in either place wins.
//!
//! # Example
//!
//! ```
//! use docgram::parse_usage;
//!
//! let grammar = parse_usage(
//!     "Repeat a word.\n\
//!      \n\
//!      Usage: say repeat [-n <num>] <word>...\n\
//!      \n\
//!      Options:\n\
//!        -n, --num-times <num>  Times to repeat. [default: 1]\n",
//! )
//! .unwrap();
//!
//! assert_eq!(grammar.program, "say");
//! assert_eq!(grammar.summary, "Repeat a word.");
//! assert_eq!(
//!     grammar.options.find_token("-n").unwrap().default.as_deref(),
//!     Some("1"),
//! );
//! ```

mod pattern;
mod sections;

use thiserror::Error;
use tracing::debug;

use docgram_core::{
    GrammarIssue, OptionsCatalog, Pattern, UsageGrammar, validate_grammar,
};

use crate::help::clean_doc;
use pattern::{PatternParser, Tok, tokenize};
use sections::{parse_option_line, split_sections};

/// Malformed usage docstring, detected at registration time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// The docstring has no recognizable `Usage:` section.
    #[error("docstring has no `Usage:` section")]
    MissingUsageSection,
    /// The `Usage:` section contains no invocation line.
    #[error("`Usage:` section is empty")]
    EmptyUsage,
    /// A usage entry does not start with the program name.
    #[error("usage line {line} does not start with program `{program}`")]
    ProgramMismatch { line: usize, program: String },
    /// Unbalanced `[`/`]` or `(`/`)` in a usage entry.
    #[error("usage line {line}: unbalanced group delimiters")]
    UnbalancedGroup { line: usize },
    /// An angle-bracket placeholder with no closing `>`.
    #[error("usage line {line}: unterminated placeholder `{token}`")]
    UnterminatedPlaceholder { line: usize, token: String },
    /// A token that cannot start a pattern atom.
    #[error("usage line {line}: unexpected token `{token}`")]
    UnexpectedToken { line: usize, token: String },
    /// The parsed grammar violates a structural invariant.
    #[error("invalid grammar: {}", .0.iter().map(|i| i.to_string()).collect::<Vec<_>>().join("; "))]
    Structure(Vec<GrammarIssue>),
}

/// Parses a docopt-style docstring into a [`UsageGrammar`].
///
/// Fails when the docstring has no `Usage:` section, when a usage line
/// cannot be tokenized (unbalanced groups, unterminated placeholders), or
/// when the resulting grammar violates a structural invariant (an option
/// reference with no catalog entry).
pub fn parse_usage(doc: &str) -> Result<UsageGrammar, GrammarError> {
    let source = clean_doc(doc);
    let sections = split_sections(&source).ok_or(GrammarError::MissingUsageSection)?;
    if sections.usage_entries.is_empty() {
        return Err(GrammarError::EmptyUsage);
    }

    let mut options = OptionsCatalog::default();
    for line in &sections.option_lines {
        if let Some(spec) = parse_option_line(line) {
            options.merge(spec);
        }
    }

    let program = sections.usage_entries[0]
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string();

    let mut branches = Vec::new();
    for (idx, entry) in sections.usage_entries.iter().enumerate() {
        let line = idx + 1;
        let mut toks = tokenize(entry, line)?;
        match toks.first() {
            Some(Tok::Word(word)) if *word == program => {
                toks.remove(0);
            }
            _ => {
                return Err(GrammarError::ProgramMismatch {
                    line,
                    program: program.clone(),
                });
            }
        }
        branches.push(PatternParser::new(toks, line, &program, &mut options).parse()?);
    }

    let summary = summary_line(&source);
    let grammar = UsageGrammar {
        program,
        pattern: Pattern::Choice(branches),
        options,
        summary,
        source,
    };

    let issues = validate_grammar(&grammar);
    if !issues.is_empty() {
        return Err(GrammarError::Structure(issues));
    }

    debug!(
        program = %grammar.program,
        alternatives = match &grammar.pattern {
            Pattern::Choice(b) => b.len(),
            _ => 1,
        },
        options = grammar.options.len(),
        "parsed usage grammar"
    );
    Ok(grammar)
}

/// First non-blank docstring line, unless the docstring opens with the usage
/// section itself.
fn summary_line(source: &str) -> String {
    source
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .filter(|line| !line.starts_with("Usage:"))
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docgram_core::Pattern;

    #[test]
    fn parses_program_and_branches() {
        let grammar = parse_usage(
            "Manage pets.\n\nUsage:\n  pets add <name> [--force]\n  pets remove <name>...\n",
        )
        .unwrap();
        assert_eq!(grammar.program, "pets");
        assert_eq!(grammar.summary, "Manage pets.");
        let Pattern::Choice(branches) = &grammar.pattern else {
            panic!("expected choice over usage lines");
        };
        assert_eq!(branches.len(), 2);
        assert_eq!(
            grammar.usage_lines(),
            vec!["pets add <name> [--force]", "pets remove <name>..."]
        );
    }

    #[test]
    fn no_usage_section_is_an_error() {
        assert_eq!(
            parse_usage("Some description with no grammar."),
            Err(GrammarError::MissingUsageSection)
        );
    }

    #[test]
    fn empty_usage_section_is_an_error() {
        assert_eq!(parse_usage("Usage:\n\nOptions:\n"), Err(GrammarError::EmptyUsage));
    }

    #[test]
    fn options_section_defaults_merge_with_inline_sightings() {
        let grammar = parse_usage(
            "Usage: prog [-n <num>]\n\nOptions:\n  -n, --num-times <num>  Count. [default: 1]\n",
        )
        .unwrap();
        let opt = grammar.options.find_token("--num-times").unwrap();
        assert!(opt.takes_value);
        assert_eq!(opt.default.as_deref(), Some("1"));
        assert_eq!(grammar.pattern.option_keys(), vec!["--num-times"]);
    }

    #[test]
    fn usage_line_not_starting_with_program_is_an_error() {
        let err =
            parse_usage("Usage:\n  prog run\n  other stop\n").unwrap_err();
        assert_eq!(
            err,
            GrammarError::ProgramMismatch {
                line: 2,
                program: "prog".into()
            }
        );
    }

    #[test]
    fn summary_is_empty_when_docstring_opens_with_usage() {
        let grammar = parse_usage("Usage: prog run").unwrap();
        assert_eq!(grammar.summary, "");
    }

    #[test]
    fn unbalanced_group_is_reported_with_line() {
        let err = parse_usage("Usage:\n  prog run\n  prog [go\n").unwrap_err();
        assert_eq!(err, GrammarError::UnbalancedGroup { line: 2 });
    }

    #[test]
    fn indented_docstring_is_cleaned() {
        let grammar = parse_usage(
            "\n    Say hello.\n\n    Usage: say hello\n",
        )
        .unwrap();
        assert_eq!(grammar.summary, "Say hello.");
        assert_eq!(grammar.program, "say");
    }
}
