//! Structural validation of parsed grammars.
//!
//! The engine's parser calls [`validate_grammar`] before handing a grammar to
//! the registry, so unresolved option references surface at registration
//! time, never during matching.

use std::collections::HashSet;

use thiserror::Error;

use crate::{Pattern, UsageGrammar};

/// Structural problems found in a parsed grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarIssue {
    /// Program name is empty or whitespace-only.
    #[error("usage program name cannot be empty")]
    EmptyProgram,
    /// The pattern has no alternatives at all.
    #[error("usage pattern is empty")]
    EmptyPattern,
    /// An `OptionRef` in the pattern has no catalog entry.
    #[error("option `{0}` referenced in usage has no catalog entry")]
    UnresolvedOption(String),
    /// More than one catalog entry answers to the same token.
    #[error("option token `{0}` has multiple catalog entries")]
    AmbiguousOption(String),
    /// A `...` repeat group wraps an empty pattern.
    #[error("repeat group wraps an empty pattern")]
    EmptyRepeat,
}

/// Validates a grammar's structural invariants.
///
/// Returns every issue found, not just the first.
///
/// # Examples
///
/// ```
/// use docgram_core::*;
///
/// let grammar = UsageGrammar {
///     program: "prog".into(),
///     pattern: Pattern::Choice(vec![Pattern::Sequence(vec![
///         Pattern::OptionRef { key: "--missing".into() },
///     ])]),
///     options: OptionsCatalog::default(),
///     summary: String::new(),
///     source: String::new(),
/// };
///
/// let issues = validate_grammar(&grammar);
/// assert!(issues.iter().any(|i| matches!(i, GrammarIssue::UnresolvedOption(_))));
/// ```
pub fn validate_grammar(grammar: &UsageGrammar) -> Vec<GrammarIssue> {
    let mut issues = Vec::new();

    if grammar.program.trim().is_empty() {
        issues.push(GrammarIssue::EmptyProgram);
    }
    if grammar.pattern.is_empty() {
        issues.push(GrammarIssue::EmptyPattern);
    }

    let mut reported: HashSet<&str> = HashSet::new();
    for key in grammar.pattern.option_keys() {
        if !reported.insert(key) {
            continue;
        }
        match grammar.options.count_token(key) {
            0 => issues.push(GrammarIssue::UnresolvedOption(key.to_string())),
            1 => {}
            _ => issues.push(GrammarIssue::AmbiguousOption(key.to_string())),
        }
    }

    let mut seen_tokens: HashSet<&str> = HashSet::new();
    for opt in grammar.options.iter() {
        for token in [opt.short.as_deref(), opt.long.as_deref()].into_iter().flatten() {
            if !seen_tokens.insert(token) && reported.insert(token) {
                issues.push(GrammarIssue::AmbiguousOption(token.to_string()));
            }
        }
    }

    check_repeats(&grammar.pattern, &mut issues);
    issues
}

fn check_repeats(pattern: &Pattern, issues: &mut Vec<GrammarIssue>) {
    match pattern {
        Pattern::Repeat(inner) => {
            if inner.is_empty() {
                issues.push(GrammarIssue::EmptyRepeat);
            }
            check_repeats(inner, issues);
        }
        Pattern::Sequence(children) | Pattern::Optional(children) | Pattern::Choice(children) => {
            for child in children {
                check_repeats(child, issues);
            }
        }
        Pattern::Literal(_) | Pattern::Positional { .. } | Pattern::OptionRef { .. } => {}
    }
}
