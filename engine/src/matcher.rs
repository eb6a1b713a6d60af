//! Argument matching: grammar + argv → raw bindings.
//!
//! Matching runs in two phases. The lex phase partitions argv into option
//! occurrences and positional tokens, consulting the options catalog for
//! value-arity (`-n 5`, `-n5`, `--num-times=5`, clustered short flags, and a
//! `--` separator are all recognized here). The match phase walks the pattern
//! tree depth-first over ordered candidate states: `Optional` falls back to
//! consuming nothing, `Repeat` is greedy and backtracks one repetition at a
//! time, and `Choice` tries branches in declaration order. The first candidate
//! that consumes every positional and every option occurrence wins.

use thiserror::Error;
use tracing::{debug, trace};

use docgram_core::{Pattern, RawBindings, RawValue, UsageGrammar, normalize_param_name};

/// argv does not match any alternative of the grammar.
///
/// Callers hold the grammar and re-print its usage block alongside the
/// mismatch reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageMismatch {
    #[error("unknown option `{0}`")]
    UnknownOption(String),
    #[error("option `{0}` requires a value")]
    MissingValue(String),
    #[error("option `{0}` does not take a value")]
    UnexpectedValue(String),
    #[error("arguments do not match any usage pattern")]
    NoMatch,
}

/// One option found in argv, resolved against the catalog.
#[derive(Debug, Clone)]
struct OptOccurrence {
    key: String,
    param: String,
    takes_value: bool,
    value: Option<String>,
}

/// A partial match: how much input is consumed and what is bound so far.
#[derive(Debug, Clone)]
struct MatchState {
    pos: usize,
    used: Vec<bool>,
    bindings: RawBindings,
}

impl MatchState {
    fn used_count(&self) -> usize {
        self.used.iter().filter(|u| **u).count()
    }

    fn progressed_beyond(&self, other: &MatchState) -> bool {
        self.pos > other.pos || self.used_count() > other.used_count()
    }
}

struct MatchInput<'a> {
    positionals: Vec<&'a str>,
    occurrences: Vec<OptOccurrence>,
}

/// Matches argv against a grammar, producing raw bindings.
///
/// # Examples
///
/// ```
/// use docgram::{match_args, parse_usage};
/// use docgram_core::RawValue;
///
/// let grammar = parse_usage("Usage: prog <file>...").unwrap();
/// let raw = match_args(&grammar, &["a.txt".into(), "b.txt".into()]).unwrap();
/// assert_eq!(
///     raw.get("file"),
///     Some(&RawValue::List(vec!["a.txt".into(), "b.txt".into()]))
/// );
/// ```
pub fn match_args(grammar: &UsageGrammar, argv: &[String]) -> Result<RawBindings, UsageMismatch> {
    let input = lex(grammar, argv)?;
    trace!(
        positionals = input.positionals.len(),
        options = input.occurrences.len(),
        "lexed argv"
    );

    let init = MatchState {
        pos: 0,
        used: vec![false; input.occurrences.len()],
        bindings: RawBindings::default(),
    };

    let candidates = match_node(&grammar.pattern, init, &input, false);
    let complete = candidates
        .into_iter()
        .find(|c| c.pos == input.positionals.len() && c.used.iter().all(|u| *u));

    match complete {
        Some(state) => {
            let mut bindings = state.bindings;
            apply_defaults(grammar, &mut bindings);
            debug!(program = %grammar.program, bound = bindings.len(), "argv matched");
            Ok(bindings)
        }
        None => Err(UsageMismatch::NoMatch),
    }
}

/// Partitions argv into option occurrences and positional tokens.
fn lex<'a>(grammar: &UsageGrammar, argv: &'a [String]) -> Result<MatchInput<'a>, UsageMismatch> {
    let mut occurrences = Vec::new();
    let mut positionals = Vec::new();
    let mut positional_only = false;

    let mut iter = argv.iter().peekable();
    while let Some(arg) = iter.next() {
        if positional_only {
            positionals.push(arg.as_str());
            continue;
        }
        if arg == "--" {
            positional_only = true;
            continue;
        }
        if let Some(rest) = arg.strip_prefix("--") {
            let (token, attached) = match rest.split_once('=') {
                Some((name, value)) => (format!("--{name}"), Some(value.to_string())),
                None => (arg.clone(), None),
            };
            let spec = grammar
                .options
                .find_token(&token)
                .ok_or_else(|| UsageMismatch::UnknownOption(token.clone()))?;
            let value = if spec.takes_value {
                match attached {
                    Some(v) => Some(v),
                    None => Some(
                        iter.next()
                            .ok_or_else(|| UsageMismatch::MissingValue(token.clone()))?
                            .clone(),
                    ),
                }
            } else {
                if attached.is_some() {
                    return Err(UsageMismatch::UnexpectedValue(token));
                }
                None
            };
            occurrences.push(OptOccurrence {
                key: spec.key().to_string(),
                param: spec.param_name(),
                takes_value: spec.takes_value,
                value,
            });
        } else if arg.len() > 1 && arg.starts_with('-') {
            // Short cluster: flags until a value-taking option, which eats
            // the rest of the cluster or the next token.
            let cluster = &arg[1..];
            let mut chars = cluster.char_indices();
            while let Some((idx, c)) = chars.next() {
                let token = format!("-{c}");
                let spec = grammar
                    .options
                    .find_token(&token)
                    .ok_or_else(|| UsageMismatch::UnknownOption(token.clone()))?;
                if spec.takes_value {
                    let rest = &cluster[idx + c.len_utf8()..];
                    let value = if rest.is_empty() {
                        iter.next()
                            .ok_or_else(|| UsageMismatch::MissingValue(token.clone()))?
                            .clone()
                    } else {
                        rest.to_string()
                    };
                    occurrences.push(OptOccurrence {
                        key: spec.key().to_string(),
                        param: spec.param_name(),
                        takes_value: true,
                        value: Some(value),
                    });
                    break;
                }
                occurrences.push(OptOccurrence {
                    key: spec.key().to_string(),
                    param: spec.param_name(),
                    takes_value: false,
                    value: None,
                });
            }
        } else {
            positionals.push(arg.as_str());
        }
    }

    Ok(MatchInput {
        positionals,
        occurrences,
    })
}

/// Returns candidate states in preference order; empty means no match.
fn match_node(
    pattern: &Pattern,
    state: MatchState,
    input: &MatchInput<'_>,
    in_repeat: bool,
) -> Vec<MatchState> {
    match pattern {
        Pattern::Literal(word) => match input.positionals.get(state.pos) {
            Some(tok) if *tok == word.as_str() => {
                let mut next = state;
                next.pos += 1;
                next.bindings
                    .insert(&normalize_param_name(word), RawValue::Flag(true));
                vec![next]
            }
            _ => vec![],
        },
        Pattern::Positional { name } => match input.positionals.get(state.pos) {
            Some(tok) => {
                let mut next = state;
                next.pos += 1;
                if in_repeat {
                    next.bindings.push_repeat(name, tok);
                } else {
                    next.bindings.insert(name, RawValue::Str(tok.to_string()));
                }
                vec![next]
            }
            None => vec![],
        },
        Pattern::OptionRef { key } => {
            let free = input
                .occurrences
                .iter()
                .enumerate()
                .find(|(i, occ)| !state.used[*i] && occ.key == *key);
            match free {
                Some((i, occ)) => {
                    let mut next = state;
                    next.used[i] = true;
                    match (&occ.value, occ.takes_value) {
                        (Some(value), true) => {
                            if next.bindings.contains(&occ.param) {
                                next.bindings.push_repeat(&occ.param, value);
                            } else {
                                next.bindings
                                    .insert(&occ.param, RawValue::Str(value.clone()));
                            }
                        }
                        _ => next.bindings.insert(&occ.param, RawValue::Flag(true)),
                    }
                    vec![next]
                }
                None => vec![],
            }
        }
        Pattern::Sequence(children) => match_sequence(children, state, input, in_repeat),
        Pattern::Optional(children) => {
            let mut candidates = match_sequence(children, state.clone(), input, in_repeat);
            // Consuming nothing is always the last resort.
            candidates.push(state);
            candidates
        }
        Pattern::Repeat(inner) => {
            let mut levels: Vec<Vec<MatchState>> = Vec::new();
            let budget = input.positionals.len() + input.occurrences.len() + 1;
            let mut frontier = match_node(inner, state, input, true);
            while !frontier.is_empty() && levels.len() < budget {
                let mut next = Vec::new();
                for st in &frontier {
                    for cand in match_node(inner, st.clone(), input, true) {
                        // Zero-width repetitions would loop forever.
                        if cand.progressed_beyond(st) {
                            next.push(cand);
                        }
                    }
                }
                levels.push(frontier);
                frontier = next;
            }
            // Greedy: most repetitions first, backtracking one at a time.
            levels.into_iter().rev().flatten().collect()
        }
        Pattern::Choice(branches) => branches
            .iter()
            .flat_map(|branch| match_node(branch, state.clone(), input, in_repeat))
            .collect(),
    }
}

fn match_sequence(
    children: &[Pattern],
    state: MatchState,
    input: &MatchInput<'_>,
    in_repeat: bool,
) -> Vec<MatchState> {
    let mut states = vec![state];
    for child in children {
        let mut next = Vec::new();
        for st in states {
            next.extend(match_node(child, st, input, in_repeat));
        }
        if next.is_empty() {
            return vec![];
        }
        states = next;
    }
    states
}

/// Fills in catalog defaults for options the match did not bind.
fn apply_defaults(grammar: &UsageGrammar, bindings: &mut RawBindings) {
    for opt in grammar.options.iter() {
        let param = opt.param_name();
        if bindings.contains(&param) {
            continue;
        }
        if let Some(default) = &opt.default {
            bindings.insert(&param, RawValue::Str(default.clone()));
        } else if !opt.takes_value {
            bindings.insert(&param, RawValue::Flag(false));
        }
        // Value-taking options with no default stay absent.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_usage;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn first_alternative_wins() {
        let grammar = parse_usage("Usage: prog (add <name> | remove <name>)").unwrap();
        let raw = match_args(&grammar, &argv(&["add", "x"])).unwrap();
        assert_eq!(raw.get("add"), Some(&RawValue::Flag(true)));
        assert_eq!(raw.get("name"), Some(&RawValue::Str("x".into())));
        assert_eq!(raw.get("remove"), None);
    }

    #[test]
    fn repeatable_positional_accumulates_in_order() {
        let grammar = parse_usage("Usage: prog <file>...").unwrap();
        let raw = match_args(&grammar, &argv(&["a.txt", "b.txt"])).unwrap();
        assert_eq!(
            raw.get("file"),
            Some(&RawValue::List(vec!["a.txt".into(), "b.txt".into()]))
        );
    }

    #[test]
    fn matching_is_deterministic() {
        let grammar = parse_usage("Usage: prog [-v] <a> [<b>]\n\nOptions:\n  -v  Verbose.\n")
            .unwrap();
        let args = argv(&["-v", "one", "two"]);
        let first = match_args(&grammar, &args).unwrap();
        let second = match_args(&grammar, &args).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn absent_option_takes_catalog_default() {
        let grammar = parse_usage(
            "Usage: prog [-n <num>] <word>\n\nOptions:\n  -n, --num-times <num>  [default: 1]\n",
        )
        .unwrap();
        let raw = match_args(&grammar, &argv(&["hi"])).unwrap();
        assert_eq!(raw.get("num_times"), Some(&RawValue::Str("1".into())));
    }

    #[test]
    fn absent_boolean_option_binds_false() {
        let grammar = parse_usage("Usage: prog [--force] <name>").unwrap();
        let raw = match_args(&grammar, &argv(&["x"])).unwrap();
        assert_eq!(raw.get("force"), Some(&RawValue::Flag(false)));
    }

    #[test]
    fn attached_and_separate_option_values_are_equivalent() {
        let grammar = parse_usage(
            "Usage: prog [-n <num>]\n\nOptions:\n  -n, --num-times <num>  Count.\n",
        )
        .unwrap();
        for args in [
            argv(&["-n", "5"]),
            argv(&["-n5"]),
            argv(&["--num-times", "5"]),
            argv(&["--num-times=5"]),
        ] {
            let raw = match_args(&grammar, &args).unwrap();
            assert_eq!(raw.get("num_times"), Some(&RawValue::Str("5".into())), "{args:?}");
        }
    }

    #[test]
    fn short_flag_cluster_splits() {
        let grammar = parse_usage(
            "Usage: prog [-a] [-b]\n\nOptions:\n  -a  First.\n  -b  Second.\n",
        )
        .unwrap();
        let raw = match_args(&grammar, &argv(&["-ab"])).unwrap();
        assert_eq!(raw.get("a"), Some(&RawValue::Flag(true)));
        assert_eq!(raw.get("b"), Some(&RawValue::Flag(true)));
    }

    #[test]
    fn double_dash_forces_positional() {
        let grammar = parse_usage("Usage: prog <name>").unwrap();
        let raw = match_args(&grammar, &argv(&["--", "--not-an-option"])).unwrap();
        assert_eq!(raw.get("name"), Some(&RawValue::Str("--not-an-option".into())));
    }

    #[test]
    fn leftover_positional_fails() {
        let grammar = parse_usage("Usage: prog <name>").unwrap();
        assert_eq!(
            match_args(&grammar, &argv(&["x", "extra"])),
            Err(UsageMismatch::NoMatch)
        );
    }

    #[test]
    fn leftover_option_fails() {
        let grammar = parse_usage(
            "Usage: prog go\n\nOptions:\n  -v  Verbose.\n",
        )
        .unwrap();
        // `-v` is in the catalog but no usage line accepts it.
        assert_eq!(
            match_args(&grammar, &argv(&["go", "-v"])),
            Err(UsageMismatch::NoMatch)
        );
    }

    #[test]
    fn unknown_option_is_reported_by_name() {
        let grammar = parse_usage("Usage: prog <name>").unwrap();
        assert_eq!(
            match_args(&grammar, &argv(&["--bogus", "x"])),
            Err(UsageMismatch::UnknownOption("--bogus".into()))
        );
    }

    #[test]
    fn missing_option_value_is_reported() {
        let grammar = parse_usage(
            "Usage: prog [-n <num>]\n\nOptions:\n  -n <num>  Count.\n",
        )
        .unwrap();
        assert_eq!(
            match_args(&grammar, &argv(&["-n"])),
            Err(UsageMismatch::MissingValue("-n".into()))
        );
    }

    #[test]
    fn repeat_backtracks_for_trailing_required_positional() {
        let grammar = parse_usage("Usage: prog <src>... <dest>").unwrap();
        let raw = match_args(&grammar, &argv(&["a", "b", "c"])).unwrap();
        assert_eq!(
            raw.get("src"),
            Some(&RawValue::List(vec!["a".into(), "b".into()]))
        );
        assert_eq!(raw.get("dest"), Some(&RawValue::Str("c".into())));
    }

    #[test]
    fn prefix_alternative_shadows_longer_branch() {
        // Documented behavior: the first full match wins even when a later
        // branch is more specific.
        let grammar = parse_usage("Usage: prog (run | run <target>)").unwrap();
        assert!(match_args(&grammar, &argv(&["run"])).is_ok());
        // The longer branch still matches when the prefix branch cannot.
        let raw = match_args(&grammar, &argv(&["run", "x"])).unwrap();
        assert_eq!(raw.get("target"), Some(&RawValue::Str("x".into())));
    }
}
