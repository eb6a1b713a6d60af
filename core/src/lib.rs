//! Core types for docopt-style usage grammars and argument bindings.
//!
//! This crate defines the data model shared by the `docgram` engine:
//!
//! - [`UsageGrammar`] — the parsed representation of one usage string
//!   (program name, pattern tree, options catalog).
//! - [`Pattern`] — the pattern tree: literals, positionals, option
//!   references, and required/optional/repeat/alternative groupings.
//! - [`OptionSpec`] / [`OptionsCatalog`] — option metadata merged from the
//!   `Options:` section and inline usage-line occurrences.
//! - [`RawBindings`] / [`TypedBindings`] — argument values as matched
//!   (raw strings and presence flags) and after type coercion.
//! - [`TypeSpec`] / [`ParamSpec`] — the parameter schema a command declares
//!   for coercion.
//!
//! Validation ([`validate_grammar`]) catches structural errors such as
//! pattern option references with no catalog entry, duplicate option tokens,
//! and empty repeat groups.
//!
//! # Example
//!
//! ```
//! use docgram_core::*;
//!
//! // Build the grammar for `greet <name>... [--shout]` by hand.
//! let mut options = OptionsCatalog::default();
//! options.merge(OptionSpec::flag(None, Some("--shout")));
//!
//! let grammar = UsageGrammar {
//!     program: "greet".into(),
//!     pattern: Pattern::Choice(vec![Pattern::Sequence(vec![
//!         Pattern::Repeat(Box::new(Pattern::Positional { name: "name".into() })),
//!         Pattern::Optional(vec![Pattern::OptionRef { key: "--shout".into() }]),
//!     ])]),
//!     options,
//!     summary: "Greet people.".into(),
//!     source: String::new(),
//! };
//!
//! assert!(validate_grammar(&grammar).is_empty());
//! assert_eq!(grammar.options.find_token("--shout").unwrap().param_name(), "shout");
//! ```

mod invocation;
mod types;
mod validate;

pub use invocation::{CustomConvert, ParamSpec, RawBindings, RawValue, TypeSpec, TypedBindings, Value};
pub use types::{OptionSpec, OptionsCatalog, Pattern, UsageGrammar, normalize_param_name};
pub use validate::{GrammarIssue, validate_grammar};
