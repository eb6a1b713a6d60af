//! Docopt-style usage grammars as a full command-line interface.
//!
//! This crate turns a structured usage string (a docopt-style grammar kept as
//! a command's documentation) into a working CLI. The pipeline:
//!
//! 1. [`parse_usage`] — docstring → [`UsageGrammar`], once, at registration
//!    time.
//! 2. [`match_args`] — grammar + argv → [`RawBindings`] (raw strings and
//!    presence flags).
//! 3. [`coerce`] — raw bindings + a command's [`ParamSpec`] schema →
//!    [`TypedBindings`], collecting every coercion failure rather than
//!    stopping at the first.
//! 4. [`Dispatcher`] — routes top-level argv (global flags, `help`,
//!    subcommand resolution) into per-command invocation and returns an exit
//!    code.
//!
//! [`complete::generate`] additionally renders bash/zsh completion scripts
//! from a [`Registry`].
//!
//! # Example
//!
//! ```
//! use docgram::{Dispatcher, Registry};
//! use docgram_core::{ParamSpec, TypeSpec};
//!
//! let mut registry = Registry::new("say", "1.0.0");
//! registry
//!     .register(
//!         "hiya",
//!         "Greet someone by name.\n\nUsage: say hiya <name>",
//!         vec![ParamSpec::new("name", TypeSpec::Str)],
//!         |args| {
//!             println!("Hiya, {}!", args.str_of("name").unwrap_or("you"));
//!             Ok(0)
//!         },
//!     )
//!     .unwrap();
//!
//! let dispatcher = Dispatcher::new(registry);
//! let mut out = Vec::new();
//! let mut err = Vec::new();
//! let code = dispatcher.dispatch(&["hiya".into(), "world".into()], &mut out, &mut err);
//! assert_eq!(code, 0);
//! ```
//!
//! The grammar language is conventional docopt: `<name>` / `ALLCAPS`
//! positionals, `--long` / `-s` options, `[...]` optional groups, `(...)`
//! required groups, `|` alternatives, and trailing `...` repetition, with an
//! `Options:` section supplying defaults and descriptions.
//!
//! [`UsageGrammar`]: docgram_core::UsageGrammar
//! [`RawBindings`]: docgram_core::RawBindings
//! [`TypedBindings`]: docgram_core::TypedBindings
//! [`ParamSpec`]: docgram_core::ParamSpec

pub mod coerce;
pub mod complete;
pub mod dispatch;
pub mod help;
pub mod matcher;
pub mod parser;
pub mod registry;

pub use coerce::{CoerceError, coerce};
pub use dispatch::{Dispatcher, LogLevel};
pub use matcher::{UsageMismatch, match_args};
pub use parser::{GrammarError, parse_usage};
pub use registry::{CommandEntry, CommandFailure, CommandFn, Registry};
