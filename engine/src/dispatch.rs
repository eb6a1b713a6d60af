//! Top-level dispatch: global flags, help resolution, command invocation.
//!
//! Dispatch is a single linear pass over argv. Leading global flags are
//! consumed first, then one token resolves the command (or the built-in
//! `help`), and the remaining tokens are matched against that command's
//! grammar. No state is ever revisited.

use std::io::Write;
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use crate::coerce::coerce;
use crate::help::{DEFAULT_WIDTH, command_listing, format_usage, top_level_doc, usage_block};
use crate::matcher::match_args;
use crate::registry::{CommandEntry, Registry};

/// Normal completion.
pub const EXIT_OK: i32 = 0;
/// Usage mismatch or validation failure.
pub const EXIT_USAGE: i32 = 1;
/// Top-level command token resolved to no registered command.
pub const EXIT_UNKNOWN_COMMAND: i32 = 2;

/// Log level selected by the global flags.
///
/// `--debug` and `--verbose` are shorthands for `--log-level DEBUG` and
/// `--log-level INFO`. The selection is handed to the caller's hook; this
/// crate never configures logging itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

/// An unrecognized `--log-level` value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value \"{0}\" supplied to --log-level; valid values are: DEBUG, INFO, WARN, ERROR")]
pub struct InvalidLogLevel(pub String);

impl FromStr for LogLevel {
    type Err = InvalidLogLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            // Accept the spelled-out form too.
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            _ => Err(InvalidLogLevel(s.to_string())),
        }
    }
}

/// Routes top-level argv into per-command invocation.
///
/// # Examples
///
/// ```
/// use docgram::{Dispatcher, Registry};
///
/// let mut registry = Registry::new("pets", "1.0.0");
/// registry
///     .register("meow", "Make a cat sound.\n\nUsage: pets meow", vec![], |_| Ok(0))
///     .unwrap();
///
/// let dispatcher = Dispatcher::new(registry);
/// let (mut out, mut err) = (Vec::new(), Vec::new());
/// assert_eq!(dispatcher.dispatch(&["meow".into()], &mut out, &mut err), 0);
/// assert_eq!(
///     dispatcher.dispatch(&["growl".into()], &mut out, &mut err),
///     2,
/// );
/// ```
pub struct Dispatcher {
    registry: Registry,
    log_handler: Option<Box<dyn Fn(LogLevel)>>,
    width: usize,
}

impl Dispatcher {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            log_handler: None,
            width: DEFAULT_WIDTH,
        }
    }

    /// Installs the collaborator hook that receives the selected log level.
    pub fn with_log_handler(mut self, handler: impl Fn(LogLevel) + 'static) -> Self {
        self.log_handler = Some(Box::new(handler));
        self
    }

    /// Overrides the help render width (default 80 columns).
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Parses global flags, resolves the command, and invokes it.
    ///
    /// Returns the process exit code: 0 success, 1 usage or validation
    /// failure, 2 unknown command. A [`CommandFailure`] from the callable
    /// surfaces its own code.
    ///
    /// [`CommandFailure`]: crate::registry::CommandFailure
    pub fn dispatch(&self, argv: &[String], out: &mut impl Write, err: &mut impl Write) -> i32 {
        let mut idx = 0;
        let mut level = None;

        // Global-flags phase.
        while let Some(arg) = argv.get(idx) {
            match arg.as_str() {
                "-h" | "--help" => {
                    let _ = writeln!(out, "{}", self.top_help());
                    return EXIT_OK;
                }
                "-V" | "--version" => {
                    let _ = writeln!(
                        out,
                        "{} {}",
                        self.registry.program(),
                        self.registry.version()
                    );
                    return EXIT_OK;
                }
                "-d" | "--debug" => {
                    level = Some(LogLevel::Debug);
                    idx += 1;
                }
                "-v" | "--verbose" => {
                    level = Some(LogLevel::Info);
                    idx += 1;
                }
                "--log-level" => {
                    let Some(value) = argv.get(idx + 1) else {
                        let _ = writeln!(err, "option `--log-level` requires a value");
                        return EXIT_USAGE;
                    };
                    match self.parse_level(value, err) {
                        Some(parsed) => level = Some(parsed),
                        None => return EXIT_USAGE,
                    }
                    idx += 2;
                }
                s if s.starts_with("--log-level=") => {
                    let value = &s["--log-level=".len()..];
                    match self.parse_level(value, err) {
                        Some(parsed) => level = Some(parsed),
                        None => return EXIT_USAGE,
                    }
                    idx += 1;
                }
                s if s.starts_with('-') && s.len() > 1 => {
                    let _ = writeln!(err, "unrecognized option `{s}`\n\n{}", self.top_help());
                    return EXIT_USAGE;
                }
                _ => break,
            }
        }

        if let (Some(level), Some(handler)) = (level, &self.log_handler) {
            handler(level);
        }

        // Command-resolution phase.
        let Some(command) = argv.get(idx) else {
            let _ = writeln!(err, "{}", self.top_help());
            return EXIT_USAGE;
        };

        if command == "help" {
            return self.run_help(argv.get(idx + 1).map(String::as_str), out, err);
        }

        match self.registry.get(command) {
            // The command token stays in the matched argv; the grammar's
            // usage line names it as a literal after the program.
            Some(entry) => self.invoke(entry, &argv[idx..], out, err),
            None => self.unknown_command(command, err),
        }
    }

    fn parse_level(&self, value: &str, err: &mut impl Write) -> Option<LogLevel> {
        match value.parse::<LogLevel>() {
            Ok(level) => Some(level),
            Err(invalid) => {
                let _ = writeln!(err, "{invalid}");
                None
            }
        }
    }

    fn run_help(&self, topic: Option<&str>, out: &mut impl Write, err: &mut impl Write) -> i32 {
        match topic {
            None => {
                let _ = writeln!(out, "{}", self.top_help());
                EXIT_OK
            }
            Some("-a") | Some("--all") => {
                let _ = writeln!(out, "{}", command_listing(&self.registry));
                EXIT_OK
            }
            Some(flag) if flag.starts_with('-') => {
                let _ = writeln!(err, "unrecognized option `{flag}`");
                EXIT_USAGE
            }
            Some(name) => match self.registry.get(name) {
                Some(entry) => {
                    let _ = writeln!(out, "{}", format_usage(&entry.grammar.source, self.width));
                    EXIT_OK
                }
                None => self.unknown_command(name, err),
            },
        }
    }

    fn invoke(
        &self,
        entry: &CommandEntry,
        argv: &[String],
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> i32 {
        debug!(command = %entry.name, args = argv.len(), "invoking command");
        let raw = match match_args(&entry.grammar, argv) {
            Ok(raw) => raw,
            Err(mismatch) => {
                let _ = writeln!(err, "{mismatch}\n\n{}", usage_block(&entry.grammar));
                return EXIT_USAGE;
            }
        };
        let typed = match coerce(&raw, &entry.params) {
            Ok(typed) => typed,
            Err(errors) => {
                for error in errors {
                    let _ = writeln!(err, "{error}");
                }
                return EXIT_USAGE;
            }
        };
        match entry.invoke(&typed) {
            Ok(code) => {
                // Command output goes through the callable itself; `out` is
                // only used for dispatch-level text.
                let _ = out.flush();
                code
            }
            Err(failure) => {
                let _ = writeln!(err, "{}", failure.message);
                failure.code
            }
        }
    }

    fn unknown_command(&self, name: &str, err: &mut impl Write) -> i32 {
        let _ = writeln!(
            err,
            "\"{name}\" is not a {program} command. '{program} help -a' lists all available subcommands.\n\n{listing}",
            program = self.registry.program(),
            listing = command_listing(&self.registry),
        );
        EXIT_UNKNOWN_COMMAND
    }

    fn top_help(&self) -> String {
        format_usage(
            &top_level_doc(self.registry.program(), self.registry.message()),
            self.width,
        )
    }
}
