//! Command registry: name → grammar, parameter schema, and callable.
//!
//! The registry is built once at process start from the collaborator's
//! command mapping and is read-only afterwards. Grammars are parsed here, at
//! registration time, so a malformed docstring fails the command before any
//! argv is seen.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;
use tracing::debug;

use docgram_core::{ParamSpec, TypedBindings, UsageGrammar};

use crate::parser::{GrammarError, parse_usage};

/// A command's explicit failure signal.
///
/// Surfaced by the dispatcher as the process exit code with the message on
/// stderr; never wrapped or reinterpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CommandFailure {
    pub code: i32,
    pub message: String,
}

impl CommandFailure {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// The callable behind a registered command.
pub type CommandFn = Box<dyn Fn(&TypedBindings) -> Result<i32, CommandFailure>>;

/// One registered command: grammar, parameter schema, and callable.
pub struct CommandEntry {
    pub name: String,
    pub grammar: UsageGrammar,
    pub params: Vec<ParamSpec>,
    run: CommandFn,
}

impl CommandEntry {
    /// First docstring line, for command listings.
    pub fn summary(&self) -> &str {
        &self.grammar.summary
    }

    pub(crate) fn invoke(&self, args: &TypedBindings) -> Result<i32, CommandFailure> {
        (self.run)(args)
    }
}

impl fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandEntry")
            .field("name", &self.name)
            .field("grammar", &self.grammar)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Mapping from command name to [`CommandEntry`].
///
/// Iteration is always alphabetical by name. Registering a name twice
/// replaces the earlier entry.
///
/// # Examples
///
/// ```
/// use docgram::Registry;
///
/// let mut registry = Registry::new("say", "1.0.0");
/// registry
///     .register("hello", "Say hello.\n\nUsage: say hello", vec![], |_| Ok(0))
///     .unwrap();
///
/// assert_eq!(registry.names(), vec!["hello"]);
/// assert_eq!(registry.get("hello").unwrap().summary(), "Say hello.");
/// ```
pub struct Registry {
    program: String,
    version: String,
    message: Option<String>,
    commands: BTreeMap<String, CommandEntry>,
}

impl Registry {
    pub fn new(program: &str, version: &str) -> Self {
        Self {
            program: program.to_string(),
            version: version.to_string(),
            message: None,
            commands: BTreeMap::new(),
        }
    }

    /// Sets a free-form message shown in the top-level help.
    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    /// Registers a command from its docstring.
    ///
    /// The docstring is parsed into a [`UsageGrammar`] immediately; a
    /// [`GrammarError`] means the command cannot be registered. The caller
    /// decides whether that aborts startup or only disables the command.
    pub fn register(
        &mut self,
        name: &str,
        docstring: &str,
        params: Vec<ParamSpec>,
        run: impl Fn(&TypedBindings) -> Result<i32, CommandFailure> + 'static,
    ) -> Result<(), GrammarError> {
        let grammar = parse_usage(docstring)?;
        debug!(command = name, program = %grammar.program, "registered command");
        self.commands.insert(
            name.to_string(),
            CommandEntry {
                name: name.to_string(),
                grammar,
                params,
                run: Box::new(run),
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&CommandEntry> {
        self.commands.get(name)
    }

    /// Registered command names, alphabetical.
    pub fn names(&self) -> Vec<&str> {
        self.commands.keys().map(String::as_str).collect()
    }

    /// Entries in alphabetical name order.
    pub fn iter(&self) -> impl Iterator<Item = &CommandEntry> {
        self.commands.values()
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_parses_grammar_eagerly() {
        let mut registry = Registry::new("pets", "0.1.0");
        let err = registry
            .register("bad", "No grammar here.", vec![], |_| Ok(0))
            .unwrap_err();
        assert_eq!(err, GrammarError::MissingUsageSection);
        assert!(registry.is_empty());
    }

    #[test]
    fn names_iterate_alphabetically_regardless_of_insertion() {
        let mut registry = Registry::new("pets", "0.1.0");
        registry
            .register("roar", "Roar.\n\nUsage: pets roar", vec![], |_| Ok(0))
            .unwrap();
        registry
            .register("meow", "Meow.\n\nUsage: pets meow", vec![], |_| Ok(0))
            .unwrap();
        assert_eq!(registry.names(), vec!["meow", "roar"]);
    }

    #[test]
    fn entry_invokes_callable() {
        let mut registry = Registry::new("pets", "0.1.0");
        registry
            .register("meow", "Meow.\n\nUsage: pets meow", vec![], |_| {
                Err(CommandFailure::new(3, "hairball"))
            })
            .unwrap();
        let entry = registry.get("meow").unwrap();
        let failure = entry.invoke(&Default::default()).unwrap_err();
        assert_eq!(failure.code, 3);
        assert_eq!(failure.to_string(), "hairball");
    }
}
