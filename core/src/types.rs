//! Grammar type definitions for usage-string modeling.
//!
//! The types here are the parsed form of a docopt-style usage string. They
//! are produced once at registration time by the engine's parser and are
//! immutable afterwards; matching never re-parses the source text.

use serde::{Deserialize, Serialize};

/// Normalizes an option or positional token to a parameter name.
///
/// Leading dashes and angle brackets are stripped, internal dashes become
/// underscores, and the result is lowercased. This is the name a command's
/// parameter schema uses for the binding.
///
/// # Examples
///
/// ```
/// use docgram_core::normalize_param_name;
///
/// assert_eq!(normalize_param_name("--num-times"), "num_times");
/// assert_eq!(normalize_param_name("<FILE>"), "file");
/// assert_eq!(normalize_param_name("-v"), "v");
/// ```
pub fn normalize_param_name(token: &str) -> String {
    let token = token.trim_start_matches('-');
    let token = token
        .strip_prefix('<')
        .and_then(|t| t.strip_suffix('>'))
        .unwrap_or(token);
    token.to_ascii_lowercase().replace('-', "_")
}

/// Metadata for one command-line option.
///
/// An option has a short form (`-n`) and/or a long form (`--num-times`), is
/// either a boolean presence flag or value-taking, and may carry a default
/// value and description from the `Options:` section.
///
/// # Examples
///
/// ```
/// use docgram_core::OptionSpec;
///
/// let opt = OptionSpec::with_value(Some("-n"), Some("--num-times"))
///     .with_default("1");
/// assert!(opt.takes_value);
/// assert_eq!(opt.key(), "--num-times");
/// assert_eq!(opt.param_name(), "num_times");
/// assert!(opt.matches("-n"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSpec {
    /// Short form (e.g. "-n")
    pub short: Option<String>,
    /// Long form (e.g. "--num-times")
    pub long: Option<String>,
    /// Whether the option consumes a value token
    pub takes_value: bool,
    /// Default value from `[default: ...]`, raw and uncoerced
    pub default: Option<String>,
    /// Description from the `Options:` section
    pub description: Option<String>,
}

impl OptionSpec {
    /// Creates a boolean presence flag (no value).
    pub fn flag(short: Option<&str>, long: Option<&str>) -> Self {
        Self {
            short: short.map(String::from),
            long: long.map(String::from),
            takes_value: false,
            default: None,
            description: None,
        }
    }

    /// Creates a value-taking option.
    pub fn with_value(short: Option<&str>, long: Option<&str>) -> Self {
        Self {
            takes_value: true,
            ..Self::flag(short, long)
        }
    }

    /// Sets the default value.
    pub fn with_default(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Returns the canonical token (long form preferred, falls back to short).
    pub fn key(&self) -> &str {
        self.long
            .as_deref()
            .or(self.short.as_deref())
            .unwrap_or("")
    }

    /// Returns the normalized parameter name for bindings.
    pub fn param_name(&self) -> String {
        normalize_param_name(self.key())
    }

    /// Checks whether a token is this option's short or long form.
    pub fn matches(&self, token: &str) -> bool {
        self.short.as_deref() == Some(token) || self.long.as_deref() == Some(token)
    }
}

/// Ordered collection of [`OptionSpec`] entries for one grammar.
///
/// The catalog is built from two sources that must agree: inline occurrences
/// in usage lines and entries in the `Options:` section. [`merge`] combines a
/// new sighting with an existing entry when either form overlaps, filling in
/// missing forms, value-arity, defaults, and descriptions.
///
/// [`merge`]: OptionsCatalog::merge
///
/// # Examples
///
/// ```
/// use docgram_core::{OptionSpec, OptionsCatalog};
///
/// let mut catalog = OptionsCatalog::default();
/// catalog.merge(OptionSpec::flag(None, Some("--shout")));
/// // A later sighting with the short form completes the entry.
/// catalog.merge(OptionSpec::flag(Some("-s"), Some("--shout")).with_description("Be loud"));
///
/// assert_eq!(catalog.len(), 1);
/// let opt = catalog.find_token("-s").unwrap();
/// assert_eq!(opt.key(), "--shout");
/// assert_eq!(opt.description.as_deref(), Some("Be loud"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionsCatalog {
    entries: Vec<OptionSpec>,
}

impl OptionsCatalog {
    /// Merges an option sighting into the catalog.
    ///
    /// An existing entry sharing a short or long form absorbs the new
    /// information; otherwise the sighting becomes a new entry.
    pub fn merge(&mut self, opt: OptionSpec) {
        for entry in &mut self.entries {
            let same_short = opt.short.is_some() && opt.short == entry.short;
            let same_long = opt.long.is_some() && opt.long == entry.long;
            if same_short || same_long {
                if entry.short.is_none() {
                    entry.short = opt.short;
                }
                if entry.long.is_none() {
                    entry.long = opt.long;
                }
                entry.takes_value |= opt.takes_value;
                if entry.default.is_none() {
                    entry.default = opt.default;
                }
                if entry.description.is_none() {
                    entry.description = opt.description;
                }
                return;
            }
        }
        self.entries.push(opt);
    }

    /// Looks up an option by short or long token.
    pub fn find_token(&self, token: &str) -> Option<&OptionSpec> {
        self.entries.iter().find(|o| o.matches(token))
    }

    /// Looks up an option by its canonical key.
    pub fn find_key(&self, key: &str) -> Option<&OptionSpec> {
        self.entries.iter().find(|o| o.key() == key)
    }

    /// Returns how many catalog entries share the given token.
    pub fn count_token(&self, token: &str) -> usize {
        self.entries.iter().filter(|o| o.matches(token)).count()
    }

    /// Iterates over the entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &OptionSpec> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One node of a usage pattern tree.
///
/// A grammar's pattern is a [`Choice`] over its usage lines; each line is a
/// [`Sequence`] of literals, positionals, option references, and groups.
///
/// `Choice` branches are tried in declaration order and the first full match
/// wins. An earlier branch that is a strict prefix of a later one therefore
/// shadows it; this mirrors conventional docopt semantics and is relied on by
/// grammars that order alternatives from specific to general.
///
/// [`Choice`]: Pattern::Choice
/// [`Sequence`]: Pattern::Sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pattern {
    /// A bare command word that must appear verbatim (e.g. `add`).
    Literal(String),
    /// A placeholder consuming one positional token (e.g. `<name>`, `FILE`).
    Positional { name: String },
    /// A reference to an options-catalog entry by canonical key.
    OptionRef { key: String },
    /// A required group; children must match in order.
    Sequence(Vec<Pattern>),
    /// An optional group; matches its children or consumes nothing.
    Optional(Vec<Pattern>),
    /// One or more repetitions of the inner pattern (`...`).
    Repeat(Box<Pattern>),
    /// Alternative branches separated by `|`, tried in order.
    Choice(Vec<Pattern>),
}

impl Pattern {
    /// Collects every option key referenced anywhere in the tree.
    pub fn option_keys(&self) -> Vec<&str> {
        let mut keys = Vec::new();
        self.collect_option_keys(&mut keys);
        keys
    }

    fn collect_option_keys<'a>(&'a self, keys: &mut Vec<&'a str>) {
        match self {
            Pattern::OptionRef { key } => keys.push(key),
            Pattern::Sequence(children)
            | Pattern::Optional(children)
            | Pattern::Choice(children) => {
                for child in children {
                    child.collect_option_keys(keys);
                }
            }
            Pattern::Repeat(inner) => inner.collect_option_keys(keys),
            Pattern::Literal(_) | Pattern::Positional { .. } => {}
        }
    }

    /// Collects every positional name in the tree, in declaration order.
    pub fn positional_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_positional_names(&mut names);
        names
    }

    fn collect_positional_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Pattern::Positional { name } => names.push(name),
            Pattern::Sequence(children)
            | Pattern::Optional(children)
            | Pattern::Choice(children) => {
                for child in children {
                    child.collect_positional_names(names);
                }
            }
            Pattern::Repeat(inner) => inner.collect_positional_names(names),
            Pattern::Literal(_) | Pattern::OptionRef { .. } => {}
        }
    }

    /// True when the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        matches!(self, Pattern::Sequence(c) | Pattern::Choice(c) if c.is_empty())
    }
}

/// Parsed representation of one usage string.
///
/// Produced by the engine's parser from a command's docstring; the original
/// (cleaned) text is kept in `source` so help output and the matchable
/// structure share a single source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageGrammar {
    /// The leading token after `Usage:`.
    pub program: String,
    /// The pattern tree; a `Choice` over the usage lines.
    pub pattern: Pattern,
    /// Option metadata merged from inline occurrences and the `Options:` section.
    pub options: OptionsCatalog,
    /// First non-blank line of the docstring, for command listings.
    pub summary: String,
    /// The cleaned docstring, used verbatim as the help text.
    pub source: String,
}

impl UsageGrammar {
    /// Returns the usage lines rendered as `program args...` strings.
    ///
    /// Used by mismatch reporting when the full source is not wanted.
    pub fn usage_lines(&self) -> Vec<String> {
        match &self.pattern {
            Pattern::Choice(branches) => branches
                .iter()
                .map(|b| format!("{} {}", self.program, render_pattern(b)).trim_end().to_string())
                .collect(),
            other => vec![
                format!("{} {}", self.program, render_pattern(other)).trim_end().to_string(),
            ],
        }
    }
}

fn render_pattern(pattern: &Pattern) -> String {
    match pattern {
        Pattern::Literal(word) => word.clone(),
        Pattern::Positional { name } => format!("<{name}>"),
        Pattern::OptionRef { key } => key.clone(),
        Pattern::Sequence(children) => children
            .iter()
            .map(render_pattern)
            .collect::<Vec<_>>()
            .join(" "),
        Pattern::Optional(children) => format!(
            "[{}]",
            children.iter().map(render_pattern).collect::<Vec<_>>().join(" ")
        ),
        Pattern::Repeat(inner) => format!("{}...", render_pattern(inner)),
        Pattern::Choice(branches) => format!(
            "({})",
            branches.iter().map(render_pattern).collect::<Vec<_>>().join(" | ")
        ),
    }
}
