//! Docstring section scanning.
//!
//! Locates the `Usage:` section (case-sensitive header, terminated by a
//! blank line or the next recognized header), rejoins wrapped usage lines,
//! and parses `Options:` definition lines into catalog entries.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use docgram_core::OptionSpec;

/// Regex patterns for section and option-line parsing.
static PATTERNS: LazyLock<SectionPatterns> = LazyLock::new(SectionPatterns::new);

struct SectionPatterns {
    /// Two or more spaces separating a definition term from its description.
    column_break: Regex,
    /// `[default: value]` marker inside an option description.
    default_value: Regex,
    /// `<arg>` or `ALLCAPS` value placeholder.
    placeholder: Regex,
}

impl SectionPatterns {
    fn new() -> Self {
        // Static patterns; a failure here is a programmer error.
        Self {
            column_break: Regex::new(r"\s{2,}").expect("static regex must compile"),
            default_value: Regex::new(r"(?i)\[default:\s*([^\]]*)\]")
                .expect("static regex must compile"),
            placeholder: Regex::new(r"^(<[^<>]+>|[A-Z][A-Z0-9_-]+)$")
                .expect("static regex must compile"),
        }
    }
}

/// Returns true for `<arg>` / `ALLCAPS` tokens that stand for a value.
pub(crate) fn is_placeholder(token: &str) -> bool {
    PATTERNS.placeholder.is_match(token)
}

/// The recognized sections of one docstring.
#[derive(Debug, Default)]
pub(crate) struct Sections {
    /// Usage entries, one per alternative invocation, wrapping undone.
    pub(crate) usage_entries: Vec<String>,
    /// Raw `Options:` definition lines, continuations rejoined.
    pub(crate) option_lines: Vec<String>,
}

fn is_section_header(trimmed: &str) -> bool {
    trimmed.starts_with("Usage:")
        || trimmed.starts_with("Arguments:")
        || trimmed.starts_with("Options:")
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Splits a cleaned docstring into its recognized sections.
///
/// Returns `None` when no `Usage:` header is present.
pub(crate) fn split_sections(doc: &str) -> Option<Sections> {
    let lines: Vec<&str> = doc.lines().collect();
    let usage_at = lines
        .iter()
        .position(|line| line.trim_start().starts_with("Usage:"))?;

    let mut sections = Sections::default();
    collect_usage(&lines, usage_at, &mut sections);

    if let Some(options_at) = lines
        .iter()
        .position(|line| line.trim_start().starts_with("Options:"))
    {
        collect_options(&lines, options_at, &mut sections);
    }

    debug!(
        usage_entries = sections.usage_entries.len(),
        option_lines = sections.option_lines.len(),
        "split docstring sections"
    );
    Some(sections)
}

fn collect_usage(lines: &[&str], header_at: usize, sections: &mut Sections) {
    let header = lines[header_at];
    let rest = header.trim_start()["Usage:".len()..].trim();
    let mut entry_col = None;

    if !rest.is_empty() {
        // First entry shares the header line; its column is where the text
        // starts after "Usage:".
        entry_col = Some(header.find(rest).unwrap_or(0));
        sections.usage_entries.push(rest.to_string());
    }

    for line in &lines[header_at + 1..] {
        let trimmed = line.trim();
        if trimmed.is_empty() || is_section_header(trimmed) {
            break;
        }
        let indent = indent_of(line);
        match entry_col {
            Some(col) if indent > col => {
                // Wrapped continuation of the previous entry.
                if let Some(last) = sections.usage_entries.last_mut() {
                    last.push(' ');
                    last.push_str(trimmed);
                }
            }
            _ => {
                if entry_col.is_none() {
                    entry_col = Some(indent);
                }
                sections.usage_entries.push(trimmed.to_string());
            }
        }
    }
}

fn collect_options(lines: &[&str], header_at: usize, sections: &mut Sections) {
    for line in &lines[header_at + 1..] {
        let trimmed = line.trim();
        if trimmed.is_empty() || is_section_header(trimmed) {
            break;
        }
        if trimmed.starts_with('-') {
            sections.option_lines.push(trimmed.to_string());
        } else if let Some(last) = sections.option_lines.last_mut() {
            // Wrapped description continuation.
            last.push(' ');
            last.push_str(trimmed);
        }
    }
}

/// Parses one `Options:` definition line into an [`OptionSpec`].
///
/// The line shape is `-s, --long <arg>  description [default: value]`; an
/// entry with no placeholder is a boolean presence flag. Returns `None` for
/// lines that define no option token.
pub(crate) fn parse_option_line(line: &str) -> Option<OptionSpec> {
    let (flags_part, description) = match PATTERNS.column_break.splitn(line, 2).collect::<Vec<_>>()
    {
        parts if parts.len() == 2 => (parts[0], Some(parts[1].trim())),
        _ => (line, None),
    };

    let mut short = None;
    let mut long = None;
    let mut takes_value = false;

    for token in flags_part.split([',', '/', ' ']).filter(|t| !t.is_empty()) {
        if let Some(rest) = token.strip_prefix("--") {
            // `--flag=<arg>` carries its placeholder inline.
            match rest.split_once('=') {
                Some((name, _arg)) => {
                    long = Some(format!("--{name}"));
                    takes_value = true;
                }
                None => long = Some(token.to_string()),
            }
        } else if token.starts_with('-') && token.len() > 1 {
            short = Some(token.to_string());
        } else if is_placeholder(token) {
            takes_value = true;
        }
    }

    if short.is_none() && long.is_none() {
        return None;
    }

    let default = PATTERNS
        .default_value
        .captures(line)
        .map(|caps| caps[1].trim().to_string());

    let mut spec = if takes_value {
        OptionSpec::with_value(short.as_deref(), long.as_deref())
    } else {
        OptionSpec::flag(short.as_deref(), long.as_deref())
    };
    spec.default = default;
    spec.description = description.map(str::to_string);
    Some(spec)
}
