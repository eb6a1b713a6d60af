//! Help text rendering: the top-level usage block, per-command usage, and
//! the command listing.
//!
//! The docstring is the single source of truth for help output; this module
//! only cleans, re-wraps, and aligns it for the requested width.

use textwrap::Options;

use docgram_core::UsageGrammar;

use crate::registry::Registry;

/// Default render width when the caller has no terminal size to offer.
pub const DEFAULT_WIDTH: usize = 80;

/// Cleans a docstring the way it was written: drops surrounding blank
/// lines and removes the common leading indentation of all lines after the
/// first.
pub fn clean_doc(doc: &str) -> String {
    let lines: Vec<&str> = doc.lines().collect();
    // Margin is counted in characters, not bytes; indentation may be
    // non-ASCII whitespace.
    let margin = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<String> = Vec::with_capacity(lines.len());
    for (idx, line) in lines.iter().enumerate() {
        if idx == 0 {
            cleaned.push(line.trim_start().to_string());
        } else {
            cleaned.push(strip_margin(line, margin).trim_end().to_string());
        }
    }

    while cleaned.first().is_some_and(|l| l.is_empty()) {
        cleaned.remove(0);
    }
    while cleaned.last().is_some_and(|l| l.is_empty()) {
        cleaned.pop();
    }
    cleaned.join("\n")
}

/// Strips up to `margin` leading whitespace characters, stopping early at
/// the first non-whitespace character.
fn strip_margin(line: &str, margin: usize) -> &str {
    let mut stripped = 0;
    for (at, c) in line.char_indices() {
        if stripped == margin || !c.is_whitespace() {
            return &line[at..];
        }
        stripped += 1;
    }
    ""
}

/// The default top-level usage block for a program with subcommands.
pub fn top_level_doc(program: &str, message: Option<&str>) -> String {
    let message = match message {
        Some(m) => format!("\n{m}\n"),
        None => String::new(),
    };
    format!(
        "Usage:\n  \
         {program} [--help] [--version] [--log-level <level> | --debug | --verbose]\n  \
         {pad}  <command> [<args>...]\n\
         \n\
         Options:\n  \
         -h, --help           Display this help message and exit.\n  \
         -V, --version        Display the version and exit.\n  \
         -d, --debug          Set the log level to DEBUG.\n  \
         -v, --verbose        Set the log level to INFO.\n  \
         --log-level <level>  Set the log level to one of DEBUG, INFO, WARN, or ERROR.\n\
         {message}\
         \n\
         '{program} help -a' lists all available subcommands.\n\
         See '{program} help <command>' for more information on a specific command.",
        pad = " ".repeat(program.len()),
    )
}

/// Re-formats a usage docstring for display.
///
/// Sections (separated by blank lines) are handled by kind: usage sections
/// wrap continuation lines under the argument column, definition sections
/// (`Options:`, `Arguments:`) re-align their term and description columns,
/// and prose paragraphs wrap at the given width.
pub fn format_usage(doc: &str, width: usize) -> String {
    let cleaned = clean_doc(doc);
    cleaned
        .split("\n\n")
        .map(|section| wrap_section(section, width))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Renders just the `Usage:` block from a grammar's pattern.
///
/// Used by mismatch reporting, where the full docstring would drown the
/// error.
pub fn usage_block(grammar: &UsageGrammar) -> String {
    let mut out = String::from("Usage:\n");
    for line in grammar.usage_lines() {
        out.push_str("  ");
        out.push_str(&line);
        out.push('\n');
    }
    out.trim_end().to_string()
}

/// The `Available commands:` block, alphabetical, with one-line summaries.
///
/// The built-in `help` command is always listed.
pub fn command_listing(registry: &Registry) -> String {
    let mut rows: Vec<(String, String)> = registry
        .iter()
        .map(|entry| (entry.name.clone(), entry.summary().to_string()))
        .collect();
    rows.push(("help".to_string(), "Display help for a command.".to_string()));
    rows.sort();

    let name_width = rows.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    let mut out = String::from("Available commands:\n");
    for (name, summary) in rows {
        if summary.is_empty() {
            out.push_str(&format!("  {name}\n"));
        } else {
            out.push_str(&format!("  {name:<name_width$}  {summary}\n"));
        }
    }
    out.trim_end().to_string()
}

fn wrap_section(section: &str, width: usize) -> String {
    if section
        .lines()
        .next()
        .is_some_and(|l| l.trim_start().starts_with("Usage:"))
    {
        return wrap_usage_section(section, width);
    }
    if is_definition_section(section) {
        return wrap_definition_section(section, width);
    }
    section
        .lines()
        .map(|line| textwrap::fill(line, width))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A definition section has a header line ending in `:` and rows of
/// `term  description` separated by two or more spaces.
fn is_definition_section(section: &str) -> bool {
    let mut lines = section.lines();
    let Some(header) = lines.next() else {
        return false;
    };
    if !header.trim_end().ends_with(':') {
        return false;
    }
    let mut saw_row = false;
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        if split_definition(line).is_none() {
            return false;
        }
        saw_row = true;
    }
    saw_row
}

fn split_definition(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim();
    let split_at = trimmed.find("  ")?;
    let (term, desc) = trimmed.split_at(split_at);
    Some((term.trim_end(), desc.trim_start()))
}

fn wrap_usage_section(section: &str, width: usize) -> String {
    section
        .lines()
        .map(|line| {
            if line.len() <= width {
                line.to_string()
            } else {
                let indent = " ".repeat(line.len() - line.trim_start().len() + 4);
                textwrap::fill(line, Options::new(width).subsequent_indent(&indent))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn wrap_definition_section(section: &str, width: usize) -> String {
    let mut lines = section.lines();
    let header = lines.next().unwrap_or_default().trim_end();

    let rows: Vec<(&str, &str)> = lines.filter_map(split_definition).collect();
    let term_width = rows.iter().map(|(term, _)| term.len()).max().unwrap_or(0);

    let mut out = String::from(header);
    let hang = " ".repeat(term_width + 4);
    for (term, desc) in rows {
        let desc_width = width.saturating_sub(term_width + 4).max(20);
        let wrapped = textwrap::fill(desc, desc_width);
        let mut parts = wrapped.lines();
        let first = parts.next().unwrap_or_default();
        out.push_str(&format!("\n  {term:<term_width$}  {first}"));
        for cont in parts {
            out.push_str(&format!("\n{hang}{cont}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_usage;

    #[test]
    fn clean_doc_dedents_and_trims() {
        let doc = "\n    Say hello.\n\n    Usage: say hello\n";
        assert_eq!(clean_doc(doc), "Say hello.\n\nUsage: say hello");
    }

    #[test]
    fn clean_doc_handles_non_ascii_indentation() {
        // No-break-space indentation is narrower in characters than the
        // space-indented line is in bytes; dedent must not split a char.
        let doc = "Title\n   Usage: prog run\n\u{a0}\u{a0}b\n";
        let cleaned = clean_doc(doc);
        assert_eq!(cleaned, "Title\n Usage: prog run\nb");
    }

    #[test]
    fn clean_doc_keeps_relative_indentation() {
        let doc = "Top.\n    Usage:\n      prog run\n";
        assert_eq!(clean_doc(doc), "Top.\nUsage:\n  prog run");
    }

    #[test]
    fn top_level_doc_names_the_program() {
        let doc = top_level_doc("say", None);
        assert!(doc.starts_with("Usage:"));
        assert!(doc.contains("say [--help]"));
        assert!(doc.contains("'say help -a' lists all available subcommands."));
    }

    #[test]
    fn top_level_doc_embeds_message() {
        let doc = top_level_doc("say", Some("Available commands:\n  hello"));
        assert!(doc.contains("Available commands:\n  hello"));
    }

    #[test]
    fn usage_block_reconstructs_from_pattern() {
        let grammar =
            parse_usage("Usage:\n  pets add <name>\n  pets remove <name>...\n").unwrap();
        assert_eq!(
            usage_block(&grammar),
            "Usage:\n  pets add <name>\n  pets remove <name>..."
        );
    }

    #[test]
    fn definition_section_realigns_columns() {
        let section = "Options:\n  -h, --help  Show help.\n  -n, --num-times <num>  Repeat count.";
        let wrapped = wrap_definition_section(section, 80);
        let help_col = wrapped.lines().nth(1).unwrap().find("Show help.").unwrap();
        let num_col = wrapped.lines().nth(2).unwrap().find("Repeat count.").unwrap();
        assert_eq!(help_col, num_col);
        assert!(wrapped.contains("-n, --num-times <num>  Repeat count."));
    }

    #[test]
    fn long_definition_descriptions_hang_indent() {
        let section = "Options:\n  -x  A very long description that will certainly not fit on one single line of forty columns.";
        let wrapped = wrap_definition_section(section, 40);
        let lines: Vec<&str> = wrapped.lines().collect();
        assert!(lines.len() > 2);
        assert!(lines[2].starts_with("      "));
    }

    #[test]
    fn prose_sections_wrap_at_width() {
        let doc = "A sentence that is noticeably longer than the narrow width we pass in here.";
        let formatted = format_usage(doc, 30);
        assert!(formatted.lines().all(|l| l.len() <= 30));
    }
}
