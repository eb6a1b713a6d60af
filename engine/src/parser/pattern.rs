//! Usage-line tokenizer and pattern parser.
//!
//! Turns one usage entry (program token already verified by the caller) into
//! a [`Pattern`] tree, merging inline option sightings into the grammar's
//! options catalog as it goes.

use tracing::trace;

use docgram_core::{OptionSpec, OptionsCatalog, Pattern, normalize_param_name};

use super::GrammarError;
use super::sections::is_placeholder;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Tok {
    Word(String),
    LBracket,
    RBracket,
    LParen,
    RParen,
    Pipe,
    Ellipsis,
}

/// Tokenizes a usage entry by whitespace and group delimiters.
///
/// A trailing `...` detaches from its word so the parser sees it as a repeat
/// marker. `line` is the 1-based usage entry index, used for error reporting.
pub(crate) fn tokenize(entry: &str, line: usize) -> Result<Vec<Tok>, GrammarError> {
    let mut toks = Vec::new();
    let mut chars = entry.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '[' => {
                chars.next();
                toks.push(Tok::LBracket);
            }
            ']' => {
                chars.next();
                toks.push(Tok::RBracket);
            }
            '(' => {
                chars.next();
                toks.push(Tok::LParen);
            }
            ')' => {
                chars.next();
                toks.push(Tok::RParen);
            }
            '|' => {
                chars.next();
                toks.push(Tok::Pipe);
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || matches!(c, '[' | ']' | '(' | ')' | '|') {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                if word == "..." {
                    toks.push(Tok::Ellipsis);
                    continue;
                }
                let repeated = word.ends_with("...");
                if repeated {
                    word.truncate(word.len() - 3);
                }
                if word.starts_with('<') && !word.ends_with('>') {
                    return Err(GrammarError::UnterminatedPlaceholder { line, token: word });
                }
                toks.push(Tok::Word(word));
                if repeated {
                    toks.push(Tok::Ellipsis);
                }
            }
        }
    }
    Ok(toks)
}

/// Recursive-descent parser over one usage entry's tokens.
pub(crate) struct PatternParser<'a> {
    toks: Vec<Tok>,
    pos: usize,
    line: usize,
    program: &'a str,
    catalog: &'a mut OptionsCatalog,
}

impl<'a> PatternParser<'a> {
    pub(crate) fn new(
        toks: Vec<Tok>,
        line: usize,
        program: &'a str,
        catalog: &'a mut OptionsCatalog,
    ) -> Self {
        Self {
            toks,
            pos: 0,
            line,
            program,
            catalog,
        }
    }

    /// Parses the whole entry into one pattern (a `Sequence` or `Choice`).
    pub(crate) fn parse(mut self) -> Result<Pattern, GrammarError> {
        let pattern = self.parse_expr()?;
        if self.pos < self.toks.len() {
            // A stray closing delimiter ends parse_expr early.
            return Err(GrammarError::UnbalancedGroup { line: self.line });
        }
        trace!(line = self.line, ?pattern, "parsed usage entry");
        Ok(pattern)
    }

    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn bump(&mut self) -> Option<Tok> {
        let tok = self.toks.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn parse_expr(&mut self) -> Result<Pattern, GrammarError> {
        let first = self.parse_seq()?;
        let mut rest = Vec::new();
        while matches!(self.peek(), Some(Tok::Pipe)) {
            self.bump();
            rest.push(self.parse_seq()?);
        }
        if rest.is_empty() {
            return Ok(first);
        }
        let mut branches = vec![first];
        branches.extend(rest);
        Ok(Pattern::Choice(branches))
    }

    fn parse_seq(&mut self) -> Result<Pattern, GrammarError> {
        let mut children = Vec::new();
        while let Some(tok) = self.peek() {
            match tok {
                Tok::Pipe | Tok::RBracket | Tok::RParen => break,
                _ => children.push(self.parse_atom()?),
            }
        }
        Ok(Pattern::Sequence(children))
    }

    fn parse_atom(&mut self) -> Result<Pattern, GrammarError> {
        let atom = match self.bump() {
            Some(Tok::LBracket) => {
                let inner = self.parse_expr()?;
                match self.bump() {
                    Some(Tok::RBracket) => {}
                    _ => return Err(GrammarError::UnbalancedGroup { line: self.line }),
                }
                match inner {
                    Pattern::Sequence(children) => Pattern::Optional(children),
                    other => Pattern::Optional(vec![other]),
                }
            }
            Some(Tok::LParen) => {
                let inner = self.parse_expr()?;
                match self.bump() {
                    Some(Tok::RParen) => {}
                    _ => return Err(GrammarError::UnbalancedGroup { line: self.line }),
                }
                inner
            }
            Some(Tok::Word(word)) => self.parse_word(&word)?,
            Some(tok) => {
                return Err(GrammarError::UnexpectedToken {
                    line: self.line,
                    token: format!("{tok:?}"),
                });
            }
            None => return Err(GrammarError::UnbalancedGroup { line: self.line }),
        };

        Ok(if matches!(self.peek(), Some(Tok::Ellipsis)) {
            self.bump();
            Pattern::Repeat(Box::new(atom))
        } else {
            atom
        })
    }

    fn parse_word(&mut self, word: &str) -> Result<Pattern, GrammarError> {
        if word.starts_with('-') && word.len() > 1 && word != "--" {
            return self.parse_option(word);
        }
        if is_placeholder(word) {
            return Ok(Pattern::Positional {
                name: normalize_param_name(word),
            });
        }
        if word == self.program {
            return Err(GrammarError::UnexpectedToken {
                line: self.line,
                token: word.to_string(),
            });
        }
        Ok(Pattern::Literal(word.to_string()))
    }

    /// Resolves an inline option sighting against the catalog.
    ///
    /// A catalog entry decides value-arity; for an unknown option the inline
    /// shape decides: an `=`-joined or immediately following placeholder
    /// makes it value-taking, otherwise it is a boolean flag. Either way the
    /// sighting is merged into the catalog so the pattern invariant (every
    /// reference resolves) holds.
    fn parse_option(&mut self, word: &str) -> Result<Pattern, GrammarError> {
        let (token, eq_arg) = match word.split_once('=') {
            Some((name, arg)) => (name, Some(arg)),
            None => (word, None),
        };

        let known_takes_value = self.catalog.find_token(token).map(|o| o.takes_value);
        let next_is_placeholder =
            matches!(self.peek(), Some(Tok::Word(w)) if is_placeholder(w));

        let takes_value = match known_takes_value {
            Some(known) => known || eq_arg.is_some(),
            None => eq_arg.is_some() || next_is_placeholder,
        };

        // The placeholder names the option's value; it is not a positional.
        if takes_value && eq_arg.is_none() && next_is_placeholder {
            self.bump();
        }

        let (short, long) = if token.starts_with("--") {
            (None, Some(token))
        } else {
            (Some(token), None)
        };
        let spec = if takes_value {
            OptionSpec::with_value(short, long)
        } else {
            OptionSpec::flag(short, long)
        };
        self.catalog.merge(spec);

        let key = self
            .catalog
            .find_token(token)
            .map(|o| o.key().to_string())
            .unwrap_or_else(|| token.to_string());
        Ok(Pattern::OptionRef { key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_entry(entry: &str, catalog: &mut OptionsCatalog) -> Result<Pattern, GrammarError> {
        let toks = tokenize(entry, 1)?;
        PatternParser::new(toks, 1, "prog", catalog).parse()
    }

    #[test]
    fn tokenize_detaches_ellipsis_and_groups() {
        let toks = tokenize("<file>... [--force]", 1).unwrap();
        assert_eq!(
            toks,
            vec![
                Tok::Word("<file>".into()),
                Tok::Ellipsis,
                Tok::LBracket,
                Tok::Word("--force".into()),
                Tok::RBracket,
            ]
        );
    }

    #[test]
    fn tokenize_rejects_unterminated_placeholder() {
        let err = tokenize("<file", 3).unwrap_err();
        assert!(matches!(
            err,
            GrammarError::UnterminatedPlaceholder { line: 3, .. }
        ));
    }

    #[test]
    fn parses_alternatives_in_declaration_order() {
        let mut catalog = OptionsCatalog::default();
        let pattern = parse_entry("(add <name> | remove <name>)", &mut catalog).unwrap();
        let Pattern::Sequence(children) = pattern else {
            panic!("expected sequence");
        };
        let Pattern::Choice(branches) = &children[0] else {
            panic!("expected choice");
        };
        assert_eq!(branches.len(), 2);
        let Pattern::Sequence(first) = &branches[0] else {
            panic!("expected sequence branch");
        };
        assert_eq!(first[0], Pattern::Literal("add".into()));
    }

    #[test]
    fn unknown_option_followed_by_placeholder_takes_value() {
        let mut catalog = OptionsCatalog::default();
        let pattern = parse_entry("--log-level <level>", &mut catalog).unwrap();
        let opt = catalog.find_token("--log-level").unwrap();
        assert!(opt.takes_value);
        // The placeholder was consumed by the option, not left as a positional.
        assert!(pattern.positional_names().is_empty());
    }

    #[test]
    fn known_boolean_option_leaves_placeholder_as_positional() {
        let mut catalog = OptionsCatalog::default();
        catalog.merge(OptionSpec::flag(Some("-v"), Some("--verbose")));
        let pattern = parse_entry("--verbose <file>", &mut catalog).unwrap();
        assert_eq!(pattern.positional_names(), vec!["file"]);
        assert!(!catalog.find_token("--verbose").unwrap().takes_value);
    }

    #[test]
    fn short_sighting_merges_with_long_catalog_entry() {
        let mut catalog = OptionsCatalog::default();
        catalog.merge(OptionSpec::with_value(Some("-n"), Some("--num-times")));
        let pattern = parse_entry("[-n <num>] <word>", &mut catalog).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(pattern.option_keys(), vec!["--num-times"]);
        assert_eq!(pattern.positional_names(), vec!["word"]);
    }

    #[test]
    fn unbalanced_bracket_is_an_error() {
        let mut catalog = OptionsCatalog::default();
        assert!(matches!(
            parse_entry("[<name>", &mut catalog),
            Err(GrammarError::UnbalancedGroup { .. })
        ));
        assert!(matches!(
            parse_entry("<name>]", &mut catalog),
            Err(GrammarError::UnbalancedGroup { .. })
        ));
    }

    #[test]
    fn repeated_group_wraps_in_repeat() {
        let mut catalog = OptionsCatalog::default();
        let pattern = parse_entry("(<key> <value>)...", &mut catalog).unwrap();
        let Pattern::Sequence(children) = pattern else {
            panic!("expected sequence");
        };
        assert!(matches!(children[0], Pattern::Repeat(_)));
    }
}
