use std::{fs, path::Path};

use tracing::warn;

use crate::{
    pattern::Pattern,
    ruleset::{self, Owner},
};

/// Parse manifest text. Never fails: rules that can't be compiled are reported
/// in [`ParseResult::errors`] and left out of [`ParseResult::rules`].
pub fn parse(source: &str) -> ParseResult {
    Parser::new(source).parse()
}

/// Read and parse the manifest at `path`. Only I/O failures are returned as
/// errors.
pub fn parse_file(path: &Path) -> std::io::Result<ParseResult> {
    let source = fs::read_to_string(path)?;
    Ok(parse(&source))
}

/// Rules in manifest order, plus one diagnostic per dropped rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    pub rules: Vec<Rule>,
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    /// Discard spans and comments and keep the compiled rules. Each dropped
    /// rule is logged with its line number.
    pub fn into_ruleset(self: ParseResult) -> ruleset::RuleSet {
        for error in &self.errors {
            warn!(line = error.line, "skipping CODEOWNERS rule: {}", error.message);
        }
        ruleset::RuleSet::new(self.rules.into_iter().map(|r| r.into()).collect())
    }
}

/// One manifest line as written: the compiled pattern, its owners, the comment
/// block above it and any comment after it. `line` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub pattern: Spanned<Pattern>,
    pub owners: Vec<Spanned<Owner>>,
    pub leading_comments: Vec<Spanned<String>>,
    pub trailing_comment: Option<Spanned<String>>,
    pub line: usize,
}

impl From<Rule> for ruleset::Rule {
    fn from(rule: Rule) -> Self {
        ruleset::Rule {
            pattern: rule.pattern.0,
            owners: rule.owners.into_iter().map(|o| o.0).collect(),
            line: rule.line,
        }
    }
}

/// Why a rule was dropped, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
    pub line: usize,
}

impl ParseError {
    fn new(message: impl Into<String>, span: impl Into<Span>, line: usize) -> ParseError {
        ParseError {
            message: message.into(),
            span: span.into(),
            line,
        }
    }
}

/// Byte offsets `[start, end)` into the manifest text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span(pub usize, pub usize);

impl From<(usize, usize)> for Span {
    fn from((start, end): (usize, usize)) -> Self {
        Span(start, end)
    }
}

/// A value together with the manifest text it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned<T>(pub T, pub Span);

impl<T> Spanned<T> {
    fn new(val: impl Into<T>, span: impl Into<Span>) -> Spanned<T> {
        Spanned(val.into(), span.into())
    }
}

struct Parser<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            errors: Vec::new(),
        }
    }

    fn parse(mut self) -> ParseResult {
        let mut rules = Vec::new();
        let mut leading_comments = Vec::new();

        // Malformed rules are recorded in self.errors and dropped, parsing
        // resumes on the next line
        self.skip_whitespace();
        while let Some(c) = self.peek() {
            match c {
                '\r' | '\n' => {
                    self.next();
                }
                '#' => {
                    let comment = self.parse_comment();
                    leading_comments.push(comment);
                }
                _ => {
                    if let Some(mut rule) = self.parse_rule() {
                        rule.leading_comments = leading_comments;
                        rules.push(rule);
                    }
                    leading_comments = Vec::new();
                }
            }
            self.skip_whitespace();
        }

        ParseResult {
            rules,
            errors: self.errors,
        }
    }

    fn parse_comment(&mut self) -> Spanned<String> {
        let (comment, span) = self.take_until(|c| matches!(c, '\r' | '\n'));
        Spanned(comment, span)
    }

    fn parse_rule(&mut self) -> Option<Rule> {
        let line = self.line;
        let Spanned(text, span) = self.parse_pattern();
        if text.is_empty() {
            self.errors
                .push(ParseError::new("expected pattern", (self.pos, self.pos), line));
            self.skip_line();
            return None;
        }

        let mut owners = Vec::new();
        loop {
            self.skip_whitespace();
            let Some(owner) = self.parse_owner() else {
                break;
            };
            owners.push(owner);
        }

        // Owners stop at a newline, EOF, or the start of a trailing comment
        let trailing_comment = match self.peek() {
            Some('#') => Some(self.parse_comment()),
            _ => None,
        };

        match Pattern::new(&text) {
            Ok(pattern) => Some(Rule {
                pattern: Spanned(pattern, span),
                owners,
                leading_comments: Vec::new(),
                trailing_comment,
                line,
            }),
            Err(err) => {
                self.errors.push(ParseError::new(err.to_string(), span, line));
                None
            }
        }
    }

    fn parse_pattern(&mut self) -> Spanned<String> {
        let start = self.pos;
        let mut pattern = String::new();
        let mut escaped = false;
        loop {
            match self.peek() {
                Some('\\') if !escaped => {
                    escaped = true;
                    self.next();
                }
                Some('\r' | '\n') | None => break,
                Some(' ' | '\t' | '#') if !escaped => break,
                Some(c) => {
                    // Escaped whitespace and hashes are part of the pattern as
                    // plain characters, other escapes are kept for the glob
                    if escaped && !matches!(c, ' ' | '\t' | '#') {
                        pattern.push('\\');
                    }
                    pattern.push(c);
                    self.next();
                    escaped = false;
                }
            }
        }
        if escaped {
            pattern.push('\\');
        }
        Spanned::new(pattern, (start, self.pos))
    }

    fn parse_owner(&mut self) -> Option<Spanned<Owner>> {
        let (owner, span) = self.take_until(|c| matches!(c, ' ' | '\t' | '#' | '\r' | '\n'));
        if owner.is_empty() {
            None
        } else {
            Some(Spanned(Owner::from(owner), span))
        }
    }

    // Consume characters up to, but not including, the first one `stop`
    // accepts or the end of input.
    fn take_until(&mut self, stop: impl Fn(char) -> bool) -> (String, Span) {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if stop(c) {
                break;
            }
            self.next();
        }
        (self.source[start..self.pos].to_owned(), Span(start, self.pos))
    }

    fn skip_whitespace(&mut self) {
        while let Some(' ' | '\t') = self.peek() {
            self.next();
        }
    }

    fn skip_line(&mut self) {
        self.take_until(|c| matches!(c, '\r' | '\n'));
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn next(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        // A bare \r ends a line too; in \r\n only the \n counts
        match c {
            '\n' => self.line += 1,
            '\r' if self.peek() != Some('\n') => self.line += 1,
            _ => {}
        }
        Some(c)
    }
}
