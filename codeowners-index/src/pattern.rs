use std::{fmt, str::Chars};

use regex::Regex;

/// A single CODEOWNERS pattern, compiled into a sequence of path segment
/// matchers. Patterns follow the gitignore dialect: a leading slash anchors
/// the pattern to the root, a trailing slash restricts it to directories,
/// `**` spans any number of path segments, and `*`, `?` and `[...]` match
/// within a single segment.
///
/// A pattern that matches a directory also matches everything beneath it.
#[derive(Debug, Clone)]
pub struct Pattern {
    text: String,
    segments: Vec<Segment>,
    anchored: bool,
    directory_only: bool,
    has_double_star: bool,
}

/// Reasons a pattern can't be compiled. Rules with malformed patterns are
/// dropped by the parser rather than aborting the whole manifest.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("pattern is empty")]
    Empty,
    #[error("unbalanced bracket in pattern")]
    UnbalancedBracket,
    #[error("patterns cannot contain control characters")]
    ControlCharacter,
    #[error("pattern ends with an unfinished escape sequence")]
    DanglingEscape,
    #[error("unsupported pattern: {0}")]
    Unsupported(String),
}

impl Pattern {
    /// Compile a pattern as written in a CODEOWNERS file.
    pub fn new(text: &str) -> Result<Pattern, PatternError> {
        if text.chars().any(char::is_control) {
            return Err(PatternError::ControlCharacter);
        }

        // Remove the leading slash if present. It forces left-anchoring so we
        // need to remember whether it was present or not.
        let (body, leading_slash) = match text.strip_prefix('/') {
            Some(body) => (body, true),
            None => (text, false),
        };

        let (body, trailing_slash) = match body.strip_suffix('/') {
            Some(body) => (body, true),
            None => (body, false),
        };

        // CODEOWNERS files use Unix path separators.
        let globs = body.split('/').filter(|g| !g.is_empty()).collect::<Vec<_>>();
        if globs.is_empty() {
            return Err(PatternError::Empty);
        }

        // All patterns are left-anchored unless they're a single component with
        // no leading slash (but a trailing slash is permitted).
        let anchored = leading_slash || globs.len() > 1;
        let has_double_star = globs.iter().any(|&g| g == "**");

        let mut segments = Vec::with_capacity(globs.len() + 2);
        if !anchored {
            segments.push(Segment::AnyDepth);
        }
        for glob in globs {
            let segment = Segment::new(glob)?;
            // Consecutive double stars coalesce into one
            if segment.is_any_depth() && segments.last().map_or(false, Segment::is_any_depth) {
                continue;
            }
            segments.push(segment);
        }

        // A trailing /** matches everything under the directory, but not the
        // directory itself, so we need one more segment.
        if segments.last().map_or(false, Segment::is_any_depth) {
            segments.push(Segment::Any);
        }

        Ok(Pattern {
            text: text.to_owned(),
            segments,
            anchored,
            directory_only: trailing_slash,
            has_double_star,
        })
    }

    /// The pattern as written in the manifest.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    pub fn is_directory_only(&self) -> bool {
        self.directory_only
    }

    pub fn has_double_star(&self) -> bool {
        self.has_double_star
    }

    /// Check whether the pattern matches a slash-separated path relative to
    /// the manifest's base directory. `is_directory` describes the final path
    /// component; every other component is a directory by construction.
    pub fn matches(&self, path: &str, is_directory: bool) -> bool {
        let components = path.split('/').filter(|c| !c.is_empty()).collect::<Vec<_>>();
        let accepting = self.segments.len();

        let mut states = vec![false; accepting + 1];
        states[0] = true;
        self.follow_any_depth(&mut states);

        for (depth, component) in components.iter().enumerate() {
            states = self.step(&states, component);
            if !states.contains(&true) {
                return false;
            }

            if states[accepting] {
                // Matching a parent directory covers everything beneath it
                let is_leaf = depth + 1 == components.len();
                if !is_leaf || is_directory || !self.directory_only {
                    return true;
                }
            }
        }

        false
    }

    // Follow every transition that accepts `component` from the current set
    // of states, then traverse the implicit zero-segment edges of `**`.
    fn step(&self, states: &[bool], component: &str) -> Vec<bool> {
        let mut next = vec![false; states.len()];
        for (idx, segment) in self.segments.iter().enumerate() {
            if !states[idx] {
                continue;
            }
            if segment.is_any_depth() {
                next[idx] = true;
            } else if segment.is_match(component) {
                next[idx + 1] = true;
            }
        }
        self.follow_any_depth(&mut next);
        next
    }

    fn follow_any_depth(&self, states: &mut [bool]) {
        for (idx, segment) in self.segments.iter().enumerate() {
            if states[idx] && segment.is_any_depth() {
                states[idx + 1] = true;
            }
        }
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Pattern {}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Debug, Clone)]
enum Segment {
    AnyDepth,
    Any,
    Literal(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
    Regex(Regex),
}

impl Segment {
    fn new(glob: &str) -> Result<Self, PatternError> {
        match glob {
            "**" => return Ok(Self::AnyDepth),
            "*" => return Ok(Self::Any),
            _ => {}
        }

        let (leading_star, rest) = match glob.strip_prefix('*') {
            Some(rest) => (true, rest),
            None => (false, glob),
        };
        let (trailing_star, inner) = match rest.strip_suffix('*') {
            Some(inner) => (true, inner),
            None => (false, rest),
        };

        if inner.contains(|c: char| matches!(c, '*' | '?' | '[' | '\\')) {
            return glob_to_regex(glob).map(Self::Regex);
        }

        let inner = inner.to_owned();
        Ok(match (leading_star, trailing_star) {
            (false, false) => Self::Literal(inner),
            (false, true) => Self::Prefix(inner),
            (true, false) => Self::Suffix(inner),
            (true, true) => Self::Contains(inner),
        })
    }

    fn is_any_depth(&self) -> bool {
        matches!(self, Self::AnyDepth)
    }

    fn is_match(&self, candidate: &str) -> bool {
        match self {
            Self::AnyDepth | Self::Any => true,
            Self::Literal(literal) => candidate == literal.as_str(),
            Self::Prefix(prefix) => candidate.starts_with(prefix.as_str()),
            Self::Suffix(suffix) => candidate.ends_with(suffix.as_str()),
            Self::Contains(needle) => {
                memchr::memmem::find(candidate.as_bytes(), needle.as_bytes()).is_some()
            }
            Self::Regex(re) => re.is_match(candidate),
        }
    }
}

fn glob_to_regex(glob: &str) -> Result<Regex, PatternError> {
    let mut regex = String::with_capacity(glob.len() + 8);
    regex.push_str(r"\A");
    let mut chars = glob.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => regex.push_str(r"[^/]*"),
            '?' => regex.push_str(r"[^/]"),
            '\\' => match chars.next() {
                Some(escaped) => push_literal(&mut regex, escaped),
                None => return Err(PatternError::DanglingEscape),
            },
            '[' => push_class(&mut regex, &mut chars)?,
            _ => push_literal(&mut regex, c),
        }
    }
    regex.push_str(r"\z");
    Regex::new(&regex).map_err(|err| PatternError::Unsupported(err.to_string()))
}

// Translate a bracket expression, starting just after the opening `[`.
fn push_class(regex: &mut String, chars: &mut Chars<'_>) -> Result<(), PatternError> {
    regex.push('[');
    if let Some('!' | '^') = chars.clone().next() {
        chars.next();
        regex.push('^');
    }

    let mut first = true;
    loop {
        let c = chars.next().ok_or(PatternError::UnbalancedBracket)?;
        match c {
            ']' if !first => break,
            '\\' => {
                let escaped = chars.next().ok_or(PatternError::DanglingEscape)?;
                push_literal(regex, escaped);
            }
            '-' if !first && !matches!(chars.clone().next(), Some(']') | None) => regex.push('-'),
            _ => push_literal(regex, c),
        }
        first = false;
    }

    regex.push(']');
    Ok(())
}

fn push_literal(regex: &mut String, c: char) {
    if regex_syntax::is_meta_character(c) {
        regex.push('\\');
    }
    regex.push(c);
}
