use std::fmt;

use crate::{
    parser,
    pattern::{Pattern, PatternError},
};

/// An ordered list of CODEOWNERS rules. Rules keep the order in which they
/// appear in the manifest, and the last matching rule determines ownership.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Create a `RuleSet` from rules in manifest order.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Parse manifest text into a `RuleSet`. Malformed rules are logged and
    /// skipped; use [`parser::parse`] to inspect them.
    pub fn parse(source: &str) -> Self {
        parser::parse(source).into_ruleset()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Find the rule that determines ownership of `path`, along with its
    /// index in the rule set. Rules are scanned from the bottom of the file
    /// upwards, so the first hit is the last matching rule in file order.
    pub fn matching_rule(&self, path: &str, is_directory: bool) -> Option<(usize, &Rule)> {
        self.rules
            .iter()
            .enumerate()
            .rev()
            .find(|(_, rule)| rule.pattern.matches(path, is_directory))
    }

    /// Owners of `path`. Empty when no rule matches, or when the matching rule
    /// lists no owners.
    pub fn owners(&self, path: &str, is_directory: bool) -> &[Owner] {
        self.matching_rule(path, is_directory)
            .map(|(_, rule)| rule.owners.as_slice())
            .unwrap_or_default()
    }
}

/// A CODEOWNERS rule: a compiled pattern plus the owners it assigns. `line` is
/// the 1-based line of the manifest the rule was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub pattern: Pattern,
    pub owners: Vec<Owner>,
    pub line: usize,
}

impl Rule {
    pub fn new(pattern: &str, owners: Vec<Owner>, line: usize) -> Result<Rule, PatternError> {
        Ok(Rule {
            pattern: Pattern::new(pattern)?,
            owners,
            line,
        })
    }
}

/// An owner listed against a rule. Owners are kept verbatim; `kind` is a
/// best-effort classification and is never used to reject an owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Owner {
    pub value: String,
    pub kind: OwnerKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnerKind {
    User,
    Team,
    Email,
    Other,
}

impl Owner {
    pub fn new(value: String, kind: OwnerKind) -> Self {
        Self { value, kind }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl From<String> for Owner {
    fn from(value: String) -> Self {
        let kind = match value.strip_prefix('@') {
            Some(name) if name.contains('/') => OwnerKind::Team,
            Some(_) => OwnerKind::User,
            None if value.contains('@') => OwnerKind::Email,
            None => OwnerKind::Other,
        };
        Owner::new(value, kind)
    }
}

impl From<&str> for Owner {
    fn from(value: &str) -> Self {
        Owner::from(value.to_owned())
    }
}

impl AsRef<str> for Owner {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl PartialEq<str> for Owner {
    fn eq(&self, other: &str) -> bool {
        self.value == other
    }
}

impl PartialEq<&str> for Owner {
    fn eq(&self, other: &&str) -> bool {
        self.value == *other
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}
