// Pattern module: compiled templates tested against candidate URIs

mod matcher;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::error::TemplateError;
use crate::template::{Token, UriTemplate, Variable};

pub use matcher::{Capture, PatternMatch, Raw};

/// A template used to recognise URIs.
///
/// Equality and hashing are structural over the parsed tokens, so
/// `/a/{b}` parsed twice gives equal patterns.
#[derive(Debug, Clone)]
pub struct UriPattern {
    template: UriTemplate,
    variable_tokens: usize,
    ambiguous: bool,
}

/// How specific a pattern was for one candidate. Greater is more specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub literal_chars: usize,
    pub variable_tokens: usize,
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.literal_chars
            .cmp(&other.literal_chars)
            .then_with(|| other.variable_tokens.cmp(&self.variable_tokens))
    }
}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl UriPattern {
    pub fn parse(pattern: &str) -> Result<Self, TemplateError> {
        UriTemplate::parse(pattern).map(Self::new)
    }

    pub fn new(template: UriTemplate) -> Self {
        let tokens = template.tokens();
        let variable_tokens = tokens.iter().filter(|t| !t.is_literal()).count();
        let ambiguous = tokens
            .windows(2)
            .any(|pair| pair[0].is_greedy() && pair[1].is_greedy());
        if ambiguous {
            warn!(
                pattern = template.as_str(),
                "adjacent variables without a separating literal; pattern will never match"
            );
        }

        Self {
            template,
            variable_tokens,
            ambiguous,
        }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.match_uri(candidate).is_some()
    }

    /// Specificity of this pattern for `candidate`, `None` when it does not match.
    pub fn score(&self, candidate: &str) -> Option<Score> {
        self.match_uri(candidate).map(|m| Score {
            literal_chars: m.literal_chars,
            variable_tokens: self.variable_tokens,
        })
    }

    /// Walk the pattern over `candidate`, returning the raw captures.
    pub fn match_uri<'u>(&self, candidate: &'u str) -> Option<PatternMatch<'_, 'u>> {
        if self.ambiguous {
            return None;
        }
        let result = matcher::match_tokens(self.template.tokens(), candidate);
        debug!(
            pattern = self.as_str(),
            candidate,
            matched = result.is_some(),
            "match attempt"
        );
        result
    }

    /// True when two greedy tokens touch; such patterns never match.
    pub fn is_ambiguous(&self) -> bool {
        self.ambiguous
    }

    /// Distinct variable names in order of first appearance.
    pub fn variable_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for var in self.variables() {
            if !names.contains(&var.name.as_str()) {
                names.push(&var.name);
            }
        }
        names
    }

    pub fn variables(&self) -> Vec<&Variable> {
        self.template.variables()
    }

    pub fn tokens(&self) -> &[Token] {
        self.template.tokens()
    }

    pub fn template(&self) -> &UriTemplate {
        &self.template
    }

    pub fn as_str(&self) -> &str {
        self.template.as_str()
    }
}

impl PartialEq for UriPattern {
    fn eq(&self, other: &Self) -> bool {
        self.template == other.template
    }
}

impl Eq for UriPattern {}

impl std::hash::Hash for UriPattern {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.template.hash(state);
    }
}

impl FromStr for UriPattern {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<UriPattern> for UriPattern {
    fn as_ref(&self) -> &UriPattern {
        self
    }
}

impl From<UriTemplate> for UriPattern {
    fn from(template: UriTemplate) -> Self {
        Self::new(template)
    }
}

impl fmt::Display for UriPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
