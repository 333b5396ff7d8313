use std::fmt;
use std::str::FromStr;

use tracing::debug;

use super::ast::{Token, Variable};
use super::expand::{expand, Parameters};
use super::parser::digest;
use crate::error::TemplateError;

/// A parsed URI template: the source string and its token sequence.
#[derive(Debug, Clone)]
pub struct UriTemplate {
    source: String,
    tokens: Vec<Token>,
}

impl UriTemplate {
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let tokens = digest(template)?;
        debug!(template, tokens = tokens.len(), "parsed template");
        Ok(Self {
            source: template.to_string(),
            tokens,
        })
    }

    pub fn expand(&self, params: &Parameters) -> String {
        expand(&self.tokens, params)
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Every variable in the template, in order, repeats included.
    pub fn variables(&self) -> Vec<&Variable> {
        self.tokens.iter().flat_map(Token::variables).collect()
    }
}

// Equality is structural: two templates are the same when they parse to the
// same tokens.
impl PartialEq for UriTemplate {
    fn eq(&self, other: &Self) -> bool {
        self.tokens == other.tokens
    }
}

impl Eq for UriTemplate {}

impl std::hash::Hash for UriTemplate {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.tokens.hash(state);
    }
}

impl FromStr for UriTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
