// Resolver module: binding matched URIs back to typed variables
//
// A candidate is matched against one or several patterns; the captures of the
// winning pattern are decoded and passed through the binder to produce
// bindings.

mod binder;

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RegistryError;
use crate::pattern::{Capture, Raw, Score, UriPattern};
use crate::template::encoding::decode;

pub use binder::{
    BooleanResolver, BoundValue, ChoiceResolver, DecimalResolver, IntegerResolver, VariableBinder,
    VariableResolver,
};

/// Variable name to bound value.
pub type Bindings = HashMap<String, BoundValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveStatus {
    Resolved,
    Unresolved,
}

/// Outcome of resolving one candidate against one pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolveResult {
    pub status: ResolveStatus,
    pub bindings: Bindings,
}

impl ResolveResult {
    pub fn unresolved() -> Self {
        Self {
            status: ResolveStatus::Unresolved,
            bindings: Bindings::new(),
        }
    }

    pub fn resolved(bindings: Bindings) -> Self {
        Self {
            status: ResolveStatus::Resolved,
            bindings,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.status == ResolveStatus::Resolved
    }

    pub fn get(&self, name: &str) -> Option<&BoundValue> {
        self.bindings.get(name)
    }
}

/// How to choose among several matching patterns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchRule {
    /// The first matching pattern in declaration order.
    #[serde(rename = "first")]
    FirstMatch,
    /// The most specific matching pattern; ties go to declaration order.
    #[default]
    #[serde(rename = "best")]
    BestMatch,
}

impl FromStr for MatchRule {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first" | "first_match" => Ok(MatchRule::FirstMatch),
            "best" | "best_match" => Ok(MatchRule::BestMatch),
            _ => Err(RegistryError::InvalidMatchRule(s.to_string())),
        }
    }
}

/// Index of the pattern chosen for `path` under `rule`.
pub fn find_best_match<P>(patterns: &[P], path: &str, rule: MatchRule) -> Option<usize>
where
    P: AsRef<UriPattern>,
{
    match rule {
        MatchRule::FirstMatch => patterns.iter().position(|p| p.as_ref().matches(path)),
        MatchRule::BestMatch => {
            let mut best: Option<(usize, Score)> = None;
            for (index, pattern) in patterns.iter().enumerate() {
                if let Some(score) = pattern.as_ref().score(path) {
                    // strictly greater, so earlier patterns win ties
                    if best.map_or(true, |(_, top)| score > top) {
                        best = Some((index, score));
                    }
                }
            }
            best.map(|(index, _)| index)
        }
    }
}

fn default_binder() -> &'static VariableBinder {
    static BINDER: OnceLock<VariableBinder> = OnceLock::new();
    BINDER.get_or_init(VariableBinder::new)
}

/// Resolves one candidate URI against patterns.
#[derive(Debug, Clone, Copy)]
pub struct UriResolver<'a> {
    uri: &'a str,
}

impl<'a> UriResolver<'a> {
    pub fn new(uri: &'a str) -> Self {
        Self { uri }
    }

    pub fn uri(&self) -> &'a str {
        self.uri
    }

    /// The pattern chosen under `rule`, if any matches.
    pub fn find<'p, P>(&self, patterns: &'p [P], rule: MatchRule) -> Option<&'p P>
    where
        P: AsRef<UriPattern>,
    {
        find_best_match(patterns, self.uri, rule).map(|index| &patterns[index])
    }

    /// Every matching pattern, in declaration order.
    pub fn find_all<'p, P>(&self, patterns: &'p [P]) -> Vec<&'p P>
    where
        P: AsRef<UriPattern>,
    {
        patterns
            .iter()
            .filter(|p| p.as_ref().matches(self.uri))
            .collect()
    }

    /// Resolve with the built-in type tags.
    pub fn resolve(&self, pattern: &UriPattern) -> ResolveResult {
        self.resolve_with(pattern, default_binder())
    }

    pub fn resolve_with(&self, pattern: &UriPattern, binder: &VariableBinder) -> ResolveResult {
        let Some(matched) = pattern.match_uri(self.uri) else {
            return ResolveResult::unresolved();
        };

        let mut bindings = Bindings::new();
        for capture in matched.captures {
            let name = &capture.variable.name;
            match bind_capture(&capture, binder) {
                Some(value) => {
                    bindings.insert(name.clone(), value);
                }
                None => debug!(variable = %name, uri = self.uri, "value rejected, binding omitted"),
            }
        }
        ResolveResult::resolved(bindings)
    }
}

fn bind_capture(capture: &Capture<'_, '_>, binder: &VariableBinder) -> Option<BoundValue> {
    let kind = capture.variable.kind.as_deref();
    let bind_one = |raw: &str| decode(raw).and_then(|text| binder.bind(kind, &text));
    match &capture.raw {
        Raw::Single(raw) => bind_one(raw),
        Raw::List(items) => items
            .iter()
            .map(|raw| bind_one(raw))
            .collect::<Option<Vec<_>>>()
            .map(BoundValue::List),
    }
}
