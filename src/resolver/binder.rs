// Typed variable resolvers and the binder that selects them by type tag

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

/// A value bound to a variable after matching.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BoundValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    List(Vec<BoundValue>),
}

impl BoundValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            BoundValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            BoundValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[BoundValue]> {
        match self {
            BoundValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for BoundValue {
    fn from(s: &str) -> Self {
        BoundValue::Text(s.to_string())
    }
}

impl From<i64> for BoundValue {
    fn from(n: i64) -> Self {
        BoundValue::Integer(n)
    }
}

impl fmt::Display for BoundValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundValue::Text(s) => f.write_str(s),
            BoundValue::Integer(n) => write!(f, "{n}"),
            BoundValue::Decimal(n) => write!(f, "{n}"),
            BoundValue::Boolean(b) => write!(f, "{b}"),
            BoundValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

/// Converts decoded text captured for a typed variable.
pub trait VariableResolver: Send + Sync {
    /// Typed value for `raw`, `None` when it cannot be converted.
    fn resolve(&self, raw: &str) -> Option<BoundValue>;

    /// Whether `raw` names something this resolver accepts.
    fn exists(&self, raw: &str) -> bool {
        self.resolve(raw).is_some()
    }
}

/// `{int:id}`
pub struct IntegerResolver;

impl VariableResolver for IntegerResolver {
    fn resolve(&self, raw: &str) -> Option<BoundValue> {
        raw.parse().ok().map(BoundValue::Integer)
    }
}

/// `{decimal:ratio}`
pub struct DecimalResolver;

impl VariableResolver for DecimalResolver {
    fn resolve(&self, raw: &str) -> Option<BoundValue> {
        raw.parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(BoundValue::Decimal)
    }
}

/// `{boolean:flag}`: true/false, yes/no, 1/0, any case.
pub struct BooleanResolver;

impl VariableResolver for BooleanResolver {
    fn resolve(&self, raw: &str) -> Option<BoundValue> {
        match raw.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(BoundValue::Boolean(true)),
            "false" | "no" | "0" => Some(BoundValue::Boolean(false)),
            _ => None,
        }
    }
}

/// Accepts a fixed set of values and binds them as text.
pub struct ChoiceResolver {
    choices: Vec<String>,
}

impl ChoiceResolver {
    pub fn new<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }
}

impl VariableResolver for ChoiceResolver {
    fn resolve(&self, raw: &str) -> Option<BoundValue> {
        self.exists(raw).then(|| BoundValue::Text(raw.to_string()))
    }

    fn exists(&self, raw: &str) -> bool {
        self.choices.iter().any(|c| c == raw)
    }
}

/// Type tag to resolver table. Built once, then shared read-only.
#[derive(Clone)]
pub struct VariableBinder {
    resolvers: HashMap<String, Arc<dyn VariableResolver>>,
}

impl VariableBinder {
    /// Binder with the built-in `int`, `integer`, `decimal` and `boolean` tags.
    pub fn new() -> Self {
        Self::empty()
            .with("int", IntegerResolver)
            .with("integer", IntegerResolver)
            .with("decimal", DecimalResolver)
            .with("boolean", BooleanResolver)
    }

    /// Binder with no tags; every variable binds as text.
    pub fn empty() -> Self {
        Self {
            resolvers: HashMap::new(),
        }
    }

    pub fn register(&mut self, tag: impl Into<String>, resolver: impl VariableResolver + 'static) {
        self.resolvers.insert(tag.into(), Arc::new(resolver));
    }

    pub fn with(mut self, tag: impl Into<String>, resolver: impl VariableResolver + 'static) -> Self {
        self.register(tag, resolver);
        self
    }

    pub fn get(&self, tag: &str) -> Option<&dyn VariableResolver> {
        self.resolvers.get(tag).map(|r| r.as_ref())
    }

    /// Bind one decoded value for a variable carrying `kind`.
    ///
    /// Untyped variables and unknown tags bind as text. `None` when the
    /// resolver rejects the value.
    pub fn bind(&self, kind: Option<&str>, raw: &str) -> Option<BoundValue> {
        match kind.and_then(|tag| self.get(tag)) {
            Some(resolver) => {
                if resolver.exists(raw) {
                    resolver.resolve(raw)
                } else {
                    None
                }
            }
            None => Some(BoundValue::Text(raw.to_string())),
        }
    }
}

impl Default for VariableBinder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for VariableBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&String> = self.resolvers.keys().collect();
        tags.sort();
        f.debug_struct("VariableBinder").field("tags", &tags).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_resolver() {
        assert_eq!(IntegerResolver.resolve("1892"), Some(BoundValue::Integer(1892)));
        assert_eq!(IntegerResolver.resolve("-4"), Some(BoundValue::Integer(-4)));
        assert_eq!(IntegerResolver.resolve("12a"), None);
        assert!(!IntegerResolver.exists(""));
    }

    #[test]
    fn test_decimal_resolver() {
        assert_eq!(DecimalResolver.resolve("2.5"), Some(BoundValue::Decimal(2.5)));
        assert_eq!(DecimalResolver.resolve("inf"), None);
    }

    #[test]
    fn test_boolean_resolver() {
        assert_eq!(BooleanResolver.resolve("Yes"), Some(BoundValue::Boolean(true)));
        assert_eq!(BooleanResolver.resolve("0"), Some(BoundValue::Boolean(false)));
        assert_eq!(BooleanResolver.resolve("maybe"), None);
    }

    #[test]
    fn test_choice_resolver() {
        let resolver = ChoiceResolver::new(["asc", "desc"]);
        assert!(resolver.exists("asc"));
        assert!(!resolver.exists("up"));
        assert_eq!(resolver.resolve("desc"), Some(BoundValue::from("desc")));
    }

    #[test]
    fn test_bind_untyped_and_unknown_tag_as_text() {
        let binder = VariableBinder::new();
        assert_eq!(binder.bind(None, "42"), Some(BoundValue::from("42")));
        assert_eq!(binder.bind(Some("uuid"), "42"), Some(BoundValue::from("42")));
        assert_eq!(binder.bind(Some("int"), "42"), Some(BoundValue::Integer(42)));
        assert_eq!(binder.bind(Some("int"), "x"), None);
    }

    #[test]
    fn test_empty_binder_binds_text() {
        let binder = VariableBinder::empty();
        assert_eq!(binder.bind(Some("int"), "42"), Some(BoundValue::from("42")));
    }

    #[test]
    fn test_bound_value_display_and_json() {
        let value = BoundValue::List(vec![BoundValue::Integer(1), BoundValue::from("b")]);
        assert_eq!(value.to_string(), "1,b");
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"[1,"b"]"#);
    }
}
