// Template expansion against caller supplied parameters

use std::borrow::Cow;
use std::collections::HashMap;

use super::ast::{Operator, OperatorKind, Token, Variable};
use super::encoding::{encode, encode_reserved};

/// A parameter value supplied for expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Single(String),
    List(Vec<String>),
}

impl Value {
    /// Defined values are non-empty strings or non-empty lists.
    pub fn is_defined(&self) -> bool {
        match self {
            Value::Single(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
        }
    }

    fn items(&self) -> &[String] {
        match self {
            Value::Single(s) => std::slice::from_ref(s),
            Value::List(items) => items,
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Single(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Single(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

impl From<Vec<&str>> for Value {
    fn from(items: Vec<&str>) -> Self {
        Value::List(items.into_iter().map(String::from).collect())
    }
}

/// Variable values used to expand a template. Absent names are undefined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters {
    values: HashMap<String, Value>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value for `var`: the parameter when defined, else its default.
    fn lookup<'a>(&'a self, var: &'a Variable) -> Option<Cow<'a, Value>> {
        match self.values.get(&var.name) {
            Some(value) if value.is_defined() => Some(Cow::Borrowed(value)),
            _ => var
                .default
                .as_ref()
                .map(|d| Cow::Owned(Value::Single(d.clone()))),
        }
    }

    fn is_defined(&self, var: &Variable) -> bool {
        self.lookup(var).is_some()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Parameters::new();
        for (name, value) in iter {
            params.set(name, value);
        }
        params
    }
}

/// Concatenate the expansion of every token. Never fails: undefined
/// variables expand to their default or to nothing.
pub fn expand(tokens: &[Token], params: &Parameters) -> String {
    let mut out = String::new();
    for token in tokens {
        expand_token(token, params, &mut out);
    }
    out
}

fn expand_token(token: &Token, params: &Parameters, out: &mut String) {
    match token {
        Token::Literal(text) => out.push_str(text),
        Token::Wildcard => out.push('*'),
        Token::Variable(var) => {
            if let Some(value) = params.lookup(var) {
                push_joined(out, &value, encode);
            }
        }
        Token::Operator(op) => expand_operator(op, params, out),
    }
}

fn expand_operator(op: &Operator, params: &Parameters, out: &mut String) {
    let defined = || {
        op.variables
            .iter()
            .filter_map(move |var| params.lookup(var).map(|value| (var, value)))
    };

    match op.kind {
        OperatorKind::Reserved => {
            for (i, (_, value)) in defined().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                push_joined(out, &value, encode_reserved);
            }
        }
        OperatorKind::PathParameter => {
            for (var, value) in defined() {
                out.push(';');
                push_pair(out, var, &value);
            }
        }
        OperatorKind::QueryParameter => {
            for (i, (var, value)) in defined().enumerate() {
                out.push(if i == 0 { '?' } else { '&' });
                push_pair(out, var, &value);
            }
        }
        OperatorKind::PathSegment => {
            for (_, value) in defined() {
                out.push('/');
                push_joined(out, &value, encode);
            }
        }
        OperatorKind::Join => {
            for (i, (var, value)) in defined().enumerate() {
                if i > 0 {
                    out.push_str(&op.arg);
                }
                push_pair(out, var, &value);
            }
        }
        OperatorKind::List => {
            let items = defined().flat_map(|(_, value)| value.into_owned().items().to_vec());
            for (i, item) in items.enumerate() {
                if i > 0 {
                    out.push_str(&op.arg);
                }
                out.push_str(&encode(&item));
            }
        }
        OperatorKind::Prefix => {
            for (_, value) in defined() {
                for item in value.items() {
                    out.push_str(&op.arg);
                    out.push_str(&encode(item));
                }
            }
        }
        OperatorKind::Suffix => {
            for (_, value) in defined() {
                for item in value.items() {
                    out.push_str(&encode(item));
                    out.push_str(&op.arg);
                }
            }
        }
        OperatorKind::Opt => {
            if !op.variables.iter().any(|var| params.is_defined(var)) {
                out.push_str(&op.arg);
            }
        }
        OperatorKind::Neg => {
            if op.variables.iter().all(|var| params.is_defined(var)) {
                out.push_str(&op.arg);
            }
        }
    }
}

/// `name=value`, list items joined with `,`.
fn push_pair(out: &mut String, var: &Variable, value: &Value) {
    out.push_str(&var.name);
    out.push('=');
    push_joined(out, value, encode);
}

fn push_joined(out: &mut String, value: &Value, escape: fn(&str) -> Cow<'_, str>) {
    for (i, item) in value.items().iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape(item));
    }
}
