// Token types for parsed URI templates

use std::fmt;

/// One parsed unit of a template.
///
/// A template is an ordered sequence of tokens; each token expands and
/// matches on its own without looking at the content of its neighbours.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    /// Text reproduced verbatim.
    Literal(String),
    /// `*` in template text: any run of characters, `/` included.
    Wildcard,
    /// `{name}`, `{type:name}` or `{name=default}`.
    Variable(Variable),
    /// An expression introduced by an operator code.
    Operator(Operator),
}

impl Token {
    /// Variables referenced by this token, in declaration order.
    pub fn variables(&self) -> &[Variable] {
        match self {
            Token::Literal(_) | Token::Wildcard => &[],
            Token::Variable(var) => std::slice::from_ref(var),
            Token::Operator(op) => &op.variables,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Token::Literal(_))
    }

    /// True for tokens that consume an unbounded run and need a literal
    /// after them to know where to stop.
    pub(crate) fn is_greedy(&self) -> bool {
        match self {
            Token::Wildcard | Token::Variable(_) => true,
            Token::Operator(op) => op.kind == OperatorKind::Reserved,
            Token::Literal(_) => false,
        }
    }
}

/// A named template variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable {
    pub name: String,
    pub default: Option<String>,
    /// Type tag used to pick a resolver when binding a matched value.
    pub kind: Option<String>,
}

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            kind: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(kind) = &self.kind {
            write!(f, "{}:", kind)?;
        }
        f.write_str(&self.name)?;
        if let Some(default) = &self.default {
            write!(f, "={}", default)?;
        }
        Ok(())
    }
}

/// Operator codes recognised inside `{...}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Join,
    List,
    Opt,
    Neg,
    Prefix,
    Suffix,
    PathParameter,
    QueryParameter,
    PathSegment,
    Reserved,
}

impl OperatorKind {
    /// Single character operators (`{+var}`, `{;x,y}`...).
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(Self::Reserved),
            ';' => Some(Self::PathParameter),
            '?' => Some(Self::QueryParameter),
            '/' => Some(Self::PathSegment),
            _ => None,
        }
    }

    /// Named operators using the `{-name|arg|vars}` form.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "join" => Some(Self::Join),
            "list" => Some(Self::List),
            "opt" => Some(Self::Opt),
            "neg" => Some(Self::Neg),
            "prefix" => Some(Self::Prefix),
            "suffix" => Some(Self::Suffix),
            _ => None,
        }
    }

    /// Whether the operator is written `{-name|arg|vars}`.
    pub fn takes_argument(self) -> bool {
        matches!(
            self,
            Self::Join | Self::List | Self::Opt | Self::Neg | Self::Prefix | Self::Suffix
        )
    }

    fn code(self) -> &'static str {
        match self {
            Self::Join => "-join",
            Self::List => "-list",
            Self::Opt => "-opt",
            Self::Neg => "-neg",
            Self::Prefix => "-prefix",
            Self::Suffix => "-suffix",
            Self::PathParameter => ";",
            Self::QueryParameter => "?",
            Self::PathSegment => "/",
            Self::Reserved => "+",
        }
    }
}

/// A composite expression such as `{;x,y}` or `{-join|&|a,b}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Operator {
    pub kind: OperatorKind,
    /// Separator, prefix, suffix or literal text depending on the kind.
    /// Empty for the single character operators.
    pub arg: String,
    pub variables: Vec<Variable>,
}

impl Operator {
    pub fn new(kind: OperatorKind, arg: impl Into<String>, variables: Vec<Variable>) -> Self {
        Self {
            kind,
            arg: arg.into(),
            variables,
        }
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|var| var.name == name)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Literal(text) => f.write_str(text),
            Token::Wildcard => f.write_str("*"),
            Token::Variable(var) => write!(f, "{{{}}}", var),
            Token::Operator(op) => {
                f.write_str("{")?;
                f.write_str(op.kind.code())?;
                if op.kind.takes_argument() {
                    write!(f, "|{}|", op.arg)?;
                }
                for (i, var) in op.variables.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", var)?;
                }
                f.write_str("}")
            }
        }
    }
}
