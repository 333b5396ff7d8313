// Error handling for furi

use thiserror::Error;

use crate::registry::Method;

/// Malformed template string. Positions are byte offsets into the template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unbalanced brace at position {position}")]
    UnbalancedBrace { position: usize },

    #[error("expression opened at position {position} is never closed")]
    UnclosedExpression { position: usize },

    #[error("unknown operator '{operator}'")]
    UnknownOperator { operator: String },

    #[error("malformed operator expression '{{{expression}}}': expected '-name|arg|vars'")]
    MalformedOperator { expression: String },

    #[error("empty variable name at position {position}")]
    EmptyVariableName { position: usize },

    #[error("invalid variable name '{name}'")]
    InvalidVariableName { name: String },

    #[error("invalid type tag '{kind}' for variable '{name}'")]
    InvalidTypeTag { kind: String, name: String },

    #[error("variable '{name}' appears twice in the same expression")]
    DuplicateVariable { name: String },
}

/// Failures while populating a service registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid pattern '{pattern}': {source}")]
    Syntax {
        pattern: String,
        #[source]
        source: TemplateError,
    },

    #[error("pattern '{pattern}' is already registered for {method}")]
    DuplicatePattern { pattern: String, method: Method },

    #[error("method {0} is not supported by this registry")]
    UnsupportedMethod(Method),

    #[error("unknown HTTP method '{0}'")]
    InvalidMethod(String),

    #[error("unknown match rule '{0}': expected 'first' or 'best'")]
    InvalidMatchRule(String),

    #[error("no generator registered under '{0}'")]
    UnknownGenerator(String),
}
