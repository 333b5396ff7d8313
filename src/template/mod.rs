// Template module for URI template parsing and expansion
//
// A template is parsed once into a sequence of tokens. Expansion walks the
// tokens in order; the same tokens drive pattern matching in `crate::pattern`.

mod ast;
pub mod encoding;
mod expand;
mod parser;
mod uri_template;

pub use ast::{Operator, OperatorKind, Token, Variable};
pub use expand::{expand, Parameters, Value};
pub use parser::{digest, TemplateParser};
pub(crate) use parser::is_name_char;
pub use uri_template::UriTemplate;
