// Template parser using recursive descent

use std::collections::HashSet;

use super::ast::{Operator, OperatorKind, Token, Variable};
use crate::error::TemplateError;

/// Splits a template string into its token sequence.
pub struct TemplateParser<'a> {
    input: &'a str,
    pos: usize,
}

/// Parse `template` into an ordered token sequence.
pub fn digest(template: &str) -> Result<Vec<Token>, TemplateError> {
    TemplateParser::parse(template)
}

impl<'a> TemplateParser<'a> {
    pub fn parse(template: &'a str) -> Result<Vec<Token>, TemplateError> {
        let mut parser = Self {
            input: template,
            pos: 0,
        };
        parser.parse_template()
    }

    fn parse_template(&mut self) -> Result<Vec<Token>, TemplateError> {
        let mut tokens = Vec::new();
        let mut literal_buf = String::new();

        while let Some(ch) = self.peek_char() {
            match ch {
                '{' => {
                    flush_literal(&mut tokens, &mut literal_buf);
                    tokens.push(self.parse_expression()?);
                }
                '}' => return Err(TemplateError::UnbalancedBrace { position: self.pos }),
                '*' => {
                    flush_literal(&mut tokens, &mut literal_buf);
                    self.consume_char();
                    tokens.push(Token::Wildcard);
                }
                _ => {
                    literal_buf.push(ch);
                    self.consume_char();
                }
            }
        }

        flush_literal(&mut tokens, &mut literal_buf);
        Ok(tokens)
    }

    fn parse_expression(&mut self) -> Result<Token, TemplateError> {
        let open = self.pos;
        self.consume_char(); // consume {
        let start = self.pos;

        loop {
            match self.peek_char() {
                Some('}') => break,
                Some('{') => return Err(TemplateError::UnbalancedBrace { position: self.pos }),
                Some(_) => {
                    self.consume_char();
                }
                None => return Err(TemplateError::UnclosedExpression { position: open }),
            }
        }

        let body = &self.input[start..self.pos];
        self.consume_char(); // consume }

        let mut chars = body.chars();
        match chars.next() {
            None => Err(TemplateError::EmptyVariableName { position: start }),
            Some('-') => parse_named_operator(body, start),
            Some(symbol) => match OperatorKind::from_symbol(symbol) {
                Some(kind) => {
                    let variables = parse_variable_list(chars.as_str(), start + 1)?;
                    Ok(Token::Operator(Operator::new(kind, "", variables)))
                }
                None if is_name_start(symbol) => {
                    Ok(Token::Variable(parse_variable(body, start)?))
                }
                None => Err(TemplateError::UnknownOperator {
                    operator: symbol.to_string(),
                }),
            },
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn consume_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }
}

fn flush_literal(tokens: &mut Vec<Token>, buf: &mut String) {
    if !buf.is_empty() {
        tokens.push(Token::Literal(std::mem::take(buf)));
    }
}

/// `-name|arg|vars`
fn parse_named_operator(body: &str, start: usize) -> Result<Token, TemplateError> {
    let mut parts = body[1..].splitn(3, '|');
    let name = parts.next().unwrap_or_default();
    let kind = OperatorKind::from_name(name).ok_or_else(|| TemplateError::UnknownOperator {
        operator: format!("-{}", name),
    })?;

    let (arg, vars) = match (parts.next(), parts.next()) {
        (Some(arg), Some(vars)) => (arg, vars),
        _ => {
            return Err(TemplateError::MalformedOperator {
                expression: body.to_string(),
            })
        }
    };

    let variables = parse_variable_list(vars, start + body.len() - vars.len())?;
    if kind == OperatorKind::List && variables.len() != 1 {
        return Err(TemplateError::MalformedOperator {
            expression: body.to_string(),
        });
    }

    Ok(Token::Operator(Operator::new(kind, arg, variables)))
}

fn parse_variable_list(list: &str, offset: usize) -> Result<Vec<Variable>, TemplateError> {
    let mut variables = Vec::new();
    let mut seen = HashSet::new();
    let mut position = offset;

    for item in list.split(',') {
        let var = parse_variable(item, position)?;
        if !seen.insert(var.name.clone()) {
            return Err(TemplateError::DuplicateVariable { name: var.name });
        }
        variables.push(var);
        position += item.len() + 1;
    }

    Ok(variables)
}

/// `[type:]name[=default]`
fn parse_variable(item: &str, position: usize) -> Result<Variable, TemplateError> {
    let (decl, default) = match item.split_once('=') {
        Some((decl, default)) => (decl, Some(default)),
        None => (item, None),
    };
    let (kind, name) = match decl.split_once(':') {
        Some((kind, name)) => (Some(kind), name),
        None => (None, decl),
    };

    if name.is_empty() {
        return Err(TemplateError::EmptyVariableName { position });
    }
    if !is_valid_name(name) {
        return Err(TemplateError::InvalidVariableName {
            name: name.to_string(),
        });
    }

    let mut var = Variable::new(name);
    if let Some(kind) = kind {
        if !is_valid_name(kind) {
            return Err(TemplateError::InvalidTypeTag {
                kind: kind.to_string(),
                name: name.to_string(),
            });
        }
        var = var.with_kind(kind);
    }
    if let Some(default) = default {
        var = var.with_default(default);
    }
    Ok(var)
}

fn is_name_start(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Variable names and type tags: `[A-Za-z0-9_][A-Za-z0-9_.-]*`
pub(crate) fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_name_start(first) => {}
        _ => return false,
    }
    chars.all(is_name_char)
}

pub(crate) fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-')
}
