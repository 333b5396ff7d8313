// Matching of token sequences against candidate URIs
//
// Tokens are walked left to right. Greedy tokens look ahead to the token that
// follows them for their stop text and try the longest run first, falling
// back to shorter ones when the rest of the pattern does not fit. Operator
// sub-grammars consume deterministically and are never retried.

use crate::template::encoding::{literal_at, CharClass};
use crate::template::{is_name_char, Operator, OperatorKind, Token, Variable};

/// Text captured for one variable, still percent-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Raw<'u> {
    Single(&'u str),
    List(Vec<&'u str>),
}

impl<'u> Raw<'u> {
    /// Operator values use unescaped `,` between list items.
    fn split(raw: &'u str) -> Self {
        if raw.contains(',') {
            Raw::List(raw.split(',').collect())
        } else {
            Raw::Single(raw)
        }
    }

    fn from_items(mut items: Vec<&'u str>) -> Self {
        if items.len() == 1 {
            Raw::Single(items.remove(0))
        } else {
            Raw::List(items)
        }
    }
}

#[derive(Debug, Clone)]
pub struct Capture<'p, 'u> {
    pub variable: &'p Variable,
    pub raw: Raw<'u>,
}

impl<'p, 'u> Capture<'p, 'u> {
    fn new(variable: &'p Variable, raw: Raw<'u>) -> Self {
        Self { variable, raw }
    }
}

/// Successful walk of a token sequence over a candidate.
#[derive(Debug, Clone)]
pub struct PatternMatch<'p, 'u> {
    /// Captures in token order; later captures of a name override earlier ones.
    pub captures: Vec<Capture<'p, 'u>>,
    /// Characters matched by literal tokens.
    pub literal_chars: usize,
}

/// Text that ends the run of the token before it.
#[derive(Debug, Clone, Copy)]
struct Boundary<'p> {
    text: Option<&'p str>,
    /// The boundary is the last token, so it has to close the candidate.
    terminal: bool,
    /// The boundary opens an operator that may match nothing, so the run
    /// may also end without it.
    optional: bool,
}

impl<'p> Boundary<'p> {
    const NONE: Boundary<'static> = Boundary {
        text: None,
        terminal: false,
        optional: false,
    };

    /// Boundary set by the first of the `rest` tokens.
    fn before(rest: &'p [Token]) -> Self {
        match rest.first() {
            Some(Token::Literal(text)) => Boundary {
                text: Some(text.as_str()),
                terminal: rest.len() == 1,
                optional: false,
            },
            Some(Token::Operator(op)) => match op.kind {
                OperatorKind::QueryParameter => Boundary::delimiter("?"),
                OperatorKind::PathParameter => Boundary::delimiter(";"),
                _ => Boundary::NONE,
            },
            _ => Boundary::NONE,
        }
    }

    fn delimiter(text: &'static str) -> Self {
        Boundary {
            text: Some(text),
            terminal: false,
            optional: true,
        }
    }

    /// Where a greedy run over `rest` may end, in the order to try them.
    ///
    /// Before a literal the longest run comes first. Before an operator the
    /// operator gets as much as it can take, so its delimiter's first
    /// occurrence comes first and the whole run last.
    fn ends(self, rest: &str, class: CharClass, min: usize) -> Vec<usize> {
        let run = class.run_len(rest);
        let mut ends: Vec<usize> = match self.text.filter(|t| !t.is_empty()) {
            Some(text) => (min..=run)
                .filter(|&at| literal_at(rest, at, text))
                .collect(),
            None => Vec::new(),
        };
        if !self.optional {
            ends.reverse();
        }
        let open = self.text.map_or(true, str::is_empty) || self.optional;
        if open && run >= min && !ends.contains(&run) {
            ends.push(run);
        }
        ends
    }
}

#[derive(Clone, Copy)]
struct Cursor<'u> {
    input: &'u str,
    pos: usize,
}

impl<'u> Cursor<'u> {
    fn rest(&self) -> &'u str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos == self.input.len()
    }

    fn mark(&self) -> usize {
        self.pos
    }

    fn reset(&mut self, mark: usize) {
        self.pos = mark;
    }

    fn advance(&mut self, len: usize) -> &'u str {
        let taken = &self.input[self.pos..self.pos + len];
        self.pos += len;
        taken
    }

    fn eat(&mut self, literal: &str) -> bool {
        if literal_at(self.input, self.pos, literal) {
            self.pos += literal.len();
            true
        } else {
            false
        }
    }

    fn take_name(&mut self) -> &'u str {
        let rest = self.rest();
        let len = rest
            .bytes()
            .take_while(|&b| b.is_ascii() && is_name_char(b as char))
            .count();
        self.advance(len)
    }

    /// Consume a run of `class` of at least `min` bytes inside an operator.
    ///
    /// The run ends at the first `stop` occurrence when one is given, then at
    /// the first occurrence of the boundary, or where a terminal boundary
    /// closes the candidate.
    fn take(
        &mut self,
        class: CharClass,
        boundary: Boundary<'_>,
        min: usize,
        stop: Option<&str>,
    ) -> Option<&'u str> {
        let rest = self.rest();
        let mut run = class.run_len(rest);
        if let Some(stop) = stop.filter(|s| !s.is_empty()) {
            if let Some(at) = (min..=run).find(|&at| literal_at(rest, at, stop)) {
                run = at;
            }
        }

        let end = match boundary.text {
            Some(text) if !text.is_empty() => stop_before(rest, run, text, boundary.terminal, min),
            _ => run,
        };
        (end >= min).then(|| self.advance(end))
    }
}

fn stop_before(rest: &str, run: usize, text: &str, terminal: bool, min: usize) -> usize {
    if terminal {
        return match rest.len().checked_sub(text.len()) {
            Some(at) if at <= run && literal_at(rest, at, text) => at,
            _ => run,
        };
    }
    (min..=run)
        .find(|&at| literal_at(rest, at, text))
        .unwrap_or(run)
}

/// Walk `tokens` over `uri`. The whole candidate has to be consumed.
pub fn match_tokens<'p, 'u>(tokens: &'p [Token], uri: &'u str) -> Option<PatternMatch<'p, 'u>> {
    let mut state = PatternMatch {
        captures: Vec::new(),
        literal_chars: 0,
    };
    let cursor = Cursor { input: uri, pos: 0 };
    walk(tokens, cursor, &mut state).then_some(state)
}

fn walk<'p, 'u>(tokens: &'p [Token], mut cursor: Cursor<'u>, state: &mut PatternMatch<'p, 'u>) -> bool {
    let Some((token, rest)) = tokens.split_first() else {
        return cursor.at_end();
    };
    let boundary = Boundary::before(rest);

    match token {
        Token::Literal(text) => {
            if !cursor.eat(text) {
                return false;
            }
            state.literal_chars += text.chars().count();
            walk(rest, cursor, state)
        }
        Token::Wildcard => greedy(rest, cursor, state, CharClass::Any, 0, boundary, |_, _| {}),
        Token::Variable(var) => greedy(rest, cursor, state, CharClass::Unreserved, 1, boundary, |raw, captures| {
            captures.push(Capture::new(var, Raw::Single(raw)))
        }),
        Token::Operator(op) if op.kind == OperatorKind::Reserved => {
            greedy(rest, cursor, state, CharClass::Reserved, 1, boundary, |raw, captures| {
                bind_positional(&op.variables, raw, captures)
            })
        }
        Token::Operator(op) => {
            match_operator(op, &mut cursor, boundary, &mut state.captures);
            walk(rest, cursor, state)
        }
    }
}

/// Try the ends of a greedy run in the order the boundary gives them until
/// the remaining tokens match.
fn greedy<'p, 'u>(
    rest: &'p [Token],
    cursor: Cursor<'u>,
    state: &mut PatternMatch<'p, 'u>,
    class: CharClass,
    min: usize,
    boundary: Boundary<'p>,
    bind: impl Fn(&'u str, &mut Vec<Capture<'p, 'u>>),
) -> bool {
    let (captured, literal_chars) = (state.captures.len(), state.literal_chars);
    for end in boundary.ends(cursor.rest(), class, min) {
        let mut next = cursor;
        bind(next.advance(end), &mut state.captures);
        if walk(rest, next, state) {
            return true;
        }
        state.captures.truncate(captured);
        state.literal_chars = literal_chars;
    }
    false
}

fn match_operator<'p, 'u>(
    op: &'p Operator,
    cursor: &mut Cursor<'u>,
    boundary: Boundary<'_>,
    captures: &mut Vec<Capture<'p, 'u>>,
) {
    match op.kind {
        // matched as a greedy run by `walk`
        OperatorKind::Reserved => {}
        OperatorKind::PathParameter => match_pairs(op, cursor, ";", ";", boundary, captures),
        OperatorKind::QueryParameter => match_pairs(op, cursor, "?", "&", boundary, captures),
        OperatorKind::Join => match_pairs(op, cursor, "", &op.arg, boundary, captures),
        OperatorKind::PathSegment => {
            for var in &op.variables {
                let mark = cursor.mark();
                if !cursor.eat("/") {
                    break;
                }
                match cursor.take(CharClass::UnreservedList, boundary, 1, None) {
                    Some(raw) => captures.push(Capture::new(var, Raw::split(raw))),
                    None => {
                        cursor.reset(mark);
                        break;
                    }
                }
            }
        }
        OperatorKind::List => {
            let items = match_items(cursor, "", &op.arg, "", boundary);
            if let (Some(var), false) = (op.variables.first(), items.is_empty()) {
                captures.push(Capture::new(var, Raw::from_items(items)));
            }
        }
        OperatorKind::Prefix | OperatorKind::Suffix => {
            let (prefix, suffix) = if op.kind == OperatorKind::Prefix {
                (op.arg.as_str(), "")
            } else {
                ("", op.arg.as_str())
            };
            let last = op.variables.len().saturating_sub(1);
            for (i, var) in op.variables.iter().enumerate() {
                // Only the last variable may take several items.
                let items = if i == last {
                    match_items(cursor, prefix, "", suffix, boundary)
                } else {
                    match_item(cursor, prefix, suffix, boundary).into_iter().collect()
                };
                if items.is_empty() {
                    break;
                }
                captures.push(Capture::new(var, Raw::from_items(items)));
            }
        }
        OperatorKind::Opt | OperatorKind::Neg => {
            cursor.eat(&op.arg);
        }
    }
}

/// One `prefix item suffix` group, or nothing with the cursor untouched.
fn match_item<'u>(
    cursor: &mut Cursor<'u>,
    prefix: &str,
    suffix: &str,
    boundary: Boundary<'_>,
) -> Option<&'u str> {
    let mark = cursor.mark();
    let item = cursor.eat(prefix).then(|| {
        let stop = if suffix.is_empty() { prefix } else { suffix };
        cursor.take(CharClass::Unreserved, boundary, 1, Some(stop))
    });
    match item.flatten() {
        Some(item) if cursor.eat(suffix) => Some(item),
        _ => {
            cursor.reset(mark);
            None
        }
    }
}

/// Repeated `prefix item suffix` groups separated by `separator`.
fn match_items<'u>(
    cursor: &mut Cursor<'u>,
    prefix: &str,
    separator: &str,
    suffix: &str,
    boundary: Boundary<'_>,
) -> Vec<&'u str> {
    let mut items = Vec::new();
    loop {
        let mark = cursor.mark();
        if !items.is_empty() && !cursor.eat(separator) {
            break;
        }
        let item = if separator.is_empty() {
            match_item(cursor, prefix, suffix, boundary)
        } else {
            let stop = Some(separator);
            cursor.take(CharClass::Unreserved, boundary, 1, stop)
        };
        match item {
            Some(item) => items.push(item),
            None => {
                cursor.reset(mark);
                break;
            }
        }
    }
    items
}

/// `name=value` groups; `first` introduces the first group, `next` the others.
/// Groups may come in any order but their names must belong to the operator.
fn match_pairs<'p, 'u>(
    op: &'p Operator,
    cursor: &mut Cursor<'u>,
    first: &str,
    next: &str,
    boundary: Boundary<'_>,
    captures: &mut Vec<Capture<'p, 'u>>,
) {
    let mut count = 0;
    loop {
        let mark = cursor.mark();
        let lead = if count == 0 { first } else { next };
        if !cursor.eat(lead) {
            break;
        }
        let var = match op.variable(cursor.take_name()) {
            Some(var) => var,
            None => {
                cursor.reset(mark);
                break;
            }
        };
        let raw = if cursor.eat("=") {
            cursor
                .take(CharClass::UnreservedList, boundary, 0, None)
                .unwrap_or_default()
        } else {
            ""
        };
        captures.push(Capture::new(var, Raw::split(raw)));
        count += 1;
    }
}

/// `{+a,b}`: a single variable keeps the whole run, several split on `,`.
fn bind_positional<'p, 'u>(variables: &'p [Variable], raw: &'u str, captures: &mut Vec<Capture<'p, 'u>>) {
    if variables.len() == 1 {
        captures.push(Capture::new(&variables[0], Raw::Single(raw)));
        return;
    }
    for (var, part) in variables.iter().zip(raw.splitn(variables.len(), ',')) {
        captures.push(Capture::new(var, Raw::Single(part)));
    }
}
