//! Tokenizer for `<field> <op> <value>` conditions joined by `&`.
//!
//! Operands are never evaluated. Membership operands go through a dedicated
//! literal-collection parser that understands brackets, commas and quoting
//! and nothing else.

use crate::error::{IndexError, Result};

use super::ast::{Condition, FieldPath, Operator, RawOperand};

/// Parses a full query into its conditions, in written order.
pub fn parse_query(input: &str) -> Result<Vec<Condition>> {
    if input.trim().is_empty() {
        return Err(IndexError::syntax(input, "query is empty"));
    }
    split_conditions(input)?
        .into_iter()
        .map(parse_condition)
        .collect()
}

/// Splits on `&` outside quoted text.
///
/// A quote opens quoted text only where an operand or list item starts, so
/// an apostrophe inside a bare value is literal.
fn split_conditions(input: &str) -> Result<Vec<&str>> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;
    let mut depth = 0usize;
    let mut last: Option<char> = None;
    for (i, c) in input.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
                last = Some(c);
            }
            continue;
        }
        match c {
            '\'' | '"' if opens_operand(last, depth) => quote = Some(c),
            '[' | '(' => depth += 1,
            ']' | ')' => depth = depth.saturating_sub(1),
            '&' => {
                parts.push(&input[start..i]);
                start = i + 1;
                depth = 0;
                last = None;
                continue;
            }
            _ => {}
        }
        if !c.is_whitespace() {
            last = Some(c);
        }
    }
    if quote.is_some() {
        return Err(IndexError::syntax(
            input[start..].trim(),
            "unterminated quoted value",
        ));
    }
    parts.push(&input[start..]);
    Ok(parts)
}

/// True when the previous significant character ends an operator, opens a
/// list, or separates list items.
fn opens_operand(last: Option<char>, depth: usize) -> bool {
    match last {
        Some('=' | '<' | '>' | '[' | '(') => true,
        Some(',') => depth > 0,
        _ => false,
    }
}

/// Parses one condition segment.
pub fn parse_condition(segment: &str) -> Result<Condition> {
    let segment = segment.trim();
    if segment.is_empty() {
        return Err(IndexError::syntax(segment, "empty condition"));
    }
    let mut cursor = Cursor::new(segment);
    let field = cursor
        .field_path()
        .ok_or_else(|| IndexError::syntax(segment, "expected a field name"))?;
    cursor.skip_whitespace();
    let op = cursor
        .operator()
        .map_err(|reason| IndexError::syntax(segment, reason))?;
    let rest = cursor.rest().trim();
    if rest.is_empty() {
        return Err(IndexError::syntax(segment, format!("missing value after '{op}'")));
    }
    let operand = if op.is_membership() {
        RawOperand::List(literal_items(rest).map_err(|reason| IndexError::syntax(segment, reason))?)
    } else {
        RawOperand::Scalar(rest.to_owned())
    };
    Ok(Condition {
        segment: segment.to_owned(),
        field,
        op,
        operand,
    })
}

/// Parses `[a, 'b, c', "d"]` or `(a, b)` into raw items, quotes preserved.
pub fn parse_literal_list(text: &str) -> Result<Vec<String>> {
    literal_items(text).map_err(|reason| IndexError::syntax(text, reason))
}

fn literal_items(text: &str) -> std::result::Result<Vec<String>, String> {
    let text = text.trim();
    let close = match text.chars().next() {
        Some('[') => ']',
        Some('(') => ')',
        _ => return Err("expected a bracketed list".into()),
    };
    if text.len() < 2 || !text.ends_with(close) {
        return Err(format!("list is not closed with '{close}'"));
    }
    let inner = &text[1..text.len() - 1];

    let mut items = Vec::new();
    let mut chars = inner.char_indices().peekable();
    loop {
        while chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
        let Some(&(start, first)) = chars.peek() else {
            break;
        };
        match first {
            ',' => return Err("empty list item".into()),
            '\'' | '"' => {
                chars.next();
                let end = chars
                    .by_ref()
                    .find(|(_, c)| *c == first)
                    .map(|(i, c)| i + c.len_utf8())
                    .ok_or("unterminated quoted item")?;
                items.push(inner[start..end].to_owned());
                while chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
                match chars.next() {
                    None => break,
                    Some((_, ',')) => {}
                    Some((_, other)) => {
                        return Err(format!("unexpected '{other}' after quoted item"))
                    }
                }
            }
            _ => {
                let mut end = inner.len();
                let mut more = false;
                for (i, c) in chars.by_ref() {
                    match c {
                        ',' => {
                            end = i;
                            more = true;
                            break;
                        }
                        '\'' | '"' | '[' | ']' | '(' | ')' => {
                            return Err(format!("unexpected '{c}' in list item"))
                        }
                        _ => {}
                    }
                }
                items.push(inner[start..end].trim().to_owned());
                if !more {
                    break;
                }
            }
        }
    }
    Ok(items)
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn identifier(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        if !rest.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return None;
        }
        let len = rest
            .find(|c: char| !is_ident_char(c))
            .unwrap_or(rest.len());
        self.pos += len;
        Some(&rest[..len])
    }

    fn field_path(&mut self) -> Option<FieldPath> {
        let first = self.identifier()?;
        if self.peek() == Some('.') {
            self.pos += 1;
            let name = self.identifier()?;
            return Some(FieldPath {
                qualifier: Some(first.to_owned()),
                name: name.to_owned(),
            });
        }
        Some(FieldPath {
            qualifier: None,
            name: first.to_owned(),
        })
    }

    fn operator(&mut self) -> std::result::Result<Operator, String> {
        let rest = self.rest();
        let run_len = rest
            .find(|c: char| !matches!(c, '=' | '!' | '<' | '>'))
            .unwrap_or(rest.len());
        if run_len > 0 {
            let run = &rest[..run_len];
            let op = Operator::SYMBOLS
                .iter()
                .find(|(symbol, _)| *symbol == run)
                .map(|(_, op)| *op)
                .ok_or_else(|| format!("unknown operator '{run}'"))?;
            self.pos += run_len;
            return Ok(op);
        }
        if let Some(after_not) = keyword(rest, "not") {
            let after_ws = after_not.trim_start();
            if after_ws.len() < after_not.len() {
                if let Some(after_in) = keyword(after_ws, "in") {
                    self.pos += rest.len() - after_in.len();
                    return Ok(Operator::NotIn);
                }
            }
            return Err("expected 'in' after 'not'".into());
        }
        if let Some(after_in) = keyword(rest, "in") {
            self.pos += rest.len() - after_in.len();
            return Ok(Operator::In);
        }
        Err("expected an operator".into())
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Remainder after `kw` when `s` starts with it as a whole word.
fn keyword<'a>(s: &'a str, kw: &str) -> Option<&'a str> {
    let tail = s.strip_prefix(kw)?;
    (!tail.starts_with(is_ident_char)).then_some(tail)
}
