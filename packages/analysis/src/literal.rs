//! Strict parser for list literals embedded in result cells.
//!
//! Accepted grammar:
//!
//! ```text
//! list   := '[' ( item ( ',' item )* ','? )? ']'
//! item   := scalar | '(' scalar ',' scalar ','? ')'
//! scalar := quoted | bare
//! quoted := '\'' ... '\'' | '"' ... '"'      (escapes: \\ \' \")
//! bare   := [A-Za-z0-9_.+-]+
//! ```
//!
//! Whitespace is allowed between tokens. Nothing else is evaluated.

use school_share_analysis_models::Pairing;
use school_share_geography_models::EntityId;
use thiserror::Error;

/// A rejected literal, with the byte offset where parsing stopped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid list literal at byte {position}: {reason}")]
pub struct LiteralError {
    /// Byte offset into the input.
    pub position: usize,
    /// What was expected or found.
    pub reason: String,
}

/// One element of a parsed list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteralItem {
    /// A single identifier.
    Scalar(String),
    /// A 2-tuple of identifiers.
    Pair(String, String),
}

/// Whether a cell means "no list" rather than a malformed one.
#[must_use]
pub fn is_blank_literal(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") || trimmed == "0.0"
}

/// Parses a list literal.
///
/// # Errors
///
/// Returns [`LiteralError`] for anything outside the grammar.
pub fn parse_list(raw: &str) -> Result<Vec<LiteralItem>, LiteralError> {
    let mut cursor = Cursor { src: raw, pos: 0 };
    let mut items = Vec::new();

    cursor.skip_ws();
    cursor.expect('[')?;
    cursor.skip_ws();

    if cursor.peek() == Some(']') {
        cursor.bump();
    } else {
        loop {
            items.push(cursor.item()?);
            cursor.skip_ws();
            match cursor.bump() {
                Some(',') => {
                    cursor.skip_ws();
                    if cursor.peek() == Some(']') {
                        cursor.bump();
                        break;
                    }
                }
                Some(']') => break,
                Some(c) => return Err(cursor.error_before(c, "expected ',' or ']'")),
                None => return Err(cursor.error("unterminated list")),
            }
        }
    }

    cursor.skip_ws();
    if cursor.pos < raw.len() {
        return Err(cursor.error("trailing input after list"));
    }

    Ok(items)
}

/// Parses a list of identifiers.
///
/// # Errors
///
/// Returns [`LiteralError`] if the text is outside the grammar, contains
/// tuples, or contains empty identifiers.
pub fn parse_id_list(raw: &str) -> Result<Vec<EntityId>, LiteralError> {
    parse_list(raw)?
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            LiteralItem::Scalar(s) => to_entity(&s, i),
            LiteralItem::Pair(..) => Err(LiteralError {
                position: 0,
                reason: format!("item {i} is a tuple, expected an identifier"),
            }),
        })
        .collect()
}

/// Parses a list of `(facility_id, school_id)` tuples.
///
/// # Errors
///
/// Returns [`LiteralError`] if the text is outside the grammar, contains
/// bare scalars, or contains empty identifiers.
pub fn parse_pair_list(raw: &str) -> Result<Vec<Pairing>, LiteralError> {
    parse_list(raw)?
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            LiteralItem::Pair(facility, school) => Ok(Pairing {
                facility_id: to_entity(&facility, i)?,
                school_id: to_entity(&school, i)?,
            }),
            LiteralItem::Scalar(_) => Err(LiteralError {
                position: 0,
                reason: format!("item {i} is a scalar, expected a (facility, school) tuple"),
            }),
        })
        .collect()
}

fn to_entity(raw: &str, index: usize) -> Result<EntityId, LiteralError> {
    EntityId::parse(raw).map_err(|e| LiteralError {
        position: 0,
        reason: format!("item {index}: {e}"),
    })
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn error(&self, reason: &str) -> LiteralError {
        LiteralError {
            position: self.pos,
            reason: reason.to_string(),
        }
    }

    /// Error pointing at a character that was already consumed.
    fn error_before(&self, found: char, reason: &str) -> LiteralError {
        LiteralError {
            position: self.pos - found.len_utf8(),
            reason: format!("{reason}, found {found:?}"),
        }
    }

    fn expect(&mut self, want: char) -> Result<(), LiteralError> {
        match self.bump() {
            Some(c) if c == want => Ok(()),
            Some(c) => Err(self.error_before(c, &format!("expected {want:?}"))),
            None => Err(self.error(&format!("expected {want:?}, found end of input"))),
        }
    }

    fn item(&mut self) -> Result<LiteralItem, LiteralError> {
        if self.peek() != Some('(') {
            return self.scalar().map(LiteralItem::Scalar);
        }

        self.bump();
        self.skip_ws();
        let first = self.scalar()?;
        self.skip_ws();
        self.expect(',')?;
        self.skip_ws();
        let second = self.scalar()?;
        self.skip_ws();
        if self.peek() == Some(',') {
            self.bump();
            self.skip_ws();
        }
        self.expect(')')?;

        Ok(LiteralItem::Pair(first, second))
    }

    fn scalar(&mut self) -> Result<String, LiteralError> {
        match self.peek() {
            Some(q @ ('\'' | '"')) => {
                self.bump();
                self.quoted(q)
            }
            _ => self.bare(),
        }
    }

    fn quoted(&mut self, quote: char) -> Result<String, LiteralError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some('\\') => match self.bump() {
                    Some(c @ ('\\' | '\'' | '"')) => out.push(c),
                    Some(c) => return Err(self.error_before(c, "unsupported escape")),
                    None => return Err(self.error("unterminated escape")),
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
            }
        }
    }

    fn bare(&mut self) -> Result<String, LiteralError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '+' | '-'))
        {
            self.bump();
        }
        if self.pos == start {
            return Err(self.error("expected an identifier"));
        }
        Ok(self.src[start..self.pos].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quoted_and_bare_identifiers() {
        let ids = parse_id_list("['480001234567', \"480007654321\", 480009999999]").unwrap();
        let ids: Vec<&str> = ids.iter().map(EntityId::as_str).collect();
        assert_eq!(ids, ["480001234567", "480007654321", "480009999999"]);
    }

    #[test]
    fn parses_empty_and_trailing_comma() {
        assert!(parse_list("[]").unwrap().is_empty());
        assert!(parse_list("  [ ]  ").unwrap().is_empty());
        assert_eq!(parse_list("['a',]").unwrap().len(), 1);
    }

    #[test]
    fn parses_pairs() {
        let pairs = parse_pair_list("[('NCAR-1', '480001'), (77, 480002,)]").unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].facility_id.as_str(), "NCAR-1");
        assert_eq!(pairs[1].facility_id.as_str(), "77");
        assert_eq!(pairs[1].school_id.as_str(), "480002");
    }

    #[test]
    fn handles_escapes() {
        let items = parse_list(r"['O\'Neil HS']").unwrap();
        assert_eq!(items, [LiteralItem::Scalar("O'Neil HS".to_string())]);
    }

    #[test]
    fn rejects_expressions() {
        for raw in [
            "__import__('os').system('ls')",
            "[1 + 2]",
            "[open('x')]",
            "['a'] + ['b']",
            "['a'",
            "['a' 'b']",
            "[('a')]",
            "['unterminated]",
            r"['\n']",
        ] {
            assert!(parse_list(raw).is_err(), "accepted {raw}");
        }
    }

    #[test]
    fn rejects_shape_mismatch() {
        assert!(parse_id_list("[('a', 'b')]").is_err());
        assert!(parse_pair_list("['a']").is_err());
        assert!(parse_id_list("['']").is_err());
    }

    #[test]
    fn blank_cells() {
        assert!(is_blank_literal(""));
        assert!(is_blank_literal(" NaN "));
        assert!(is_blank_literal("0.0"));
        assert!(!is_blank_literal("[]"));
    }
}
