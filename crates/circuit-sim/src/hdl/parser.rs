//! Statement parser over one top-level token slice.

use super::ast::{GateType, Selection, SignalRef, Statement};
use super::errors::{HdlError, HdlErrorKind};
use super::lexer::{Token, TokenKind};

const RESERVED: [&str; 3] = ["wire", "input", "output"];

/// Parses the tokens of one statement.
///
/// # Errors
///
/// Returns [`HdlErrorKind::UnknownGateType`] for an instantiation of an
/// unknown type and [`HdlErrorKind::Syntax`] for anything else that does
/// not match the grammar.
pub fn parse_statement(line: usize, tokens: &[Token]) -> Result<Statement, HdlError> {
    let mut cursor = Cursor::new(line, tokens);
    let head = cursor.name_or_keyword("'wire' or a gate type")?;

    let statement = if head.eq_ignore_ascii_case("wire") {
        parse_wire(&mut cursor)?
    } else if let Some(ty) = GateType::from_keyword(&head) {
        parse_gate(&mut cursor, ty)?
    } else if looks_like_instantiation(tokens) {
        return Err(HdlError::new(line, HdlErrorKind::UnknownGateType(head)));
    } else {
        return Err(HdlError::syntax(
            line,
            format!("expected 'wire' or a gate type, found '{head}'"),
        ));
    };

    cursor.finish()?;
    Ok(statement)
}

fn looks_like_instantiation(tokens: &[Token]) -> bool {
    matches!(
        tokens,
        [first, second, third, ..]
            if first.ident().is_some()
                && second.ident().is_some()
                && third.kind == TokenKind::LParen
    )
}

fn parse_wire(cursor: &mut Cursor<'_>) -> Result<Statement, HdlError> {
    let leading = if cursor.peek_is(&TokenKind::LBracket) {
        Some(parse_declared_range(cursor)?)
    } else {
        None
    };
    let name = cursor.name("wire name")?;
    let trailing = if cursor.peek_is(&TokenKind::LBracket) {
        if leading.is_some() {
            return Err(cursor.error("wire range given twice"));
        }
        Some(parse_declared_range(cursor)?)
    } else {
        None
    };
    Ok(Statement::Wire {
        name,
        range: leading.or(trailing),
    })
}

fn parse_declared_range(cursor: &mut Cursor<'_>) -> Result<(usize, usize), HdlError> {
    cursor.expect(&TokenKind::LBracket, "'['")?;
    let hi = cursor.number()?;
    cursor.expect(&TokenKind::Colon, "':'")?;
    let lo = cursor.number()?;
    cursor.expect(&TokenKind::RBracket, "']'")?;
    Ok((hi, lo))
}

fn parse_gate(cursor: &mut Cursor<'_>, ty: GateType) -> Result<Statement, HdlError> {
    let name = cursor.name("gate instance name")?;
    cursor.expect(&TokenKind::LParen, "'('")?;

    cursor.keyword("input")?;
    cursor.expect(&TokenKind::Colon, "':' after 'input'")?;
    let inputs = parse_refs(cursor)?;

    match cursor.advance().map(|token| &token.kind) {
        Some(TokenKind::Semicolon | TokenKind::Comma) => {}
        _ => return Err(cursor.error_before("';' before 'output'")),
    }
    cursor.keyword("output")?;
    cursor.expect(&TokenKind::Colon, "':' after 'output'")?;
    let outputs = parse_refs(cursor)?;

    cursor.expect(&TokenKind::RParen, "')'")?;
    Ok(Statement::Gate {
        ty,
        name,
        inputs,
        outputs,
    })
}

fn parse_refs(cursor: &mut Cursor<'_>) -> Result<Vec<SignalRef>, HdlError> {
    let mut refs = vec![parse_ref(cursor)?];
    while cursor.peek_is(&TokenKind::Comma) && !cursor.output_section_follows() {
        cursor.advance();
        refs.push(parse_ref(cursor)?);
    }
    Ok(refs)
}

fn parse_ref(cursor: &mut Cursor<'_>) -> Result<SignalRef, HdlError> {
    let wire = cursor.name("wire reference")?;
    if !cursor.peek_is(&TokenKind::LBracket) {
        return Ok(SignalRef {
            wire,
            selection: Selection::Whole,
        });
    }
    cursor.advance();
    let first = cursor.number()?;
    let selection = if cursor.peek_is(&TokenKind::Colon) {
        cursor.advance();
        let lo = cursor.number()?;
        Selection::Range { hi: first, lo }
    } else {
        Selection::Bit(first)
    };
    cursor.expect(&TokenKind::RBracket, "']'")?;
    Ok(SignalRef { wire, selection })
}

struct Cursor<'a> {
    line: usize,
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Cursor<'a> {
    const fn new(line: usize, tokens: &'a [Token]) -> Self {
        Self {
            line,
            tokens,
            pos: 0,
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_is(&self, kind: &TokenKind) -> bool {
        self.peek().is_some_and(|token| &token.kind == kind)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// True at `, output :`, which ends an input list written with a comma.
    fn output_section_follows(&self) -> bool {
        matches!(
            self.tokens.get(self.pos..self.pos + 3),
            Some([_, keyword, colon]) if keyword.is_keyword("output") && colon.kind == TokenKind::Colon
        )
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<(), HdlError> {
        if self.peek_is(kind) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected {what}")))
        }
    }

    fn keyword(&mut self, word: &str) -> Result<(), HdlError> {
        if self.peek().is_some_and(|token| token.is_keyword(word)) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{word}'")))
        }
    }

    fn name_or_keyword(&mut self, what: &str) -> Result<String, HdlError> {
        match self.peek().and_then(Token::ident) {
            Some(text) => {
                self.pos += 1;
                Ok(text.to_string())
            }
            None => Err(self.error(&format!("expected {what}"))),
        }
    }

    fn name(&mut self, what: &str) -> Result<String, HdlError> {
        let column = self.peek().map(|token| token.column);
        let text = self.name_or_keyword(what)?;
        if RESERVED.iter().any(|word| text.eq_ignore_ascii_case(word)) {
            return Err(HdlError::syntax(
                self.line,
                format!(
                    "'{text}' is reserved and cannot be used as a name at column {}",
                    column.unwrap_or_default()
                ),
            ));
        }
        Ok(text)
    }

    fn number(&mut self) -> Result<usize, HdlError> {
        match self.peek().map(|token| &token.kind) {
            Some(TokenKind::Number(value)) => {
                self.pos += 1;
                Ok(*value)
            }
            _ => Err(self.error("expected a number")),
        }
    }

    fn finish(&self) -> Result<(), HdlError> {
        if self.pos < self.tokens.len() {
            Err(self.error("expected end of statement"))
        } else {
            Ok(())
        }
    }

    fn error(&self, expected: &str) -> HdlError {
        let found = self.peek().map_or_else(
            || "end of statement".to_string(),
            |token| format!("column {}", token.column),
        );
        HdlError::syntax(self.line, format!("{expected} at {found}"))
    }

    fn error_before(&self, expected: &str) -> HdlError {
        let found = self
            .pos
            .checked_sub(1)
            .and_then(|index| self.tokens.get(index))
            .map_or_else(
                || "end of statement".to_string(),
                |token| format!("column {}", token.column),
            );
        HdlError::syntax(self.line, format!("expected {expected} at {found}"))
    }
}
