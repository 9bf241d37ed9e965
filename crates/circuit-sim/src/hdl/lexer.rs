//! Line tokenizer and top-level statement splitter.

use super::errors::HdlError;

/// Token classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword.
    Ident(String),
    /// Decimal, `0x` hexadecimal or `0b` binary literal.
    Number(usize),
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `:`
    Colon,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
}

/// A token with its 1-indexed column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Class and payload.
    pub kind: TokenKind,
    /// 1-indexed column of the first character.
    pub column: usize,
}

impl Token {
    /// The identifier text, if this is an identifier.
    #[must_use]
    pub fn ident(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Ident(text) => Some(text),
            _ => None,
        }
    }

    /// True if this is the identifier `word`, ignoring ASCII case.
    #[must_use]
    pub fn is_keyword(&self, word: &str) -> bool {
        self.ident().is_some_and(|text| text.eq_ignore_ascii_case(word))
    }
}

/// Removes a trailing `#` or `//` comment.
#[must_use]
pub fn strip_comment(text: &str) -> &str {
    let hash = text.find('#');
    let slashes = text.find("//");
    let cut = match (hash, slashes) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };
    cut.map_or(text, |index| &text[..index])
}

/// Tokenizes one source line, comments excluded.
///
/// # Errors
///
/// Returns a syntax error for characters outside the grammar and for
/// malformed or oversized number literals.
pub fn tokenize(line: usize, text: &str) -> Result<Vec<Token>, HdlError> {
    let text = strip_comment(text);
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let ch = chars[pos];
        let column = pos + 1;
        if ch.is_whitespace() {
            pos += 1;
            continue;
        }

        let single = match ch {
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            '[' => Some(TokenKind::LBracket),
            ']' => Some(TokenKind::RBracket),
            ':' => Some(TokenKind::Colon),
            ',' => Some(TokenKind::Comma),
            ';' => Some(TokenKind::Semicolon),
            _ => None,
        };
        if let Some(kind) = single {
            tokens.push(Token { kind, column });
            pos += 1;
            continue;
        }

        if ch.is_ascii_digit() {
            let start = pos;
            while pos < chars.len() && chars[pos].is_ascii_alphanumeric() {
                pos += 1;
            }
            let literal: String = chars[start..pos].iter().collect();
            let value = parse_number(&literal).ok_or_else(|| {
                HdlError::syntax(line, format!("invalid number '{literal}' at column {column}"))
            })?;
            tokens.push(Token {
                kind: TokenKind::Number(value),
                column,
            });
            continue;
        }

        if ch.is_ascii_alphabetic() || ch == '_' {
            let start = pos;
            while pos < chars.len() && (chars[pos].is_ascii_alphanumeric() || chars[pos] == '_') {
                pos += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Ident(chars[start..pos].iter().collect()),
                column,
            });
            continue;
        }

        return Err(HdlError::syntax(
            line,
            format!("unexpected character '{ch}' at column {column}"),
        ));
    }

    Ok(tokens)
}

fn parse_number(literal: &str) -> Option<usize> {
    let lower = literal.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        usize::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = lower.strip_prefix("0b") {
        usize::from_str_radix(bin, 2).ok()
    } else {
        lower.parse().ok()
    }
}

/// Splits a token line at top-level `;`, dropping empty statements.
///
/// A `;` inside parentheses separates port sections and does not end the
/// statement.
///
/// # Errors
///
/// Returns a syntax error when parentheses do not balance within the line.
pub fn split_statements(line: usize, tokens: &[Token]) -> Result<Vec<&[Token]>, HdlError> {
    let mut statements = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (index, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    HdlError::syntax(line, format!("unmatched ')' at column {}", token.column))
                })?;
            }
            TokenKind::Semicolon if depth == 0 => {
                if index > start {
                    statements.push(&tokens[start..index]);
                }
                start = index + 1;
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(HdlError::syntax(line, "missing ')'"));
    }
    if start < tokens.len() {
        statements.push(&tokens[start..]);
    }
    Ok(statements)
}
