use log::debug;
use serde::Serialize;
use std::fmt;
use std::mem;

/// Token categories produced by the scanner.
///
/// Only `STRING` and `NUMBER` carry data: the literal's value, already
/// decoded.  Equality ignores that payload (see the `PartialEq` impl below),
/// so `check(TokenType::NUMBER(0.0))` matches any number.
#[allow(non_camel_case_types)]
#[rustfmt::skip]
#[derive(Debug, Clone, Serialize)]
pub enum TokenType {
    // Punctuation.
    LEFT_PAREN, RIGHT_PAREN, LEFT_BRACE, RIGHT_BRACE,
    COMMA, DOT, SEMICOLON,

    // Arithmetic.
    MINUS, PLUS, SLASH, STAR,

    // Comparison, negation and assignment; each has a one‑ and a two‑byte form.
    BANG, BANG_EQUAL,
    EQUAL, EQUAL_EQUAL,
    GREATER, GREATER_EQUAL,
    LESS, LESS_EQUAL,

    // Literals.
    IDENTIFIER,
    STRING(String),
    #[serde(rename = "NUMBER")]
    NUMBER(f64),

    // Reserved words.
    AND, BREAK, ELSE, FALSE, FUN, FOR, IF, NIL,
    OR, PRINT, RETURN, TRUE, VAR, WHILE,

    EOF,
}

impl TokenType {
    /// Variant name without payload, as printed by `aq tokenize`.
    pub fn name(&self) -> String {
        match self {
            TokenType::STRING(_) => "STRING".to_string(),
            TokenType::NUMBER(_) => "NUMBER".to_string(),
            // Unit variants debug‑print as their bare name.
            unit => format!("{:?}", unit),
        }
    }
}

impl PartialEq for TokenType {
    fn eq(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

/// One lexeme with its category and source line.
///
/// Tokens own their lexeme so that AST nodes built from them can outlive the
/// source buffer, which the interactive loop discards after every line.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Token {
    pub token_type: TokenType,

    /// Source text of the token, quotes included for strings.
    pub lexeme: String,

    /// 1‑based; a multi‑line string reports the line it ends on.
    pub line: usize,
}

impl Token {
    pub fn new<S: Into<String>>(token_type: TokenType, lexeme: S, line: usize) -> Self {
        let lexeme: String = lexeme.into();

        debug!(
            "Creating new token: type={:?}, lexeme={}, line={}",
            token_type, lexeme, line
        );

        Self {
            token_type,
            lexeme,
            line,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.token_type.name(), self.lexeme)?;

        match &self.token_type {
            TokenType::STRING(s) => write!(f, "{}", s),
            TokenType::NUMBER(n) => {
                // 3 → "3.0", 3.14 → "3.14"
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    let mut buf: itoa::Buffer = itoa::Buffer::new();
                    write!(f, "{}.0", buf.format(*n as i64))
                } else if n.fract() == 0.0 {
                    write!(f, "{:.1}", n)
                } else {
                    write!(f, "{}", n)
                }
            }
            _ => write!(f, "null"),
        }
    }
}
