//! Streaming lexer for aq source text.
//!
//! [`Scanner`] walks the source byte by byte and yields one
//! `Result<Token, AqError>` per lexeme.  Whitespace and comments produce
//! nothing; a lexing error is yielded in place of a token and scanning carries
//! on after it, so the stream always finishes with exactly one `EOF`.
//!
//! Recognised input:
//!
//! - punctuation `( ) { } , . ; - + * /` and the operators `! != = == < <= > >=`
//! - `//` line comments and `/* … */` block comments, which **nest**
//! - `"…"` strings, which may span lines and are taken verbatim (no escapes)
//! - numbers `123` and `3.25`, always stored as `f64`
//! - identifiers, with keywords picked out by a perfect‑hash map
//!
//! ```rust
//! use aq::scanner::Scanner;
//!
//! for result in Scanner::new("print 123; // example") {
//!     match result {
//!         Ok(token) => println!("{}", token),
//!         Err(err) => eprintln!("{}", err),
//!     }
//! }
//! ```

use std::iter::FusedIterator;

use log::{debug, info};
use memchr::memchr;
use phf::phf_map;

use crate::error::{AqError, Result};
use crate::token::{Token, TokenType};

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"break"  => TokenType::BREAK,
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"fun"    => TokenType::FUN,
    b"for"    => TokenType::FOR,
    b"if"     => TokenType::IF,
    b"nil"    => TokenType::NIL,
    b"or"     => TokenType::OR,
    b"print"  => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"true"   => TokenType::TRUE,
    b"var"    => TokenType::VAR,
    b"while"  => TokenType::WHILE,
};

/// Lexer over one unit of source text.
pub struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    start: usize, // first byte of the lexeme being scanned
    curr: usize,  // next byte to examine; `len + 1` once EOF was emitted
    line: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            bytes: src.as_bytes(),
            start: 0,
            curr: 0,
            line: 1,
        }
    }

    // ───────────────────────────── cursor ──────────────────────────────────

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.bytes.len()
    }

    /// Consume and return the current byte.  Callers check `is_at_end` first.
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b: u8 = self.bytes[self.curr];
        self.curr += 1;
        b
    }

    /// Byte `offset` positions ahead of the cursor, `0` past the end.
    #[inline(always)]
    fn peek_at(&self, offset: usize) -> u8 {
        self.bytes.get(self.curr + offset).copied().unwrap_or(0)
    }

    #[inline(always)]
    fn peek(&self) -> u8 {
        self.peek_at(0)
    }

    /// Consume the current byte only if it is `expected`.
    #[inline(always)]
    fn eat(&mut self, expected: u8) -> bool {
        let hit: bool = !self.is_at_end() && self.peek() == expected;
        if hit {
            self.curr += 1;
        }
        hit
    }

    /// `long` if the next byte is `=`, otherwise `short`.
    #[inline(always)]
    fn with_equal(&mut self, long: TokenType, short: TokenType) -> TokenType {
        if self.eat(b'=') {
            long
        } else {
            short
        }
    }

    // ───────────────────────────── lexing ──────────────────────────────────

    /// Scan one lexeme starting at `self.start`.  `Ok(None)` means it was
    /// whitespace or a comment.
    fn scan_token(&mut self) -> Result<Option<TokenType>> {
        let kind: TokenType = match self.advance() {
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b',' => TokenType::COMMA,
            b'.' => TokenType::DOT,
            b'-' => TokenType::MINUS,
            b'+' => TokenType::PLUS,
            b';' => TokenType::SEMICOLON,
            b'*' => TokenType::STAR,

            b'!' => self.with_equal(TokenType::BANG_EQUAL, TokenType::BANG),
            b'=' => self.with_equal(TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.with_equal(TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.with_equal(TokenType::GREATER_EQUAL, TokenType::GREATER),

            b' ' | b'\r' | b'\t' => return Ok(None),

            b'\n' => {
                self.line += 1;
                return Ok(None);
            }

            b'/' if self.eat(b'/') => {
                // Stop *before* the newline so the line counter sees it.
                self.curr = match memchr(b'\n', &self.bytes[self.curr..]) {
                    Some(pos) => self.curr + pos,
                    None => self.bytes.len(),
                };
                return Ok(None);
            }

            b'/' if self.eat(b'*') => {
                self.block_comment()?;
                return Ok(None);
            }

            b'/' => TokenType::SLASH,

            b'"' => self.string()?,

            b'0'..=b'9' => self.number(),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),

            _ => {
                // Skip the whole code point, not just its first byte.
                let c: char = self.src[self.start..]
                    .chars()
                    .next()
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                self.curr = self.start + c.len_utf8();

                return Err(AqError::lex(
                    self.line,
                    format!("Unexpected character: {}", c),
                ));
            }
        };

        Ok(Some(kind))
    }

    /// Skip a `/* … */` comment whose opening delimiter was just consumed.
    ///
    /// Every nested `/*` pushes a `(line, offset)` marker and every `*/` pops
    /// one; the comment ends when the stack drains.
    fn block_comment(&mut self) -> Result<()> {
        let mut open: Vec<(usize, usize)> = vec![(self.line, self.start)];

        while !open.is_empty() && !self.is_at_end() {
            match (self.peek(), self.peek_at(1)) {
                (b'*', b'/') => {
                    self.curr += 2;
                    open.pop();
                }
                (b'/', b'*') => {
                    open.push((self.line, self.curr));
                    self.curr += 2;
                }
                (b'\n', _) => {
                    self.line += 1;
                    self.curr += 1;
                }
                _ => self.curr += 1,
            }
        }

        match open.last() {
            None => {
                debug!("Block comment closed on line {}", self.line);
                Ok(())
            }
            Some(&(line, offset)) => Err(AqError::lex(
                line,
                format!("Unterminated block comment opened at offset {}.", offset),
            )),
        }
    }

    /// String body after the opening quote, up to and including the closing one.
    fn string(&mut self) -> Result<TokenType> {
        while !self.is_at_end() && self.peek() != b'"' {
            if self.advance() == b'\n' {
                self.line += 1;
            }
        }

        if !self.eat(b'"') {
            return Err(AqError::lex(self.line, "Unterminated string."));
        }

        let contents: &str = &self.src[self.start + 1..self.curr - 1];

        Ok(TokenType::STRING(contents.to_owned()))
    }

    fn number(&mut self) -> TokenType {
        self.skip_digits();

        // A trailing `.` with no digit after it is left for the next token.
        if self.peek() == b'.' && self.peek_at(1).is_ascii_digit() {
            self.curr += 1;
            self.skip_digits();
        }

        let text: &str = &self.src[self.start..self.curr];

        TokenType::NUMBER(text.parse::<f64>().unwrap_or(0.0))
    }

    fn skip_digits(&mut self) {
        while self.peek().is_ascii_digit() {
            self.curr += 1;
        }
    }

    fn identifier(&mut self) -> TokenType {
        while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
            self.curr += 1;
        }

        KEYWORDS
            .get(&self.bytes[self.start..self.curr])
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.curr > self.bytes.len() {
                return None;
            }

            if self.curr == self.bytes.len() {
                self.curr += 1;
                return Some(Ok(Token::new(TokenType::EOF, "", self.line)));
            }

            self.start = self.curr;

            match self.scan_token() {
                Ok(Some(kind)) => {
                    let lexeme: &str = &self.src[self.start..self.curr];
                    return Some(Ok(Token::new(kind, lexeme, self.line)));
                }
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl<'a> FusedIterator for Scanner<'a> {}

/// Scan `src` to completion, returning the well‑formed token list (always
/// terminated by `EOF`) alongside every lexical error encountered.
pub fn scan(src: &str) -> (Vec<Token>, Vec<AqError>) {
    let mut tokens: Vec<Token> = Vec::new();
    let mut errors: Vec<AqError> = Vec::new();

    for item in Scanner::new(src) {
        match item {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e),
        }
    }

    info!(
        "Scanned {} token(s) with {} error(s)",
        tokens.len(),
        errors.len()
    );

    (tokens, errors)
}
