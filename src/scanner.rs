//! Module `scanner` implements a one‑pass, streaming UTF‑8 lexer for the Rox language.
//!
//! It transforms a byte slice (`&[u8]`) into a sequence of `Token<'a>`s, skipping whitespace
//! and comments, and emitting exactly one `EOF` token at the end. Designed as a `FusedIterator`,
//! it can be chained safely with other iterator adapters.
//!
//! # Public API
//!
//! - `Scanner::new(src: &'a [u8]) -> Scanner<'a>`
//!   Create a new lexer over the input buffer.
//!
//! - `impl Iterator for Scanner<'a>`
//!   Yields `Result<Token<'a>, LoxError>` on each `.next()`. Scanning resumes after an
//!   error, so one pass reports every bad character.
//!
//! - `Scanner::scan_all(self)`
//!   Drains the iterator, returning every token or every diagnostic.
//!
//! # Token Recognition (`scan_token`)
//!
//! - Single‑character tokens: `(`, `)`, `{`, `}`, `,`, `.`, `-`, `+`, `;`, `*`, `?`, `:`.
//! - Two‑character operators: `!=`, `==`, `<=`, `>=`.
//! - Comments: `//` to end of line (bulk-skipped with `memchr`) and non-nesting
//!   `/* … */` blocks that end at the first `*/`.
//! - String literals: `"` … `"`, allowing multi‑line and reporting unterminated errors.
//! - Numeric literals: integer and optional fractional part.
//! - Identifiers/keywords: alphanumeric/_ sequences, resolved via a perfect‑hash `KEYWORDS` map.
//!
//! # Example
//!
//! ```rust
//! use rox::scanner::Scanner;
//!
//! let source = b"print 123; // example";
//! let tokens: Vec<_> = Scanner::new(source).filter_map(Result::ok).collect();
//! assert_eq!(tokens.len(), 4); // PRINT NUMBER SEMICOLON EOF
//! ```

use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::{memchr, memchr2};
use phf::phf_map;
use std::iter::FusedIterator;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"      => TokenType::AND,
    b"break"    => TokenType::BREAK,
    b"class"    => TokenType::CLASS,
    b"continue" => TokenType::CONTINUE,
    b"else"     => TokenType::ELSE,
    b"false"    => TokenType::FALSE,
    b"fun"      => TokenType::FUN,
    b"for"      => TokenType::FOR,
    b"if"       => TokenType::IF,
    b"nil"      => TokenType::NIL,
    b"or"       => TokenType::OR,
    b"print"    => TokenType::PRINT,
    b"return"   => TokenType::RETURN,
    b"super"    => TokenType::SUPER,
    b"this"     => TokenType::THIS,
    b"true"     => TokenType::TRUE,
    b"var"      => TokenType::VAR,
    b"while"    => TokenType::WHILE,
};

/// A single pass **scanner / lexer** that converts raw UTF‑8 bytes into a
/// sequence of [`Token`]s.  The lifetime `'a` ties every emitted token’s
/// `lexeme` slice back to the original source buffer.
pub struct Scanner<'a> {
    src: &'a [u8],              // entire source text
    start: usize,               // index of the *first* byte of the current lexeme
    curr: usize,                // index *one past* the last byte examined
    line: usize,                // 1‑based line counter (\n increments)
    pending: Option<TokenType>, // recognised token kind waiting to be emitted
}

impl<'a> Scanner<'a> {
    /// Create a new lexer over `src`.
    #[inline]
    pub fn new(src: &'a [u8]) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            start: 0,
            curr: 0,
            line: 1,
            pending: None,
        }
    }

    /// Scan the whole input.  Returns every token (ending in `EOF`) or, if any
    /// lexeme was malformed, every lex error found.
    pub fn scan_all(self) -> Result<Vec<Token<'a>>> {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();

        for item in self {
            match item {
                Ok(token) => tokens.push(token),
                Err(e) => errors.push(e),
            }
        }

        if errors.is_empty() {
            info!("Scanned {} tokens", tokens.len());

            Ok(tokens)
        } else {
            Err(LoxError::from_batch(errors))
        }
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    #[inline(always)]
    const fn len(&self) -> usize {
        self.src.len()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.len()
    }

    /// Advance one byte and return it.  Callers guard with [`Self::is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.src[self.curr];
        self.curr += 1;
        b
    }

    /// Peek at the current byte without consuming it.  Returns `0` if past EOF
    /// to avoid branching at call‑site.
    #[inline(always)]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.src[self.curr]
        }
    }

    /// Peek one byte beyond [`Self::peek`].  Safe at EOF.
    #[inline(always)]
    fn peek_next(&self) -> u8 {
        if self.curr + 1 >= self.len() {
            0
        } else {
            self.src[self.curr + 1]
        }
    }

    /// Conditionally consume a byte **iff** it matches `expected`.
    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Borrow `src[from..to]` as text.
    fn text(&self, from: usize, to: usize) -> Result<&'a str> {
        let src: &'a [u8] = self.src;

        std::str::from_utf8(&src[from..to])
            .map_err(|_| LoxError::lex(self.line, "Invalid UTF-8 in source."))
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Scan a *single* token starting at `self.curr`.  If the lexeme produces an
    /// actual token the kind is stored in `self.pending`.  Whitespace and
    /// comments are skipped by returning `Ok(())` with `pending = None`.
    fn scan_token(&mut self) -> Result<()> {
        let b = self.advance();

        match b {
            // ── single‑character punctuators ──────────────────────────────
            b'(' => self.pending = Some(TokenType::LEFT_PAREN),
            b')' => self.pending = Some(TokenType::RIGHT_PAREN),
            b'{' => self.pending = Some(TokenType::LEFT_BRACE),
            b'}' => self.pending = Some(TokenType::RIGHT_BRACE),
            b',' => self.pending = Some(TokenType::COMMA),
            b'.' => self.pending = Some(TokenType::DOT),
            b'-' => self.pending = Some(TokenType::MINUS),
            b'+' => self.pending = Some(TokenType::PLUS),
            b';' => self.pending = Some(TokenType::SEMICOLON),
            b'*' => self.pending = Some(TokenType::STAR),
            b'?' => self.pending = Some(TokenType::QUESTION),
            b':' => self.pending = Some(TokenType::COLON),

            // ── two‑character operators (!=, ==, <=, >=) ─────────────────
            b'!' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::BANG_EQUAL
                } else {
                    TokenType::BANG
                };

                self.pending = Some(tt);
            }

            b'=' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::EQUAL_EQUAL
                } else {
                    TokenType::EQUAL
                };

                self.pending = Some(tt);
            }

            b'<' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::LESS_EQUAL
                } else {
                    TokenType::LESS
                };

                self.pending = Some(tt);
            }

            b'>' => {
                let tt = if self.match_byte(b'=') {
                    TokenType::GREATER_EQUAL
                } else {
                    TokenType::GREATER
                };

                self.pending = Some(tt);
            }

            // ── whitespace / newline ─────────────────────────────────────
            b' ' | b'\r' | b'\t' => {
                return Ok(());
            }

            b'\n' => {
                self.line += 1;

                return Ok(());
            }

            // ── comments ─────────────────────────────────────────────────
            b'/' => {
                if self.match_byte(b'/') {
                    // Fast‑forward to next newline; if none found, skip to EOF.
                    if let Some(pos) = memchr(b'\n', &self.src[self.curr..]) {
                        self.curr += pos;
                    } else {
                        self.curr = self.len();
                    }

                    return Ok(());
                }

                if self.match_byte(b'*') {
                    return self.skip_block_comment();
                }

                self.pending = Some(TokenType::SLASH);
            }

            // ── string literal " … " ─────────────────────────────────────
            b'"' => {
                return self.parse_string();
            }

            // ── number literal (digit‑leading) ───────────────────────────
            b'0'..=b'9' => {
                self.parse_number()?;
            }

            // ── identifiers / keywords (alpha or underscore‑leading) ─────
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                self.parse_identifier();
            }

            // ── unexpected character ─────────────────────────────────────
            _ => {
                return Err(LoxError::lex(
                    self.line,
                    format!("Unexpected character: {}", b as char),
                ));
            }
        }

        Ok(())
    }

    /// Skip a `/* … */` comment.  `self.curr` sits just past the opening `/*`.
    /// The comment ends at the first `*/`; block comments do not nest.
    fn skip_block_comment(&mut self) -> Result<()> {
        let start_line = self.line;

        loop {
            // Jump straight to the next byte that can matter.
            match memchr2(b'*', b'\n', &self.src[self.curr..]) {
                None => {
                    self.curr = self.len();

                    debug!("Block comment opened on line {} never closed", start_line);

                    return Err(LoxError::lex(self.line, "Unterminated block comment."));
                }

                Some(pos) => {
                    self.curr += pos;

                    if self.advance() == b'\n' {
                        self.line += 1;
                    } else if self.match_byte(b'/') {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Parse a double‑quoted string literal.
    ///
    /// * `self.start` still points to the opening `"`.
    /// * When we return, `self.curr` points **past** the closing `"`.
    fn parse_string(&mut self) -> Result<()> {
        while !self.is_at_end() && self.peek() != b'"' {
            if self.advance() == b'\n' {
                self.line += 1;
            }
        }

        if self.is_at_end() {
            return Err(LoxError::lex(self.line, "Unterminated string."));
        }

        self.advance(); // closing quote

        let s: &str = self.text(self.start + 1, self.curr - 1)?;

        self.pending = Some(TokenType::STRING(s.to_owned()));

        Ok(())
    }

    /// Parse a numeric literal (`123`, `3.14`).  Fractions are optional.
    fn parse_number(&mut self) -> Result<()> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance(); // "."

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let s: &str = self.text(self.start, self.curr)?;
        let n: f64 = s
            .parse::<f64>()
            .map_err(|e| LoxError::lex(self.line, format!("Invalid number '{}': {}", s, e)))?;

        self.pending = Some(TokenType::NUMBER(n));

        Ok(())
    }

    /// Parse an identifier and decide if it is a **keyword** or a generic
    /// `IDENTIFIER` token.
    fn parse_identifier(&mut self) {
        while {
            let c: u8 = self.peek();
            c.is_ascii_alphanumeric() || c == b'_'
        } {
            self.advance();
        }

        let slice: &[u8] = &self.src[self.start..self.curr];

        let tt: TokenType = KEYWORDS
            .get(slice)
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER);

        self.pending = Some(tt);
    }
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.curr <= self.len() {
            // EOF guard – emit exactly one EOF then terminate.
            if self.curr == self.len() {
                self.curr += 1;
                return Some(Ok(Token::new(TokenType::EOF, "", self.line)));
            }

            self.start = self.curr;
            self.pending = None;

            if let Err(e) = self.scan_token() {
                return Some(Err(e));
            }

            if let Some(tt) = self.pending.take() {
                let lex: &'a str = match self.text(self.start, self.curr) {
                    Ok(lex) => lex,
                    Err(e) => return Some(Err(e)),
                };

                debug!("Scanned token ({:?}) on line {}", tt, self.line);

                return Some(Ok(Token::new(tt, lex, self.line)));
            }
            // Otherwise it was whitespace / comment → continue loop.
        }

        None
    }
}

impl<'a> FusedIterator for Scanner<'a> {}
