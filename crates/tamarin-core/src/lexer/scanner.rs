//! Hand-written scanner turning source text into tokens.

use super::token::{Span, Token, TokenKind};
use crate::{Error, Result};

/// The lexer. Consumes source text and produces a token stream.
pub struct Scanner<'a> {
    source: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Creates a new scanner over the given source text.
    pub fn new(source: &'a str) -> Self {
        Self {
            source: source.as_bytes(),
            pos: 0,
        }
    }

    /// Scans the entire input, returning the token stream terminated by Eof.
    pub fn scan_all(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        Ok(tokens)
    }

    fn peek(&self) -> u8 {
        *self.source.get(self.pos).unwrap_or(&0)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        *self.source.get(self.pos + offset).unwrap_or(&0)
    }

    fn bump(&mut self) -> u8 {
        let c = self.peek();
        self.pos += 1;
        c
    }

    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    self.pos += 1;
                }
                b'/' if self.peek_at(1) == b'/' => {
                    while self.pos < self.source.len() && self.peek() != b'\n' {
                        self.pos += 1;
                    }
                }
                b'/' if self.peek_at(1) == b'*' => {
                    let start = self.pos;
                    self.pos += 2;
                    loop {
                        if self.pos >= self.source.len() {
                            return Err(Error::Syntax(format!(
                                "unterminated block comment at offset {}",
                                start
                            )));
                        }
                        if self.peek() == b'*' && self.peek_at(1) == b'/' {
                            self.pos += 2;
                            break;
                        }
                        self.pos += 1;
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Scans the next token.
    fn next_token(&mut self) -> Result<Token> {
        self.skip_trivia()?;
        let start = self.pos;

        if self.pos >= self.source.len() {
            return Ok(Token::new(TokenKind::Eof, Span::new(start, start)));
        }

        let c = self.peek();
        let kind = match c {
            b'0'..=b'9' => return self.scan_number(),
            b'\'' | b'"' => return self.scan_string(),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' | b'$' => return self.scan_word(),
            b'.' if self.peek_at(1).is_ascii_digit() => return self.scan_number(),

            b'{' => self.single(TokenKind::LeftBrace),
            b'}' => self.single(TokenKind::RightBrace),
            b'(' => self.single(TokenKind::LeftParen),
            b')' => self.single(TokenKind::RightParen),
            b'[' => self.single(TokenKind::LeftBracket),
            b']' => self.single(TokenKind::RightBracket),
            b';' => self.single(TokenKind::Semicolon),
            b',' => self.single(TokenKind::Comma),
            b'.' => self.single(TokenKind::Dot),
            b':' => self.single(TokenKind::Colon),
            b'?' => self.single(TokenKind::Question),
            b'~' => self.single(TokenKind::BitNot),

            b'+' => self.select3(b'+', TokenKind::PlusPlus, b'=', TokenKind::PlusAssign, TokenKind::Plus),
            b'-' => self.select3(b'-', TokenKind::MinusMinus, b'=', TokenKind::MinusAssign, TokenKind::Minus),
            b'*' => {
                self.pos += 1;
                if self.peek() == b'*' {
                    self.pos += 1;
                    if self.peek() == b'=' {
                        self.pos += 1;
                        TokenKind::StarStarAssign
                    } else {
                        TokenKind::StarStar
                    }
                } else if self.peek() == b'=' {
                    self.pos += 1;
                    TokenKind::StarAssign
                } else {
                    TokenKind::Star
                }
            }
            b'/' => self.select2(b'=', TokenKind::SlashAssign, TokenKind::Slash),
            b'%' => self.select2(b'=', TokenKind::PercentAssign, TokenKind::Percent),
            b'^' => self.select2(b'=', TokenKind::XorAssign, TokenKind::BitXor),

            b'=' => {
                self.pos += 1;
                if self.peek() == b'=' {
                    self.pos += 1;
                    if self.peek() == b'=' {
                        self.pos += 1;
                        TokenKind::StrictEq
                    } else {
                        TokenKind::Eq
                    }
                } else {
                    TokenKind::Assign
                }
            }
            b'!' => {
                self.pos += 1;
                if self.peek() == b'=' {
                    self.pos += 1;
                    if self.peek() == b'=' {
                        self.pos += 1;
                        TokenKind::StrictNotEq
                    } else {
                        TokenKind::NotEq
                    }
                } else {
                    TokenKind::Not
                }
            }
            b'<' => {
                self.pos += 1;
                match self.peek() {
                    b'<' => {
                        self.pos += 1;
                        if self.peek() == b'=' {
                            self.pos += 1;
                            TokenKind::ShlAssign
                        } else {
                            TokenKind::Shl
                        }
                    }
                    b'=' => {
                        self.pos += 1;
                        TokenKind::LtEq
                    }
                    _ => TokenKind::Lt,
                }
            }
            b'>' => {
                self.pos += 1;
                match self.peek() {
                    b'>' => {
                        self.pos += 1;
                        match self.peek() {
                            b'>' => {
                                self.pos += 1;
                                if self.peek() == b'=' {
                                    self.pos += 1;
                                    TokenKind::UShrAssign
                                } else {
                                    TokenKind::UShr
                                }
                            }
                            b'=' => {
                                self.pos += 1;
                                TokenKind::ShrAssign
                            }
                            _ => TokenKind::Shr,
                        }
                    }
                    b'=' => {
                        self.pos += 1;
                        TokenKind::GtEq
                    }
                    _ => TokenKind::Gt,
                }
            }
            b'&' => {
                self.pos += 1;
                match self.peek() {
                    b'&' => {
                        self.pos += 1;
                        TokenKind::AndAnd
                    }
                    b'=' => {
                        self.pos += 1;
                        TokenKind::AndAssign
                    }
                    _ => TokenKind::BitAnd,
                }
            }
            b'|' => {
                self.pos += 1;
                match self.peek() {
                    b'|' => {
                        self.pos += 1;
                        TokenKind::OrOr
                    }
                    b'=' => {
                        self.pos += 1;
                        TokenKind::OrAssign
                    }
                    _ => TokenKind::BitOr,
                }
            }

            _ => {
                return Err(Error::Syntax(format!(
                    "unexpected character '{}' at offset {}",
                    c as char, start
                )))
            }
        };

        Ok(Token::new(kind, Span::new(start, self.pos)))
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        kind
    }

    /// Advances past a one-char operator that may be followed by `next` to
    /// form a two-char operator.
    fn select2(&mut self, next: u8, long: TokenKind, short: TokenKind) -> TokenKind {
        self.pos += 1;
        if self.peek() == next {
            self.pos += 1;
            long
        } else {
            short
        }
    }

    fn select3(
        &mut self,
        a: u8,
        kind_a: TokenKind,
        b: u8,
        kind_b: TokenKind,
        short: TokenKind,
    ) -> TokenKind {
        self.pos += 1;
        if self.peek() == a {
            self.pos += 1;
            kind_a
        } else if self.peek() == b {
            self.pos += 1;
            kind_b
        } else {
            short
        }
    }

    fn scan_number(&mut self) -> Result<Token> {
        let start = self.pos;

        // Hex literal
        if self.peek() == b'0' && matches!(self.peek_at(1), b'x' | b'X') {
            self.pos += 2;
            let digits_start = self.pos;
            while self.peek().is_ascii_hexdigit() {
                self.pos += 1;
            }
            if self.pos == digits_start {
                return Err(Error::Syntax(format!(
                    "missing hex digits at offset {}",
                    start
                )));
            }
            let text = std::str::from_utf8(&self.source[digits_start..self.pos]).unwrap();
            let value = u64::from_str_radix(text, 16)
                .map_err(|_| Error::Syntax(format!("hex literal too large at offset {}", start)))?;
            return Ok(Token::new(
                TokenKind::Number(value as f64),
                Span::new(start, self.pos),
            ));
        }

        while self.peek().is_ascii_digit() {
            self.pos += 1;
        }
        if self.peek() == b'.' {
            self.pos += 1;
            while self.peek().is_ascii_digit() {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), b'e' | b'E') {
            self.pos += 1;
            if matches!(self.peek(), b'+' | b'-') {
                self.pos += 1;
            }
            while self.peek().is_ascii_digit() {
                self.pos += 1;
            }
        }

        let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap();
        let value: f64 = text
            .parse()
            .map_err(|_| Error::Syntax(format!("invalid number literal at offset {}", start)))?;
        Ok(Token::new(
            TokenKind::Number(value),
            Span::new(start, self.pos),
        ))
    }

    fn scan_string(&mut self) -> Result<Token> {
        let start = self.pos;
        let quote = self.bump();
        let mut value = String::new();

        loop {
            if self.pos >= self.source.len() {
                return Err(Error::Syntax(format!(
                    "unterminated string at offset {}",
                    start
                )));
            }
            let c = self.bump();
            if c == quote {
                break;
            }
            if c == b'\\' {
                let esc = self.bump();
                match esc {
                    b'n' => value.push('\n'),
                    b't' => value.push('\t'),
                    b'r' => value.push('\r'),
                    b'b' => value.push('\u{0008}'),
                    b'f' => value.push('\u{000C}'),
                    b'v' => value.push('\u{000B}'),
                    b'0' => value.push('\0'),
                    b'x' => {
                        let code = self.scan_hex_escape(2, start)?;
                        value.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
                    }
                    b'u' => {
                        let code = self.scan_hex_escape(4, start)?;
                        value.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
                    }
                    b'\n' => {}
                    _ => value.push(esc as char),
                }
            } else if c < 0x80 {
                value.push(c as char);
            } else {
                // Re-decode a multi-byte UTF-8 sequence starting at c.
                let seq_start = self.pos - 1;
                let mut end = self.pos;
                while end < self.source.len() && (self.source[end] & 0xC0) == 0x80 {
                    end += 1;
                }
                let text = std::str::from_utf8(&self.source[seq_start..end])
                    .map_err(|_| Error::Syntax(format!("invalid UTF-8 at offset {}", seq_start)))?;
                value.push_str(text);
                self.pos = end;
            }
        }

        Ok(Token::new(
            TokenKind::String(value),
            Span::new(start, self.pos),
        ))
    }

    fn scan_hex_escape(&mut self, len: usize, start: usize) -> Result<u32> {
        let mut code: u32 = 0;
        for _ in 0..len {
            let d = self.bump();
            let digit = (d as char)
                .to_digit(16)
                .ok_or_else(|| Error::Syntax(format!("invalid escape in string at offset {}", start)))?;
            code = code * 16 + digit;
        }
        Ok(code)
    }

    fn scan_word(&mut self) -> Result<Token> {
        let start = self.pos;
        while matches!(self.peek(), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' | b'$') {
            self.pos += 1;
        }
        let word = std::str::from_utf8(&self.source[start..self.pos]).unwrap();
        let kind = TokenKind::keyword(word)
            .unwrap_or_else(|| TokenKind::Identifier(word.to_string()));
        Ok(Token::new(kind, Span::new(start, self.pos)))
    }
}
