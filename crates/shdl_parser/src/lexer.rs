//! Lexical analyzer for SHDL source text.
//!
//! Converts source text into a sequence of [`Token`]s. Comments are fully
//! elided: `#` to end of line, `"…"` single-line, and `"""…"""` multi-line
//! (non-nesting). Integer literals may be decimal, `0x` hex, or `0b` binary;
//! the lexer validates that a prefix is followed by at least one digit.
//! Errors are reported to the [`DiagnosticSink`] and produce
//! [`ShdlToken::Error`] tokens.

use crate::token::{lookup_keyword, ShdlToken, Token};
use shdl_diagnostics::{codes, Diagnostic, DiagnosticCode, DiagnosticSink};
use shdl_source::{FileId, Span};

/// Lexes SHDL source into tokens.
///
/// Whitespace and comments are skipped; the returned vector always ends with
/// an [`ShdlToken::Eof`] token.
pub fn lex(source: &str, file: FileId, sink: &DiagnosticSink) -> Vec<Token> {
    let mut lexer = Lexer {
        source: source.as_bytes(),
        pos: 0,
        file,
        sink,
    };
    lexer.lex_all()
}

struct Lexer<'a> {
    source: &'a [u8],
    pos: usize,
    file: FileId,
    sink: &'a DiagnosticSink,
}

impl Lexer<'_> {
    fn lex_all(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            if self.pos >= self.source.len() {
                tokens.push(Token {
                    kind: ShdlToken::Eof,
                    span: Span::new(self.file, self.pos as u32, self.pos as u32),
                });
                break;
            }
            tokens.push(self.next_token());
        }
        tokens
    }

    fn peek(&self) -> u8 {
        self.source.get(self.pos).copied().unwrap_or(0)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        self.source.get(self.pos + offset).copied().unwrap_or(0)
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(self.file, start as u32, self.pos as u32)
    }

    fn error(&self, code: DiagnosticCode, msg: &str, span: Span) {
        self.sink.emit(Diagnostic::error(code, msg, span));
    }

    /// Skips whitespace and all three comment forms.
    fn skip_trivia(&mut self) {
        loop {
            while self.pos < self.source.len() && self.source[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }
            if self.pos >= self.source.len() {
                return;
            }
            // Line comment: # to end of line
            if self.peek() == b'#' {
                while self.pos < self.source.len() && self.source[self.pos] != b'\n' {
                    self.pos += 1;
                }
                continue;
            }
            // String comments: """…""" (multi-line) or "…" (single-line)
            if self.peek() == b'"' {
                if self.peek_at(1) == b'"' && self.peek_at(2) == b'"' {
                    self.skip_block_comment();
                } else {
                    self.skip_line_string_comment();
                }
                continue;
            }
            break;
        }
    }

    /// Skips a `"""…"""` block comment. Non-nesting.
    fn skip_block_comment(&mut self) {
        let start = self.pos;
        self.pos += 3;
        loop {
            if self.pos >= self.source.len() {
                self.error(
                    codes::UNTERMINATED_COMMENT,
                    "unterminated \"\"\" block comment",
                    self.span_from(start),
                );
                return;
            }
            if self.peek() == b'"' && self.peek_at(1) == b'"' && self.peek_at(2) == b'"' {
                self.pos += 3;
                return;
            }
            self.pos += 1;
        }
    }

    /// Skips a `"…"` comment; an unclosed one simply ends at the newline.
    fn skip_line_string_comment(&mut self) {
        self.pos += 1;
        while self.pos < self.source.len()
            && self.source[self.pos] != b'"'
            && self.source[self.pos] != b'\n'
        {
            self.pos += 1;
        }
        if self.pos < self.source.len() && self.source[self.pos] == b'"' {
            self.pos += 1;
        }
    }

    fn next_token(&mut self) -> Token {
        let start = self.pos;
        let b = self.peek();

        if is_ident_start(b) {
            return self.lex_identifier(start);
        }
        if b.is_ascii_digit() {
            return self.lex_number(start);
        }

        self.pos += 1;
        let kind = match b {
            b'(' => ShdlToken::LeftParen,
            b')' => ShdlToken::RightParen,
            b'{' => ShdlToken::LeftBrace,
            b'}' => ShdlToken::RightBrace,
            b'[' => ShdlToken::LeftBracket,
            b']' => ShdlToken::RightBracket,
            b',' => ShdlToken::Comma,
            b';' => ShdlToken::Semicolon,
            b'.' => ShdlToken::Dot,
            b'=' => ShdlToken::Equals,
            b'>' => ShdlToken::Greater,
            b'+' => ShdlToken::Plus,
            b'*' => ShdlToken::Star,
            b'/' => ShdlToken::Slash,
            b'-' => {
                if self.peek() == b'>' {
                    self.pos += 1;
                    ShdlToken::Arrow
                } else {
                    ShdlToken::Minus
                }
            }
            b':' => {
                if self.peek() == b':' {
                    self.pos += 1;
                    ShdlToken::ColonColon
                } else {
                    ShdlToken::Colon
                }
            }
            _ => {
                self.error(
                    codes::INVALID_CHARACTER,
                    &format!("unexpected character '{}'", b as char),
                    self.span_from(start),
                );
                ShdlToken::Error
            }
        };
        Token {
            kind,
            span: self.span_from(start),
        }
    }

    fn lex_identifier(&mut self, start: usize) -> Token {
        while self.pos < self.source.len() && is_ident_char(self.source[self.pos]) {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap_or("");
        let kind = lookup_keyword(text).unwrap_or(ShdlToken::Identifier);
        Token {
            kind,
            span: self.span_from(start),
        }
    }

    fn lex_number(&mut self, start: usize) -> Token {
        if self.peek() == b'0' && matches!(self.peek_at(1), b'x' | b'X' | b'b' | b'B') {
            let base = self.peek_at(1).to_ascii_lowercase();
            self.pos += 2;
            let digits_start = self.pos;
            if base == b'x' {
                while self.pos < self.source.len() && self.source[self.pos].is_ascii_hexdigit() {
                    self.pos += 1;
                }
                if self.pos == digits_start {
                    self.error(
                        codes::BAD_HEX_LITERAL,
                        "expected hex digits after '0x'",
                        self.span_from(start),
                    );
                    return Token {
                        kind: ShdlToken::Error,
                        span: self.span_from(start),
                    };
                }
            } else {
                while self.pos < self.source.len() && matches!(self.source[self.pos], b'0' | b'1') {
                    self.pos += 1;
                }
                if self.pos == digits_start {
                    self.error(
                        codes::BAD_BINARY_LITERAL,
                        "expected binary digits after '0b'",
                        self.span_from(start),
                    );
                    return Token {
                        kind: ShdlToken::Error,
                        span: self.span_from(start),
                    };
                }
            }
        } else {
            while self.pos < self.source.len() && self.source[self.pos].is_ascii_digit() {
                self.pos += 1;
            }
        }
        Token {
            kind: ShdlToken::IntLiteral,
            span: self.span_from(start),
        }
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
