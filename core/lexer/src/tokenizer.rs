//! Pulls bytes from a [`SourceReader`] and emits one token at a time.

use crate::reader::{SourceReader, EOF};
use crate::token::{keyword_kind, Token, TokenKind, TokenPayload};
use plx_diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};

pub struct Tokenizer {
    reader: SourceReader,
}

impl Tokenizer {
    #[must_use]
    pub fn new(filename: impl Into<String>, source: Vec<u8>) -> Self {
        Self {
            reader: SourceReader::new(filename, source),
        }
    }

    /// Skips whitespace and `#`-to-end-of-line comments, then lexes and
    /// returns the next token with its start location.
    pub fn next_token(&mut self, sink: &mut dyn DiagnosticSink) -> Token {
        self.skip_trivia();
        let start = self.reader.location();
        let c = self.reader.peek();

        if c == EOF {
            return Token::new(TokenKind::Eof, start, TokenPayload::None);
        }
        if is_ident_start(c) {
            return self.lex_ident_or_keyword(start);
        }
        if c.is_ascii_digit() {
            return self.lex_number(start, sink);
        }
        if c == b'"' {
            return self.lex_string(start, sink);
        }
        self.lex_operator(start, sink)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.reader.peek() {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    self.reader.advance();
                }
                b'#' => {
                    while self.reader.peek() != b'\n' && self.reader.peek() != EOF {
                        self.reader.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn lex_ident_or_keyword(&mut self, start: plx_diagnostics::SourceLocation) -> Token {
        let mut text = String::new();
        while is_ident_continue(self.reader.peek()) {
            text.push(self.reader.advance() as char);
        }
        if let Some(kind) = keyword_kind(&text) {
            return Token::new(kind, start, TokenPayload::None);
        }
        Token::new(TokenKind::Ident, start, TokenPayload::Text(text))
    }

    fn lex_number(&mut self, start: plx_diagnostics::SourceLocation, sink: &mut dyn DiagnosticSink) -> Token {
        if self.reader.peek() == b'0' && (self.reader.peek_next() == b'x' || self.reader.peek_next() == b'X') {
            return self.lex_radix_literal(start, sink, 16, is_hex_digit);
        }
        if self.reader.peek() == b'0' && (self.reader.peek_next() == b'b' || self.reader.peek_next() == b'B') {
            return self.lex_radix_literal(start, sink, 2, |c| c == b'0' || c == b'1');
        }

        let mut digits = String::new();
        while self.reader.peek().is_ascii_digit() {
            digits.push(self.reader.advance() as char);
        }

        if self.reader.peek() == b'.' && self.reader.peek_next().is_ascii_digit() {
            self.reader.advance(); // '.'
            let mut frac = String::new();
            while self.reader.peek().is_ascii_digit() {
                frac.push(self.reader.advance() as char);
            }
            let text = format!("{digits}.{frac}");
            let value: f64 = text.parse().unwrap_or(0.0);
            return Token::new(TokenKind::FloatLiteral, start, TokenPayload::Float(value));
        }

        let value: u64 = digits.parse().unwrap_or_else(|_| {
            sink.report(Diagnostic::new(DiagnosticKind::Lexical, format!("malformed integer literal `{digits}`"), start.clone()));
            0
        });
        Token::new(TokenKind::IntLiteral, start, TokenPayload::UnsignedInt(value))
    }

    fn lex_radix_literal(
        &mut self,
        start: plx_diagnostics::SourceLocation,
        sink: &mut dyn DiagnosticSink,
        radix: u32,
        is_digit: fn(u8) -> bool,
    ) -> Token {
        self.reader.advance(); // '0'
        self.reader.advance(); // 'x' or 'b'
        let mut digits = String::new();
        while is_digit(self.reader.peek()) {
            digits.push(self.reader.advance() as char);
        }
        if digits.is_empty() {
            sink.report(Diagnostic::new(
                DiagnosticKind::Lexical,
                "malformed integer literal: expected at least one digit",
                start.clone(),
            ));
            return Token::new(TokenKind::Error, start, TokenPayload::None);
        }
        if is_ident_continue(self.reader.peek()) && !is_digit(self.reader.peek()) {
            sink.report(Diagnostic::new(
                DiagnosticKind::Lexical,
                "malformed integer literal: unexpected character immediately following digits",
                self.reader.location(),
            ));
            return Token::new(TokenKind::Error, start, TokenPayload::None);
        }
        let value = u64::from_str_radix(&digits, radix).unwrap_or(0);
        Token::new(TokenKind::IntLiteral, start, TokenPayload::UnsignedInt(value))
    }

    fn lex_string(&mut self, start: plx_diagnostics::SourceLocation, sink: &mut dyn DiagnosticSink) -> Token {
        self.reader.advance(); // opening quote
        let mut bytes = Vec::new();
        loop {
            match self.reader.peek() {
                EOF => {
                    sink.report(Diagnostic::new(DiagnosticKind::Lexical, "unterminated string literal", start.clone()));
                    return Token::new(TokenKind::Error, start, TokenPayload::None);
                }
                b'"' => {
                    self.reader.advance();
                    break;
                }
                b'\\' => {
                    self.reader.advance();
                    match self.reader.peek() {
                        b'"' => {
                            bytes.push(b'"');
                            self.reader.advance();
                        }
                        b'\\' => {
                            bytes.push(b'\\');
                            self.reader.advance();
                        }
                        b'n' => {
                            bytes.push(b'\n');
                            self.reader.advance();
                        }
                        b'r' => {
                            bytes.push(b'\r');
                            self.reader.advance();
                        }
                        b't' => {
                            bytes.push(b'\t');
                            self.reader.advance();
                        }
                        b'0' => {
                            bytes.push(0);
                            self.reader.advance();
                        }
                        b' ' | b'\t' | b'\r' | b'\n' => {
                            // line continuation: consume all subsequent whitespace
                            while matches!(self.reader.peek(), b' ' | b'\t' | b'\r' | b'\n') {
                                self.reader.advance();
                            }
                        }
                        EOF => {
                            sink.report(Diagnostic::new(DiagnosticKind::Lexical, "unterminated string literal", start.clone()));
                            return Token::new(TokenKind::Error, start, TokenPayload::None);
                        }
                        other => {
                            sink.report(Diagnostic::new(
                                DiagnosticKind::Lexical,
                                format!("unknown escape sequence `\\{}`", other as char),
                                self.reader.location(),
                            ));
                            self.reader.advance();
                        }
                    }
                }
                _ => bytes.push(self.reader.advance()),
            }
        }
        let text = String::from_utf8_lossy(&bytes).into_owned();
        Token::new(TokenKind::StringLiteral, start, TokenPayload::Text(text))
    }

    fn lex_operator(&mut self, start: plx_diagnostics::SourceLocation, sink: &mut dyn DiagnosticSink) -> Token {
        let c = self.reader.advance();
        let kind = match c {
            b'.' => TokenKind::Period,
            b',' => TokenKind::Comma,
            b':' => TokenKind::Colon,
            b';' => TokenKind::Semicolon,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b'&' => TokenKind::Amp,
            b'=' => {
                if self.reader.accept(b'=') {
                    TokenKind::Eq
                } else {
                    TokenKind::Assign
                }
            }
            b'!' => {
                if self.reader.accept(b'=') {
                    TokenKind::Neq
                } else {
                    TokenKind::Not
                }
            }
            b'<' => {
                if self.reader.accept(b'=') {
                    TokenKind::Lte
                } else if self.reader.accept(b'>') {
                    if self.reader.accept(b'=') {
                        TokenKind::LShiftAssign
                    } else {
                        TokenKind::LShift
                    }
                } else {
                    TokenKind::Lt
                }
            }
            b'>' => {
                if self.reader.accept(b'=') {
                    TokenKind::Gte
                } else if self.reader.accept(b'>') {
                    if self.reader.accept(b'=') {
                        TokenKind::RShiftAssign
                    } else {
                        TokenKind::RShift
                    }
                } else {
                    TokenKind::Gt
                }
            }
            b'+' => {
                if self.reader.accept(b'=') {
                    TokenKind::PlusAssign
                } else {
                    TokenKind::Plus
                }
            }
            b'-' => {
                if self.reader.accept(b'>') {
                    TokenKind::Arrow
                } else if self.reader.accept(b'=') {
                    TokenKind::MinusAssign
                } else {
                    TokenKind::Minus
                }
            }
            b'*' => {
                if self.reader.accept(b'=') {
                    TokenKind::StarAssign
                } else {
                    TokenKind::Star
                }
            }
            b'/' => {
                if self.reader.accept(b'=') {
                    TokenKind::SlashAssign
                } else {
                    TokenKind::Slash
                }
            }
            b'%' => {
                if self.reader.accept(b'=') {
                    TokenKind::PercentAssign
                } else {
                    TokenKind::Percent
                }
            }
            other => {
                sink.report(Diagnostic::new(
                    DiagnosticKind::Lexical,
                    format!("unexpected byte `{}`", other as char),
                    start.clone(),
                ));
                return Token::new(TokenKind::Error, start, TokenPayload::None);
            }
        };
        Token::new(kind, start, TokenPayload::None)
    }
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_ident_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

fn is_hex_digit(c: u8) -> bool {
    c.is_ascii_hexdigit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use plx_diagnostics::CollectingSink;

    fn tokens(src: &str) -> Vec<Token> {
        let mut sink = CollectingSink::default();
        let mut tz = Tokenizer::new("t.plx", src.as_bytes().to_vec());
        let mut out = Vec::new();
        loop {
            let tok = tz.next_token(&mut sink);
            let eof = tok.kind == TokenKind::Eof;
            out.push(tok);
            if eof {
                break;
            }
        }
        out
    }

    #[test]
    fn keywords_round_trip() {
        let keywords = [
            "const", "var", "struct", "func", "if", "else", "defer", "loop", "while", "for", "continue", "break", "return", "and",
            "or", "xor", "s8", "s16", "s32", "s64", "u8", "u16", "u32", "u64", "f16", "f32", "f64", "bool", "true", "false",
        ];
        for kw in keywords {
            let toks = tokens(kw);
            assert_eq!(toks.len(), 2, "expected keyword + EOF for `{kw}`");
            assert_eq!(toks[0].kind, keyword_kind(kw).unwrap(), "mismatch for `{kw}`");
            assert_eq!(toks[1].kind, TokenKind::Eof);
        }
    }

    #[test]
    fn integer_literal_forms() {
        let cases: [(&str, u64); 6] = [("0", 0), ("1", 1), ("0xAB", 0xAB), ("0xCD", 0xCD), ("0b00", 0), ("0b11", 3)];
        for (text, expected) in cases {
            let toks = tokens(text);
            assert_eq!(toks[0].kind, TokenKind::IntLiteral, "for `{text}`");
            assert_eq!(toks[0].payload, TokenPayload::UnsignedInt(expected), "for `{text}`");
        }
    }

    #[test]
    fn float_literal_forms() {
        for (text, expected) in [("0.0", 0.0), ("1.0", 1.0)] {
            let toks = tokens(text);
            assert_eq!(toks[0].kind, TokenKind::FloatLiteral);
            assert_eq!(toks[0].payload, TokenPayload::Float(expected));
        }
    }

    #[test]
    fn string_escapes() {
        let cases = [
            (r#""\"""#, "\""),
            (r#""\\""#, "\\"),
            (r#""\n""#, "\n"),
            (r#""\r""#, "\r"),
            (r#""\t""#, "\t"),
            (r#""\0""#, "\0"),
        ];
        for (src, expected) in cases {
            let toks = tokens(src);
            assert_eq!(toks[0].kind, TokenKind::StringLiteral, "for {src}");
            assert_eq!(toks[0].text(), Some(expected));
        }
    }

    #[test]
    fn string_line_continuation_consumes_whitespace() {
        let toks = tokens("\"a\\   \n  b\"");
        assert_eq!(toks[0].text(), Some("ab"));
    }

    #[test]
    fn shift_operators_use_language_specific_spelling() {
        let toks = tokens("<> >> <>= >>=");
        assert_eq!(toks[0].kind, TokenKind::LShift);
        assert_eq!(toks[1].kind, TokenKind::RShift);
        assert_eq!(toks[2].kind, TokenKind::LShiftAssign);
        assert_eq!(toks[3].kind, TokenKind::RShiftAssign);
    }

    #[test]
    fn hex_literal_rejects_trailing_alnum() {
        let mut sink = CollectingSink::default();
        let mut tz = Tokenizer::new("t.plx", b"0xABz".to_vec());
        let tok = tz.next_token(&mut sink);
        assert_eq!(tok.kind, TokenKind::Error);
        assert!(sink.had_errors());
    }

    #[test]
    fn unterminated_string_reports_lexical_error() {
        let mut sink = CollectingSink::default();
        let mut tz = Tokenizer::new("t.plx", b"\"abc".to_vec());
        let tok = tz.next_token(&mut sink);
        assert_eq!(tok.kind, TokenKind::Error);
        assert!(sink.had_errors());
    }
}
