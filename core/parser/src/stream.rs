//! A one-token-lookahead wrapper around [`Tokenizer`].

use plx_diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use plx_lexer::{Token, TokenKind, Tokenizer};

pub struct TokenStream {
    tokenizer: Tokenizer,
    current: Token,
}

impl TokenStream {
    pub fn new(filename: impl Into<String>, source: Vec<u8>, sink: &mut dyn DiagnosticSink) -> Self {
        let mut tokenizer = Tokenizer::new(filename, source);
        let current = tokenizer.next_token(sink);
        Self { tokenizer, current }
    }

    /// Non-destructively returns the current (lookahead) token.
    #[must_use]
    pub fn peek(&self) -> &Token {
        &self.current
    }

    #[must_use]
    pub fn peek_kind(&self) -> TokenKind {
        self.current.kind
    }

    /// Consumes and returns the current token, lexing the next one.
    pub fn advance(&mut self, sink: &mut dyn DiagnosticSink) -> Token {
        let next = self.tokenizer.next_token(sink);
        std::mem::replace(&mut self.current, next)
    }

    /// Consumes the current token if its kind matches, reporting the match.
    pub fn accept(&mut self, kind: TokenKind, sink: &mut dyn DiagnosticSink) -> Option<Token> {
        if self.current.kind == kind {
            Some(self.advance(sink))
        } else {
            None
        }
    }

    /// Requires the current token to match `kind`, emitting "unexpected
    /// token" and returning `None` otherwise.
    pub fn expect(&mut self, kind: TokenKind, sink: &mut dyn DiagnosticSink) -> Option<Token> {
        if self.current.kind == kind {
            Some(self.advance(sink))
        } else {
            self.unexpected_token(sink);
            None
        }
    }

    /// Emits a diagnostic keyed to the current token's location.
    pub fn unexpected_token(&self, sink: &mut dyn DiagnosticSink) {
        sink.report(Diagnostic::new(
            DiagnosticKind::Syntactic,
            format!("unexpected token `{:?}`", self.current.kind),
            self.current.location.clone(),
        ));
    }
}
