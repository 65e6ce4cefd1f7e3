//! Token kinds and the token record produced by the tokenizer.

use plx_diagnostics::SourceLocation;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Eof,
    Error,

    // keywords
    Const,
    Var,
    Struct,
    Func,
    If,
    Else,
    Defer,
    Loop,
    While,
    For,
    Continue,
    Break,
    Return,
    And,
    Or,
    Xor,
    KwS8,
    KwS16,
    KwS32,
    KwS64,
    KwU8,
    KwU16,
    KwU32,
    KwU64,
    KwF16,
    KwF32,
    KwF64,
    KwBool,
    True,
    False,

    Ident,
    IntLiteral,
    FloatLiteral,
    StringLiteral,

    // punctuation
    Period,
    Comma,
    Colon,
    Semicolon,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    // operators
    Assign,
    Eq,
    Neq,
    Not,
    Lt,
    Lte,
    LShift,
    LShiftAssign,
    Gt,
    Gte,
    RShift,
    RShiftAssign,
    Plus,
    PlusAssign,
    Arrow,
    Minus,
    MinusAssign,
    Star,
    StarAssign,
    Slash,
    SlashAssign,
    Percent,
    PercentAssign,
    Amp,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenPayload {
    None,
    UnsignedInt(u64),
    Float(f64),
    Text(String),
}

/// A lexed token: its kind, where it started, and any accumulated payload
/// (identifier/string text, or a literal's numeric value).
#[derive(Clone, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub location: SourceLocation,
    pub payload: TokenPayload,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, location: SourceLocation, payload: TokenPayload) -> Self {
        Self { kind, location, payload }
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            TokenPayload::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Keyword table keyed by exact spelling; consulted after an identifier has
/// been fully lexed, matching the reference implementation's "compare
/// against a small perfect-match table" design.
#[must_use]
pub fn keyword_kind(text: &str) -> Option<TokenKind> {
    Some(match text {
        "const" => TokenKind::Const,
        "var" => TokenKind::Var,
        "struct" => TokenKind::Struct,
        "func" => TokenKind::Func,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "defer" => TokenKind::Defer,
        "loop" => TokenKind::Loop,
        "while" => TokenKind::While,
        "for" => TokenKind::For,
        "continue" => TokenKind::Continue,
        "break" => TokenKind::Break,
        "return" => TokenKind::Return,
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "xor" => TokenKind::Xor,
        "s8" => TokenKind::KwS8,
        "s16" => TokenKind::KwS16,
        "s32" => TokenKind::KwS32,
        "s64" => TokenKind::KwS64,
        "u8" => TokenKind::KwU8,
        "u16" => TokenKind::KwU16,
        "u32" => TokenKind::KwU32,
        "u64" => TokenKind::KwU64,
        "f16" => TokenKind::KwF16,
        "f32" => TokenKind::KwF32,
        "f64" => TokenKind::KwF64,
        "bool" => TokenKind::KwBool,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        _ => return None,
    })
}
