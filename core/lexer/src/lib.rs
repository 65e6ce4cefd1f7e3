//! Character-level source reader and tokenizer.
//!
//! The reader turns a byte stream into a sequence of positioned characters;
//! the tokenizer turns that into a lookahead-1 stream of classified tokens
//! consumed by the recursive-descent parser in `plx-parser`.

pub mod reader;
pub mod token;
pub mod tokenizer;

pub use reader::SourceReader;
pub use token::{Token, TokenKind, TokenPayload};
pub use tokenizer::Tokenizer;
