//! Character-level stream with line/column tracking.

use plx_diagnostics::SourceLocation;

/// Sentinel returned by [`SourceReader::peek`] and [`SourceReader::advance`]
/// at end of stream, distinct from any valid byte.
pub const EOF: u8 = 0xFF;

/// Wraps a source file's bytes, handing characters out one at a time while
/// tracking the current line, column, and the byte offset of the start of
/// the current line (so diagnostics can re-seek and reprint the offending
/// line without re-scanning the whole file).
pub struct SourceReader {
    filename: String,
    bytes: Vec<u8>,
    pos: usize,
    line: u32,
    column: u32,
    line_start_offset: u32,
}

impl SourceReader {
    #[must_use]
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
            pos: 0,
            line: 1,
            column: 1,
            line_start_offset: 0,
        }
    }

    /// Non-destructively returns the current character, or [`EOF`].
    #[must_use]
    pub fn peek(&self) -> u8 {
        self.bytes.get(self.pos).copied().unwrap_or(EOF)
    }

    /// Looks one character past the current one without consuming anything.
    #[must_use]
    pub fn peek_next(&self) -> u8 {
        self.bytes.get(self.pos + 1).copied().unwrap_or(EOF)
    }

    /// The location of the character `peek()` would return.
    #[must_use]
    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.filename.clone(), self.line, self.column, self.line_start_offset)
    }

    /// Consumes and returns the current character, advancing line/column
    /// bookkeeping. On newline the line counter bumps and a new
    /// start-of-line offset is recorded; otherwise the column advances.
    pub fn advance(&mut self) -> u8 {
        let c = self.peek();
        if c == EOF {
            return EOF;
        }
        self.pos += 1;
        if c == b'\n' {
            self.line += 1;
            self.column = 1;
            self.line_start_offset = u32::try_from(self.pos).unwrap_or(u32::MAX);
        } else {
            self.column += 1;
        }
        c
    }

    /// Consumes the current character if it equals `c`, reporting whether it
    /// matched.
    pub fn accept(&mut self, c: u8) -> bool {
        if self.peek() == c {
            self.advance();
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn at_eof(&self) -> bool {
        self.peek() == EOF
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_tracks_line_and_column() {
        let mut r = SourceReader::new("t.plx", b"ab\ncd".to_vec());
        assert_eq!(r.location().line, 1);
        assert_eq!(r.location().column, 1);
        r.advance(); // a
        assert_eq!(r.location().column, 2);
        r.advance(); // b
        r.advance(); // \n
        assert_eq!(r.location().line, 2);
        assert_eq!(r.location().column, 1);
        assert_eq!(r.peek(), b'c');
    }

    #[test]
    fn peek_at_eof_returns_sentinel() {
        let mut r = SourceReader::new("t.plx", b"a".to_vec());
        r.advance();
        assert_eq!(r.peek(), EOF);
        assert!(r.at_eof());
    }

    #[test]
    fn accept_only_consumes_on_match() {
        let mut r = SourceReader::new("t.plx", b"xy".to_vec());
        assert!(!r.accept(b'y'));
        assert!(r.accept(b'x'));
        assert_eq!(r.peek(), b'y');
    }
}
