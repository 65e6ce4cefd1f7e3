//! Structured compiler diagnostics.
//!
//! Every pass in the pipeline reports failures as [`Diagnostic`] values pushed
//! into a [`DiagnosticSink`]. The core never formats a diagnostic for a
//! terminal: rendering (colour, carets, line re-seeking) is an external
//! collaborator's job, per the pipeline's scope boundary.

use std::fmt;

/// A 1-based source position plus the byte offset of the start of its line,
/// so a caret-printer can re-seek and reprint the offending line.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub filename: String,
    pub line: u32,
    pub column: u32,
    pub line_start_offset: u32,
}

impl SourceLocation {
    #[must_use]
    pub fn new(filename: impl Into<String>, line: u32, column: u32, line_start_offset: u32) -> Self {
        Self {
            filename: filename.into(),
            line,
            column,
            line_start_offset,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.column)
    }
}

/// Broad categories a diagnostic falls into; mirrors §7 of the specification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    Lexical,
    Syntactic,
    NameResolution,
    Type,
    ControlFlow,
    Validation,
    Io,
    Resource,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagnosticKind::Lexical => "lexical error",
            DiagnosticKind::Syntactic => "syntax error",
            DiagnosticKind::NameResolution => "name resolution error",
            DiagnosticKind::Type => "type error",
            DiagnosticKind::ControlFlow => "control-flow error",
            DiagnosticKind::Validation => "validation error",
            DiagnosticKind::Io => "I/O error",
            DiagnosticKind::Resource => "resource error",
        };
        write!(f, "{s}")
    }
}

/// One compiler diagnostic: a kind, a human message, a primary location, and
/// an optional secondary ("note") location pointing at a related declaration.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub primary: SourceLocation,
    pub secondary: Option<(String, SourceLocation)>,
}

impl Diagnostic {
    #[must_use]
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, primary: SourceLocation) -> Self {
        Self {
            kind,
            message: message.into(),
            primary,
            secondary: None,
        }
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>, location: SourceLocation) -> Self {
        self.secondary = Some((note.into(), location));
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.primary, self.kind, self.message)?;
        if let Some((note, loc)) = &self.secondary {
            write!(f, "\n  note: {note} at {loc}")?;
        }
        Ok(())
    }
}

/// Receives diagnostics as passes produce them. The default implementation
/// used by `plxc` prints `category: message` plus a caret line; tests use a
/// `Vec<Diagnostic>` sink to assert on structured content instead of text.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);

    fn had_errors(&self) -> bool;
}

/// A sink that only collects diagnostics, for tests and for passes that hand
/// their accumulated errors back to a caller instead of a live sink.
#[derive(Default, Debug)]
pub struct CollectingSink {
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink for CollectingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    fn had_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(line: u32, col: u32) -> SourceLocation {
        SourceLocation::new("test.plx", line, col, 0)
    }

    #[test]
    fn collecting_sink_tracks_errors() {
        let mut sink = CollectingSink::default();
        assert!(!sink.had_errors());
        sink.report(Diagnostic::new(DiagnosticKind::Syntactic, "unexpected token", loc(1, 1)));
        assert!(sink.had_errors());
        assert_eq!(sink.diagnostics.len(), 1);
    }

    #[test]
    fn diagnostic_display_includes_note() {
        let d = Diagnostic::new(DiagnosticKind::NameResolution, "identifier `a` already declared", loc(2, 7))
            .with_note("first declared here", loc(1, 7));
        let text = d.to_string();
        assert!(text.contains("already declared"));
        assert!(text.contains("note:"));
    }
}
