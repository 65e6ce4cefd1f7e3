//! The driver's default `DiagnosticSink`: renders `category: message` plus a
//! caret line under the primary location's column to standard error.

use plx_diagnostics::{Diagnostic, DiagnosticSink};

#[derive(Default)]
pub struct StderrSink {
    error_count: usize,
}

impl DiagnosticSink for StderrSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.error_count += 1;
        eprintln!("{}: {}: {}", diagnostic.primary, diagnostic.kind, diagnostic.message);
        let caret_column = diagnostic.primary.column.saturating_sub(1) as usize;
        eprintln!("{}^", " ".repeat(caret_column));
        if let Some((note, location)) = &diagnostic.secondary {
            eprintln!("  note: {note} at {location}");
        }
    }

    fn had_errors(&self) -> bool {
        self.error_count > 0
    }
}
