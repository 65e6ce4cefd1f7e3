//! Typed diagnostics for name resolution, type checking, and return-path
//! checking, converted to [`Diagnostic`] at the point they're reported.

use plx_ast::Location;
use plx_diagnostics::{Diagnostic, DiagnosticKind};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SemaError {
    #[error("{location}: undeclared identifier `{name}`")]
    UndeclaredIdentifier { name: String, location: Location },

    #[error("{location}: identifier `{name}` already declared")]
    AlreadyDeclared {
        name: String,
        location: Location,
        first_location: Location,
    },

    #[error("{location}: expected void, found `{found}`")]
    ExpectedVoid { found: String, location: Location },

    #[error("{location}: expected `{expected}`, found `{found}`")]
    TypeMismatch { expected: String, found: String, location: Location },

    #[error("{location}: operands must be {expected_kind}: found `{left}` and `{right}`")]
    OperandKindMismatch {
        expected_kind: &'static str,
        left: String,
        right: String,
        location: Location,
    },

    #[error("{location}: return type mismatch: expected `{expected}`, found `{found}`")]
    ReturnTypeMismatch { expected: String, found: String, location: Location },

    #[error("{location}: call expects {expected} argument(s), found {found}")]
    ArgumentCountMismatch { expected: usize, found: usize, location: Location },

    #[error("{location}: argument {index} type mismatch: expected `{expected}`, found `{found}`")]
    ArgumentTypeMismatch {
        index: usize,
        expected: String,
        found: String,
        location: Location,
    },

    #[error("{location}: callee is not callable (not a function type)")]
    NotCallable { location: Location },

    #[error("{location}: subject is not indexable (not an array or slice)")]
    NotIndexable { location: Location },

    #[error("{location}: operand of `*` must be a reference type")]
    NotDereferenceable { location: Location },

    #[error("{location}: missing return statement")]
    MissingReturn { location: Location },

    #[error("{location}: field access is not yet implemented")]
    FieldAccessUnimplemented { location: Location },
}

impl SemaError {
    #[must_use]
    pub fn location(&self) -> &Location {
        match self {
            SemaError::UndeclaredIdentifier { location, .. }
            | SemaError::AlreadyDeclared { location, .. }
            | SemaError::ExpectedVoid { location, .. }
            | SemaError::TypeMismatch { location, .. }
            | SemaError::OperandKindMismatch { location, .. }
            | SemaError::ReturnTypeMismatch { location, .. }
            | SemaError::ArgumentCountMismatch { location, .. }
            | SemaError::ArgumentTypeMismatch { location, .. }
            | SemaError::NotCallable { location }
            | SemaError::NotIndexable { location }
            | SemaError::NotDereferenceable { location }
            | SemaError::MissingReturn { location }
            | SemaError::FieldAccessUnimplemented { location } => location,
        }
    }

    #[must_use]
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            SemaError::UndeclaredIdentifier { .. } | SemaError::AlreadyDeclared { .. } => DiagnosticKind::NameResolution,
            SemaError::MissingReturn { .. } => DiagnosticKind::ControlFlow,
            SemaError::FieldAccessUnimplemented { .. } => DiagnosticKind::Type,
            _ => DiagnosticKind::Type,
        }
    }

    #[must_use]
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::new(self.kind(), self.to_string(), self.location().clone());
        if let SemaError::AlreadyDeclared { first_location, .. } = self {
            diag.with_note("first declared here", first_location.clone())
        } else {
            diag
        }
    }
}
