//! Diagnostics for the post-fold AST validator.

use plx_ast::Location;
use plx_diagnostics::{Diagnostic, DiagnosticKind};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ValidateError {
    #[error("{location}: expected a constant")]
    ExpectedConstant { location: Location },

    #[error("{location}: assignment target must be referenceable")]
    TargetNotReferenceable { location: Location },

    #[error("{location}: operand of `&` must be referenceable")]
    RefOperandNotReferenceable { location: Location },

    #[error("{location}: array length must be a literal")]
    ArrayLengthNotLiteral { location: Location },
}

impl ValidateError {
    #[must_use]
    pub fn location(&self) -> &Location {
        match self {
            ValidateError::ExpectedConstant { location }
            | ValidateError::TargetNotReferenceable { location }
            | ValidateError::RefOperandNotReferenceable { location }
            | ValidateError::ArrayLengthNotLiteral { location } => location,
        }
    }

    #[must_use]
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::new(DiagnosticKind::Validation, self.to_string(), self.location().clone())
    }
}
