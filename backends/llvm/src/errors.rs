//! The LLVM back-end fails gracefully, rather than panicking, on the
//! handful of node kinds it doesn't yet lower: sub-slicing, field access,
//! and struct literals, all left unfinished per the type checker's own
//! unimplemented field-access rule.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("llvm back-end: {0}")]
pub struct NotSupported(pub String);

impl NotSupported {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
