//! The WebAssembly back-end fails gracefully, rather than miscompiling, on
//! the handful of node kinds it doesn't yet lower (anything needing linear
//! memory: field access, struct literals, references, and indexing beyond
//! what a future memory section would support).

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("wasm back-end: {0}")]
pub struct NotSupported(pub String);

impl NotSupported {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
