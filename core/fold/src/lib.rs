//! Constant folding and post-fold structural validation.

pub mod errors;
pub mod fold;
pub mod validate;

pub use errors::ValidateError;
pub use fold::fold_module;
pub use validate::validate_module;
