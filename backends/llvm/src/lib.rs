//! Textual LLVM IR back-end.
//!
//! [`codegen_module`] lowers a resolved, type-checked, folded, and validated
//! tree into an LLVM module and returns its textual IR. [`link_executable`]
//! hands that IR to an external native toolchain to produce a runnable
//! binary, mirroring how the reference WebAssembly back-end shells out to
//! its own external compiler and linker rather than re-implementing code
//! generation for a second target from scratch.
//!
//! Like the Wasm back-end, anything this one can't yet lower (sub-slicing,
//! field access, struct literals) is reported as a [`NotSupported`] error
//! rather than a panic.

pub mod compiler;
pub mod errors;
pub mod link;
pub mod types;

use inkwell::context::Context;
use plx_ast::{NodeId, Pool};
use plx_sema::SymbolTable;

pub use errors::NotSupported;
pub use link::{link_executable, OptimizationMode};

/// Lowers `module` to textual LLVM IR using a fresh LLVM context scoped to
/// this one compilation.
pub fn codegen_module(pool: &Pool, table: &mut SymbolTable, module: NodeId, module_name: &str) -> Result<String, NotSupported> {
    let context = Context::create();
    let compiler = compiler::Compiler::new(&context, module_name);
    compiler.lower_module(pool, table, module)?;
    Ok(compiler.module_ir())
}
