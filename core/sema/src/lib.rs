//! Semantic analysis: name resolution, type checking, and return-path
//! checking over a parsed module.

pub mod errors;
pub mod resolve;
pub mod return_check;
pub mod symbol_table;
pub mod type_info;
pub mod typeck;

pub use errors::SemaError;
pub use symbol_table::{Entry, Mutability, Scope, SymbolTable};
pub use type_info::Primitives;

use plx_ast::{NodeId, Pool};
use plx_diagnostics::DiagnosticSink;

/// Runs every semantic pass over `module` in pipeline order, short-circuiting
/// at the first pass that reports an error: a module with undeclared names
/// is never handed to the type checker, and an ill-typed module is never
/// handed to the return checker.
pub fn analyze(pool: &mut Pool, sink: &mut dyn DiagnosticSink, module: NodeId) -> Option<(SymbolTable, Primitives)> {
    let mut table = SymbolTable::new();
    if !resolve::resolve_module(pool, &mut table, sink, module) {
        return None;
    }

    let prims = Primitives::intern(pool);
    if !typeck::type_check_module(pool, &mut table, &prims, sink, module) {
        return None;
    }

    if !return_check::check_returns(pool, sink, module) {
        return None;
    }

    Some((table, prims))
}
