//! Post-fold structural validation: rejects shapes the parser and type
//! checker allow but that only make sense once constants have collapsed to
//! literals.

use crate::errors::ValidateError;
use plx_ast::{kind::NodeKind, NodeId, Pool};
use plx_diagnostics::DiagnosticSink;

/// Walks every definition and reports every violation found, rather than
/// stopping at the first one: each violation is local to the node it's
/// anchored on.
pub fn validate_module(pool: &Pool, sink: &mut dyn DiagnosticSink, module: NodeId) -> bool {
    let mut ok = true;
    for &def in pool.children(module) {
        ok &= validate_node(pool, sink, def);
    }
    ok
}

fn validate_node(pool: &Pool, sink: &mut dyn DiagnosticSink, id: NodeId) -> bool {
    let mut ok = true;
    match pool.kind(id) {
        NodeKind::ConstDef | NodeKind::VarDef => {
            let value = pool.child(id, 1).unwrap();
            if !pool.kind(value).is_literal() {
                let location = pool.get(value).location.clone();
                sink.report(ValidateError::ExpectedConstant { location }.to_diagnostic());
                ok = false;
            }
        }
        NodeKind::Assign | NodeKind::AssignAdd | NodeKind::AssignSub | NodeKind::AssignMul | NodeKind::AssignDiv | NodeKind::AssignRem | NodeKind::AssignLShift | NodeKind::AssignRShift => {
            let target = pool.child(id, 0).unwrap();
            if !is_referenceable(pool, target) {
                let location = pool.get(target).location.clone();
                sink.report(ValidateError::TargetNotReferenceable { location }.to_diagnostic());
                ok = false;
            }
        }
        NodeKind::Ref => {
            let operand = pool.child(id, 0).unwrap();
            if !is_referenceable(pool, operand) {
                let location = pool.get(operand).location.clone();
                sink.report(ValidateError::RefOperandNotReferenceable { location }.to_diagnostic());
                ok = false;
            }
        }
        NodeKind::TypeArray => {
            let length = pool.child(id, 0).unwrap();
            if !pool.kind(length).is_literal() {
                let location = pool.get(length).location.clone();
                sink.report(ValidateError::ArrayLengthNotLiteral { location }.to_diagnostic());
                ok = false;
            }
        }
        _ => {}
    }
    for child in pool.children(id) {
        ok &= validate_node(pool, sink, *child);
    }
    ok
}

/// An l-value: an identifier, a dereference, or an index expression.
fn is_referenceable(pool: &Pool, id: NodeId) -> bool {
    matches!(pool.kind(id), NodeKind::Ident | NodeKind::Deref | NodeKind::Index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plx_diagnostics::CollectingSink;
    use plx_sema::SymbolTable;

    fn validate(src: &str) -> (bool, Vec<plx_diagnostics::Diagnostic>) {
        let mut pool = Pool::new();
        let mut sink = CollectingSink::default();
        let (module, parse_ok) = plx_parser::parse_program(&mut pool, &mut sink, &[("t.plx".into(), src.as_bytes().to_vec())]);
        assert!(parse_ok, "{:?}", sink.diagnostics);
        let mut table = SymbolTable::new();
        assert!(plx_sema::resolve::resolve_module(&mut pool, &mut table, &mut sink, module));
        let prims = plx_sema::Primitives::intern(&mut pool);
        assert!(plx_sema::typeck::type_check_module(&mut pool, &mut table, &prims, &mut sink, module), "{:?}", sink.diagnostics);
        crate::fold::fold_module(&mut pool, &mut table, module);
        let ok = validate_module(&pool, &mut sink, module);
        (ok, sink.diagnostics)
    }

    #[test]
    fn literal_const_passes() {
        let (ok, diags) = validate("const a = 1 + 2;");
        assert!(ok, "{diags:?}");
    }

    #[test]
    fn non_constant_const_rhs_is_rejected() {
        let (ok, diags) = validate("func f(x: s32) -> s32 { const a = x; return a; }");
        assert!(!ok);
        assert!(diags.iter().any(|d| d.message.contains("expected a constant")));
    }

    #[test]
    fn assigning_through_an_index_is_referenceable() {
        let (ok, diags) = validate("func f(xs: []s32) -> s32 { xs[0] = 1; return xs[0]; }");
        assert!(ok, "{diags:?}");
    }

    #[test]
    fn reference_of_a_call_result_is_rejected() {
        let (ok, diags) = validate("func g() -> s32 { return 1; } func f() -> &s32 { return &g(); }");
        assert!(!ok);
        assert!(diags.iter().any(|d| d.message.contains("must be referenceable")));
    }

    #[test]
    fn array_length_must_be_a_literal() {
        let (ok, diags) = validate("func f(n: s32) -> s32 { var xs: [n]s32; return 0; }");
        assert!(!ok);
        assert!(diags.iter().any(|d| d.message.contains("array length")));
    }
}
