//! Return-path checking: proves every non-void function's body returns on
//! every syntactic control-flow path.
//!
//! The decision procedure is deliberately simple and is not flow-sensitive
//! beyond if/else and block nesting: a `loop` or `while` is never considered
//! to always return, even one whose only exit is a `return` inside it. That
//! matches the reference behaviour this crate supplements, not an oversight.

use crate::errors::SemaError;
use plx_ast::{kind::NodeKind, NodeId, Pool};
use plx_diagnostics::DiagnosticSink;

/// Checks every `FuncDef` in `module`, reporting "missing return statement"
/// for a non-void function whose body does not always return.
pub fn check_returns(pool: &Pool, sink: &mut dyn DiagnosticSink, module: NodeId) -> bool {
    let mut ok = true;
    for &def in pool.children(module) {
        if pool.kind(def) != NodeKind::FuncDef {
            continue;
        }
        let return_type = pool.child(def, 2).unwrap();
        if pool.kind(return_type) == NodeKind::TypeVoid {
            continue;
        }
        let body = pool.child(def, 3).unwrap();
        if !always_returns(pool, body) {
            let location = pool.get(def).location.clone();
            sink.report(SemaError::MissingReturn { location }.to_diagnostic());
            ok = false;
        }
    }
    ok
}

/// Return → true; Block → true iff some statement always returns;
/// If-then-else → true iff both branches always return; anything else →
/// false.
fn always_returns(pool: &Pool, id: NodeId) -> bool {
    match pool.kind(id) {
        NodeKind::Return => true,
        NodeKind::Block => pool.children(id).iter().any(|&stmt| always_returns(pool, stmt)),
        NodeKind::If => {
            let then_block = pool.child(id, 1).unwrap();
            let else_branch = pool.child(id, 2).unwrap();
            always_returns(pool, then_block) && always_returns(pool, else_branch)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plx_diagnostics::CollectingSink;

    fn check(src: &str) -> (bool, Vec<plx_diagnostics::Diagnostic>) {
        let mut pool = Pool::new();
        let mut sink = CollectingSink::default();
        let (module, parse_ok) = plx_parser::parse_program(&mut pool, &mut sink, &[("t.plx".into(), src.as_bytes().to_vec())]);
        assert!(parse_ok, "unexpected parse failure: {:?}", sink.diagnostics);
        let ok = check_returns(&pool, &mut sink, module);
        (ok, sink.diagnostics)
    }

    #[test]
    fn void_function_needs_no_return() {
        let (ok, _) = check("func f() { }");
        assert!(ok);
    }

    #[test]
    fn trailing_return_satisfies_the_check() {
        let (ok, _) = check("func f() -> s32 { return 1; }");
        assert!(ok);
    }

    #[test]
    fn if_without_else_is_not_exhaustive() {
        let (ok, diags) = check("func f() -> s32 { if true { return 1; } }");
        assert!(!ok);
        assert!(diags[0].message.contains("missing return statement"));
    }

    #[test]
    fn if_else_both_returning_satisfies_the_check() {
        let (ok, _) = check("func f() -> s32 { if true { return 1; } else { return 2; } }");
        assert!(ok);
    }

    #[test]
    fn loop_is_never_considered_exhaustive() {
        let (ok, diags) = check("func f() -> s32 { loop { return 1; } }");
        assert!(!ok);
        assert!(diags[0].message.contains("missing return statement"));
    }
}
