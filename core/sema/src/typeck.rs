//! Type checking: annotates every expression-kind node with a type pointer
//! and verifies every typing rule in the language.

use crate::errors::SemaError;
use crate::symbol_table::SymbolTable;
use crate::type_info::{is_bool_type, is_integer_type, is_numeric_type, is_string_type, type_name, types_equal, Primitives};
use plx_ast::{kind::NodeKind, Location, NodeId, Payload, Pool};
use plx_diagnostics::DiagnosticSink;

/// Runs the type checker over every definition in `module`, in two passes:
/// every function's signature is synthesized first (so a forward call to a
/// not-yet-checked function still has a type to compare against), then every
/// definition's value or body is checked against it.
pub fn type_check_module(pool: &mut Pool, table: &mut SymbolTable, prims: &Primitives, sink: &mut dyn DiagnosticSink, module: NodeId) -> bool {
    let defs = pool.children(module).to_vec();

    for &def in &defs {
        if pool.kind(def) == NodeKind::FuncDef {
            synthesize_func_signature(pool, table, def);
        }
    }

    let mut ok = true;
    for &def in &defs {
        ok &= type_check_definition(pool, table, prims, sink, def);
    }
    ok
}

fn synthesize_func_signature(pool: &mut Pool, table: &mut SymbolTable, def: NodeId) {
    let name = pool.child(def, 0).unwrap();
    let params = pool.child(def, 1).unwrap();
    let return_type = pool.child(def, 2).unwrap();
    let loc = pool.get(def).location.clone();

    let mut param_types = Vec::new();
    for param in pool.children(params).to_vec() {
        let pname = pool.child(param, 0).unwrap();
        let ptype = pool.child(param, 1).unwrap();
        pool.set_type(param, ptype);
        pool.set_type(pname, ptype);
        if let Some(entry) = pool.get(pname).ident_entry() {
            table.get_mut(entry).ty = Some(ptype);
        }
        param_types.push(ptype);
    }

    let params_copy: Vec<NodeId> = param_types.iter().map(|&t| pool.clone_subtree(t)).collect();
    let params_node = pool.alloc(NodeKind::Other, Payload::None, params_copy, loc.clone());
    let return_type_copy = pool.clone_subtree(return_type);
    let func_ty = pool.alloc(NodeKind::TypeFunc, Payload::None, vec![params_node, return_type_copy], loc);

    pool.set_type(name, func_ty);
    pool.set_type(def, func_ty);
    if let Some(entry) = pool.get(name).ident_entry() {
        table.get_mut(entry).ty = Some(func_ty);
    }
}

fn type_check_definition(pool: &mut Pool, table: &mut SymbolTable, prims: &Primitives, sink: &mut dyn DiagnosticSink, def: NodeId) -> bool {
    match pool.kind(def) {
        NodeKind::ConstDef | NodeKind::VarDef => {
            let value = pool.child(def, 1).unwrap();
            let (ok, value_ty) = type_check_node(pool, table, prims, sink, value, None);
            if let Some(ty) = value_ty {
                pool.set_type(def, ty);
                bind_name_type(pool, table, def, ty);
            }
            ok
        }
        NodeKind::VarDecl => {
            let ty = pool.child(def, 1).unwrap();
            pool.set_type(def, ty);
            bind_name_type(pool, table, def, ty);
            true
        }
        NodeKind::StructDef => true,
        NodeKind::FuncDef => {
            let return_type = pool.child(def, 2).unwrap();
            let body = pool.child(def, 3).unwrap();
            type_check_block(pool, table, prims, sink, body, Some(return_type))
        }
        _ => true,
    }
}

fn bind_name_type(pool: &mut Pool, table: &mut SymbolTable, def: NodeId, ty: NodeId) {
    let name = pool.child(def, 0).unwrap();
    pool.set_type(name, ty);
    if let Some(entry) = pool.get(name).ident_entry() {
        table.get_mut(entry).ty = Some(ty);
    }
}

fn type_check_block(pool: &mut Pool, table: &mut SymbolTable, prims: &Primitives, sink: &mut dyn DiagnosticSink, block: NodeId, return_type: Option<NodeId>) -> bool {
    let mut ok = true;
    for stmt in pool.children(block).to_vec() {
        let (stmt_ok, ty) = type_check_node(pool, table, prims, sink, stmt, return_type);
        ok &= stmt_ok;
        if let Some(ty) = ty {
            if ty != prims.void && !types_equal(pool, ty, prims.void) {
                let location = pool.get(stmt).location.clone();
                sink.report(
                    SemaError::ExpectedVoid {
                        found: type_name(pool, ty),
                        location,
                    }
                    .to_diagnostic(),
                );
                ok = false;
            }
        }
    }
    pool.set_type(block, prims.void);
    ok
}

/// Type-checks one node, returning whether it checked cleanly and the type
/// it was assigned (statements are assigned `void`; declarations carry no
/// type of their own and return `None`).
fn type_check_node(pool: &mut Pool, table: &mut SymbolTable, prims: &Primitives, sink: &mut dyn DiagnosticSink, id: NodeId, return_type: Option<NodeId>) -> (bool, Option<NodeId>) {
    let loc = pool.get(id).location.clone();
    match pool.kind(id) {
        NodeKind::Nop | NodeKind::Continue | NodeKind::Break => {
            void(pool, prims, id);
            (true, Some(prims.void))
        }

        NodeKind::Block => {
            let ok = type_check_block(pool, table, prims, sink, id, return_type);
            (ok, Some(prims.void))
        }

        NodeKind::ConstDef | NodeKind::VarDef | NodeKind::VarDecl => {
            let ok = type_check_definition(pool, table, prims, sink, id);
            void(pool, prims, id);
            (ok, Some(prims.void))
        }

        NodeKind::If => {
            let cond = pool.child(id, 0).unwrap();
            let then_block = pool.child(id, 1).unwrap();
            let else_branch = pool.child(id, 2).unwrap();
            let (mut ok, cond_ty) = type_check_node(pool, table, prims, sink, cond, return_type);
            ok &= require_bool(pool, prims, sink, cond, cond_ty);
            ok &= type_check_node(pool, table, prims, sink, then_block, return_type).0;
            ok &= type_check_node(pool, table, prims, sink, else_branch, return_type).0;
            void(pool, prims, id);
            (ok, Some(prims.void))
        }

        NodeKind::Loop => {
            let body = pool.child(id, 0).unwrap();
            let ok = type_check_node(pool, table, prims, sink, body, return_type).0;
            void(pool, prims, id);
            (ok, Some(prims.void))
        }

        NodeKind::While => {
            let cond = pool.child(id, 0).unwrap();
            let body = pool.child(id, 1).unwrap();
            let (mut ok, cond_ty) = type_check_node(pool, table, prims, sink, cond, return_type);
            ok &= require_bool(pool, prims, sink, cond, cond_ty);
            ok &= type_check_node(pool, table, prims, sink, body, return_type).0;
            void(pool, prims, id);
            (ok, Some(prims.void))
        }

        NodeKind::Return => {
            let expected = return_type.expect("return statement outside a function body");
            let ok = if let Some(&value) = pool.children(id).first() {
                let (value_ok, value_ty) = type_check_node(pool, table, prims, sink, value, return_type);
                let matches = value_ty.is_some_and(|ty| types_equal(pool, ty, expected));
                if !matches {
                    sink.report(
                        SemaError::ReturnTypeMismatch {
                            expected: type_name(pool, expected),
                            found: value_ty.map_or_else(|| "<error>".to_string(), |ty| type_name(pool, ty)),
                            location: loc.clone(),
                        }
                        .to_diagnostic(),
                    );
                }
                value_ok && matches
            } else {
                let matches = types_equal(pool, expected, prims.void);
                if !matches {
                    sink.report(
                        SemaError::ReturnTypeMismatch {
                            expected: type_name(pool, expected),
                            found: "void".to_string(),
                            location: loc.clone(),
                        }
                        .to_diagnostic(),
                    );
                }
                matches
            };
            void(pool, prims, id);
            (ok, Some(prims.void))
        }

        NodeKind::Assign => {
            let target = pool.child(id, 0).unwrap();
            let value = pool.child(id, 1).unwrap();
            let (mut ok, target_ty) = type_check_node(pool, table, prims, sink, target, return_type);
            let (value_ok, value_ty) = type_check_node(pool, table, prims, sink, value, return_type);
            ok &= value_ok;
            ok &= require_equal(pool, sink, &loc, target_ty, value_ty);
            void(pool, prims, id);
            (ok, Some(prims.void))
        }

        NodeKind::AssignAdd | NodeKind::AssignSub | NodeKind::AssignMul | NodeKind::AssignDiv => {
            let ok = type_check_compound_assign(pool, table, prims, sink, id, return_type, is_numeric_type, "numeric");
            void(pool, prims, id);
            (ok, Some(prims.void))
        }

        NodeKind::AssignRem | NodeKind::AssignLShift | NodeKind::AssignRShift => {
            let ok = type_check_compound_assign(pool, table, prims, sink, id, return_type, is_integer_type, "integer");
            void(pool, prims, id);
            (ok, Some(prims.void))
        }

        NodeKind::And | NodeKind::Or | NodeKind::Xor => {
            let (left, right) = (pool.child(id, 0).unwrap(), pool.child(id, 1).unwrap());
            let (mut ok, lt) = type_check_node(pool, table, prims, sink, left, return_type);
            let (rok, rt) = type_check_node(pool, table, prims, sink, right, return_type);
            ok &= rok;
            let kind_ok = |pool: &Pool, t: NodeId| is_integer_type(pool, t) || is_bool_type(pool, t);
            ok &= require_binary_operand_kind(pool, sink, &loc, lt, rt, kind_ok, "integer or bool");
            let result_ty = lt.filter(|&t| rt.is_some_and(|r| types_equal(pool, t, r))).unwrap_or(prims.s32);
            pool.set_type(id, result_ty);
            (ok, Some(result_ty))
        }

        NodeKind::Eq | NodeKind::Neq => {
            let (left, right) = (pool.child(id, 0).unwrap(), pool.child(id, 1).unwrap());
            let (mut ok, lt) = type_check_node(pool, table, prims, sink, left, return_type);
            let (rok, rt) = type_check_node(pool, table, prims, sink, right, return_type);
            ok &= rok;
            let kind_ok = |pool: &Pool, t: NodeId| is_numeric_type(pool, t) || is_bool_type(pool, t) || is_string_type(pool, t);
            ok &= require_binary_operand_kind(pool, sink, &loc, lt, rt, kind_ok, "numeric, bool, or string");
            pool.set_type(id, prims.bool_);
            (ok, Some(prims.bool_))
        }

        NodeKind::Lt | NodeKind::Lte | NodeKind::Gt | NodeKind::Gte => {
            let (left, right) = (pool.child(id, 0).unwrap(), pool.child(id, 1).unwrap());
            let (mut ok, lt) = type_check_node(pool, table, prims, sink, left, return_type);
            let (rok, rt) = type_check_node(pool, table, prims, sink, right, return_type);
            ok &= rok;
            ok &= require_binary_operand_kind(pool, sink, &loc, lt, rt, is_numeric_type, "numeric");
            pool.set_type(id, prims.bool_);
            (ok, Some(prims.bool_))
        }

        NodeKind::Add | NodeKind::Sub | NodeKind::Mul | NodeKind::Div => {
            let (left, right) = (pool.child(id, 0).unwrap(), pool.child(id, 1).unwrap());
            let (mut ok, lt) = type_check_node(pool, table, prims, sink, left, return_type);
            let (rok, rt) = type_check_node(pool, table, prims, sink, right, return_type);
            ok &= rok;
            ok &= require_binary_operand_kind(pool, sink, &loc, lt, rt, is_numeric_type, "numeric");
            let result_ty = lt.unwrap_or(prims.s32);
            pool.set_type(id, result_ty);
            (ok, Some(result_ty))
        }

        NodeKind::Rem | NodeKind::LShift | NodeKind::RShift => {
            let (left, right) = (pool.child(id, 0).unwrap(), pool.child(id, 1).unwrap());
            let (mut ok, lt) = type_check_node(pool, table, prims, sink, left, return_type);
            let (rok, rt) = type_check_node(pool, table, prims, sink, right, return_type);
            ok &= rok;
            ok &= require_binary_operand_kind(pool, sink, &loc, lt, rt, is_integer_type, "integer");
            let result_ty = lt.unwrap_or(prims.s32);
            pool.set_type(id, result_ty);
            (ok, Some(result_ty))
        }

        NodeKind::Not => {
            let operand = pool.child(id, 0).unwrap();
            let (ok, ty) = type_check_node(pool, table, prims, sink, operand, return_type);
            let ok = ok && ty.is_some_and(|t| is_integer_type(pool, t) || is_bool_type(pool, t));
            let result_ty = ty.unwrap_or(prims.bool_);
            pool.set_type(id, result_ty);
            (ok, Some(result_ty))
        }

        NodeKind::Neg => {
            let operand = pool.child(id, 0).unwrap();
            let (ok, ty) = type_check_node(pool, table, prims, sink, operand, return_type);
            let ok = ok && ty.is_some_and(|t| is_numeric_type(pool, t));
            let result_ty = ty.unwrap_or(prims.s32);
            pool.set_type(id, result_ty);
            (ok, Some(result_ty))
        }

        NodeKind::Ref => {
            let operand = pool.child(id, 0).unwrap();
            let (ok, ty) = type_check_node(pool, table, prims, sink, operand, return_type);
            let ref_ty = ty.map_or_else(|| prims.void, |t| {
                let copy = pool.clone_subtree(t);
                pool.alloc(NodeKind::TypeRef, Payload::None, vec![copy], loc.clone())
            });
            pool.set_type(id, ref_ty);
            (ok, Some(ref_ty))
        }

        NodeKind::Deref => {
            let operand = pool.child(id, 0).unwrap();
            let (ok, ty) = type_check_node(pool, table, prims, sink, operand, return_type);
            match ty.filter(|&t| pool.kind(t) == NodeKind::TypeRef) {
                Some(ref_ty) => {
                    let referent = pool.child(ref_ty, 0).unwrap();
                    pool.set_type(id, referent);
                    (ok, Some(referent))
                }
                None => {
                    sink.report(SemaError::NotDereferenceable { location: loc }.to_diagnostic());
                    (false, None)
                }
            }
        }

        NodeKind::Call => type_check_call(pool, table, prims, sink, id, return_type, &loc),

        NodeKind::Index | NodeKind::Slice => type_check_index_or_slice(pool, table, prims, sink, id, return_type, &loc),

        NodeKind::Field => {
            let subject = pool.child(id, 0).unwrap();
            type_check_node(pool, table, prims, sink, subject, return_type);
            sink.report(SemaError::FieldAccessUnimplemented { location: loc }.to_diagnostic());
            (false, None)
        }

        NodeKind::Ident => {
            let ty = pool.get(id).ident_entry().and_then(|e| table.get(e).ty);
            if let Some(ty) = ty {
                pool.set_type(id, ty);
            }
            (ty.is_some(), ty)
        }

        k if k.is_literal() => {
            let ty = prims.for_literal_kind(k).expect("literal kind maps to a primitive type");
            pool.set_type(id, ty);
            (true, Some(ty))
        }

        NodeKind::StructLiteral => type_check_struct_literal(pool, table, prims, sink, id, return_type),

        k if k.is_type() => (true, None),

        _ => (true, None),
    }
}

fn void(pool: &mut Pool, prims: &Primitives, id: NodeId) {
    pool.set_type(id, prims.void);
}

fn require_bool(pool: &Pool, _prims: &Primitives, sink: &mut dyn DiagnosticSink, cond: NodeId, cond_ty: Option<NodeId>) -> bool {
    match cond_ty {
        Some(ty) if is_bool_type(pool, ty) => true,
        Some(ty) => {
            let location = pool.get(cond).location.clone();
            sink.report(
                SemaError::TypeMismatch {
                    expected: "bool".to_string(),
                    found: type_name(pool, ty),
                    location,
                }
                .to_diagnostic(),
            );
            false
        }
        None => false,
    }
}

fn require_equal(pool: &Pool, sink: &mut dyn DiagnosticSink, loc: &Location, expected: Option<NodeId>, found: Option<NodeId>) -> bool {
    match (expected, found) {
        (Some(e), Some(f)) => {
            if types_equal(pool, e, f) {
                true
            } else {
                sink.report(
                    SemaError::TypeMismatch {
                        expected: type_name(pool, e),
                        found: type_name(pool, f),
                        location: loc.clone(),
                    }
                    .to_diagnostic(),
                );
                false
            }
        }
        _ => false,
    }
}

fn require_binary_operand_kind(
    pool: &Pool,
    sink: &mut dyn DiagnosticSink,
    loc: &Location,
    left: Option<NodeId>,
    right: Option<NodeId>,
    kind_ok: impl Fn(&Pool, NodeId) -> bool,
    expected_kind: &'static str,
) -> bool {
    match (left, right) {
        (Some(l), Some(r)) if kind_ok(pool, l) && kind_ok(pool, r) && types_equal(pool, l, r) => true,
        (Some(l), Some(r)) => {
            sink.report(
                SemaError::OperandKindMismatch {
                    expected_kind,
                    left: type_name(pool, l),
                    right: type_name(pool, r),
                    location: loc.clone(),
                }
                .to_diagnostic(),
            );
            false
        }
        _ => false,
    }
}

fn type_check_compound_assign(
    pool: &mut Pool,
    table: &mut SymbolTable,
    prims: &Primitives,
    sink: &mut dyn DiagnosticSink,
    id: NodeId,
    return_type: Option<NodeId>,
    kind_ok: impl Fn(&Pool, NodeId) -> bool,
    expected_kind: &'static str,
) -> bool {
    let loc = pool.get(id).location.clone();
    let target = pool.child(id, 0).unwrap();
    let value = pool.child(id, 1).unwrap();
    let (mut ok, tt) = type_check_node(pool, table, prims, sink, target, return_type);
    let (vok, vt) = type_check_node(pool, table, prims, sink, value, return_type);
    ok &= vok;
    ok &= require_binary_operand_kind(pool, sink, &loc, tt, vt, kind_ok, expected_kind);
    ok
}

fn type_check_call(pool: &mut Pool, table: &mut SymbolTable, prims: &Primitives, sink: &mut dyn DiagnosticSink, id: NodeId, return_type: Option<NodeId>, loc: &Location) -> (bool, Option<NodeId>) {
    let callee = pool.child(id, 0).unwrap();
    let args_node = pool.child(id, 1).unwrap();
    let (mut ok, callee_ty) = type_check_node(pool, table, prims, sink, callee, return_type);

    let Some(callee_ty) = callee_ty.filter(|&t| pool.kind(t) == NodeKind::TypeFunc) else {
        if callee_ty.is_some() {
            sink.report(SemaError::NotCallable { location: loc.clone() }.to_diagnostic());
        }
        for arg in pool.children(args_node).to_vec() {
            type_check_node(pool, table, prims, sink, arg, return_type);
        }
        return (false, None);
    };

    let param_types_node = pool.child(callee_ty, 0).unwrap();
    let param_types = pool.children(param_types_node).to_vec();
    let args = pool.children(args_node).to_vec();

    if args.len() != param_types.len() {
        sink.report(
            SemaError::ArgumentCountMismatch {
                expected: param_types.len(),
                found: args.len(),
                location: loc.clone(),
            }
            .to_diagnostic(),
        );
        ok = false;
    }

    let mut arg_iter = args.iter();
    let mut param_iter = param_types.iter();
    let mut index = 0usize;
    loop {
        let (arg, param_ty) = match (arg_iter.next(), param_iter.next()) {
            (Some(&a), Some(&p)) => (a, p),
            _ => break,
        };
        let (arg_ok, arg_ty) = type_check_node(pool, table, prims, sink, arg, return_type);
        ok &= arg_ok;
        match arg_ty {
            Some(t) if types_equal(pool, t, param_ty) => {}
            Some(t) => {
                sink.report(
                    SemaError::ArgumentTypeMismatch {
                        index,
                        expected: type_name(pool, param_ty),
                        found: type_name(pool, t),
                        location: loc.clone(),
                    }
                    .to_diagnostic(),
                );
                ok = false;
            }
            None => ok = false,
        }
        index += 1;
    }
    for &arg in arg_iter {
        type_check_node(pool, table, prims, sink, arg, return_type);
    }

    let result_ty = pool.child(callee_ty, 1).unwrap();
    pool.set_type(id, result_ty);
    (ok, Some(result_ty))
}

fn type_check_index_or_slice(pool: &mut Pool, table: &mut SymbolTable, prims: &Primitives, sink: &mut dyn DiagnosticSink, id: NodeId, return_type: Option<NodeId>, loc: &Location) -> (bool, Option<NodeId>) {
    let subject = pool.child(id, 0).unwrap();
    let (mut ok, subject_ty) = type_check_node(pool, table, prims, sink, subject, return_type);

    let index_children: Vec<NodeId> = pool.children(id)[1..].to_vec();
    for &idx in &index_children {
        let (idx_ok, idx_ty) = type_check_node(pool, table, prims, sink, idx, return_type);
        ok &= idx_ok;
        if !idx_ty.is_some_and(|t| is_integer_type(pool, t)) {
            let location = pool.get(idx).location.clone();
            sink.report(
                SemaError::TypeMismatch {
                    expected: "integer".to_string(),
                    found: idx_ty.map_or_else(|| "<error>".to_string(), |t| type_name(pool, t)),
                    location,
                }
                .to_diagnostic(),
            );
            ok = false;
        }
    }

    let elem_ty = match subject_ty.map(|t| (pool.kind(t), t)) {
        Some((NodeKind::TypeArray, t)) => Some(pool.child(t, 1).unwrap()),
        Some((NodeKind::TypeSlice, t)) => Some(pool.child(t, 0).unwrap()),
        Some(_) => {
            sink.report(SemaError::NotIndexable { location: loc.clone() }.to_diagnostic());
            ok = false;
            None
        }
        None => {
            ok = false;
            None
        }
    };

    if let Some(ty) = elem_ty {
        pool.set_type(id, ty);
    }
    (ok, elem_ty)
}

fn type_check_struct_literal(pool: &mut Pool, table: &mut SymbolTable, prims: &Primitives, sink: &mut dyn DiagnosticSink, id: NodeId, return_type: Option<NodeId>) -> (bool, Option<NodeId>) {
    let struct_name = pool.child(id, 0).unwrap();
    let inits = pool.child(id, 1).unwrap();
    let mut ok = true;
    for field_init in pool.children(inits).to_vec() {
        let value = pool.child(field_init, 1).unwrap();
        ok &= type_check_node(pool, table, prims, sink, value, return_type).0;
    }
    let struct_ty = pool.get(struct_name).ident_entry().and_then(|e| table.get(e).ty);
    if let Some(ty) = struct_ty {
        pool.set_type(id, ty);
    }
    (ok && struct_ty.is_some(), struct_ty)
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
        let mut table = SymbolTable::new();
        let resolve_ok = crate::resolve::resolve_module(&mut pool, &mut table, &mut sink, module);
        assert!(resolve_ok, "unexpected resolve failure: {:?}", sink.diagnostics);
        let prims = Primitives::intern(&mut pool);
        let ok = type_check_module(&mut pool, &mut table, &prims, &mut sink, module);
        (ok, sink.diagnostics)
    }

    #[test]
    fn matching_return_type_checks() {
        let (ok, diags) = check("func f() -> s32 { return 1; }");
        assert!(ok, "{diags:?}");
    }

    #[test]
    fn mismatched_return_type_is_reported() {
        let (ok, diags) = check("func f() -> bool { return 1; }");
        assert!(!ok);
        assert!(diags[0].message.contains("return type mismatch"));
    }

    #[test]
    fn forward_call_between_functions_typechecks() {
        let (ok, diags) = check("func a() -> s32 { return b(); } func b() -> s32 { return 1; }");
        assert!(ok, "{diags:?}");
    }

    #[test]
    fn argument_count_mismatch_is_reported() {
        let (ok, diags) = check("func f(x: s32) -> s32 { return x; } func g() -> s32 { return f(); }");
        assert!(!ok);
        assert!(diags.iter().any(|d| d.message.contains("expects 1 argument")));
    }

    #[test]
    fn argument_type_mismatch_is_reported() {
        let (ok, diags) = check("func f(x: bool) -> s32 { return 0; } func g() -> s32 { return f(1); }");
        assert!(!ok);
        assert!(diags.iter().any(|d| d.message.contains("argument 0 type mismatch")));
    }

    #[test]
    fn if_condition_must_be_bool() {
        let (ok, diags) = check("func f() -> s32 { if 1 { return 1; } return 0; }");
        assert!(!ok);
        assert!(diags.iter().any(|d| d.message.contains("expected `bool`")));
    }

    #[test]
    fn bare_call_statement_must_type_to_void() {
        let (ok, diags) = check("func f() -> s32 { return 0; } func g() -> s32 { f(); return 0; }");
        assert!(!ok);
        assert!(diags.iter().any(|d| d.message.contains("expected void")));
    }

    #[test]
    fn deref_of_non_reference_is_rejected() {
        let (ok, diags) = check("func f() -> s32 { var x = 1; return *x; }");
        assert!(!ok);
        assert!(diags.iter().any(|d| d.message.contains("reference type")));
    }

    #[test]
    fn reference_and_dereference_round_trip() {
        let (ok, diags) = check("func f() -> s32 { var x = 1; var r = &x; return *r; }");
        assert!(ok, "{diags:?}");
    }
}
