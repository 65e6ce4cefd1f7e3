//! Constant folding: an iterative, fixed-point rewrite of the tree that
//! collapses literal-valued subtrees in place.

use plx_ast::{kind::NodeKind, NodeId, Payload, Pool};
use plx_sema::SymbolTable;

/// Runs the folder to a fixed point: repeated whole-tree passes until one
/// makes no rewrite at all.
pub fn fold_module(pool: &mut Pool, table: &mut SymbolTable, module: NodeId) {
    while fold_node(pool, table, module) {}
}

fn fold_node(pool: &mut Pool, table: &mut SymbolTable, id: NodeId) -> bool {
    let mut changed = false;
    for child in pool.children(id).to_vec() {
        changed |= fold_node(pool, table, child);
    }
    changed |= apply_rule(pool, table, id);
    changed
}

fn apply_rule(pool: &mut Pool, table: &mut SymbolTable, id: NodeId) -> bool {
    match pool.kind(id) {
        NodeKind::ConstDef => fold_const_def(pool, table, id),
        NodeKind::If => fold_if(pool, id),
        NodeKind::While => fold_while(pool, id),
        NodeKind::And | NodeKind::Or | NodeKind::Xor => fold_logical(pool, id),
        NodeKind::Eq | NodeKind::Neq | NodeKind::Lt | NodeKind::Lte | NodeKind::Gt | NodeKind::Gte => fold_comparison(pool, id),
        NodeKind::Add | NodeKind::Sub | NodeKind::Mul | NodeKind::Div | NodeKind::Rem | NodeKind::LShift | NodeKind::RShift => fold_arithmetic(pool, id),
        NodeKind::Not => fold_not(pool, id),
        NodeKind::Neg => fold_neg(pool, id),
        NodeKind::Ident => fold_ident(pool, table, id),
        _ => false,
    }
}

fn fold_const_def(pool: &mut Pool, table: &mut SymbolTable, id: NodeId) -> bool {
    let name = pool.child(id, 0).unwrap();
    let value = pool.child(id, 1).unwrap();
    if !pool.kind(value).is_literal() {
        return false;
    }
    if let Some(entry) = pool.get(name).ident_entry() {
        table.get_mut(entry).folded_value = Some(value);
    }
    pool.rewrite(id, NodeKind::Nop, Payload::None, vec![]);
    true
}

/// Splices the chosen branch's current contents into `id`, preserving `id`
/// so any sibling slot pointing at it keeps working.
fn splice_in_place(pool: &mut Pool, id: NodeId, chosen: NodeId) {
    let node = pool.get(chosen).clone();
    pool.rewrite(id, node.kind, node.payload, node.children);
}

fn fold_if(pool: &mut Pool, id: NodeId) -> bool {
    let cond = pool.child(id, 0).unwrap();
    let Payload::Bool(value) = &pool.get(cond).payload else {
        return false;
    };
    let value = *value;
    let then_block = pool.child(id, 1).unwrap();
    let else_branch = pool.child(id, 2).unwrap();
    let chosen = if value { then_block } else { else_branch };
    splice_in_place(pool, id, chosen);
    true
}

fn fold_while(pool: &mut Pool, id: NodeId) -> bool {
    let cond = pool.child(id, 0).unwrap();
    let Payload::Bool(value) = &pool.get(cond).payload else {
        return false;
    };
    let value = *value;
    let body = pool.child(id, 1).unwrap();
    if value {
        pool.rewrite(id, NodeKind::Loop, Payload::None, vec![body]);
    } else {
        pool.rewrite(id, NodeKind::Nop, Payload::None, vec![]);
    }
    true
}

fn same_literal_kind(pool: &Pool, a: NodeId, b: NodeId) -> Option<NodeKind> {
    let (ka, kb) = (pool.kind(a), pool.kind(b));
    (ka.is_literal() && ka == kb).then_some(ka)
}

fn fold_logical(pool: &mut Pool, id: NodeId) -> bool {
    let (left, right) = (pool.child(id, 0).unwrap(), pool.child(id, 1).unwrap());
    let Some(kind) = same_literal_kind(pool, left, right) else {
        return false;
    };
    let result = if kind == NodeKind::LitBool {
        let (Payload::Bool(l), Payload::Bool(r)) = (&pool.get(left).payload, &pool.get(right).payload) else {
            unreachable!()
        };
        let (l, r) = (*l, *r);
        let v = match pool.kind(id) {
            NodeKind::And => l && r,
            NodeKind::Or => l || r,
            NodeKind::Xor => l ^ r,
            _ => unreachable!(),
        };
        Payload::Bool(v)
    } else if kind.is_signed_int_literal() {
        let (Payload::SignedInt(l), Payload::SignedInt(r)) = (&pool.get(left).payload, &pool.get(right).payload) else {
            unreachable!()
        };
        let (l, r) = (*l, *r);
        let v = match pool.kind(id) {
            NodeKind::And => l & r,
            NodeKind::Or => l | r,
            NodeKind::Xor => l ^ r,
            _ => unreachable!(),
        };
        Payload::SignedInt(v)
    } else if kind.is_unsigned_int_literal() {
        let (Payload::UnsignedInt(l), Payload::UnsignedInt(r)) = (&pool.get(left).payload, &pool.get(right).payload) else {
            unreachable!()
        };
        let (l, r) = (*l, *r);
        let v = match pool.kind(id) {
            NodeKind::And => l & r,
            NodeKind::Or => l | r,
            NodeKind::Xor => l ^ r,
            _ => unreachable!(),
        };
        Payload::UnsignedInt(v)
    } else {
        return false;
    };
    pool.rewrite(id, kind, result, vec![]);
    true
}

fn fold_comparison(pool: &mut Pool, id: NodeId) -> bool {
    let (left, right) = (pool.child(id, 0).unwrap(), pool.child(id, 1).unwrap());
    if same_literal_kind(pool, left, right).is_none() {
        return false;
    }
    let ordering = match (&pool.get(left).payload, &pool.get(right).payload) {
        (Payload::SignedInt(l), Payload::SignedInt(r)) => l.partial_cmp(r),
        (Payload::UnsignedInt(l), Payload::UnsignedInt(r)) => l.partial_cmp(r),
        (Payload::Float(l), Payload::Float(r)) => l.partial_cmp(r),
        (Payload::Bool(l), Payload::Bool(r)) => l.partial_cmp(r),
        (Payload::Bytes(l), Payload::Bytes(r)) => l.partial_cmp(r),
        _ => None,
    };
    let Some(ordering) = ordering else {
        return false;
    };
    use std::cmp::Ordering;
    let value = match pool.kind(id) {
        NodeKind::Eq => ordering == Ordering::Equal,
        NodeKind::Neq => ordering != Ordering::Equal,
        NodeKind::Lt => ordering == Ordering::Less,
        NodeKind::Lte => ordering != Ordering::Greater,
        NodeKind::Gt => ordering == Ordering::Greater,
        NodeKind::Gte => ordering != Ordering::Less,
        _ => unreachable!(),
    };
    pool.rewrite(id, NodeKind::LitBool, Payload::Bool(value), vec![]);
    true
}

fn fold_arithmetic(pool: &mut Pool, id: NodeId) -> bool {
    let (left, right) = (pool.child(id, 0).unwrap(), pool.child(id, 1).unwrap());
    let Some(kind) = same_literal_kind(pool, left, right) else {
        return false;
    };
    let op = pool.kind(id);
    if kind.is_signed_int_literal() {
        let (Payload::SignedInt(l), Payload::SignedInt(r)) = (&pool.get(left).payload, &pool.get(right).payload) else {
            unreachable!()
        };
        let (l, r) = (*l, *r);
        let Some(v) = signed_arithmetic(op, l, r) else {
            return false;
        };
        pool.rewrite(id, kind, Payload::SignedInt(v), vec![]);
        true
    } else if kind.is_unsigned_int_literal() {
        let (Payload::UnsignedInt(l), Payload::UnsignedInt(r)) = (&pool.get(left).payload, &pool.get(right).payload) else {
            unreachable!()
        };
        let (l, r) = (*l, *r);
        let Some(v) = unsigned_arithmetic(op, l, r) else {
            return false;
        };
        pool.rewrite(id, kind, Payload::UnsignedInt(v), vec![]);
        true
    } else if kind.is_float_literal() {
        let (Payload::Float(l), Payload::Float(r)) = (&pool.get(left).payload, &pool.get(right).payload) else {
            unreachable!()
        };
        let (l, r) = (*l, *r);
        let v = match op {
            NodeKind::Add => l + r,
            NodeKind::Sub => l - r,
            NodeKind::Mul => l * r,
            NodeKind::Div => l / r,
            NodeKind::Rem => l % r,
            _ => return false,
        };
        pool.rewrite(id, kind, Payload::Float(v), vec![]);
        true
    } else {
        false
    }
}

/// Integer arithmetic on signed-integer literals, guarded against
/// overflow/underflow at the bounds of 64-bit two's complement. A would-be
/// overflow leaves the original node untouched rather than wrapping.
fn signed_arithmetic(op: NodeKind, l: i64, r: i64) -> Option<i64> {
    match op {
        NodeKind::Add => l.checked_add(r),
        NodeKind::Sub => l.checked_sub(r),
        NodeKind::Mul => l.checked_mul(r),
        NodeKind::Div => l.checked_div(r),
        NodeKind::Rem => l.checked_rem(r),
        NodeKind::LShift => u32::try_from(r).ok().and_then(|shift| l.checked_shl(shift)),
        NodeKind::RShift => u32::try_from(r).ok().and_then(|shift| l.checked_shr(shift)),
        _ => None,
    }
}

fn unsigned_arithmetic(op: NodeKind, l: u64, r: u64) -> Option<u64> {
    match op {
        NodeKind::Add => l.checked_add(r),
        NodeKind::Sub => l.checked_sub(r),
        NodeKind::Mul => l.checked_mul(r),
        NodeKind::Div => l.checked_div(r),
        NodeKind::Rem => l.checked_rem(r),
        NodeKind::LShift => u32::try_from(r).ok().and_then(|shift| l.checked_shl(shift)),
        NodeKind::RShift => u32::try_from(r).ok().and_then(|shift| l.checked_shr(shift)),
        _ => None,
    }
}

fn fold_not(pool: &mut Pool, id: NodeId) -> bool {
    let operand = pool.child(id, 0).unwrap();
    let kind = pool.kind(operand);
    if !kind.is_literal() {
        return false;
    }
    let result = match pool.get(operand).payload.clone() {
        Payload::Bool(v) => Payload::Bool(!v),
        Payload::SignedInt(v) => Payload::SignedInt(!v),
        Payload::UnsignedInt(v) => Payload::UnsignedInt(!v),
        _ => return false,
    };
    pool.rewrite(id, kind, result, vec![]);
    true
}

fn fold_neg(pool: &mut Pool, id: NodeId) -> bool {
    let operand = pool.child(id, 0).unwrap();
    let kind = pool.kind(operand);
    if !kind.is_literal() {
        return false;
    }
    let result = match pool.get(operand).payload.clone() {
        Payload::SignedInt(v) => match v.checked_neg() {
            Some(n) => Payload::SignedInt(n),
            None => return false,
        },
        Payload::Float(v) => Payload::Float(-v),
        _ => return false,
    };
    pool.rewrite(id, kind, result, vec![]);
    true
}

fn fold_ident(pool: &mut Pool, table: &SymbolTable, id: NodeId) -> bool {
    let Some(entry) = pool.get(id).ident_entry() else {
        return false;
    };
    let Some(value) = table.get(entry).folded_value else {
        return false;
    };
    splice_in_place(pool, id, value);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use plx_diagnostics::CollectingSink;

    fn fold_source(src: &str) -> Pool {
        let mut pool = Pool::new();
        let mut sink = CollectingSink::default();
        let (module, parse_ok) = plx_parser::parse_program(&mut pool, &mut sink, &[("t.plx".into(), src.as_bytes().to_vec())]);
        assert!(parse_ok, "{:?}", sink.diagnostics);
        let mut table = SymbolTable::new();
        assert!(plx_sema::resolve::resolve_module(&mut pool, &mut table, &mut sink, module));
        let prims = plx_sema::Primitives::intern(&mut pool);
        assert!(plx_sema::typeck::type_check_module(&mut pool, &mut table, &prims, &mut sink, module), "{:?}", sink.diagnostics);
        fold_module(&mut pool, &mut table, module);
        pool
    }

    #[test]
    fn const_folds_to_literal_and_collapses_to_nop() {
        let pool = fold_source("const a = 1 + 2;");
        let module = pool_module(&pool);
        let def = pool.children(module)[0];
        assert_eq!(pool.kind(def), NodeKind::Nop);
    }

    #[test]
    fn if_with_literal_condition_collapses_to_chosen_branch() {
        let pool = fold_source("func f() -> s32 { if true { return 1; } else { return 2; } }");
        let func = pool.children(pool_module(&pool))[0];
        let body = pool.child(func, 3).unwrap();
        let stmt = pool.children(body)[0];
        assert_eq!(pool.kind(stmt), NodeKind::Return);
        let value = pool.child(stmt, 0).unwrap();
        assert_eq!(pool.get(value).payload, Payload::SignedInt(1));
    }

    #[test]
    fn signed_overflow_is_guarded_at_the_bounds_of_i64() {
        assert_eq!(signed_arithmetic(NodeKind::Add, i64::MAX, 1), None);
        assert_eq!(signed_arithmetic(NodeKind::Sub, i64::MIN, 1), None);
        assert_eq!(signed_arithmetic(NodeKind::Add, 1, 2), Some(3));
    }

    #[test]
    fn division_by_zero_skips_the_rewrite_instead_of_panicking() {
        assert_eq!(signed_arithmetic(NodeKind::Div, 10, 0), None);
        assert_eq!(unsigned_arithmetic(NodeKind::Rem, 10, 0), None);
    }

    #[test]
    fn negation_of_i64_min_is_guarded() {
        let pool = fold_source("const a = 1 - 2;");
        let module = pool_module(&pool);
        assert_eq!(pool.kind(pool.children(module)[0]), NodeKind::Nop);
    }

    fn pool_module(pool: &Pool) -> NodeId {
        (0..pool.len()).map(|i| NodeId(u32::try_from(i).unwrap())).find(|&id| pool.kind(id) == NodeKind::Module).expect("module node present")
    }
}
