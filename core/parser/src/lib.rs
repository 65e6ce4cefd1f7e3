//! Recursive-descent parser: token stream → tree IR.

pub mod parser;
pub mod stream;

pub use parser::Parser;

use plx_ast::{kind::NodeKind, Location, NodeId, Payload, Pool};
use plx_diagnostics::DiagnosticSink;

/// Parses every `.plx` source file and concatenates their top-level
/// definitions into one synthetic module node, the unit every later stage
/// operates on. Returns the module id and whether every file parsed
/// cleanly.
pub fn parse_program(pool: &mut Pool, sink: &mut dyn DiagnosticSink, files: &[(String, Vec<u8>)]) -> (NodeId, bool) {
    let mut defs = Vec::new();
    let mut ok = true;
    for (filename, source) in files {
        let mut parser = Parser::new(filename.clone(), source.clone(), pool, sink);
        let (file_defs, file_ok) = parser.parse_definitions(sink);
        defs.extend(file_defs);
        ok &= file_ok;
    }
    let location = files
        .first()
        .map(|(name, _)| Location::new(name.clone(), 1, 1, 0))
        .unwrap_or_else(|| Location::new("<empty>", 1, 1, 0));
    let module = pool.alloc(NodeKind::Module, Payload::None, defs, location);
    (module, ok)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plx_diagnostics::CollectingSink;

    fn parse_ok(src: &str) -> (Pool, NodeId) {
        let mut pool = Pool::new();
        let mut sink = CollectingSink::default();
        let (module, ok) = parse_program(&mut pool, &mut sink, &[("t.plx".into(), src.as_bytes().to_vec())]);
        assert!(ok, "expected clean parse, got diagnostics: {:?}", sink.diagnostics);
        (pool, module)
    }

    #[test]
    fn hello_addition_parses_to_a_function() {
        let (pool, module) = parse_ok("func main() -> s32 { return 1 + 2; }");
        let defs = pool.children(module);
        assert_eq!(defs.len(), 1);
        assert_eq!(pool.kind(defs[0]), NodeKind::FuncDef);
        let body = pool.child(defs[0], 3).unwrap();
        assert_eq!(pool.kind(body), NodeKind::Block);
        let ret = pool.child(body, 0).unwrap();
        assert_eq!(pool.kind(ret), NodeKind::Return);
        let value = pool.child(ret, 0).unwrap();
        assert_eq!(pool.kind(value), NodeKind::Add);
    }

    #[test]
    fn const_and_var_defs() {
        let (pool, module) = parse_ok("const a = 1; var b: s32; var c = 2;");
        let defs = pool.children(module);
        assert_eq!(pool.kind(defs[0]), NodeKind::ConstDef);
        assert_eq!(pool.kind(defs[1]), NodeKind::VarDecl);
        assert_eq!(pool.kind(defs[2]), NodeKind::VarDef);
    }

    #[test]
    fn struct_def_shape() {
        let (pool, module) = parse_ok("struct Point { x: s32; y: s32; }");
        let def = pool.children(module)[0];
        assert_eq!(pool.kind(def), NodeKind::StructDef);
        let members = pool.child(def, 1).unwrap();
        assert_eq!(pool.children(members).len(), 2);
    }

    #[test]
    fn if_else_chain() {
        let (pool, module) = parse_ok("func k() -> s32 { if false { return 1; } else { return 2; } }");
        let body = pool.child(pool.children(module)[0], 3).unwrap();
        let if_node = pool.child(body, 0).unwrap();
        assert_eq!(pool.kind(if_node), NodeKind::If);
        let else_branch = pool.child(if_node, 2).unwrap();
        assert_eq!(pool.kind(else_branch), NodeKind::Block);
    }

    #[test]
    fn if_condition_does_not_swallow_following_block_as_struct_literal() {
        let (pool, module) = parse_ok("func f(x: bool) -> s32 { if x { return 1; } return 0; }");
        let body = pool.child(pool.children(module)[0], 3).unwrap();
        let if_node = pool.child(body, 0).unwrap();
        assert_eq!(pool.kind(if_node), NodeKind::If);
        let cond = pool.child(if_node, 0).unwrap();
        assert_eq!(pool.kind(cond), NodeKind::Ident);
    }

    #[test]
    fn struct_literal_parses_outside_condition_position() {
        let (pool, module) = parse_ok("func f() -> s32 { var p = Point { x: 1; y: 2; }; return 0; }");
        let body = pool.child(pool.children(module)[0], 3).unwrap();
        let var_def = pool.child(body, 0).unwrap();
        let value = pool.child(var_def, 1).unwrap();
        assert_eq!(pool.kind(value), NodeKind::StructLiteral);
    }

    #[test]
    fn arithmetic_run_is_left_associative() {
        let (pool, module) = parse_ok("func f() -> s32 { return 1 + 2 + 3; }");
        let body = pool.child(pool.children(module)[0], 3).unwrap();
        let ret = pool.child(body, 0).unwrap();
        let top = pool.child(ret, 0).unwrap();
        assert_eq!(pool.kind(top), NodeKind::Add);
        let left = pool.child(top, 0).unwrap();
        assert_eq!(pool.kind(left), NodeKind::Add);
    }

    #[test]
    fn rel_expr_is_non_chainable() {
        // `1 < 2 < 3` must fail to parse: relational is exactly two operands.
        let mut pool = Pool::new();
        let mut sink = CollectingSink::default();
        let (_, ok) = parse_program(&mut pool, &mut sink, &[("t.plx".into(), b"func f() -> bool { return 1 < 2 < 3; }".to_vec())]);
        assert!(!ok);
    }

    #[test]
    fn shift_operator_spelling_parses() {
        let (pool, module) = parse_ok("func f() -> s32 { return 1 <> 2; }");
        let body = pool.child(pool.children(module)[0], 3).unwrap();
        let ret = pool.child(body, 0).unwrap();
        let value = pool.child(ret, 0).unwrap();
        assert_eq!(pool.kind(value), NodeKind::LShift);
    }

    #[test]
    fn array_and_slice_types() {
        let (pool, module) = parse_ok("func f(a: [3] s32, b: [] s32) { }");
        let params = pool.child(pool.children(module)[0], 1).unwrap();
        let a = pool.children(params)[0];
        let a_ty = pool.child(a, 1).unwrap();
        assert_eq!(pool.kind(a_ty), NodeKind::TypeArray);
        let b = pool.children(params)[1];
        let b_ty = pool.child(b, 1).unwrap();
        assert_eq!(pool.kind(b_ty), NodeKind::TypeSlice);
    }

    #[test]
    fn undeclared_syntax_reports_unexpected_token() {
        let mut pool = Pool::new();
        let mut sink = CollectingSink::default();
        let (_, ok) = parse_program(&mut pool, &mut sink, &[("t.plx".into(), b"func f( -> s32 { }".to_vec())]);
        assert!(!ok);
        assert!(sink.had_errors());
    }
}
