//! Name resolution: links identifier nodes to their declarations.

use crate::errors::SemaError;
use crate::symbol_table::{Mutability, Scope, SymbolTable};
use plx_ast::{kind::NodeKind, NodeId, Payload, Pool};
use plx_diagnostics::DiagnosticSink;

/// Walks the module recursively, returning whether every identifier
/// resolved cleanly. Module resolution is a two-pass visit: every top-level
/// name is declared first (so forward references and mutual recursion work
/// at module scope), then each definition's body is resolved.
pub fn resolve_module(pool: &mut Pool, table: &mut SymbolTable, sink: &mut dyn DiagnosticSink, module: NodeId) -> bool {
    let defs = pool.children(module).to_vec();

    for &def in &defs {
        declare_definition_name(pool, table, sink, def);
    }

    let mut ok = true;
    for &def in &defs {
        ok &= resolve_definition_body(pool, table, sink, def);
    }
    ok
}

fn declare_definition_name(pool: &mut Pool, table: &mut SymbolTable, sink: &mut dyn DiagnosticSink, def: NodeId) {
    let mutability = match pool.kind(def) {
        NodeKind::ConstDef | NodeKind::FuncDef | NodeKind::StructDef => Mutability::Const,
        NodeKind::VarDef | NodeKind::VarDecl => Mutability::Var,
        _ => return,
    };
    let name_node = pool.child(def, 0).expect("definition's first child is its name");
    declare_name(pool, table, sink, name_node, Scope::Global, mutability);
}

fn declare_name(pool: &mut Pool, table: &mut SymbolTable, sink: &mut dyn DiagnosticSink, name_node: NodeId, scope: Scope, mutability: Mutability) {
    let name = pool.get(name_node).ident_name().expect("name position holds an identifier").to_string();
    let location = pool.get(name_node).location.clone();
    match table.declare(&name, location.clone(), scope, mutability) {
        Ok(id) => set_entry(pool, name_node, id),
        Err(existing) => {
            let first_location = table.get(existing).location.clone();
            sink.report(
                SemaError::AlreadyDeclared {
                    name,
                    location,
                    first_location,
                }
                .to_diagnostic(),
            );
        }
    }
}

fn set_entry(pool: &mut Pool, node: NodeId, entry: plx_ast::EntryId) {
    if let Payload::Ident { name, .. } = pool.get(node).payload.clone() {
        pool.get_mut(node).payload = Payload::Ident { name, entry: Some(entry) };
    }
}

fn resolve_definition_body(pool: &mut Pool, table: &mut SymbolTable, sink: &mut dyn DiagnosticSink, def: NodeId) -> bool {
    match pool.kind(def) {
        NodeKind::ConstDef | NodeKind::VarDef => {
            let value = pool.child(def, 1).unwrap();
            resolve_node(pool, table, sink, value)
        }
        NodeKind::VarDecl => {
            let ty = pool.child(def, 1).unwrap();
            resolve_node(pool, table, sink, ty)
        }
        NodeKind::StructDef => {
            // Structurally visited: member names are never declared into the
            // enclosing scope, but member type expressions still need their
            // identifiers (references to other types) resolved.
            let members = pool.child(def, 1).unwrap();
            let mut ok = true;
            for member in pool.children(members).to_vec() {
                let ty = pool.child(member, 1).unwrap();
                ok &= resolve_node(pool, table, sink, ty);
            }
            ok
        }
        NodeKind::FuncDef => resolve_func_def(pool, table, sink, def),
        _ => true,
    }
}

fn resolve_func_def(pool: &mut Pool, table: &mut SymbolTable, sink: &mut dyn DiagnosticSink, def: NodeId) -> bool {
    let params = pool.child(def, 1).unwrap();
    let return_type = pool.child(def, 2).unwrap();
    let body = pool.child(def, 3).unwrap();

    table.enter_scope();
    let mut ok = true;
    for param in pool.children(params).to_vec() {
        let name = pool.child(param, 0).unwrap();
        let ty = pool.child(param, 1).unwrap();
        ok &= resolve_node(pool, table, sink, ty);
        declare_name(pool, table, sink, name, Scope::Local, Mutability::Var);
    }
    ok &= resolve_node(pool, table, sink, return_type);
    ok &= resolve_node(pool, table, sink, body);
    table.exit_scope();
    ok
}

/// The generic recursive visitor: resolves identifiers, declares block-local
/// definitions before their own name can be seen in their initializer, and
/// otherwise just walks into every child.
fn resolve_node(pool: &mut Pool, table: &mut SymbolTable, sink: &mut dyn DiagnosticSink, id: NodeId) -> bool {
    match pool.kind(id) {
        NodeKind::Block => {
            table.enter_scope();
            let ok = resolve_block_statements(pool, table, sink, id);
            table.exit_scope();
            ok
        }
        NodeKind::ConstDef | NodeKind::VarDef => {
            let value = pool.child(id, 1).unwrap();
            let ok = resolve_node(pool, table, sink, value);
            let name = pool.child(id, 0).unwrap();
            let mutability = if pool.kind(id) == NodeKind::ConstDef { Mutability::Const } else { Mutability::Var };
            declare_name(pool, table, sink, name, Scope::Local, mutability);
            ok
        }
        NodeKind::VarDecl => {
            let ty = pool.child(id, 1).unwrap();
            let ok = resolve_node(pool, table, sink, ty);
            let name = pool.child(id, 0).unwrap();
            declare_name(pool, table, sink, name, Scope::Local, Mutability::Var);
            ok
        }
        NodeKind::Ident | NodeKind::TypeName => {
            let name = pool.get(id).ident_name().unwrap().to_string();
            match table.lookup(&name) {
                Some(entry) => {
                    set_entry(pool, id, entry);
                    true
                }
                None => {
                    let location = pool.get(id).location.clone();
                    sink.report(SemaError::UndeclaredIdentifier { name, location }.to_diagnostic());
                    false
                }
            }
        }
        NodeKind::Field => {
            // The subject is a use site; the field name is a structural tag,
            // never an identifier to look up on its own.
            let subject = pool.child(id, 0).unwrap();
            resolve_node(pool, table, sink, subject)
        }
        NodeKind::StructLiteral => {
            let struct_name = pool.child(id, 0).unwrap();
            let mut ok = resolve_node(pool, table, sink, struct_name);
            let inits = pool.child(id, 1).unwrap();
            for field_init in pool.children(inits).to_vec() {
                let value = pool.child(field_init, 1).unwrap();
                ok &= resolve_node(pool, table, sink, value);
            }
            ok
        }
        _ => {
            let mut ok = true;
            for child in pool.children(id).to_vec() {
                ok &= resolve_node(pool, table, sink, child);
            }
            ok
        }
    }
}

fn resolve_block_statements(pool: &mut Pool, table: &mut SymbolTable, sink: &mut dyn DiagnosticSink, block: NodeId) -> bool {
    let mut ok = true;
    for stmt in pool.children(block).to_vec() {
        ok &= resolve_node(pool, table, sink, stmt);
    }
    ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use plx_diagnostics::CollectingSink;
    use plx_parser::parse_program;

    fn resolve(src: &str) -> (bool, Vec<plx_diagnostics::Diagnostic>) {
        let mut pool = Pool::new();
        let mut sink = CollectingSink::default();
        let (module, parse_ok) = parse_program(&mut pool, &mut sink, &[("t.plx".into(), src.as_bytes().to_vec())]);
        assert!(parse_ok, "unexpected parse failure: {:?}", sink.diagnostics);
        let mut table = SymbolTable::new();
        let ok = resolve_module(&mut pool, &mut table, &mut sink, module);
        (ok, sink.diagnostics)
    }

    #[test]
    fn undeclared_identifier_is_reported() {
        let (ok, diags) = resolve("func f() -> s32 { return x; }");
        assert!(!ok);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("undeclared identifier"));
    }

    #[test]
    fn duplicate_top_level_declaration_is_reported() {
        let (ok, diags) = resolve("const a = 1; const a = 2;");
        assert!(!ok);
        assert!(diags[0].message.contains("already declared"));
        assert!(diags[0].secondary.is_some());
    }

    #[test]
    fn forward_reference_between_functions_resolves() {
        let (ok, _) = resolve("func a() -> s32 { return b(); } func b() -> s32 { return 1; }");
        assert!(ok);
    }

    #[test]
    fn initializer_cannot_see_its_own_name() {
        let (ok, diags) = resolve("func f() -> s32 { var x = x; return 0; }");
        assert!(!ok);
        assert!(diags[0].message.contains("undeclared identifier"));
    }

    #[test]
    fn parameter_shadows_outer_const() {
        let (ok, _) = resolve("const x = 1; func f(x: s32) -> s32 { return x; }");
        assert!(ok);
    }
}
