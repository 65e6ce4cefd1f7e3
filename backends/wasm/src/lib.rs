//! Binary WebAssembly back-end.
//!
//! Produces a minimal core v1 module: a type section, a function section,
//! and a code section, with no memory, table, or export section. Anything
//! that would require linear memory is rejected with [`NotSupported`]
//! rather than miscompiled.

pub mod codegen;
pub mod errors;
pub mod leb;
pub mod module;
pub mod opcodes;
pub mod valtype;

use plx_ast::{NodeId, Pool};

pub use errors::NotSupported;

/// Lowers every function definition in `module` into a binary Wasm module.
pub fn codegen_module(pool: &Pool, module: NodeId) -> Result<Vec<u8>, NotSupported> {
    codegen::codegen_module(pool, module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plx_diagnostics::CollectingSink;
    use plx_ast::Pool;

    fn wasm_for(src: &str) -> Vec<u8> {
        let mut pool = Pool::new();
        let mut sink = CollectingSink::default();
        let (module, parse_ok) = plx_parser::parse_program(&mut pool, &mut sink, &[("t.plx".into(), src.as_bytes().to_vec())]);
        assert!(parse_ok, "{:?}", sink.diagnostics);
        let (mut table, _prims) = plx_sema::analyze(&mut pool, &mut sink, module).unwrap_or_else(|| panic!("{:?}", sink.diagnostics));
        plx_fold::fold_module(&mut pool, &mut table, module);
        assert!(plx_fold::validate_module(&pool, &mut sink, module), "{:?}", sink.diagnostics);
        codegen_module(&pool, module).unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn preamble_and_magic_are_correct() {
        let bytes = wasm_for("func main() -> s32 { return 1 + 2; }");
        assert_eq!(&bytes[0..4], b"\0asm");
        assert_eq!(&bytes[4..8], &[0x01, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn section_ids_appear_in_order() {
        let bytes = wasm_for("func main() -> s32 { return 1 + 2; }");
        // type (1), function (3), code (10), each written once, in order.
        let ids: Vec<u8> = {
            let mut i = 8;
            let mut out = Vec::new();
            while i < bytes.len() {
                out.push(bytes[i]);
                i += 1;
                let mut len = 0u64;
                let mut shift = 0;
                loop {
                    let b = bytes[i];
                    i += 1;
                    len |= u64::from(b & 0x7F) << shift;
                    if b & 0x80 == 0 {
                        break;
                    }
                    shift += 7;
                }
                i += len as usize;
            }
            out
        };
        assert_eq!(ids, vec![1, 3, 10]);
    }

    #[test]
    fn local_variables_round_trip_through_a_wasm_local_slot() {
        let bytes = wasm_for("func f() -> s32 { var n: s32 = 5; n += 1; return n; }");
        assert!(bytes.contains(&crate::opcodes::LOCAL_SET));
        assert!(bytes.contains(&crate::opcodes::LOCAL_GET));
    }

    #[test]
    fn direct_calls_use_the_call_opcode() {
        let bytes = wasm_for("func a() -> s32 { return b(); } func b() -> s32 { return 1; }");
        assert!(bytes.contains(&crate::opcodes::CALL));
    }

    #[test]
    fn slice_expression_reports_not_supported_instead_of_panicking() {
        // Field access is rejected earlier, by the type checker itself
        // (it never gets as far as codegen); a sub-slice is fully typed and
        // folded but still needs linear memory this back-end doesn't
        // allocate, so it's the construct that actually exercises codegen's
        // own graceful-failure path.
        let mut pool = Pool::new();
        let mut sink = CollectingSink::default();
        let src = "func f(a: []s32) -> s32 { return a[1:3]; }";
        let (module, parse_ok) = plx_parser::parse_program(&mut pool, &mut sink, &[("t.plx".into(), src.as_bytes().to_vec())]);
        assert!(parse_ok, "{:?}", sink.diagnostics);
        let (mut table, _prims) = plx_sema::analyze(&mut pool, &mut sink, module).unwrap_or_else(|| panic!("{:?}", sink.diagnostics));
        plx_fold::fold_module(&mut pool, &mut table, module);
        assert!(plx_fold::validate_module(&pool, &mut sink, module), "{:?}", sink.diagnostics);
        assert!(codegen_module(&pool, module).is_err());
    }
}
