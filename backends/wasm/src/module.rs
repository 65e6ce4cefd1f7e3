//! Assembles the section sequence of a binary module: preamble, type,
//! function, code. Each section's payload is written to a scratch buffer
//! first so its byte length is known before the section header (id + LEB128
//! size) is written to the real output.

use crate::leb::write_u32;
use crate::valtype::ValType;

const MAGIC: [u8; 4] = *b"\0asm";
const VERSION: [u8; 4] = [0x01, 0x00, 0x00, 0x00];

const SECTION_TYPE: u8 = 1;
const SECTION_FUNCTION: u8 = 3;
const SECTION_CODE: u8 = 10;

pub struct FuncType {
    pub params: Vec<ValType>,
    pub results: Vec<ValType>,
}

#[derive(Default)]
pub struct ModuleBuilder {
    types: Vec<FuncType>,
    func_type_indices: Vec<u32>,
    code_bodies: Vec<Vec<u8>>,
}

impl ModuleBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a function type, returning its index. Types aren't
    /// deduplicated: one function type per function definition, in module
    /// order, exactly as the type section lists them.
    pub fn add_type(&mut self, params: Vec<ValType>, results: Vec<ValType>) -> u32 {
        let idx = u32::try_from(self.types.len()).expect("more function types than fit in u32");
        self.types.push(FuncType { params, results });
        idx
    }

    /// Registers a function body under a previously added type, returning
    /// its function index.
    pub fn add_function(&mut self, type_idx: u32, locals: Vec<ValType>, body: Vec<u8>) -> u32 {
        let idx = u32::try_from(self.func_type_indices.len()).expect("more functions than fit in u32");
        self.func_type_indices.push(type_idx);
        self.code_bodies.push(encode_function_body(&locals, &body));
        idx
    }

    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&VERSION);
        write_section(&mut out, SECTION_TYPE, &self.type_section_payload());
        write_section(&mut out, SECTION_FUNCTION, &self.function_section_payload());
        write_section(&mut out, SECTION_CODE, &self.code_section_payload());
        out
    }

    fn type_section_payload(&self) -> Vec<u8> {
        let mut payload = Vec::new();
        write_u32(&mut payload, u32::try_from(self.types.len()).unwrap());
        for ty in &self.types {
            payload.push(0x60); // func type tag
            write_u32(&mut payload, u32::try_from(ty.params.len()).unwrap());
            for p in &ty.params {
                payload.push(p.byte());
            }
            write_u32(&mut payload, u32::try_from(ty.results.len()).unwrap());
            for r in &ty.results {
                payload.push(r.byte());
            }
        }
        payload
    }

    fn function_section_payload(&self) -> Vec<u8> {
        let mut payload = Vec::new();
        write_u32(&mut payload, u32::try_from(self.func_type_indices.len()).unwrap());
        for &idx in &self.func_type_indices {
            write_u32(&mut payload, idx);
        }
        payload
    }

    fn code_section_payload(&self) -> Vec<u8> {
        let mut payload = Vec::new();
        write_u32(&mut payload, u32::try_from(self.code_bodies.len()).unwrap());
        for body in &self.code_bodies {
            write_u32(&mut payload, u32::try_from(body.len()).unwrap());
            payload.extend_from_slice(body);
        }
        payload
    }
}

/// One run per local rather than a maximally compacted run-length table:
/// simpler to generate, and still a valid Wasm locals vector.
fn encode_function_body(locals: &[ValType], instructions: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    write_u32(&mut body, u32::try_from(locals.len()).unwrap());
    for local in locals {
        write_u32(&mut body, 1);
        body.push(local.byte());
    }
    body.extend_from_slice(instructions);
    body.push(crate::opcodes::END);
    body
}

fn write_section(out: &mut Vec<u8>, id: u8, payload: &[u8]) {
    out.push(id);
    write_u32(out, u32::try_from(payload.len()).unwrap());
    out.extend_from_slice(payload);
}
