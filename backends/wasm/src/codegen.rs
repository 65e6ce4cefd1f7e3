//! Lowers a checked, folded tree into function bodies of raw instruction
//! bytes plus the type/function declarations that frame them.
//!
//! Expressions push their value; statements drive control flow. Anything
//! needing linear memory — field access, struct literals, references,
//! indexing, and assignment through anything but a plain local — reports
//! [`NotSupported`] instead of emitting a wrong answer.

use std::collections::HashMap;

use plx_ast::{kind::NodeKind, EntryId, NodeId, Payload, Pool};

use crate::errors::NotSupported;
use crate::leb::{write_i32, write_i64, write_u32};
use crate::module::ModuleBuilder;
use crate::opcodes::*;
use crate::valtype::{is_unsigned, value_type, ValType};

/// Label kinds pushed as control constructs are entered; `break` targets the
/// nearest `Block`, `continue` the nearest `Loop`, searching from the top.
enum Label {
    Block,
    Loop,
}

struct FunctionCompiler<'a> {
    pool: &'a Pool,
    functions: &'a HashMap<EntryId, u32>,
    locals: HashMap<EntryId, u32>,
    local_types: Vec<ValType>,
    labels: Vec<Label>,
}

impl<'a> FunctionCompiler<'a> {
    fn break_depth(&self) -> Result<u32, NotSupported> {
        self.labels
            .iter()
            .rev()
            .position(|l| matches!(l, Label::Block))
            .map(|i| i as u32)
            .ok_or_else(|| NotSupported::new("`break` outside a loop"))
    }

    fn continue_depth(&self) -> Result<u32, NotSupported> {
        self.labels
            .iter()
            .rev()
            .position(|l| matches!(l, Label::Loop))
            .map(|i| i as u32)
            .ok_or_else(|| NotSupported::new("`continue` outside a loop"))
    }

    fn lower_stmt(&mut self, out: &mut Vec<u8>, id: NodeId) -> Result<(), NotSupported> {
        match self.pool.kind(id) {
            NodeKind::Nop => Ok(()),

            NodeKind::Block => {
                for &stmt in self.pool.children(id) {
                    self.lower_stmt(out, stmt)?;
                }
                Ok(())
            }

            NodeKind::ConstDef | NodeKind::VarDef => {
                let name_node = self.pool.child(id, 0).unwrap();
                let value = self.pool.child(id, 1).unwrap();
                // The statement itself is typed `void`; the declared name
                // carries the local's actual type.
                let ty = self.pool.type_of(name_node).expect("local is typed before codegen runs");
                let idx = self.declare_local(name_node, ty)?;
                self.lower_expr(out, value)?;
                out.push(LOCAL_SET);
                write_u32(out, idx);
                Ok(())
            }

            NodeKind::VarDecl => {
                let name_node = self.pool.child(id, 0).unwrap();
                let ty = self.pool.type_of(name_node).expect("local is typed before codegen runs");
                // Wasm locals are zero-initialized; a bare `var x: T;` needs
                // no instructions at all once it has a slot.
                self.declare_local(name_node, ty)?;
                Ok(())
            }

            NodeKind::If => self.lower_if(out, id),
            NodeKind::Loop => self.lower_loop(out, id),
            NodeKind::While => self.lower_while(out, id),

            NodeKind::Continue => {
                out.push(BR);
                write_u32(out, self.continue_depth()?);
                Ok(())
            }

            NodeKind::Break => {
                out.push(BR);
                write_u32(out, self.break_depth()?);
                Ok(())
            }

            NodeKind::Return => {
                if let Some(&value) = self.pool.children(id).first() {
                    self.lower_expr(out, value)?;
                }
                out.push(RETURN);
                Ok(())
            }

            NodeKind::Assign => {
                let target = self.pool.child(id, 0).unwrap();
                let value = self.pool.child(id, 1).unwrap();
                let idx = self.local_index_of(target)?;
                self.lower_expr(out, value)?;
                out.push(LOCAL_SET);
                write_u32(out, idx);
                Ok(())
            }

            NodeKind::AssignAdd | NodeKind::AssignSub | NodeKind::AssignMul | NodeKind::AssignDiv | NodeKind::AssignRem | NodeKind::AssignLShift | NodeKind::AssignRShift => {
                let target = self.pool.child(id, 0).unwrap();
                let value = self.pool.child(id, 1).unwrap();
                let ty = self.pool.type_of(target).expect("compound assign target is typed");
                let idx = self.local_index_of(target)?;
                out.push(LOCAL_GET);
                write_u32(out, idx);
                self.lower_expr(out, value)?;
                out.push(self.binary_opcode_for_compound(self.pool.kind(id), ty)?);
                out.push(LOCAL_SET);
                write_u32(out, idx);
                Ok(())
            }

            _ => {
                self.lower_expr(out, id)?;
                Ok(())
            }
        }
    }

    fn declare_local(&mut self, name_node: NodeId, ty: NodeId) -> Result<u32, NotSupported> {
        let value_ty = value_type(self.pool, ty)?;
        let idx = u32::try_from(self.locals.len()).expect("more locals than fit in u32");
        self.local_types.push(value_ty);
        if let Some(entry) = self.pool.get(name_node).ident_entry() {
            self.locals.insert(entry, idx);
        }
        Ok(idx)
    }

    fn local_index_of(&self, id: NodeId) -> Result<u32, NotSupported> {
        if self.pool.kind(id) != NodeKind::Ident {
            return Err(NotSupported::new("assignment through anything but a plain local"));
        }
        let entry = self.pool.get(id).ident_entry().expect("resolved identifier carries an entry");
        self.locals.get(&entry).copied().ok_or_else(|| NotSupported::new("assignment to a non-local identifier"))
    }

    fn lower_if(&mut self, out: &mut Vec<u8>, id: NodeId) -> Result<(), NotSupported> {
        let cond = self.pool.child(id, 0).unwrap();
        let then_block = self.pool.child(id, 1).unwrap();
        let else_branch = self.pool.child(id, 2).unwrap();

        self.lower_expr(out, cond)?;
        out.push(IF);
        out.push(BLOCKTYPE_EMPTY);
        self.labels.push(Label::Block);
        self.lower_stmt(out, then_block)?;
        if self.pool.kind(else_branch) != NodeKind::Nop {
            out.push(ELSE);
            self.lower_stmt(out, else_branch)?;
        }
        self.labels.pop();
        out.push(END);
        Ok(())
    }

    fn lower_loop(&mut self, out: &mut Vec<u8>, id: NodeId) -> Result<(), NotSupported> {
        let body = self.pool.child(id, 0).unwrap();
        out.push(BLOCK);
        out.push(BLOCKTYPE_EMPTY);
        self.labels.push(Label::Block);
        out.push(LOOP);
        out.push(BLOCKTYPE_EMPTY);
        self.labels.push(Label::Loop);
        self.lower_stmt(out, body)?;
        out.push(BR);
        write_u32(out, 0); // repeat unconditionally; `break` is the only exit
        self.labels.pop();
        out.push(END);
        self.labels.pop();
        out.push(END);
        Ok(())
    }

    fn lower_while(&mut self, out: &mut Vec<u8>, id: NodeId) -> Result<(), NotSupported> {
        let cond = self.pool.child(id, 0).unwrap();
        let body = self.pool.child(id, 1).unwrap();
        out.push(BLOCK);
        out.push(BLOCKTYPE_EMPTY);
        self.labels.push(Label::Block);
        out.push(LOOP);
        out.push(BLOCKTYPE_EMPTY);
        self.labels.push(Label::Loop);

        self.lower_expr(out, cond)?;
        out.push(I32_EQZ);
        out.push(BR_IF);
        write_u32(out, 1); // condition false: exit through the wrapping block

        self.lower_stmt(out, body)?;
        out.push(BR);
        write_u32(out, 0); // repeat: re-test the condition

        self.labels.pop();
        out.push(END);
        self.labels.pop();
        out.push(END);
        Ok(())
    }

    fn lower_expr(&mut self, out: &mut Vec<u8>, id: NodeId) -> Result<(), NotSupported> {
        let kind = self.pool.kind(id);
        if kind.is_literal() {
            return self.lower_literal(out, id);
        }
        match kind {
            NodeKind::Ident => {
                let entry = self.pool.get(id).ident_entry().expect("resolved identifier carries an entry");
                let idx = self.locals.get(&entry).copied().ok_or_else(|| NotSupported::new("reference to a non-local identifier"))?;
                out.push(LOCAL_GET);
                write_u32(out, idx);
                Ok(())
            }

            NodeKind::Not => {
                let operand = self.pool.child(id, 0).unwrap();
                let ty = self.pool.type_of(id).expect("`!` is typed before codegen runs");
                self.lower_expr(out, operand)?;
                match value_type(self.pool, ty)? {
                    ValType::I32 => {
                        write_i32(out, -1);
                        out.push(I32_XOR);
                    }
                    ValType::I64 => {
                        write_i64(out, -1);
                        out.push(I64_XOR);
                    }
                    _ => return Err(NotSupported::new("`!` on a non-integer, non-bool type")),
                }
                Ok(())
            }

            NodeKind::Neg => {
                let operand = self.pool.child(id, 0).unwrap();
                let ty = self.pool.type_of(id).expect("negation is typed before codegen runs");
                match value_type(self.pool, ty)? {
                    ValType::I32 => {
                        write_i32(out, 0);
                        self.lower_expr(out, operand)?;
                        out.push(I32_SUB);
                    }
                    ValType::I64 => {
                        write_i64(out, 0);
                        self.lower_expr(out, operand)?;
                        out.push(I64_SUB);
                    }
                    ValType::F32 => {
                        self.lower_expr(out, operand)?;
                        out.push(F32_NEG);
                    }
                    ValType::F64 => {
                        self.lower_expr(out, operand)?;
                        out.push(F64_NEG);
                    }
                }
                Ok(())
            }

            NodeKind::And | NodeKind::Or | NodeKind::Xor | NodeKind::Eq | NodeKind::Neq | NodeKind::Lt | NodeKind::Lte | NodeKind::Gt | NodeKind::Gte | NodeKind::Add | NodeKind::Sub | NodeKind::Mul | NodeKind::Div | NodeKind::Rem | NodeKind::LShift | NodeKind::RShift => self.lower_binary(out, id),

            NodeKind::Call => self.lower_call(out, id),

            NodeKind::Ref | NodeKind::Deref | NodeKind::Index | NodeKind::Slice | NodeKind::Field | NodeKind::StructLiteral => Err(NotSupported::new(format!("{kind:?} requires linear memory, which this back-end does not yet allocate"))),

            other => Err(NotSupported::new(format!("{other:?} cannot appear in expression position"))),
        }
    }

    fn lower_literal(&self, out: &mut Vec<u8>, id: NodeId) -> Result<(), NotSupported> {
        let ty = self.pool.type_of(id).expect("literal is typed before codegen runs");
        let value_ty = value_type(self.pool, ty)?;
        match (&self.pool.get(id).payload, value_ty) {
            (Payload::SignedInt(v), ValType::I32) => {
                out.push(I32_CONST);
                write_i32(out, *v as i32);
            }
            (Payload::SignedInt(v), ValType::I64) => {
                out.push(I64_CONST);
                write_i64(out, *v);
            }
            (Payload::UnsignedInt(v), ValType::I32) => {
                out.push(I32_CONST);
                write_i32(out, *v as i32);
            }
            (Payload::UnsignedInt(v), ValType::I64) => {
                out.push(I64_CONST);
                write_i64(out, *v as i64);
            }
            (Payload::Bool(b), ValType::I32) => {
                out.push(I32_CONST);
                write_i32(out, i32::from(*b));
            }
            (Payload::Float(v), ValType::F32) => {
                out.push(F32_CONST);
                out.extend_from_slice(&(*v as f32).to_le_bytes());
            }
            (Payload::Float(v), ValType::F64) => {
                out.push(F64_CONST);
                out.extend_from_slice(&v.to_le_bytes());
            }
            (payload, _) => return Err(NotSupported::new(format!("literal payload {payload:?} does not match its checked type"))),
        }
        Ok(())
    }

    fn lower_binary(&mut self, out: &mut Vec<u8>, id: NodeId) -> Result<(), NotSupported> {
        let left = self.pool.child(id, 0).unwrap();
        let right = self.pool.child(id, 1).unwrap();
        let operand_ty = self.pool.type_of(left).expect("binary operand is typed before codegen runs");
        self.lower_expr(out, left)?;
        self.lower_expr(out, right)?;
        out.push(self.binary_opcode(self.pool.kind(id), operand_ty)?);
        Ok(())
    }

    fn binary_opcode(&self, op: NodeKind, operand_ty: NodeId) -> Result<u8, NotSupported> {
        let vt = value_type(self.pool, operand_ty)?;
        let unsigned = is_unsigned(self.pool, operand_ty);
        Ok(match (op, vt) {
            (NodeKind::Add, ValType::I32) => I32_ADD,
            (NodeKind::Add, ValType::I64) => I64_ADD,
            (NodeKind::Add, ValType::F32) => F32_ADD,
            (NodeKind::Add, ValType::F64) => F64_ADD,
            (NodeKind::Sub, ValType::I32) => I32_SUB,
            (NodeKind::Sub, ValType::I64) => I64_SUB,
            (NodeKind::Sub, ValType::F32) => F32_SUB,
            (NodeKind::Sub, ValType::F64) => F64_SUB,
            (NodeKind::Mul, ValType::I32) => I32_MUL,
            (NodeKind::Mul, ValType::I64) => I64_MUL,
            (NodeKind::Mul, ValType::F32) => F32_MUL,
            (NodeKind::Mul, ValType::F64) => F64_MUL,
            (NodeKind::Div, ValType::I32) if unsigned => I32_DIV_U,
            (NodeKind::Div, ValType::I32) => I32_DIV_S,
            (NodeKind::Div, ValType::I64) if unsigned => I64_DIV_U,
            (NodeKind::Div, ValType::I64) => I64_DIV_S,
            (NodeKind::Div, ValType::F32) => F32_DIV,
            (NodeKind::Div, ValType::F64) => F64_DIV,
            (NodeKind::Rem, ValType::I32) if unsigned => I32_REM_U,
            (NodeKind::Rem, ValType::I32) => I32_REM_S,
            (NodeKind::Rem, ValType::I64) if unsigned => I64_REM_U,
            (NodeKind::Rem, ValType::I64) => I64_REM_S,
            (NodeKind::And, ValType::I32) => I32_AND,
            (NodeKind::And, ValType::I64) => I64_AND,
            (NodeKind::Or, ValType::I32) => I32_OR,
            (NodeKind::Or, ValType::I64) => I64_OR,
            (NodeKind::Xor, ValType::I32) => I32_XOR,
            (NodeKind::Xor, ValType::I64) => I64_XOR,
            (NodeKind::LShift, ValType::I32) => I32_SHL,
            (NodeKind::LShift, ValType::I64) => I64_SHL,
            (NodeKind::RShift, ValType::I32) if unsigned => I32_SHR_U,
            (NodeKind::RShift, ValType::I32) => I32_SHR_S,
            (NodeKind::RShift, ValType::I64) if unsigned => I64_SHR_U,
            (NodeKind::RShift, ValType::I64) => I64_SHR_S,
            (NodeKind::Eq, ValType::I32) => I32_EQ,
            (NodeKind::Eq, ValType::I64) => I64_EQ,
            (NodeKind::Eq, ValType::F32) => F32_EQ,
            (NodeKind::Eq, ValType::F64) => F64_EQ,
            (NodeKind::Neq, ValType::I32) => I32_NE,
            (NodeKind::Neq, ValType::I64) => I64_NE,
            (NodeKind::Neq, ValType::F32) => F32_NE,
            (NodeKind::Neq, ValType::F64) => F64_NE,
            (NodeKind::Lt, ValType::I32) if unsigned => I32_LT_U,
            (NodeKind::Lt, ValType::I32) => I32_LT_S,
            (NodeKind::Lt, ValType::I64) if unsigned => I64_LT_U,
            (NodeKind::Lt, ValType::I64) => I64_LT_S,
            (NodeKind::Lt, ValType::F32) => F32_LT,
            (NodeKind::Lt, ValType::F64) => F64_LT,
            (NodeKind::Lte, ValType::I32) if unsigned => I32_LE_U,
            (NodeKind::Lte, ValType::I32) => I32_LE_S,
            (NodeKind::Lte, ValType::I64) if unsigned => I64_LE_U,
            (NodeKind::Lte, ValType::I64) => I64_LE_S,
            (NodeKind::Lte, ValType::F32) => F32_LE,
            (NodeKind::Lte, ValType::F64) => F64_LE,
            (NodeKind::Gt, ValType::I32) if unsigned => I32_GT_U,
            (NodeKind::Gt, ValType::I32) => I32_GT_S,
            (NodeKind::Gt, ValType::I64) if unsigned => I64_GT_U,
            (NodeKind::Gt, ValType::I64) => I64_GT_S,
            (NodeKind::Gt, ValType::F32) => F32_GT,
            (NodeKind::Gt, ValType::F64) => F64_GT,
            (NodeKind::Gte, ValType::I32) if unsigned => I32_GE_U,
            (NodeKind::Gte, ValType::I32) => I32_GE_S,
            (NodeKind::Gte, ValType::I64) if unsigned => I64_GE_U,
            (NodeKind::Gte, ValType::I64) => I64_GE_S,
            (NodeKind::Gte, ValType::F32) => F32_GE,
            (NodeKind::Gte, ValType::F64) => F64_GE,
            (op, vt) => return Err(NotSupported::new(format!("no {vt:?} opcode for {op:?}"))),
        })
    }

    fn binary_opcode_for_compound(&self, op: NodeKind, ty: NodeId) -> Result<u8, NotSupported> {
        let arithmetic_op = match op {
            NodeKind::AssignAdd => NodeKind::Add,
            NodeKind::AssignSub => NodeKind::Sub,
            NodeKind::AssignMul => NodeKind::Mul,
            NodeKind::AssignDiv => NodeKind::Div,
            NodeKind::AssignRem => NodeKind::Rem,
            NodeKind::AssignLShift => NodeKind::LShift,
            NodeKind::AssignRShift => NodeKind::RShift,
            _ => unreachable!(),
        };
        self.binary_opcode(arithmetic_op, ty)
    }

    fn lower_call(&mut self, out: &mut Vec<u8>, id: NodeId) -> Result<(), NotSupported> {
        let callee = self.pool.child(id, 0).unwrap();
        let args_node = self.pool.child(id, 1).unwrap();
        if self.pool.kind(callee) != NodeKind::Ident {
            return Err(NotSupported::new("indirect calls (no table section is emitted)"));
        }
        let entry = self.pool.get(callee).ident_entry().expect("resolved call target carries an entry");
        let func_idx = *self.functions.get(&entry).ok_or_else(|| NotSupported::new("call to a function with no Wasm declaration"))?;
        for &arg in self.pool.children(args_node) {
            self.lower_expr(out, arg)?;
        }
        out.push(CALL);
        write_u32(out, func_idx);
        Ok(())
    }
}

/// Lowers every function definition in `module` into a binary Wasm module.
pub fn codegen_module(pool: &Pool, module: NodeId) -> Result<Vec<u8>, NotSupported> {
    let mut builder = ModuleBuilder::new();
    let mut functions = HashMap::new();

    let func_defs: Vec<NodeId> = pool.children(module).iter().copied().filter(|&d| pool.kind(d) == NodeKind::FuncDef).collect();

    // Every function gets its Wasm function index before any body is
    // lowered, so forward and mutually recursive calls resolve.
    for (i, &def) in func_defs.iter().enumerate() {
        let name_node = pool.child(def, 0).unwrap();
        if let Some(entry) = pool.get(name_node).ident_entry() {
            functions.insert(entry, u32::try_from(i).unwrap());
        }
    }

    for &def in &func_defs {
        let func_ty = pool.type_of(def).expect("function signature is synthesized before codegen runs");
        let params_node = pool.child(func_ty, 0).unwrap();
        let param_types_ast: Vec<NodeId> = pool.children(params_node).to_vec();
        let params: Vec<ValType> = param_types_ast.iter().map(|&t| value_type(pool, t)).collect::<Result<_, _>>()?;
        let return_type = pool.child(func_ty, 1).unwrap();
        let results = if pool.kind(return_type) == NodeKind::TypeVoid { vec![] } else { vec![value_type(pool, return_type)?] };
        let type_idx = builder.add_type(params.clone(), results);

        let mut fc = FunctionCompiler {
            pool,
            functions: &functions,
            locals: HashMap::new(),
            local_types: Vec::new(),
            labels: Vec::new(),
        };
        let param_list = pool.child(def, 1).unwrap();
        for (i, &param) in pool.children(param_list).iter().enumerate() {
            let pname = pool.child(param, 0).unwrap();
            if let Some(entry) = pool.get(pname).ident_entry() {
                fc.locals.insert(entry, u32::try_from(i).unwrap());
            }
        }

        let mut body = Vec::new();
        fc.lower_stmt(&mut body, pool.child(def, 3).unwrap())?;
        let extra_locals = fc.local_types;
        builder.add_function(type_idx, extra_locals, body);
    }

    Ok(builder.finish())
}
