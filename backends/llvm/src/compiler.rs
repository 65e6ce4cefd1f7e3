//! Lowers a checked, folded tree into an LLVM module.
//!
//! Every local — parameter or declared variable — lives in a stack slot
//! allocated by `alloca` in the function's entry block; reads go through
//! `load` and writes through `store`. This sidesteps SSA construction
//! entirely and leaves it to the external optimizer invoked after this pass
//! runs, matching how the reference front-end treats its own locals.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use inkwell::basic_block::BasicBlock;
use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::values::{BasicValue, BasicValueEnum, FloatValue, FunctionValue, IntValue, PointerValue};
use inkwell::{AddressSpace, IntPredicate};

use plx_ast::{kind::NodeKind, EntryId, NodeId, Payload, Pool};
use plx_sema::SymbolTable;

use crate::errors::NotSupported;
use crate::types::{basic_type, fn_type_for};

fn is_unsigned(pool: &Pool, ty: NodeId) -> bool {
    matches!(pool.kind(ty), NodeKind::TypeU8 | NodeKind::TypeU16 | NodeKind::TypeU32 | NodeKind::TypeU64)
}

fn is_float(pool: &Pool, ty: NodeId) -> bool {
    matches!(pool.kind(ty), NodeKind::TypeF16 | NodeKind::TypeF32 | NodeKind::TypeF64)
}

/// Maps a compound-assignment kind to the plain binary-operator kind that
/// selects the same opcode, so the per-type opcode tables live in one place
/// and both the compound and non-compound forms read from it.
fn as_binary_op(kind: NodeKind) -> NodeKind {
    match kind {
        NodeKind::AssignAdd => NodeKind::Add,
        NodeKind::AssignSub => NodeKind::Sub,
        NodeKind::AssignMul => NodeKind::Mul,
        NodeKind::AssignDiv => NodeKind::Div,
        NodeKind::AssignRem => NodeKind::Rem,
        NodeKind::AssignLShift => NodeKind::LShift,
        NodeKind::AssignRShift => NodeKind::RShift,
        other => other,
    }
}

/// A loop's entry label (where `continue` branches) and exit label (where
/// `break` branches), pushed on entry to `Loop`/`While` and popped on exit.
type LoopLabels<'ctx> = (BasicBlock<'ctx>, BasicBlock<'ctx>);

pub struct Compiler<'ctx> {
    context: &'ctx Context,
    module: Module<'ctx>,
    builder: Builder<'ctx>,
    locals: RefCell<HashMap<EntryId, PointerValue<'ctx>>>,
    globals: RefCell<HashMap<EntryId, PointerValue<'ctx>>>,
    functions: RefCell<HashMap<EntryId, FunctionValue<'ctx>>>,
    loop_stack: RefCell<Vec<LoopLabels<'ctx>>>,
    unnamed: Cell<u32>,
}

impl<'ctx> Compiler<'ctx> {
    #[must_use]
    pub fn new(context: &'ctx Context, module_name: &str) -> Self {
        Self {
            context,
            module: context.create_module(module_name),
            builder: context.create_builder(),
            locals: RefCell::new(HashMap::new()),
            globals: RefCell::new(HashMap::new()),
            functions: RefCell::new(HashMap::new()),
            loop_stack: RefCell::new(Vec::new()),
            unnamed: Cell::new(0),
        }
    }

    #[must_use]
    pub fn module_ir(&self) -> String {
        self.module.print_to_string().to_string()
    }

    fn next_name(&self) -> String {
        let n = self.unnamed.get();
        self.unnamed.set(n + 1);
        format!("{n}")
    }

    /// Lowers every top-level definition: function signatures and globals
    /// are declared first so forward references resolve, then every
    /// function body is lowered.
    pub fn lower_module(&self, pool: &Pool, table: &mut SymbolTable, module: NodeId) -> Result<(), NotSupported> {
        for &def in pool.children(module) {
            match pool.kind(def) {
                NodeKind::FuncDef => self.declare_function(pool, def)?,
                NodeKind::ConstDef | NodeKind::VarDef | NodeKind::VarDecl => self.declare_global(pool, table, def)?,
                NodeKind::StructDef => {}
                _ => {}
            }
        }
        for &def in pool.children(module) {
            if pool.kind(def) == NodeKind::FuncDef {
                self.lower_function_body(pool, table, def)?;
            }
        }
        Ok(())
    }

    fn declare_function(&self, pool: &Pool, def: NodeId) -> Result<(), NotSupported> {
        let name_node = pool.child(def, 0).unwrap();
        let name = pool.get(name_node).ident_name().unwrap().to_string();
        let func_ty = pool.type_of(def).expect("function signature is synthesized before codegen runs");
        let param_types_node = pool.child(func_ty, 0).unwrap();
        let param_types: Vec<NodeId> = pool.children(param_types_node).to_vec();
        let return_type = pool.child(func_ty, 1).unwrap();

        let fn_type = fn_type_for(self.context, pool, &param_types, return_type, false)?;
        let function = self.module.add_function(&name, fn_type, None);

        if let Some(entry) = pool.get(name_node).ident_entry() {
            self.functions.borrow_mut().insert(entry, function);
        }
        Ok(())
    }

    fn declare_global(&self, pool: &Pool, table: &mut SymbolTable, def: NodeId) -> Result<(), NotSupported> {
        let name_node = pool.child(def, 0).unwrap();
        let name = pool.get(name_node).ident_name().unwrap().to_string();
        let Some(entry) = pool.get(name_node).ident_entry() else { return Ok(()) };
        let ty = pool.type_of(def).expect("globals are typed before codegen runs");
        let llvm_ty = basic_type(self.context, pool, ty)?;
        let global = self.module.add_global(llvm_ty, Some(AddressSpace::default()), &name);

        let initializer = match pool.kind(def) {
            NodeKind::ConstDef | NodeKind::VarDef => {
                let value = pool.child(def, 1).unwrap();
                self.const_literal(pool, value)?
            }
            _ => self.zero_of(llvm_ty),
        };
        global.set_initializer(&initializer);
        if table.get(entry).mutability == plx_sema::symbol_table::Mutability::Const {
            global.set_constant(true);
        }
        self.globals.borrow_mut().insert(entry, global.as_pointer_value());
        Ok(())
    }

    fn zero_of(&self, ty: inkwell::types::BasicTypeEnum<'ctx>) -> BasicValueEnum<'ctx> {
        use inkwell::types::BasicTypeEnum;
        match ty {
            BasicTypeEnum::IntType(t) => t.const_zero().into(),
            BasicTypeEnum::FloatType(t) => t.const_zero().into(),
            BasicTypeEnum::PointerType(t) => t.const_null().into(),
            BasicTypeEnum::ArrayType(t) => t.const_zero().into(),
            BasicTypeEnum::StructType(t) => t.const_zero().into(),
            BasicTypeEnum::VectorType(t) => t.const_zero().into(),
        }
    }

    /// Builds an LLVM constant directly from a literal node, for globals
    /// (which are initialized without any instructions running).
    fn const_literal(&self, pool: &Pool, literal: NodeId) -> Result<BasicValueEnum<'ctx>, NotSupported> {
        let ty = pool.type_of(literal).expect("literal is typed before codegen runs");
        let llvm_ty = basic_type(self.context, pool, ty)?;
        Ok(match (&pool.get(literal).payload, llvm_ty) {
            (Payload::SignedInt(v), inkwell::types::BasicTypeEnum::IntType(t)) => t.const_int(*v as u64, true).into(),
            (Payload::UnsignedInt(v), inkwell::types::BasicTypeEnum::IntType(t)) => t.const_int(*v, false).into(),
            (Payload::Bool(b), inkwell::types::BasicTypeEnum::IntType(t)) => t.const_int(u64::from(*b), false).into(),
            (Payload::Float(v), inkwell::types::BasicTypeEnum::FloatType(t)) => t.const_float(*v).into(),
            (payload, _) => panic!("literal payload {payload:?} does not match its checked type"),
        })
    }

    fn lower_function_body(&self, pool: &Pool, table: &mut SymbolTable, def: NodeId) -> Result<(), NotSupported> {
        let name_node = pool.child(def, 0).unwrap();
        let params = pool.child(def, 1).unwrap();
        let return_type = pool.child(def, 2).unwrap();
        let body = pool.child(def, 3).unwrap();

        let entry_id = pool.get(name_node).ident_entry().unwrap();
        let function = self.functions.borrow()[&entry_id];

        let entry_block = self.context.append_basic_block(function, "entry");
        self.builder.position_at_end(entry_block);

        self.locals.borrow_mut().clear();
        for (i, &param) in pool.children(params).iter().enumerate() {
            let pname = pool.child(param, 0).unwrap();
            let ptype = pool.child(param, 1).unwrap();
            let llvm_ty = basic_type(self.context, pool, ptype)?;
            let slot = function.get_nth_param(i as u32).unwrap();
            let alloca = self.builder.build_alloca(llvm_ty, &self.next_name()).unwrap();
            self.builder.build_store(alloca, slot).unwrap();
            if let Some(entry) = pool.get(pname).ident_entry() {
                table.get_mut(entry).local_slot = Some(i as u32);
                self.locals.borrow_mut().insert(entry, alloca);
            }
        }

        self.lower_stmt(pool, table, body)?;

        if pool.kind(return_type) == NodeKind::TypeVoid && !self.current_block_terminated() {
            self.builder.build_return(None).unwrap();
        }
        Ok(())
    }

    fn current_block_terminated(&self) -> bool {
        self.builder.get_insert_block().and_then(BasicBlock::get_terminator).is_some()
    }

    fn lower_stmt(&self, pool: &Pool, table: &mut SymbolTable, id: NodeId) -> Result<(), NotSupported> {
        if self.current_block_terminated() {
            return Ok(());
        }
        match pool.kind(id) {
            NodeKind::Nop => {}

            NodeKind::Block => {
                for &stmt in pool.children(id) {
                    self.lower_stmt(pool, table, stmt)?;
                }
            }

            NodeKind::ConstDef | NodeKind::VarDef => {
                let name_node = pool.child(id, 0).unwrap();
                let value = pool.child(id, 1).unwrap();
                // The statement itself types to void; the declared name
                // carries the local's actual type.
                let ty = pool.type_of(name_node).unwrap();
                let llvm_ty = basic_type(self.context, pool, ty)?;
                let alloca = self.builder.build_alloca(llvm_ty, &self.next_name()).unwrap();
                let initial = self.lower_expr(pool, table, value)?;
                self.builder.build_store(alloca, initial).unwrap();
                if let Some(entry) = pool.get(name_node).ident_entry() {
                    self.locals.borrow_mut().insert(entry, alloca);
                }
            }

            NodeKind::VarDecl => {
                let name_node = pool.child(id, 0).unwrap();
                let ty = pool.type_of(name_node).unwrap();
                let llvm_ty = basic_type(self.context, pool, ty)?;
                let alloca = self.builder.build_alloca(llvm_ty, &self.next_name()).unwrap();
                let zero = self.zero_of(llvm_ty);
                self.builder.build_store(alloca, zero).unwrap();
                if let Some(entry) = pool.get(name_node).ident_entry() {
                    self.locals.borrow_mut().insert(entry, alloca);
                }
            }

            NodeKind::If => self.lower_if(pool, table, id)?,
            NodeKind::Loop => self.lower_loop(pool, table, id)?,
            NodeKind::While => self.lower_while(pool, table, id)?,

            NodeKind::Continue => {
                let (entry, _) = *self.loop_stack.borrow().last().expect("continue outside a loop");
                self.builder.build_unconditional_branch(entry).unwrap();
            }

            NodeKind::Break => {
                let (_, exit) = *self.loop_stack.borrow().last().expect("break outside a loop");
                self.builder.build_unconditional_branch(exit).unwrap();
            }

            NodeKind::Return => {
                if let Some(&value) = pool.children(id).first() {
                    let v = self.lower_expr(pool, table, value)?;
                    self.builder.build_return(Some(&v)).unwrap();
                } else {
                    self.builder.build_return(None).unwrap();
                }
            }

            NodeKind::Assign => {
                let target = pool.child(id, 0).unwrap();
                let value = pool.child(id, 1).unwrap();
                let ptr = self.lower_lvalue(pool, table, target)?;
                let v = self.lower_expr(pool, table, value)?;
                self.builder.build_store(ptr, v).unwrap();
            }

            NodeKind::AssignAdd | NodeKind::AssignSub | NodeKind::AssignMul | NodeKind::AssignDiv | NodeKind::AssignRem | NodeKind::AssignLShift | NodeKind::AssignRShift => {
                self.lower_compound_assign(pool, table, id)?;
            }

            // An expression in statement position (e.g. a bare call) is
            // lowered for its side effects; the type checker already
            // guaranteed it types to void.
            _ => {
                self.lower_expr(pool, table, id)?;
            }
        }
        Ok(())
    }

    fn lower_if(&self, pool: &Pool, table: &mut SymbolTable, id: NodeId) -> Result<(), NotSupported> {
        let cond = pool.child(id, 0).unwrap();
        let then_block = pool.child(id, 1).unwrap();
        let else_branch = pool.child(id, 2).unwrap();

        let function = self.current_function();
        let then_bb = self.context.append_basic_block(function, "then");
        let else_bb = self.context.append_basic_block(function, "else");
        let merge_bb = self.context.append_basic_block(function, "endif");

        let cond_val = self.lower_expr(pool, table, cond)?.into_int_value();
        self.builder.build_conditional_branch(cond_val, then_bb, else_bb).unwrap();

        self.builder.position_at_end(then_bb);
        self.lower_stmt(pool, table, then_block)?;
        if !self.current_block_terminated() {
            self.builder.build_unconditional_branch(merge_bb).unwrap();
        }

        self.builder.position_at_end(else_bb);
        self.lower_stmt(pool, table, else_branch)?;
        if !self.current_block_terminated() {
            self.builder.build_unconditional_branch(merge_bb).unwrap();
        }

        self.builder.position_at_end(merge_bb);
        Ok(())
    }

    fn lower_loop(&self, pool: &Pool, table: &mut SymbolTable, id: NodeId) -> Result<(), NotSupported> {
        let body = pool.child(id, 0).unwrap();
        let function = self.current_function();
        let loop_bb = self.context.append_basic_block(function, "loop_enter");
        let after_bb = self.context.append_basic_block(function, "loop_exit");

        self.builder.build_unconditional_branch(loop_bb).unwrap();
        self.builder.position_at_end(loop_bb);
        self.loop_stack.borrow_mut().push((loop_bb, after_bb));
        let result = self.lower_stmt(pool, table, body);
        self.loop_stack.borrow_mut().pop();
        result?;
        if !self.current_block_terminated() {
            self.builder.build_unconditional_branch(loop_bb).unwrap();
        }

        self.builder.position_at_end(after_bb);
        Ok(())
    }

    fn lower_while(&self, pool: &Pool, table: &mut SymbolTable, id: NodeId) -> Result<(), NotSupported> {
        let cond = pool.child(id, 0).unwrap();
        let body = pool.child(id, 1).unwrap();
        let function = self.current_function();
        let header_bb = self.context.append_basic_block(function, "while_head");
        let body_bb = self.context.append_basic_block(function, "while_body");
        let after_bb = self.context.append_basic_block(function, "while_exit");

        self.builder.build_unconditional_branch(header_bb).unwrap();
        self.builder.position_at_end(header_bb);
        let cond_val = self.lower_expr(pool, table, cond)?.into_int_value();
        self.builder.build_conditional_branch(cond_val, body_bb, after_bb).unwrap();

        self.builder.position_at_end(body_bb);
        self.loop_stack.borrow_mut().push((header_bb, after_bb));
        let result = self.lower_stmt(pool, table, body);
        self.loop_stack.borrow_mut().pop();
        result?;
        if !self.current_block_terminated() {
            self.builder.build_unconditional_branch(header_bb).unwrap();
        }

        self.builder.position_at_end(after_bb);
        Ok(())
    }

    fn current_function(&self) -> FunctionValue<'ctx> {
        self.builder.get_insert_block().unwrap().get_parent().unwrap()
    }

    /// Applies the per-type opcode table shared with `lower_arithmetic`
    /// (`+ - * /`) to two already-lowered float operands.
    fn float_binop(&self, op: NodeKind, l: FloatValue<'ctx>, r: FloatValue<'ctx>, name: &str) -> BasicValueEnum<'ctx> {
        // Fast-math semantics are applied by the external toolchain's
        // `-ffast-math`, not per instruction.
        match op {
            NodeKind::Add => self.builder.build_float_add(l, r, name).unwrap().into(),
            NodeKind::Sub => self.builder.build_float_sub(l, r, name).unwrap().into(),
            NodeKind::Mul => self.builder.build_float_mul(l, r, name).unwrap().into(),
            NodeKind::Div => self.builder.build_float_div(l, r, name).unwrap().into(),
            other => panic!("{other:?} is not a float operator"),
        }
    }

    /// Applies the per-type opcode table shared with `lower_arithmetic`
    /// (`+ - * /`) and `lower_integer_only` (`% <> >>`) to two
    /// already-lowered integer operands.
    fn int_binop(&self, op: NodeKind, l: IntValue<'ctx>, r: IntValue<'ctx>, unsigned: bool, name: &str) -> BasicValueEnum<'ctx> {
        match op {
            NodeKind::Add => self.builder.build_int_add(l, r, name).unwrap().into(),
            NodeKind::Sub => self.builder.build_int_sub(l, r, name).unwrap().into(),
            NodeKind::Mul => self.builder.build_int_mul(l, r, name).unwrap().into(),
            NodeKind::Div if unsigned => self.builder.build_int_unsigned_div(l, r, name).unwrap().into(),
            NodeKind::Div => self.builder.build_int_signed_div(l, r, name).unwrap().into(),
            NodeKind::Rem if unsigned => self.builder.build_int_unsigned_rem(l, r, name).unwrap().into(),
            NodeKind::Rem => self.builder.build_int_signed_rem(l, r, name).unwrap().into(),
            NodeKind::LShift => self.builder.build_left_shift(l, r, name).unwrap().into(),
            NodeKind::RShift => self.builder.build_right_shift(l, r, !unsigned, name).unwrap().into(),
            other => panic!("{other:?} is not an integer operator"),
        }
    }

    fn lower_compound_assign(&self, pool: &Pool, table: &mut SymbolTable, id: NodeId) -> Result<(), NotSupported> {
        let target = pool.child(id, 0).unwrap();
        let value = pool.child(id, 1).unwrap();
        let ty = pool.type_of(target).expect("compound assignment target is typed");
        let llvm_ty = basic_type(self.context, pool, ty)?;
        let op = as_binary_op(pool.kind(id));

        let ptr = self.lower_lvalue(pool, table, target)?;
        let current = self.builder.build_load(llvm_ty, ptr, &self.next_name()).unwrap();
        let rhs = self.lower_expr(pool, table, value)?;
        let name = self.next_name();

        let result = if is_float(pool, ty) {
            self.float_binop(op, current.into_float_value(), rhs.into_float_value(), &name)
        } else {
            let unsigned = is_unsigned(pool, ty);
            self.int_binop(op, current.into_int_value(), rhs.into_int_value(), unsigned, &name)
        };
        self.builder.build_store(ptr, result).unwrap();
        Ok(())
    }

    /// Computes the address of an l-value: an identifier's stack slot or
    /// global, a dereferenced pointer, or an index into an array or slice.
    fn lower_lvalue(&self, pool: &Pool, table: &mut SymbolTable, id: NodeId) -> Result<PointerValue<'ctx>, NotSupported> {
        match pool.kind(id) {
            NodeKind::Ident => {
                let entry = pool.get(id).ident_entry().expect("resolved identifier carries an entry");
                if let Some(&ptr) = self.locals.borrow().get(&entry) {
                    return Ok(ptr);
                }
                if let Some(&ptr) = self.globals.borrow().get(&entry) {
                    return Ok(ptr);
                }
                panic!("identifier has no storage slot at codegen time");
            }
            NodeKind::Deref => {
                let operand = pool.child(id, 0).unwrap();
                Ok(self.lower_expr(pool, table, operand)?.into_pointer_value())
            }
            NodeKind::Index => {
                let subject = pool.child(id, 0).unwrap();
                let index = pool.child(id, 1).unwrap();
                let index_val = self.lower_expr(pool, table, index)?.into_int_value();
                let subject_ty = pool.type_of(subject).expect("index subject is typed");
                let elem_ty = pool.type_of(id).expect("index result is typed");
                let llvm_elem_ty = basic_type(self.context, pool, elem_ty)?;

                match pool.kind(subject_ty) {
                    NodeKind::TypeArray => {
                        let array_ptr = self.lower_lvalue(pool, table, subject)?;
                        let array_llvm_ty = basic_type(self.context, pool, subject_ty)?;
                        let zero = self.context.i32_type().const_zero();
                        Ok(unsafe { self.builder.build_in_bounds_gep(array_llvm_ty, array_ptr, &[zero, index_val], &self.next_name()).unwrap() })
                    }
                    NodeKind::TypeSlice => {
                        let slice_val = self.lower_expr(pool, table, subject)?;
                        let data_ptr = self.builder.build_extract_value(slice_val.into_struct_value(), 1, &self.next_name()).unwrap().into_pointer_value();
                        Ok(unsafe { self.builder.build_in_bounds_gep(llvm_elem_ty, data_ptr, &[index_val], &self.next_name()).unwrap() })
                    }
                    other => panic!("{other:?} is not indexable"),
                }
            }
            other => panic!("{other:?} is not referenceable"),
        }
    }

    fn lower_expr(&self, pool: &Pool, table: &mut SymbolTable, id: NodeId) -> Result<BasicValueEnum<'ctx>, NotSupported> {
        match pool.kind(id) {
            k if k.is_literal() => self.lower_literal(pool, id),

            NodeKind::Ident => {
                let ty = pool.type_of(id).expect("identifier is typed before codegen runs");
                let llvm_ty = basic_type(self.context, pool, ty)?;
                let ptr = self.lower_lvalue(pool, table, id)?;
                Ok(self.builder.build_load(llvm_ty, ptr, &self.next_name()).unwrap())
            }

            NodeKind::Not => {
                let operand = pool.child(id, 0).unwrap();
                let v = self.lower_expr(pool, table, operand)?.into_int_value();
                Ok(self.builder.build_not(v, &self.next_name()).unwrap().into())
            }

            NodeKind::Neg => {
                let operand = pool.child(id, 0).unwrap();
                let ty = pool.type_of(id).expect("negation is typed before codegen runs");
                if is_float(pool, ty) {
                    let v = self.lower_expr(pool, table, operand)?.into_float_value();
                    Ok(self.builder.build_float_neg(v, &self.next_name()).unwrap().into())
                } else {
                    let v = self.lower_expr(pool, table, operand)?.into_int_value();
                    Ok(self.builder.build_int_neg(v, &self.next_name()).unwrap().into())
                }
            }

            NodeKind::Ref => Ok(self.lower_lvalue(pool, table, pool.child(id, 0).unwrap())?.into()),

            NodeKind::Deref => {
                let ptr = self.lower_lvalue(pool, table, id)?;
                let ty = pool.type_of(id).expect("dereference is typed before codegen runs");
                let llvm_ty = basic_type(self.context, pool, ty)?;
                Ok(self.builder.build_load(llvm_ty, ptr, &self.next_name()).unwrap())
            }

            NodeKind::And | NodeKind::Or | NodeKind::Xor => self.lower_bitwise(pool, table, id),
            NodeKind::Eq | NodeKind::Neq => self.lower_equality(pool, table, id),
            NodeKind::Lt | NodeKind::Lte | NodeKind::Gt | NodeKind::Gte => self.lower_relational(pool, table, id),
            NodeKind::Add | NodeKind::Sub | NodeKind::Mul | NodeKind::Div => self.lower_arithmetic(pool, table, id),
            NodeKind::Rem | NodeKind::LShift | NodeKind::RShift => self.lower_integer_only(pool, table, id),

            NodeKind::Call => self.lower_call(pool, table, id),

            NodeKind::Index => {
                let ty = pool.type_of(id).expect("index is typed before codegen runs");
                let llvm_ty = basic_type(self.context, pool, ty)?;
                let ptr = self.lower_lvalue(pool, table, id)?;
                Ok(self.builder.build_load(llvm_ty, ptr, &self.next_name()).unwrap())
            }

            NodeKind::Slice => Err(NotSupported::new("sub-slicing is not yet representable by this back-end")),
            NodeKind::Field => Err(NotSupported::new("field access is not yet implemented by this back-end")),
            NodeKind::StructLiteral => Err(NotSupported::new("struct literals are not yet implemented by this back-end")),

            other => panic!("{other:?} cannot appear in expression position"),
        }
    }

    fn lower_literal(&self, pool: &Pool, id: NodeId) -> Result<BasicValueEnum<'ctx>, NotSupported> {
        // Materialized via alloca+store+load so every value, literal or not,
        // comes from a uniform load — keeping value-vs-pointer treatment
        // uniform across the whole expression walk.
        let constant = self.const_literal(pool, id)?;
        let alloca = self.builder.build_alloca(constant.get_type(), &self.next_name()).unwrap();
        self.builder.build_store(alloca, constant).unwrap();
        Ok(self.builder.build_load(constant.get_type(), alloca, &self.next_name()).unwrap())
    }

    fn lower_bitwise(&self, pool: &Pool, table: &mut SymbolTable, id: NodeId) -> Result<BasicValueEnum<'ctx>, NotSupported> {
        let (left, right) = (pool.child(id, 0).unwrap(), pool.child(id, 1).unwrap());
        let l = self.lower_expr(pool, table, left)?.into_int_value();
        let r = self.lower_expr(pool, table, right)?.into_int_value();
        let name = self.next_name();
        Ok(match pool.kind(id) {
            NodeKind::And => self.builder.build_and(l, r, &name).unwrap().into(),
            NodeKind::Or => self.builder.build_or(l, r, &name).unwrap().into(),
            NodeKind::Xor => self.builder.build_xor(l, r, &name).unwrap().into(),
            _ => unreachable!(),
        })
    }

    fn lower_equality(&self, pool: &Pool, table: &mut SymbolTable, id: NodeId) -> Result<BasicValueEnum<'ctx>, NotSupported> {
        let (left, right) = (pool.child(id, 0).unwrap(), pool.child(id, 1).unwrap());
        let operand_ty = pool.type_of(left).expect("equality operand is typed");
        let name = self.next_name();
        Ok(if is_float(pool, operand_ty) {
            let l = self.lower_expr(pool, table, left)?.into_float_value();
            let r = self.lower_expr(pool, table, right)?.into_float_value();
            let pred = if pool.kind(id) == NodeKind::Eq { inkwell::FloatPredicate::OEQ } else { inkwell::FloatPredicate::ONE };
            self.builder.build_float_compare(pred, l, r, &name).unwrap().into()
        } else {
            let l = self.lower_expr(pool, table, left)?.into_int_value();
            let r = self.lower_expr(pool, table, right)?.into_int_value();
            let pred = if pool.kind(id) == NodeKind::Eq { IntPredicate::EQ } else { IntPredicate::NE };
            self.builder.build_int_compare(pred, l, r, &name).unwrap().into()
        })
    }

    fn lower_relational(&self, pool: &Pool, table: &mut SymbolTable, id: NodeId) -> Result<BasicValueEnum<'ctx>, NotSupported> {
        let (left, right) = (pool.child(id, 0).unwrap(), pool.child(id, 1).unwrap());
        let operand_ty = pool.type_of(left).expect("relational operand is typed");
        let name = self.next_name();
        Ok(if is_float(pool, operand_ty) {
            let l = self.lower_expr(pool, table, left)?.into_float_value();
            let r = self.lower_expr(pool, table, right)?.into_float_value();
            let pred = match pool.kind(id) {
                NodeKind::Lt => inkwell::FloatPredicate::OLT,
                NodeKind::Lte => inkwell::FloatPredicate::OLE,
                NodeKind::Gt => inkwell::FloatPredicate::OGT,
                NodeKind::Gte => inkwell::FloatPredicate::OGE,
                _ => unreachable!(),
            };
            self.builder.build_float_compare(pred, l, r, &name).unwrap().into()
        } else {
            let l = self.lower_expr(pool, table, left)?.into_int_value();
            let r = self.lower_expr(pool, table, right)?.into_int_value();
            let unsigned = is_unsigned(pool, operand_ty);
            let pred = match (pool.kind(id), unsigned) {
                (NodeKind::Lt, false) => IntPredicate::SLT,
                (NodeKind::Lt, true) => IntPredicate::ULT,
                (NodeKind::Lte, false) => IntPredicate::SLE,
                (NodeKind::Lte, true) => IntPredicate::ULE,
                (NodeKind::Gt, false) => IntPredicate::SGT,
                (NodeKind::Gt, true) => IntPredicate::UGT,
                (NodeKind::Gte, false) => IntPredicate::SGE,
                (NodeKind::Gte, true) => IntPredicate::UGE,
                _ => unreachable!(),
            };
            self.builder.build_int_compare(pred, l, r, &name).unwrap().into()
        })
    }

    fn lower_arithmetic(&self, pool: &Pool, table: &mut SymbolTable, id: NodeId) -> Result<BasicValueEnum<'ctx>, NotSupported> {
        let (left, right) = (pool.child(id, 0).unwrap(), pool.child(id, 1).unwrap());
        let ty = pool.type_of(id).expect("arithmetic expression is typed");
        let name = self.next_name();
        let op = pool.kind(id);
        Ok(if is_float(pool, ty) {
            let l = self.lower_expr(pool, table, left)?.into_float_value();
            let r = self.lower_expr(pool, table, right)?.into_float_value();
            self.float_binop(op, l, r, &name)
        } else {
            let l = self.lower_expr(pool, table, left)?.into_int_value();
            let r = self.lower_expr(pool, table, right)?.into_int_value();
            let unsigned = is_unsigned(pool, ty);
            self.int_binop(op, l, r, unsigned, &name)
        })
    }

    fn lower_integer_only(&self, pool: &Pool, table: &mut SymbolTable, id: NodeId) -> Result<BasicValueEnum<'ctx>, NotSupported> {
        let (left, right) = (pool.child(id, 0).unwrap(), pool.child(id, 1).unwrap());
        let ty = pool.type_of(id).expect("integer expression is typed");
        let unsigned = is_unsigned(pool, ty);
        let l = self.lower_expr(pool, table, left)?.into_int_value();
        let r = self.lower_expr(pool, table, right)?.into_int_value();
        let name = self.next_name();
        Ok(self.int_binop(pool.kind(id), l, r, unsigned, &name))
    }

    fn lower_call(&self, pool: &Pool, table: &mut SymbolTable, id: NodeId) -> Result<BasicValueEnum<'ctx>, NotSupported> {
        let callee = pool.child(id, 0).unwrap();
        let args_node = pool.child(id, 1).unwrap();
        let mut args = Vec::new();
        for &a in pool.children(args_node) {
            args.push(self.lower_expr(pool, table, a)?.into());
        }

        let function = if pool.kind(callee) == NodeKind::Ident {
            let entry = pool.get(callee).ident_entry().expect("resolved call target carries an entry");
            self.functions.borrow().get(&entry).copied()
        } else {
            None
        };

        let name = self.next_name();
        let call_site = match function {
            Some(f) => self.builder.build_call(f, &args, &name).unwrap(),
            None => {
                // A function value computed at runtime (stored in a variable
                // or returned from another call): call through the pointer.
                let callee_ty = pool.type_of(callee).expect("callee is typed before codegen runs");
                let param_types: Vec<NodeId> = pool.children(pool.child(callee_ty, 0).unwrap()).to_vec();
                let return_type = pool.child(callee_ty, 1).unwrap();
                let fn_ty = fn_type_for(self.context, pool, &param_types, return_type, false)?;
                let ptr = self.lower_expr(pool, table, callee)?.into_pointer_value();
                self.builder.build_indirect_call(fn_ty, ptr, &args, &name).unwrap()
            }
        };

        Ok(call_site.try_as_basic_value().left().unwrap_or_else(|| {
            // Void-returning calls type to void and are only ever used in
            // statement position, so the value is never read.
            self.context.bool_type().const_zero().into()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plx_diagnostics::CollectingSink;

    fn ir_for(src: &str) -> String {
        let mut pool = Pool::new();
        let mut sink = CollectingSink::default();
        let (module, parse_ok) = plx_parser::parse_program(&mut pool, &mut sink, &[("t.plx".into(), src.as_bytes().to_vec())]);
        assert!(parse_ok, "{:?}", sink.diagnostics);
        let (mut table, _prims) = plx_sema::analyze(&mut pool, &mut sink, module).unwrap_or_else(|| panic!("{:?}", sink.diagnostics));
        plx_fold::fold_module(&mut pool, &mut table, module);
        assert!(plx_fold::validate_module(&pool, &mut sink, module), "{:?}", sink.diagnostics);
        crate::codegen_module(&pool, &mut table, module, "t").expect("codegen should succeed for this fixture")
    }

    #[test]
    fn hello_addition_returns_the_folded_constant() {
        let ir = ir_for("func main() -> s32 { return 1 + 2; }");
        assert!(ir.contains("define i32 @main"));
        assert!(ir.contains("ret i32 3") || ir.contains("i32 3"));
    }

    #[test]
    fn forward_call_between_functions_emits_both_definitions() {
        let ir = ir_for("func a() -> s32 { return b(); } func b() -> s32 { return 1; }");
        assert!(ir.contains("define i32 @a"));
        assert!(ir.contains("define i32 @b"));
        assert!(ir.contains("call i32 @b"));
    }

    #[test]
    fn while_loop_lowers_to_a_conditional_branch() {
        let ir = ir_for("func f() -> s32 { var n: s32; while n < 10 { n += 1; } return n; }");
        assert!(ir.contains("br i1"));
        assert!(ir.contains("while_head"));
    }

    #[test]
    fn unsigned_division_selects_the_unsigned_instruction() {
        let ir = ir_for("func f(a: u32, b: u32) -> u32 { return a / b; }");
        assert!(ir.contains("udiv"));
    }

    #[test]
    fn signed_division_selects_the_signed_instruction() {
        let ir = ir_for("func f(a: s32, b: s32) -> s32 { return a / b; }");
        assert!(ir.contains("sdiv"));
    }

    #[test]
    fn slice_expression_reports_not_supported_instead_of_panicking() {
        // Field access is rejected earlier, by the type checker itself
        // (it never gets as far as codegen); a sub-slice is fully typed and
        // folded but still needs a GEP shape this back-end doesn't build,
        // so it's the construct that actually exercises codegen's own
        // graceful-failure path.
        let mut pool = Pool::new();
        let mut sink = CollectingSink::default();
        let src = "func f(a: []s32) -> s32 { return a[1:3]; }";
        let (module, parse_ok) = plx_parser::parse_program(&mut pool, &mut sink, &[("t.plx".into(), src.as_bytes().to_vec())]);
        assert!(parse_ok, "{:?}", sink.diagnostics);
        let (mut table, _prims) = plx_sema::analyze(&mut pool, &mut sink, module).unwrap_or_else(|| panic!("{:?}", sink.diagnostics));
        plx_fold::fold_module(&mut pool, &mut table, module);
        assert!(plx_fold::validate_module(&pool, &mut sink, module), "{:?}", sink.diagnostics);
        assert!(crate::codegen_module(&pool, &mut table, module, "t").is_err());
    }
}
