//! Maps tree type nodes onto LLVM types.

use inkwell::context::Context;
use inkwell::types::{BasicType, BasicTypeEnum};
use plx_ast::{kind::NodeKind, NodeId, Pool};

use crate::errors::NotSupported;

/// Maps a type-position node to its LLVM representation. Panics on `void` in
/// a value position; callers that may see a void return type handle that
/// case themselves via [`fn_type_for`]. User-defined struct types are not
/// yet lowered (the type-mapping table doesn't cover them either); that case
/// reports [`NotSupported`] instead of panicking, since a struct-typed
/// parameter or return value is otherwise ordinary, reachable source.
pub fn basic_type<'ctx>(context: &'ctx Context, pool: &Pool, ty: NodeId) -> Result<BasicTypeEnum<'ctx>, NotSupported> {
    Ok(match pool.kind(ty) {
        NodeKind::TypeS8 | NodeKind::TypeU8 => context.i8_type().into(),
        NodeKind::TypeS16 | NodeKind::TypeU16 => context.i16_type().into(),
        NodeKind::TypeS32 | NodeKind::TypeU32 => context.i32_type().into(),
        NodeKind::TypeS64 | NodeKind::TypeU64 => context.i64_type().into(),
        NodeKind::TypeF16 => context.f16_type().into(),
        NodeKind::TypeF32 => context.f32_type().into(),
        NodeKind::TypeF64 => context.f64_type().into(),
        NodeKind::TypeBool => context.bool_type().into(),
        NodeKind::TypeRef | NodeKind::TypeFunc => context.ptr_type(inkwell::AddressSpace::default()).into(),
        NodeKind::TypeArray => {
            let length = literal_array_length(pool, pool.child(ty, 0).unwrap());
            let elem = basic_type(context, pool, pool.child(ty, 1).unwrap())?;
            elem.array_type(length).into()
        }
        NodeKind::TypeSlice => {
            // `{ i64, ptr }`: element count followed by a data pointer.
            let len_field = context.i64_type();
            let ptr_field = context.ptr_type(inkwell::AddressSpace::default());
            context.struct_type(&[len_field.into(), ptr_field.into()], false).into()
        }
        NodeKind::TypeName => return Err(NotSupported::new("user-defined struct types are not yet lowered by this back-end")),
        NodeKind::TypeVoid | NodeKind::TypeString => {
            panic!("type {:?} has no value representation", pool.kind(ty))
        }
        other => panic!("{other:?} is not a type node"),
    })
}

fn literal_array_length(pool: &Pool, length: NodeId) -> u32 {
    use plx_ast::Payload;
    match &pool.get(length).payload {
        Payload::SignedInt(n) => u32::try_from(*n).expect("array length must fit in u32"),
        Payload::UnsignedInt(n) => u32::try_from(*n).expect("array length must fit in u32"),
        other => panic!("array length literal has unexpected payload {other:?}"),
    }
}

/// Builds the LLVM function type for a `func` signature, mapping a `void`
/// return type onto `void` rather than panicking (the only place a bare
/// `void` type is a legal value).
pub fn fn_type_for<'ctx>(
    context: &'ctx Context,
    pool: &Pool,
    param_types: &[NodeId],
    return_type: NodeId,
    is_var_arg: bool,
) -> Result<inkwell::types::FunctionType<'ctx>, NotSupported> {
    let mut params = Vec::new();
    for &t in param_types {
        params.push(basic_type(context, pool, t)?.into());
    }
    Ok(if pool.kind(return_type) == NodeKind::TypeVoid {
        context.void_type().fn_type(&params, is_var_arg)
    } else {
        basic_type(context, pool, return_type)?.fn_type(&params, is_var_arg)
    })
}
