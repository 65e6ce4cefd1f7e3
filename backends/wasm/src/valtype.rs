//! Value-type mapping: the handful of representable scalar kinds.

use crate::errors::NotSupported;
use plx_ast::{kind::NodeKind, NodeId, Pool};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValType {
    I32,
    I64,
    F32,
    F64,
}

impl ValType {
    #[must_use]
    pub fn byte(self) -> u8 {
        match self {
            ValType::I32 => 0x7F,
            ValType::I64 => 0x7E,
            ValType::F32 => 0x7D,
            ValType::F64 => 0x7C,
        }
    }
}

/// 8/16/32-bit integers and bool collapse to `i32`; 64-bit integers become
/// `i64`; `f16` widens to `f32` since Wasm MVP has no half-precision type;
/// `f64` stays `f64`. Composite and string types are not representable.
pub fn value_type(pool: &Pool, ty: NodeId) -> Result<ValType, NotSupported> {
    match pool.kind(ty) {
        NodeKind::TypeS8 | NodeKind::TypeS16 | NodeKind::TypeS32 | NodeKind::TypeU8 | NodeKind::TypeU16 | NodeKind::TypeU32 | NodeKind::TypeBool => Ok(ValType::I32),
        NodeKind::TypeS64 | NodeKind::TypeU64 => Ok(ValType::I64),
        NodeKind::TypeF16 | NodeKind::TypeF32 => Ok(ValType::F32),
        NodeKind::TypeF64 => Ok(ValType::F64),
        other => Err(NotSupported::new(format!("{other:?} has no Wasm value-type representation"))),
    }
}

#[must_use]
pub fn is_unsigned(pool: &Pool, ty: NodeId) -> bool {
    matches!(pool.kind(ty), NodeKind::TypeU8 | NodeKind::TypeU16 | NodeKind::TypeU32 | NodeKind::TypeU64)
}
