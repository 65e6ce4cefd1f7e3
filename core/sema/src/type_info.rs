//! Canonical primitive type nodes and structural type equality.

use plx_ast::{kind::NodeKind, Location, Payload, Pool};
use plx_ast::NodeId;

/// One interned instance of every primitive type, allocated once per
/// compilation and reused everywhere a primitive type pointer is needed
/// (literal types, parameter/return types that name a primitive, etc.).
#[derive(Clone, Copy, Debug)]
pub struct Primitives {
    pub void: NodeId,
    pub s8: NodeId,
    pub s16: NodeId,
    pub s32: NodeId,
    pub s64: NodeId,
    pub u8: NodeId,
    pub u16: NodeId,
    pub u32: NodeId,
    pub u64: NodeId,
    pub f16: NodeId,
    pub f32: NodeId,
    pub f64: NodeId,
    pub bool_: NodeId,
    pub string: NodeId,
}

impl Primitives {
    #[must_use]
    pub fn intern(pool: &mut Pool) -> Self {
        let loc = Location::new("<builtin>", 0, 0, 0);
        let mut alloc = |kind: NodeKind| pool.alloc(kind, Payload::None, vec![], loc.clone());
        Self {
            void: alloc(NodeKind::TypeVoid),
            s8: alloc(NodeKind::TypeS8),
            s16: alloc(NodeKind::TypeS16),
            s32: alloc(NodeKind::TypeS32),
            s64: alloc(NodeKind::TypeS64),
            u8: alloc(NodeKind::TypeU8),
            u16: alloc(NodeKind::TypeU16),
            u32: alloc(NodeKind::TypeU32),
            u64: alloc(NodeKind::TypeU64),
            f16: alloc(NodeKind::TypeF16),
            f32: alloc(NodeKind::TypeF32),
            f64: alloc(NodeKind::TypeF64),
            bool_: alloc(NodeKind::TypeBool),
            string: alloc(NodeKind::TypeString),
        }
    }

    #[must_use]
    pub fn for_literal_kind(&self, kind: NodeKind) -> Option<NodeId> {
        Some(match kind {
            NodeKind::LitS8 => self.s8,
            NodeKind::LitS16 => self.s16,
            NodeKind::LitS32 => self.s32,
            NodeKind::LitS64 => self.s64,
            NodeKind::LitU8 => self.u8,
            NodeKind::LitU16 => self.u16,
            NodeKind::LitU32 => self.u32,
            NodeKind::LitU64 => self.u64,
            NodeKind::LitF16 => self.f16,
            NodeKind::LitF32 => self.f32,
            NodeKind::LitF64 => self.f64,
            NodeKind::LitBool => self.bool_,
            NodeKind::LitString => self.string,
            _ => return None,
        })
    }
}

#[must_use]
pub fn is_integer_type(pool: &Pool, ty: NodeId) -> bool {
    matches!(
        pool.kind(ty),
        NodeKind::TypeS8
            | NodeKind::TypeS16
            | NodeKind::TypeS32
            | NodeKind::TypeS64
            | NodeKind::TypeU8
            | NodeKind::TypeU16
            | NodeKind::TypeU32
            | NodeKind::TypeU64
    )
}

#[must_use]
pub fn is_float_type(pool: &Pool, ty: NodeId) -> bool {
    matches!(pool.kind(ty), NodeKind::TypeF16 | NodeKind::TypeF32 | NodeKind::TypeF64)
}

#[must_use]
pub fn is_numeric_type(pool: &Pool, ty: NodeId) -> bool {
    is_integer_type(pool, ty) || is_float_type(pool, ty)
}

#[must_use]
pub fn is_bool_type(pool: &Pool, ty: NodeId) -> bool {
    pool.kind(ty) == NodeKind::TypeBool
}

#[must_use]
pub fn is_string_type(pool: &Pool, ty: NodeId) -> bool {
    pool.kind(ty) == NodeKind::TypeString
}

/// Structural type equality: identical pointers are always equal; otherwise
/// the kinds must match and, for composites, children must be pairwise
/// equal. Two named user types are equal iff they resolve to the same
/// symbol entry.
#[must_use]
pub fn types_equal(pool: &Pool, a: NodeId, b: NodeId) -> bool {
    if a == b {
        return true;
    }
    let (ka, kb) = (pool.kind(a), pool.kind(b));
    if ka != kb {
        return false;
    }
    match ka {
        NodeKind::TypeName => pool.get(a).ident_entry() == pool.get(b).ident_entry(),
        NodeKind::TypeRef | NodeKind::TypeSlice => types_equal(pool, pool.child(a, 0).unwrap(), pool.child(b, 0).unwrap()),
        NodeKind::TypeArray => {
            let (len_a, elem_a) = (pool.child(a, 0).unwrap(), pool.child(a, 1).unwrap());
            let (len_b, elem_b) = (pool.child(b, 0).unwrap(), pool.child(b, 1).unwrap());
            literal_values_equal(pool, len_a, len_b) && types_equal(pool, elem_a, elem_b)
        }
        NodeKind::TypeFunc => {
            let (params_a, ret_a) = (pool.child(a, 0).unwrap(), pool.child(a, 1).unwrap());
            let (params_b, ret_b) = (pool.child(b, 0).unwrap(), pool.child(b, 1).unwrap());
            let (pa, pb) = (pool.children(params_a), pool.children(params_b));
            pa.len() == pb.len() && pa.iter().zip(pb.iter()).all(|(&x, &y)| types_equal(pool, x, y)) && types_equal(pool, ret_a, ret_b)
        }
        // All remaining cases are primitives: matching kinds already make
        // them equal.
        _ => true,
    }
}

fn literal_values_equal(pool: &Pool, a: NodeId, b: NodeId) -> bool {
    use plx_ast::Payload;
    match (&pool.get(a).payload, &pool.get(b).payload) {
        (Payload::SignedInt(x), Payload::SignedInt(y)) => x == y,
        (Payload::UnsignedInt(x), Payload::UnsignedInt(y)) => x == y,
        _ => a == b,
    }
}

#[must_use]
pub fn type_name(pool: &Pool, ty: NodeId) -> String {
    match pool.kind(ty) {
        NodeKind::TypeVoid => "void".to_string(),
        NodeKind::TypeS8 => "s8".to_string(),
        NodeKind::TypeS16 => "s16".to_string(),
        NodeKind::TypeS32 => "s32".to_string(),
        NodeKind::TypeS64 => "s64".to_string(),
        NodeKind::TypeU8 => "u8".to_string(),
        NodeKind::TypeU16 => "u16".to_string(),
        NodeKind::TypeU32 => "u32".to_string(),
        NodeKind::TypeU64 => "u64".to_string(),
        NodeKind::TypeF16 => "f16".to_string(),
        NodeKind::TypeF32 => "f32".to_string(),
        NodeKind::TypeF64 => "f64".to_string(),
        NodeKind::TypeBool => "bool".to_string(),
        NodeKind::TypeString => "string".to_string(),
        NodeKind::TypeRef => format!("&{}", type_name(pool, pool.child(ty, 0).unwrap())),
        NodeKind::TypeSlice => format!("[]{}", type_name(pool, pool.child(ty, 0).unwrap())),
        NodeKind::TypeArray => format!("[_]{}", type_name(pool, pool.child(ty, 1).unwrap())),
        NodeKind::TypeFunc => {
            let params = pool.children(pool.child(ty, 0).unwrap()).iter().map(|&p| type_name(pool, p)).collect::<Vec<_>>().join(", ");
            format!("func({params}) -> {}", type_name(pool, pool.child(ty, 1).unwrap()))
        }
        NodeKind::TypeName => pool.get(ty).ident_name().unwrap_or("<type>").to_string(),
        _ => "<invalid type>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflexivity_and_symmetry() {
        let mut pool = Pool::new();
        let prims = Primitives::intern(&mut pool);
        assert!(types_equal(&pool, prims.s32, prims.s32));
        assert!(types_equal(&pool, prims.s32, prims.s32) == types_equal(&pool, prims.s32, prims.s32));
        assert!(!types_equal(&pool, prims.s32, prims.u32));
    }

    #[test]
    fn ref_types_compare_structurally() {
        let mut pool = Pool::new();
        let prims = Primitives::intern(&mut pool);
        let loc = Location::new("t", 1, 1, 0);
        let ref_a = pool.alloc(NodeKind::TypeRef, Payload::None, vec![prims.s32], loc.clone());
        let ref_b = pool.alloc(NodeKind::TypeRef, Payload::None, vec![prims.s32], loc);
        assert!(types_equal(&pool, ref_a, ref_b));
    }
}
