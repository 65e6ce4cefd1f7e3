//! The closed enumeration of tree node kinds.
//!
//! Child counts and order per kind are fixed and documented next to each
//! variant; the parser is the sole creator of non-leaf shapes. Later passes
//! (constant folder, validator) may rewrite a node's kind and children in
//! place but never invent a shape the parser wouldn't have produced.

/// Every construct of the language is one of these tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Children: every top-level definition, in source order.
    Module,

    // -- definitions --------------------------------------------------
    /// Children: [name, value].
    ConstDef,
    /// Children: [name, value_or_type]. Whether the second child is a value
    /// or a bare type is carried by the child's own kind (a type-kind node
    /// for a declaration-only `var x: T;`, any expression otherwise).
    VarDef,
    /// Same shape as `VarDef`; kept distinct so later passes can tell a
    /// `var x: T;` (no initializer) apart from `var x = expr;` without
    /// re-inspecting the child's kind.
    VarDecl,
    /// Children: [name, members]. `members` is an `Other` node whose
    /// children are `Other` nodes shaped `[member_name, member_type]`.
    StructDef,
    /// Children: [name, params, return_type, body]. `return_type` is a
    /// `TypeVoid` node when no `-> T` was written.
    FuncDef,

    // -- statements -----------------------------------------------------
    /// No children, no payload.
    Nop,
    /// Children: each statement in the block, in order.
    Block,
    /// Children: [condition, then_block, else_branch_or_nop].
    If,
    /// Children: [body].
    Loop,
    /// Children: [condition, body].
    While,
    /// No children.
    Continue,
    /// No children.
    Break,
    /// Children: [value] if a value was returned, otherwise no children.
    Return,

    /// Children: [target, value].
    Assign,
    AssignAdd,
    AssignSub,
    AssignMul,
    AssignDiv,
    AssignRem,
    AssignLShift,
    AssignRShift,

    // -- binary expressions ----------------------------------------------
    And,
    Or,
    Xor,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    LShift,
    RShift,

    // -- unary expressions -------------------------------------------------
    /// Children: [operand].
    Not,
    /// Children: [operand].
    Neg,
    /// Children: [operand].
    Ref,
    /// Children: [operand].
    Deref,

    // -- postfix expressions -----------------------------------------------
    /// Children: [callee, args]. `args` is an `Other` node.
    Call,
    /// Children: [subject, index].
    Index,
    /// Children: [subject, start, end].
    Slice,
    /// Children: [subject, name]. `name` is an `Ident` node.
    Field,

    /// Payload: [`Payload::Ident`]. No children before resolution; resolved
    /// identifiers keep no children, the resolved entry lives in the payload.
    Ident,

    // -- literals -------------------------------------------------------
    LitS8,
    LitS16,
    LitS32,
    LitS64,
    LitU8,
    LitU16,
    LitU32,
    LitU64,
    LitF16,
    LitF32,
    LitF64,
    LitBool,
    LitString,
    /// Children: [struct_name, field_inits]. `field_inits` is an `Other`
    /// node of `Other` nodes shaped `[field_name, value]`.
    StructLiteral,

    // -- type expressions -------------------------------------------------
    TypeVoid,
    TypeS8,
    TypeS16,
    TypeS32,
    TypeS64,
    TypeU8,
    TypeU16,
    TypeU32,
    TypeU64,
    TypeF16,
    TypeF32,
    TypeF64,
    TypeBool,
    TypeString,
    /// Children: [params, return_type]. `params` is an `Other` node of bare
    /// type nodes (no names). `return_type` is `TypeVoid` when absent.
    TypeFunc,
    /// Children: [referent].
    TypeRef,
    /// Children: [length, element_type]. `length` is an expression (must be
    /// a literal after validation).
    TypeArray,
    /// Children: [element_type].
    TypeSlice,
    /// A user type name in type position, resolved like any other
    /// identifier. Payload: [`Payload::Ident`].
    TypeName,

    /// A list-only container: parameter lists, argument lists, struct member
    /// lists, and function-type parameter lists. Payload and type are
    /// unused.
    Other,
}

impl NodeKind {
    #[must_use]
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            NodeKind::LitS8
                | NodeKind::LitS16
                | NodeKind::LitS32
                | NodeKind::LitS64
                | NodeKind::LitU8
                | NodeKind::LitU16
                | NodeKind::LitU32
                | NodeKind::LitU64
                | NodeKind::LitF16
                | NodeKind::LitF32
                | NodeKind::LitF64
                | NodeKind::LitBool
                | NodeKind::LitString
        )
    }

    #[must_use]
    pub fn is_signed_int_literal(self) -> bool {
        matches!(self, NodeKind::LitS8 | NodeKind::LitS16 | NodeKind::LitS32 | NodeKind::LitS64)
    }

    #[must_use]
    pub fn is_unsigned_int_literal(self) -> bool {
        matches!(self, NodeKind::LitU8 | NodeKind::LitU16 | NodeKind::LitU32 | NodeKind::LitU64)
    }

    #[must_use]
    pub fn is_int_literal(self) -> bool {
        self.is_signed_int_literal() || self.is_unsigned_int_literal()
    }

    #[must_use]
    pub fn is_float_literal(self) -> bool {
        matches!(self, NodeKind::LitF16 | NodeKind::LitF32 | NodeKind::LitF64)
    }

    #[must_use]
    pub fn is_type(self) -> bool {
        matches!(
            self,
            NodeKind::TypeVoid
                | NodeKind::TypeS8
                | NodeKind::TypeS16
                | NodeKind::TypeS32
                | NodeKind::TypeS64
                | NodeKind::TypeU8
                | NodeKind::TypeU16
                | NodeKind::TypeU32
                | NodeKind::TypeU64
                | NodeKind::TypeF16
                | NodeKind::TypeF32
                | NodeKind::TypeF64
                | NodeKind::TypeBool
                | NodeKind::TypeString
                | NodeKind::TypeFunc
                | NodeKind::TypeRef
                | NodeKind::TypeArray
                | NodeKind::TypeSlice
                | NodeKind::TypeName
        )
    }

    #[must_use]
    pub fn is_primitive_type(self) -> bool {
        self.is_type() && !matches!(self, NodeKind::TypeFunc | NodeKind::TypeRef | NodeKind::TypeArray | NodeKind::TypeSlice | NodeKind::TypeName)
    }
}
