//! Hand-written recursive-descent parser with one-token lookahead and
//! precedence climbing at each arithmetic/relational/logical layer.

use crate::stream::TokenStream;
use plx_ast::{kind::NodeKind, Location, NodeId, Payload, Pool};
use plx_diagnostics::DiagnosticSink;
use plx_lexer::{TokenKind, TokenPayload};

pub struct Parser<'p> {
    stream: TokenStream,
    pool: &'p mut Pool,
    /// Set while parsing an `if`/`while` condition, so a bare identifier
    /// immediately followed by `{` is read as the start of the following
    /// block rather than as a struct literal. This resolves an ambiguity
    /// the distilled grammar leaves implicit.
    no_struct_literal: bool,
}

type PResult = Option<NodeId>;

impl<'p> Parser<'p> {
    #[must_use]
    pub fn new(filename: impl Into<String>, source: Vec<u8>, pool: &'p mut Pool, sink: &mut dyn DiagnosticSink) -> Self {
        Self {
            stream: TokenStream::new(filename, source, sink),
            pool,
            no_struct_literal: false,
        }
    }

    fn loc(&self) -> Location {
        self.stream.peek().location.clone()
    }

    fn alloc(&mut self, kind: NodeKind, payload: Payload, children: Vec<NodeId>, location: Location) -> NodeId {
        self.pool.alloc(kind, payload, children, location)
    }

    fn nop(&mut self, location: Location) -> NodeId {
        self.alloc(NodeKind::Nop, Payload::None, vec![], location)
    }

    fn other(&mut self, children: Vec<NodeId>, location: Location) -> NodeId {
        self.alloc(NodeKind::Other, Payload::None, children, location)
    }

    /// Parses every top-level definition in this file, returning them along
    /// with whether the whole file parsed cleanly. On error within one
    /// definition, resynchronizes at the next definition-starting keyword
    /// so sibling definitions still get a chance to report their own
    /// diagnostics.
    pub fn parse_definitions(&mut self, sink: &mut dyn DiagnosticSink) -> (Vec<NodeId>, bool) {
        let mut defs = Vec::new();
        let mut ok = true;
        while self.stream.peek_kind() != TokenKind::Eof {
            match self.parse_definition(sink) {
                Some(def) => defs.push(def),
                None => {
                    ok = false;
                    self.resync_to_definition(sink);
                }
            }
        }
        (defs, ok)
    }

    fn resync_to_definition(&mut self, sink: &mut dyn DiagnosticSink) {
        loop {
            match self.stream.peek_kind() {
                TokenKind::Eof | TokenKind::Const | TokenKind::Var | TokenKind::Struct | TokenKind::Func => break,
                _ => {
                    self.stream.advance(sink);
                }
            }
        }
    }

    fn parse_definition(&mut self, sink: &mut dyn DiagnosticSink) -> PResult {
        match self.stream.peek_kind() {
            TokenKind::Const => self.parse_const_def(sink),
            TokenKind::Var => self.parse_var_def_or_decl(sink),
            TokenKind::Struct => self.parse_struct_def(sink),
            TokenKind::Func => self.parse_func_def(sink),
            _ => {
                self.stream.unexpected_token(sink);
                None
            }
        }
    }

    fn parse_ident(&mut self, sink: &mut dyn DiagnosticSink) -> PResult {
        let loc = self.loc();
        let tok = self.stream.expect(TokenKind::Ident, sink)?;
        let TokenPayload::Text(name) = tok.payload else {
            unreachable!("Ident token always carries Text payload")
        };
        Some(self.alloc(NodeKind::Ident, Payload::Ident { name, entry: None }, vec![], loc))
    }

    // ---- definitions ----------------------------------------------------

    fn parse_const_def(&mut self, sink: &mut dyn DiagnosticSink) -> PResult {
        let loc = self.loc();
        self.stream.expect(TokenKind::Const, sink)?;
        let name = self.parse_ident(sink)?;
        self.stream.expect(TokenKind::Assign, sink)?;
        let value = self.parse_expr(sink)?;
        self.stream.expect(TokenKind::Semicolon, sink)?;
        Some(self.alloc(NodeKind::ConstDef, Payload::None, vec![name, value], loc))
    }

    fn parse_var_def_or_decl(&mut self, sink: &mut dyn DiagnosticSink) -> PResult {
        let loc = self.loc();
        self.stream.expect(TokenKind::Var, sink)?;
        let name = self.parse_ident(sink)?;
        if self.stream.accept(TokenKind::Assign, sink).is_some() {
            let value = self.parse_expr(sink)?;
            self.stream.expect(TokenKind::Semicolon, sink)?;
            Some(self.alloc(NodeKind::VarDef, Payload::None, vec![name, value], loc))
        } else {
            self.stream.expect(TokenKind::Colon, sink)?;
            let ty = self.parse_type(sink)?;
            self.stream.expect(TokenKind::Semicolon, sink)?;
            Some(self.alloc(NodeKind::VarDecl, Payload::None, vec![name, ty], loc))
        }
    }

    fn parse_struct_def(&mut self, sink: &mut dyn DiagnosticSink) -> PResult {
        let loc = self.loc();
        self.stream.expect(TokenKind::Struct, sink)?;
        let name = self.parse_ident(sink)?;
        self.stream.expect(TokenKind::LBrace, sink)?;
        let members_loc = self.loc();
        let mut members = Vec::new();
        while self.stream.peek_kind() != TokenKind::RBrace {
            let member_loc = self.loc();
            let field_name = self.parse_ident(sink)?;
            self.stream.expect(TokenKind::Colon, sink)?;
            let field_type = self.parse_type(sink)?;
            self.stream.expect(TokenKind::Semicolon, sink)?;
            members.push(self.other(vec![field_name, field_type], member_loc));
        }
        self.stream.expect(TokenKind::RBrace, sink)?;
        let members = self.other(members, members_loc);
        Some(self.alloc(NodeKind::StructDef, Payload::None, vec![name, members], loc))
    }

    fn parse_func_def(&mut self, sink: &mut dyn DiagnosticSink) -> PResult {
        let loc = self.loc();
        self.stream.expect(TokenKind::Func, sink)?;
        let name = self.parse_ident(sink)?;
        let params = self.parse_params(sink)?;
        let return_type = if self.stream.accept(TokenKind::Arrow, sink).is_some() {
            self.parse_type(sink)?
        } else {
            let void_loc = self.loc();
            self.alloc(NodeKind::TypeVoid, Payload::None, vec![], void_loc)
        };
        let body = self.parse_block(sink)?;
        Some(self.alloc(NodeKind::FuncDef, Payload::None, vec![name, params, return_type, body], loc))
    }

    fn parse_params(&mut self, sink: &mut dyn DiagnosticSink) -> PResult {
        let loc = self.loc();
        self.stream.expect(TokenKind::LParen, sink)?;
        let mut params = Vec::new();
        if self.stream.peek_kind() != TokenKind::RParen {
            loop {
                let param_loc = self.loc();
                let name = self.parse_ident(sink)?;
                self.stream.expect(TokenKind::Colon, sink)?;
                let ty = self.parse_type(sink)?;
                params.push(self.other(vec![name, ty], param_loc));
                if self.stream.accept(TokenKind::Comma, sink).is_none() {
                    break;
                }
            }
        }
        self.stream.expect(TokenKind::RParen, sink)?;
        Some(self.other(params, loc))
    }

    // ---- statements -------------------------------------------------------

    fn parse_block(&mut self, sink: &mut dyn DiagnosticSink) -> PResult {
        let loc = self.loc();
        self.stream.expect(TokenKind::LBrace, sink)?;
        let mut stmts = Vec::new();
        while self.stream.peek_kind() != TokenKind::RBrace && self.stream.peek_kind() != TokenKind::Eof {
            stmts.push(self.parse_stmt(sink)?);
        }
        self.stream.expect(TokenKind::RBrace, sink)?;
        Some(self.alloc(NodeKind::Block, Payload::None, stmts, loc))
    }

    fn parse_stmt(&mut self, sink: &mut dyn DiagnosticSink) -> PResult {
        match self.stream.peek_kind() {
            TokenKind::LBrace => self.parse_block(sink),
            TokenKind::Const => self.parse_const_def(sink),
            TokenKind::Var => self.parse_var_def_or_decl(sink),
            TokenKind::If => self.parse_if(sink),
            TokenKind::Loop => self.parse_loop(sink),
            TokenKind::While => self.parse_while(sink),
            TokenKind::Continue => {
                let loc = self.loc();
                self.stream.advance(sink);
                self.stream.expect(TokenKind::Semicolon, sink)?;
                Some(self.alloc(NodeKind::Continue, Payload::None, vec![], loc))
            }
            TokenKind::Break => {
                let loc = self.loc();
                self.stream.advance(sink);
                self.stream.expect(TokenKind::Semicolon, sink)?;
                Some(self.alloc(NodeKind::Break, Payload::None, vec![], loc))
            }
            TokenKind::Return => self.parse_return(sink),
            _ => self.parse_assign_or_expr_stmt(sink),
        }
    }

    fn parse_if(&mut self, sink: &mut dyn DiagnosticSink) -> PResult {
        let loc = self.loc();
        self.stream.expect(TokenKind::If, sink)?;
        let cond = self.parse_condition(sink)?;
        let then_block = self.parse_block(sink)?;
        let else_branch = if self.stream.accept(TokenKind::Else, sink).is_some() {
            if self.stream.peek_kind() == TokenKind::If {
                self.parse_if(sink)?
            } else {
                self.parse_block(sink)?
            }
        } else {
            self.nop(self.loc())
        };
        Some(self.alloc(NodeKind::If, Payload::None, vec![cond, then_block, else_branch], loc))
    }

    fn parse_loop(&mut self, sink: &mut dyn DiagnosticSink) -> PResult {
        let loc = self.loc();
        self.stream.expect(TokenKind::Loop, sink)?;
        let body = self.parse_block(sink)?;
        Some(self.alloc(NodeKind::Loop, Payload::None, vec![body], loc))
    }

    fn parse_while(&mut self, sink: &mut dyn DiagnosticSink) -> PResult {
        let loc = self.loc();
        self.stream.expect(TokenKind::While, sink)?;
        let cond = self.parse_condition(sink)?;
        let body = self.parse_block(sink)?;
        Some(self.alloc(NodeKind::While, Payload::None, vec![cond, body], loc))
    }

    /// A condition is a `RelExpr` parsed with struct literals disabled, so
    /// `if x { ... }` reads `x` as the condition and `{` as the block.
    fn parse_condition(&mut self, sink: &mut dyn DiagnosticSink) -> PResult {
        let saved = self.no_struct_literal;
        self.no_struct_literal = true;
        let result = self.parse_rel_expr(sink);
        self.no_struct_literal = saved;
        result
    }

    fn parse_return(&mut self, sink: &mut dyn DiagnosticSink) -> PResult {
        let loc = self.loc();
        self.stream.expect(TokenKind::Return, sink)?;
        let children = if self.stream.peek_kind() == TokenKind::Semicolon {
            vec![]
        } else {
            vec![self.parse_expr(sink)?]
        };
        self.stream.expect(TokenKind::Semicolon, sink)?;
        Some(self.alloc(NodeKind::Return, Payload::None, children, loc))
    }

    fn parse_assign_or_expr_stmt(&mut self, sink: &mut dyn DiagnosticSink) -> PResult {
        let loc = self.loc();
        let target = self.parse_unary_expr(sink)?;
        let assign_kind = match self.stream.peek_kind() {
            TokenKind::Assign => Some(NodeKind::Assign),
            TokenKind::PlusAssign => Some(NodeKind::AssignAdd),
            TokenKind::MinusAssign => Some(NodeKind::AssignSub),
            TokenKind::StarAssign => Some(NodeKind::AssignMul),
            TokenKind::SlashAssign => Some(NodeKind::AssignDiv),
            TokenKind::PercentAssign => Some(NodeKind::AssignRem),
            TokenKind::LShiftAssign => Some(NodeKind::AssignLShift),
            TokenKind::RShiftAssign => Some(NodeKind::AssignRShift),
            _ => None,
        };
        if let Some(kind) = assign_kind {
            self.stream.advance(sink);
            let value = self.parse_expr(sink)?;
            self.stream.expect(TokenKind::Semicolon, sink)?;
            Some(self.alloc(kind, Payload::None, vec![target, value], loc))
        } else {
            self.stream.expect(TokenKind::Semicolon, sink)?;
            Some(target)
        }
    }

    // ---- expressions --------------------------------------------------------

    fn parse_expr(&mut self, sink: &mut dyn DiagnosticSink) -> PResult {
        self.parse_logical_expr(sink)
    }

    fn parse_logical_expr(&mut self, sink: &mut dyn DiagnosticSink) -> PResult {
        let loc = self.loc();
        let mut left = self.parse_rel_expr(sink)?;
        let op = match self.stream.peek_kind() {
            TokenKind::And => NodeKind::And,
            TokenKind::Or => NodeKind::Or,
            TokenKind::Xor => NodeKind::Xor,
            _ => return Some(left),
        };
        let op_kind = self.stream.peek_kind();
        while self.stream.peek_kind() == op_kind {
            self.stream.advance(sink);
            let right = self.parse_rel_expr(sink)?;
            left = self.alloc(op, Payload::None, vec![left, right], loc.clone());
        }
        Some(left)
    }

    fn parse_rel_expr(&mut self, sink: &mut dyn DiagnosticSink) -> PResult {
        let loc = self.loc();
        let left = self.parse_arithmetic_expr(sink)?;
        let op = match self.stream.peek_kind() {
            TokenKind::Eq => NodeKind::Eq,
            TokenKind::Neq => NodeKind::Neq,
            TokenKind::Lt => NodeKind::Lt,
            TokenKind::Lte => NodeKind::Lte,
            TokenKind::Gt => NodeKind::Gt,
            TokenKind::Gte => NodeKind::Gte,
            _ => return Some(left),
        };
        self.stream.advance(sink);
        let right = self.parse_arithmetic_expr(sink)?;
        Some(self.alloc(op, Payload::None, vec![left, right], loc))
    }

    fn parse_arithmetic_expr(&mut self, sink: &mut dyn DiagnosticSink) -> PResult {
        let loc = self.loc();
        let mut left = self.parse_unary_expr(sink)?;
        let op = match self.stream.peek_kind() {
            TokenKind::Plus => NodeKind::Add,
            TokenKind::Minus => NodeKind::Sub,
            TokenKind::Star => NodeKind::Mul,
            TokenKind::Slash => NodeKind::Div,
            TokenKind::Percent => NodeKind::Rem,
            TokenKind::LShift => NodeKind::LShift,
            TokenKind::RShift => NodeKind::RShift,
            _ => return Some(left),
        };
        let op_kind = self.stream.peek_kind();
        while self.stream.peek_kind() == op_kind {
            self.stream.advance(sink);
            let right = self.parse_unary_expr(sink)?;
            left = self.alloc(op, Payload::None, vec![left, right], loc.clone());
        }
        Some(left)
    }

    fn parse_unary_expr(&mut self, sink: &mut dyn DiagnosticSink) -> PResult {
        let loc = self.loc();
        let op = match self.stream.peek_kind() {
            TokenKind::Not => NodeKind::Not,
            TokenKind::Minus => NodeKind::Neg,
            TokenKind::Star => NodeKind::Deref,
            TokenKind::Amp => NodeKind::Ref,
            _ => return self.parse_postfix_expr(sink),
        };
        self.stream.advance(sink);
        let operand = self.parse_unary_expr(sink)?;
        Some(self.alloc(op, Payload::None, vec![operand], loc))
    }

    fn parse_postfix_expr(&mut self, sink: &mut dyn DiagnosticSink) -> PResult {
        let mut expr = self.parse_primary_expr(sink)?;
        loop {
            let loc = self.loc();
            match self.stream.peek_kind() {
                TokenKind::LParen => {
                    self.stream.advance(sink);
                    let mut args = Vec::new();
                    if self.stream.peek_kind() != TokenKind::RParen {
                        loop {
                            args.push(self.parse_expr(sink)?);
                            if self.stream.accept(TokenKind::Comma, sink).is_none() {
                                break;
                            }
                        }
                    }
                    self.stream.expect(TokenKind::RParen, sink)?;
                    let args = self.other(args, loc.clone());
                    expr = self.alloc(NodeKind::Call, Payload::None, vec![expr, args], loc);
                }
                TokenKind::LBracket => {
                    self.stream.advance(sink);
                    let first = self.parse_expr(sink)?;
                    if self.stream.accept(TokenKind::Colon, sink).is_some() {
                        let end = self.parse_expr(sink)?;
                        self.stream.expect(TokenKind::RBracket, sink)?;
                        expr = self.alloc(NodeKind::Slice, Payload::None, vec![expr, first, end], loc);
                    } else {
                        self.stream.expect(TokenKind::RBracket, sink)?;
                        expr = self.alloc(NodeKind::Index, Payload::None, vec![expr, first], loc);
                    }
                }
                TokenKind::Period => {
                    self.stream.advance(sink);
                    let name = self.parse_ident(sink)?;
                    expr = self.alloc(NodeKind::Field, Payload::None, vec![expr, name], loc);
                }
                _ => break,
            }
        }
        Some(expr)
    }

    fn parse_primary_expr(&mut self, sink: &mut dyn DiagnosticSink) -> PResult {
        let loc = self.loc();
        match self.stream.peek_kind() {
            TokenKind::IntLiteral => {
                let tok = self.stream.advance(sink);
                let TokenPayload::UnsignedInt(v) = tok.payload else {
                    unreachable!("IntLiteral token always carries UnsignedInt payload")
                };
                // Integer literals always parse to the s32 tree kind.
                Some(self.alloc(NodeKind::LitS32, Payload::SignedInt(v as i64), vec![], loc))
            }
            TokenKind::FloatLiteral => {
                let tok = self.stream.advance(sink);
                let TokenPayload::Float(v) = tok.payload else {
                    unreachable!("FloatLiteral token always carries Float payload")
                };
                Some(self.alloc(NodeKind::LitF64, Payload::Float(v), vec![], loc))
            }
            TokenKind::True => {
                self.stream.advance(sink);
                Some(self.alloc(NodeKind::LitBool, Payload::Bool(true), vec![], loc))
            }
            TokenKind::False => {
                self.stream.advance(sink);
                Some(self.alloc(NodeKind::LitBool, Payload::Bool(false), vec![], loc))
            }
            TokenKind::StringLiteral => {
                let tok = self.stream.advance(sink);
                let TokenPayload::Text(s) = tok.payload else {
                    unreachable!("StringLiteral token always carries Text payload")
                };
                Some(self.alloc(NodeKind::LitString, Payload::Bytes(s.into_bytes()), vec![], loc))
            }
            TokenKind::LParen => {
                self.stream.advance(sink);
                let saved = self.no_struct_literal;
                self.no_struct_literal = false;
                let inner = self.parse_expr(sink);
                self.no_struct_literal = saved;
                let inner = inner?;
                self.stream.expect(TokenKind::RParen, sink)?;
                Some(inner)
            }
            TokenKind::Ident => {
                let name = self.parse_ident(sink)?;
                if !self.no_struct_literal && self.stream.peek_kind() == TokenKind::LBrace {
                    self.parse_struct_literal(name, loc, sink)
                } else {
                    Some(name)
                }
            }
            _ => {
                self.stream.unexpected_token(sink);
                None
            }
        }
    }

    fn parse_struct_literal(&mut self, name: NodeId, loc: Location, sink: &mut dyn DiagnosticSink) -> PResult {
        self.stream.expect(TokenKind::LBrace, sink)?;
        let fields_loc = self.loc();
        let mut fields = Vec::new();
        while self.stream.peek_kind() != TokenKind::RBrace {
            let field_loc = self.loc();
            let field_name = self.parse_ident(sink)?;
            self.stream.expect(TokenKind::Colon, sink)?;
            let value = self.parse_expr(sink)?;
            self.stream.expect(TokenKind::Semicolon, sink)?;
            fields.push(self.other(vec![field_name, value], field_loc));
        }
        self.stream.expect(TokenKind::RBrace, sink)?;
        let fields = self.other(fields, fields_loc);
        Some(self.alloc(NodeKind::StructLiteral, Payload::None, vec![name, fields], loc))
    }

    // ---- types --------------------------------------------------------------

    fn parse_type(&mut self, sink: &mut dyn DiagnosticSink) -> PResult {
        let loc = self.loc();
        match self.stream.peek_kind() {
            TokenKind::KwS8 => self.primitive_type(NodeKind::TypeS8, sink, loc),
            TokenKind::KwS16 => self.primitive_type(NodeKind::TypeS16, sink, loc),
            TokenKind::KwS32 => self.primitive_type(NodeKind::TypeS32, sink, loc),
            TokenKind::KwS64 => self.primitive_type(NodeKind::TypeS64, sink, loc),
            TokenKind::KwU8 => self.primitive_type(NodeKind::TypeU8, sink, loc),
            TokenKind::KwU16 => self.primitive_type(NodeKind::TypeU16, sink, loc),
            TokenKind::KwU32 => self.primitive_type(NodeKind::TypeU32, sink, loc),
            TokenKind::KwU64 => self.primitive_type(NodeKind::TypeU64, sink, loc),
            TokenKind::KwF16 => self.primitive_type(NodeKind::TypeF16, sink, loc),
            TokenKind::KwF32 => self.primitive_type(NodeKind::TypeF32, sink, loc),
            TokenKind::KwF64 => self.primitive_type(NodeKind::TypeF64, sink, loc),
            TokenKind::KwBool => self.primitive_type(NodeKind::TypeBool, sink, loc),
            TokenKind::Func => {
                self.stream.advance(sink);
                self.stream.expect(TokenKind::LParen, sink)?;
                let mut params = Vec::new();
                if self.stream.peek_kind() != TokenKind::RParen {
                    loop {
                        params.push(self.parse_type(sink)?);
                        if self.stream.accept(TokenKind::Comma, sink).is_none() {
                            break;
                        }
                    }
                }
                self.stream.expect(TokenKind::RParen, sink)?;
                let params = self.other(params, loc.clone());
                let return_type = if self.stream.accept(TokenKind::Arrow, sink).is_some() {
                    self.parse_type(sink)?
                } else {
                    self.alloc(NodeKind::TypeVoid, Payload::None, vec![], loc.clone())
                };
                Some(self.alloc(NodeKind::TypeFunc, Payload::None, vec![params, return_type], loc))
            }
            TokenKind::Amp => {
                self.stream.advance(sink);
                let inner = self.parse_type(sink)?;
                Some(self.alloc(NodeKind::TypeRef, Payload::None, vec![inner], loc))
            }
            TokenKind::LBracket => {
                self.stream.advance(sink);
                if self.stream.accept(TokenKind::RBracket, sink).is_some() {
                    let elem = self.parse_type(sink)?;
                    Some(self.alloc(NodeKind::TypeSlice, Payload::None, vec![elem], loc))
                } else {
                    let len = self.parse_expr(sink)?;
                    self.stream.expect(TokenKind::RBracket, sink)?;
                    let elem = self.parse_type(sink)?;
                    Some(self.alloc(NodeKind::TypeArray, Payload::None, vec![len, elem], loc))
                }
            }
            TokenKind::Ident => {
                let tok = self.stream.advance(sink);
                let TokenPayload::Text(name) = tok.payload else {
                    unreachable!("Ident token always carries Text payload")
                };
                Some(self.alloc(NodeKind::TypeName, Payload::Ident { name, entry: None }, vec![], loc))
            }
            _ => {
                self.stream.unexpected_token(sink);
                None
            }
        }
    }

    fn primitive_type(&mut self, kind: NodeKind, sink: &mut dyn DiagnosticSink, loc: Location) -> PResult {
        self.stream.advance(sink);
        Some(self.alloc(kind, Payload::None, vec![], loc))
    }
}
