//! AST node definitions.
//!
//! Every syntactic category is a closed enum over per-construct structs, so
//! the checker and the lowerer are exhaustive matches. Nodes never point back
//! at their parents; the walkers thread the lexical context (current class,
//! enclosing loop, function return type) explicitly instead.

use crate::span::Span;
use std::fmt;

/// Dense identity for expression nodes, assigned by the [`crate::AstBuilder`].
///
/// Side tables (the checker's type map, for one) are indexed by this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(pub u32);

impl ExprId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// An identifier with its source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Ident {
            name: name.into(),
            span,
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Primitive type keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimType {
    Int,
    Double,
    Bool,
    String,
    Void,
}

/// A type as written in the source. Resolved to a semantic type id during
/// binding; never used for type comparisons directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Prim(PrimType, Span),
    Named(Ident),
    Array(Box<TypeExpr>, Span),
}

impl TypeExpr {
    pub fn span(&self) -> Span {
        match self {
            TypeExpr::Prim(_, span) => *span,
            TypeExpr::Named(id) => id.span,
            TypeExpr::Array(_, span) => *span,
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Equal,
    NotEqual,
    And,
    Or,
}

impl BinaryOp {
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod
        )
    }

    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            BinaryOp::Less | BinaryOp::LessEq | BinaryOp::Greater | BinaryOp::GreaterEq
        )
    }

    pub fn is_equality(&self) -> bool {
        matches!(self, BinaryOp::Equal | BinaryOp::NotEqual)
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Less => "<",
            BinaryOp::LessEq => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEq => ">=",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        };
        write!(f, "{}", s)
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Numeric negation (-)
    Neg,
    /// Logical not (!)
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Not => write!(f, "!"),
        }
    }
}

/// Which read built-in an expression invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadKind {
    Integer,
    Line,
}

#[derive(Debug, Clone)]
pub struct IntLit {
    pub id: ExprId,
    pub span: Span,
    pub value: i32,
}

#[derive(Debug, Clone)]
pub struct DoubleLit {
    pub id: ExprId,
    pub span: Span,
    pub value: f64,
}

#[derive(Debug, Clone)]
pub struct BoolLit {
    pub id: ExprId,
    pub span: Span,
    pub value: bool,
}

#[derive(Debug, Clone)]
pub struct StringLit {
    pub id: ExprId,
    pub span: Span,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct NullLit {
    pub id: ExprId,
    pub span: Span,
}

/// Placeholder where an expression is optional (for-loop slots, mostly).
#[derive(Debug, Clone)]
pub struct EmptyExpr {
    pub id: ExprId,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct BinaryExpr {
    pub id: ExprId,
    pub span: Span,
    pub op: BinaryOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct UnaryExpr {
    pub id: ExprId,
    pub span: Span,
    pub op: UnaryOp,
    pub operand: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct AssignExpr {
    pub id: ExprId,
    pub span: Span,
    pub target: Box<Expr>,
    pub value: Box<Expr>,
}

#[derive(Debug, Clone)]
pub struct ThisExpr {
    pub id: ExprId,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ArrayAccessExpr {
    pub id: ExprId,
    pub span: Span,
    pub base: Box<Expr>,
    pub subscript: Box<Expr>,
}

/// Field access covers both `base.field` and a bare `field`; whether an
/// implicit `this.` applies is decided during checking, not parsing.
#[derive(Debug, Clone)]
pub struct FieldAccessExpr {
    pub id: ExprId,
    pub span: Span,
    pub base: Option<Box<Expr>>,
    pub field: Ident,
}

/// Call covers both `base.method(args)` and a bare `function(args)`.
#[derive(Debug, Clone)]
pub struct CallExpr {
    pub id: ExprId,
    pub span: Span,
    pub base: Option<Box<Expr>>,
    pub method: Ident,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub struct NewObjectExpr {
    pub id: ExprId,
    pub span: Span,
    pub class: Ident,
}

#[derive(Debug, Clone)]
pub struct NewArrayExpr {
    pub id: ExprId,
    pub span: Span,
    pub size: Box<Expr>,
    pub elem: TypeExpr,
}

#[derive(Debug, Clone)]
pub struct ReadExpr {
    pub id: ExprId,
    pub span: Span,
    pub kind: ReadKind,
}

/// Stands in for a region the parser could not make sense of. Types as the
/// error type and never produces further diagnostics.
#[derive(Debug, Clone)]
pub struct ErrorExpr {
    pub id: ExprId,
    pub span: Span,
}

/// Expressions.
#[derive(Debug, Clone)]
pub enum Expr {
    IntLit(IntLit),
    DoubleLit(DoubleLit),
    BoolLit(BoolLit),
    StringLit(StringLit),
    NullLit(NullLit),
    Empty(EmptyExpr),
    Binary(BinaryExpr),
    Unary(UnaryExpr),
    Assign(AssignExpr),
    This(ThisExpr),
    ArrayAccess(ArrayAccessExpr),
    FieldAccess(FieldAccessExpr),
    Call(CallExpr),
    NewObject(NewObjectExpr),
    NewArray(NewArrayExpr),
    Read(ReadExpr),
    Error(ErrorExpr),
}

impl Expr {
    pub fn id(&self) -> ExprId {
        match self {
            Expr::IntLit(e) => e.id,
            Expr::DoubleLit(e) => e.id,
            Expr::BoolLit(e) => e.id,
            Expr::StringLit(e) => e.id,
            Expr::NullLit(e) => e.id,
            Expr::Empty(e) => e.id,
            Expr::Binary(e) => e.id,
            Expr::Unary(e) => e.id,
            Expr::Assign(e) => e.id,
            Expr::This(e) => e.id,
            Expr::ArrayAccess(e) => e.id,
            Expr::FieldAccess(e) => e.id,
            Expr::Call(e) => e.id,
            Expr::NewObject(e) => e.id,
            Expr::NewArray(e) => e.id,
            Expr::Read(e) => e.id,
            Expr::Error(e) => e.id,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Expr::IntLit(e) => e.span,
            Expr::DoubleLit(e) => e.span,
            Expr::BoolLit(e) => e.span,
            Expr::StringLit(e) => e.span,
            Expr::NullLit(e) => e.span,
            Expr::Empty(e) => e.span,
            Expr::Binary(e) => e.span,
            Expr::Unary(e) => e.span,
            Expr::Assign(e) => e.span,
            Expr::This(e) => e.span,
            Expr::ArrayAccess(e) => e.span,
            Expr::FieldAccess(e) => e.span,
            Expr::Call(e) => e.span,
            Expr::NewObject(e) => e.span,
            Expr::NewArray(e) => e.span,
            Expr::Read(e) => e.span,
            Expr::Error(e) => e.span,
        }
    }

    pub fn span_mut(&mut self) -> &mut Span {
        match self {
            Expr::IntLit(e) => &mut e.span,
            Expr::DoubleLit(e) => &mut e.span,
            Expr::BoolLit(e) => &mut e.span,
            Expr::StringLit(e) => &mut e.span,
            Expr::NullLit(e) => &mut e.span,
            Expr::Empty(e) => &mut e.span,
            Expr::Binary(e) => &mut e.span,
            Expr::Unary(e) => &mut e.span,
            Expr::Assign(e) => &mut e.span,
            Expr::This(e) => &mut e.span,
            Expr::ArrayAccess(e) => &mut e.span,
            Expr::FieldAccess(e) => &mut e.span,
            Expr::Call(e) => &mut e.span,
            Expr::NewObject(e) => &mut e.span,
            Expr::NewArray(e) => &mut e.span,
            Expr::Read(e) => &mut e.span,
            Expr::Error(e) => &mut e.span,
        }
    }
}

/// A braced block: declarations first, then statements.
#[derive(Debug, Clone)]
pub struct Block {
    pub span: Span,
    pub decls: Vec<VarDecl>,
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub span: Span,
    pub test: Expr,
    pub then_body: Box<Stmt>,
    pub else_body: Option<Box<Stmt>>,
}

#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub span: Span,
    pub test: Expr,
    pub body: Box<Stmt>,
}

#[derive(Debug, Clone)]
pub struct ForStmt {
    pub span: Span,
    pub init: Expr,
    pub test: Expr,
    pub step: Expr,
    pub body: Box<Stmt>,
}

#[derive(Debug, Clone)]
pub struct BreakStmt {
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub span: Span,
    pub value: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct PrintStmt {
    pub span: Span,
    pub args: Vec<Expr>,
}

/// Statements.
#[derive(Debug, Clone)]
pub enum Stmt {
    Expr(Expr),
    Block(Block),
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
    Break(BreakStmt),
    Return(ReturnStmt),
    Print(PrintStmt),
    Error(Span),
}

/// A variable declaration: globals, fields, formals, and block locals alike.
#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: Ident,
    pub declared: TypeExpr,
}

/// A function declaration. Interface prototypes carry no body.
#[derive(Debug, Clone)]
pub struct FnDecl {
    pub name: Ident,
    pub ret: TypeExpr,
    pub formals: Vec<VarDecl>,
    pub body: Option<Block>,
}

/// A class member, in declaration order.
#[derive(Debug, Clone)]
pub enum Member {
    Field(VarDecl),
    Method(FnDecl),
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: Ident,
    pub extends: Option<Ident>,
    pub implements: Vec<Ident>,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone)]
pub struct InterfaceDecl {
    pub name: Ident,
    pub prototypes: Vec<FnDecl>,
}

/// Top-level declarations.
#[derive(Debug, Clone)]
pub enum Decl {
    Var(VarDecl),
    Fn(FnDecl),
    Class(ClassDecl),
    Interface(InterfaceDecl),
}

impl Decl {
    pub fn name(&self) -> &Ident {
        match self {
            Decl::Var(d) => &d.name,
            Decl::Fn(d) => &d.name,
            Decl::Class(d) => &d.name,
            Decl::Interface(d) => &d.name,
        }
    }
}

/// A whole compilation unit. `expr_count` sizes the side tables indexed by
/// [`ExprId`].
#[derive(Debug, Clone)]
pub struct Program {
    pub decls: Vec<Decl>,
    pub expr_count: u32,
}
