// hir.rs — High-level IR for Mesh source programs.
//
// The tree produced by the parser and consumed by the call rewriter and
// the type checker. Every node carries a `SimpleSpan` so downstream
// phases can report against the source.
//
// Calls and tensor reads share one surface syntax; the parser emits
// `TensorRead` for both and the rewrite phase converts reads whose base
// names a declared function into `Call` nodes. Tuple reads are never a
// distinct node: the checker discriminates on the base expression type.
//
// Preconditions: produced by the parser from a valid or partially-valid
//   token stream.
// Postconditions: each node's span covers the source range of the
//   construct.
// Failure modes: none (data-only module).
// Side effects: none.

use chumsky::span::SimpleSpan;

/// Byte-offset span (alias for chumsky's `SimpleSpan`).
pub type Span = SimpleSpan;

/// An identifier with its source text and span.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

/// An integer literal with its span, used where the grammar requires a
/// fixed number (ranges, tuple lengths).
#[derive(Debug, Clone, PartialEq)]
pub struct IntLiteral {
    pub val: i64,
    pub span: Span,
}

// ── Root ──

/// A complete Mesh program: a sequence of top-level declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub decls: Vec<Decl>,
    pub span: Span,
}

// ── Top-level declarations ──

#[derive(Debug, Clone, PartialEq)]
pub struct Decl {
    pub kind: DeclKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
    Element(ElementTypeDecl),
    Extern(ExternDecl),
    Func(FuncDecl),
    /// Global `const` declaration; checked like a statement-level const
    /// in the global scope.
    Const(VarDeclStmt),
}

/// `element IDENT field* end`
#[derive(Debug, Clone, PartialEq)]
pub struct ElementTypeDecl {
    pub name: Ident,
    pub fields: Vec<IdentDecl>,
}

/// `extern IDENT : type ;`
#[derive(Debug, Clone, PartialEq)]
pub struct ExternDecl {
    pub var: IdentDecl,
}

/// `func IDENT ( args ) -> ( results ) stmt* end`, or the argument- and
/// result-less `proc IDENT stmt* end` form.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub name: Ident,
    pub args: Vec<FuncArg>,
    pub results: Vec<IdentDecl>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncArg {
    pub decl: IdentDecl,
    pub inout: bool,
}

/// `IDENT : type` — a typed name in a field, extern, argument, result,
/// or var/const position.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentDecl {
    pub name: Ident,
    pub ty: TypeExpr,
    pub span: Span,
}

// ── Type expressions ──

#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Int,
    Float,
    Bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExprKind {
    /// `int` | `float` | `bool`
    Scalar(ScalarKind),
    /// A reference to a declared element kind.
    Element(Ident),
    /// `set{Elem}` or `set{Elem}(e1,...,ek)`
    Set {
        element: Ident,
        endpoints: Vec<Ident>,
    },
    /// `(Elem*n)`
    Tuple {
        element: Ident,
        length: IntLiteral,
    },
    /// `tensor[d1,...,dn](block)` with optional `'` column-vector mark.
    /// The block is a scalar or a nested tensor type.
    Tensor {
        block: Box<TypeExpr>,
        index_sets: Vec<IndexSetExpr>,
        column_vector: bool,
    },
}

/// One dimension in a tensor type: a range length, a named set, or `*`.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexSetExpr {
    Range(IntLiteral),
    Set(Ident),
    Dynamic(Span),
}

// ── Statements ──

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    VarDecl(VarDeclStmt),
    ConstDecl(VarDeclStmt),
    Assign(AssignStmt),
    While(WhileStmt),
    If(IfStmt),
    For(ForStmt),
    Print(PrintStmt),
    /// A bare expression statement; its value is discarded.
    Expr(Expr),
}

/// `var IDENT : type (= expr)? ;` / `const IDENT : type (= expr)? ;`
#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclStmt {
    pub var: IdentDecl,
    pub init: Option<Expr>,
}

/// `lhs1, ..., lhsn = expr ;`
#[derive(Debug, Clone, PartialEq)]
pub struct AssignStmt {
    pub lhs: Vec<Expr>,
    pub rhs: Expr,
}

/// `while cond stmt* end`
#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub cond: Expr,
    pub body: Vec<Stmt>,
}

/// `if cond stmt* (else stmt*)? end`
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub cond: Expr,
    pub then_body: Vec<Stmt>,
    pub else_body: Option<Vec<Stmt>>,
}

/// `for IDENT in lower:upper stmt* end`
#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub var: Ident,
    pub domain: RangeDomain,
    pub body: Vec<Stmt>,
}

/// `lower : upper` — an integral half-open loop range.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeDomain {
    pub lower: Expr,
    pub upper: Expr,
    pub span: Span,
}

/// `print expr ;`
#[derive(Debug, Clone, PartialEq)]
pub struct PrintStmt {
    pub expr: Expr,
}

// ── Expressions ──

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Map(MapExpr),
    Or(Box<Expr>, Box<Expr>),
    Xor(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    /// Chained comparison: `a < b <= c` has three operands and two ops.
    Cmp(CmpExpr),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    ElwiseMul(Box<Expr>, Box<Expr>),
    ElwiseDiv(Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
    /// Postfix `'`.
    Transpose(Box<Expr>),
    /// Produced by the call rewriter; never emitted by the parser.
    Call(CallExpr),
    TensorRead(TensorReadExpr),
    FieldRead(FieldReadExpr),
    Var(Ident),
    IntLit(i64),
    FloatLit(f64),
    BoolLit(bool),
    /// `[1, 2, 3]` with optional `'` transpose.
    IntVectorLit { vals: Vec<i64>, transposed: bool },
    /// `[1.0, 2.0]` with optional `'` transpose.
    FloatVectorLit { vals: Vec<f64>, transposed: bool },
    /// `[row, row, ...]` of nested literals. Never transposed: the
    /// parser only attaches `'` at rank 1.
    NDTensorLit { elems: Vec<Expr>, transposed: bool },
}

/// `map IDENT (partials)? to IDENT (reduce +)?`
#[derive(Debug, Clone, PartialEq)]
pub struct MapExpr {
    pub func: Ident,
    pub partial_actuals: Vec<Expr>,
    pub target: Ident,
    pub reduce: Option<ReduceOp>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    Sum,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CmpExpr {
    pub operands: Vec<Expr>,
    pub ops: Vec<CmpOp>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub func: Ident,
    pub args: Vec<Expr>,
}

/// `base(i1, ..., in)` — tensor read, tuple read, or (pre-rewrite) call.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorReadExpr {
    pub tensor: Box<Expr>,
    pub indices: Vec<ReadIndex>,
}

/// One index of a tensor read: `:` keeps the axis, an expression
/// selects along it.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadIndex {
    Slice(Span),
    Expr(Expr),
}

impl ReadIndex {
    pub fn is_slice(&self) -> bool {
        matches!(self, ReadIndex::Slice(_))
    }
}

/// `base.field`
#[derive(Debug, Clone, PartialEq)]
pub struct FieldReadExpr {
    pub base: Box<Expr>,
    pub field: Ident,
}
