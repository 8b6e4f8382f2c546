// rewrite.rs — Call rewriting
//
// Calls and tensor/tuple reads share the `name(args)` surface form, so
// the parser emits `TensorRead` for all of them. This pass converts a
// read whose base names a declared function (or a built-in intrinsic)
// and whose indices are all expressions into a `Call` node, so the
// checker sees calls and reads as distinct constructs.
//
// Assignment targets keep their read form: an lvalue head is never a
// call, only its index expressions are rewritten.
//
// Preconditions: `program` is a parsed HIR tree.
// Postconditions: every `name(args)` whose name matches a function
//   declared anywhere in the program (or an intrinsic) is a `Call`.
// Failure modes: none; names that match nothing are left as reads for
//   the checker to diagnose.
// Side effects: none.

use std::collections::HashSet;

use crate::context;
use crate::hir::*;

/// Rewrite all call-shaped tensor reads in `program`.
pub fn rewrite_calls(program: Program) -> Program {
    let mut funcs: HashSet<String> = context::intrinsic_names().into_iter().collect();
    for decl in &program.decls {
        if let DeclKind::Func(func) = &decl.kind {
            funcs.insert(func.name.name.clone());
        }
    }

    let decls = program
        .decls
        .into_iter()
        .map(|decl| rewrite_decl(decl, &funcs))
        .collect();

    Program {
        decls,
        span: program.span,
    }
}

fn rewrite_decl(decl: Decl, funcs: &HashSet<String>) -> Decl {
    let kind = match decl.kind {
        DeclKind::Func(func) => DeclKind::Func(FuncDecl {
            name: func.name,
            args: func.args,
            results: func.results,
            body: rewrite_body(func.body, funcs),
        }),
        DeclKind::Const(var_decl) => DeclKind::Const(rewrite_var_decl(var_decl, funcs)),
        other => other,
    };
    Decl {
        kind,
        span: decl.span,
    }
}

fn rewrite_body(body: Vec<Stmt>, funcs: &HashSet<String>) -> Vec<Stmt> {
    body.into_iter().map(|s| rewrite_stmt(s, funcs)).collect()
}

fn rewrite_var_decl(decl: VarDeclStmt, funcs: &HashSet<String>) -> VarDeclStmt {
    VarDeclStmt {
        var: decl.var,
        init: decl.init.map(|e| rewrite_expr(e, funcs)),
    }
}

fn rewrite_stmt(stmt: Stmt, funcs: &HashSet<String>) -> Stmt {
    let kind = match stmt.kind {
        StmtKind::VarDecl(decl) => StmtKind::VarDecl(rewrite_var_decl(decl, funcs)),
        StmtKind::ConstDecl(decl) => StmtKind::ConstDecl(rewrite_var_decl(decl, funcs)),
        StmtKind::Assign(assign) => StmtKind::Assign(AssignStmt {
            lhs: assign
                .lhs
                .into_iter()
                .map(|e| rewrite_lhs(e, funcs))
                .collect(),
            rhs: rewrite_expr(assign.rhs, funcs),
        }),
        StmtKind::While(w) => StmtKind::While(WhileStmt {
            cond: rewrite_expr(w.cond, funcs),
            body: rewrite_body(w.body, funcs),
        }),
        StmtKind::If(i) => StmtKind::If(IfStmt {
            cond: rewrite_expr(i.cond, funcs),
            then_body: rewrite_body(i.then_body, funcs),
            else_body: i.else_body.map(|b| rewrite_body(b, funcs)),
        }),
        StmtKind::For(f) => StmtKind::For(ForStmt {
            var: f.var,
            domain: RangeDomain {
                lower: rewrite_expr(f.domain.lower, funcs),
                upper: rewrite_expr(f.domain.upper, funcs),
                span: f.domain.span,
            },
            body: rewrite_body(f.body, funcs),
        }),
        StmtKind::Print(p) => StmtKind::Print(PrintStmt {
            expr: rewrite_expr(p.expr, funcs),
        }),
        StmtKind::Expr(e) => StmtKind::Expr(rewrite_expr(e, funcs)),
    };
    Stmt {
        kind,
        span: stmt.span,
    }
}

/// Rewrite an assignment target. The head of an lvalue stays a read or
/// field access; only nested index expressions are eligible for call
/// conversion.
fn rewrite_lhs(expr: Expr, funcs: &HashSet<String>) -> Expr {
    let kind = match expr.kind {
        ExprKind::TensorRead(read) => ExprKind::TensorRead(TensorReadExpr {
            tensor: Box::new(rewrite_lhs(*read.tensor, funcs)),
            indices: rewrite_indices(read.indices, funcs),
        }),
        ExprKind::FieldRead(read) => ExprKind::FieldRead(FieldReadExpr {
            base: Box::new(rewrite_lhs(*read.base, funcs)),
            field: read.field,
        }),
        other => {
            return rewrite_expr(
                Expr {
                    kind: other,
                    span: expr.span,
                },
                funcs,
            )
        }
    };
    Expr {
        kind,
        span: expr.span,
    }
}

fn rewrite_indices(indices: Vec<ReadIndex>, funcs: &HashSet<String>) -> Vec<ReadIndex> {
    indices
        .into_iter()
        .map(|index| match index {
            ReadIndex::Slice(span) => ReadIndex::Slice(span),
            ReadIndex::Expr(e) => ReadIndex::Expr(rewrite_expr(e, funcs)),
        })
        .collect()
}

fn rewrite_expr(expr: Expr, funcs: &HashSet<String>) -> Expr {
    let span = expr.span;
    let bin = |l: Expr, r: Expr, funcs: &HashSet<String>| {
        (
            Box::new(rewrite_expr(l, funcs)),
            Box::new(rewrite_expr(r, funcs)),
        )
    };
    let kind = match expr.kind {
        ExprKind::TensorRead(read) => {
            let tensor = rewrite_expr(*read.tensor, funcs);
            let indices = rewrite_indices(read.indices, funcs);
            let is_call = matches!(
                &tensor.kind,
                ExprKind::Var(name) if funcs.contains(&name.name)
            ) && indices.iter().all(|i| !i.is_slice());
            if is_call {
                let func = match tensor.kind {
                    ExprKind::Var(name) => name,
                    _ => unreachable!("guarded by is_call"),
                };
                let args = indices
                    .into_iter()
                    .map(|index| match index {
                        ReadIndex::Expr(e) => e,
                        ReadIndex::Slice(_) => unreachable!("guarded by is_call"),
                    })
                    .collect();
                ExprKind::Call(CallExpr { func, args })
            } else {
                ExprKind::TensorRead(TensorReadExpr {
                    tensor: Box::new(tensor),
                    indices,
                })
            }
        }
        ExprKind::FieldRead(read) => ExprKind::FieldRead(FieldReadExpr {
            base: Box::new(rewrite_expr(*read.base, funcs)),
            field: read.field,
        }),
        ExprKind::Map(map) => ExprKind::Map(MapExpr {
            func: map.func,
            partial_actuals: map
                .partial_actuals
                .into_iter()
                .map(|e| rewrite_expr(e, funcs))
                .collect(),
            target: map.target,
            reduce: map.reduce,
        }),
        ExprKind::Or(l, r) => {
            let (l, r) = bin(*l, *r, funcs);
            ExprKind::Or(l, r)
        }
        ExprKind::Xor(l, r) => {
            let (l, r) = bin(*l, *r, funcs);
            ExprKind::Xor(l, r)
        }
        ExprKind::And(l, r) => {
            let (l, r) = bin(*l, *r, funcs);
            ExprKind::And(l, r)
        }
        ExprKind::Not(e) => ExprKind::Not(Box::new(rewrite_expr(*e, funcs))),
        ExprKind::Cmp(cmp) => ExprKind::Cmp(CmpExpr {
            operands: cmp
                .operands
                .into_iter()
                .map(|e| rewrite_expr(e, funcs))
                .collect(),
            ops: cmp.ops,
        }),
        ExprKind::Add(l, r) => {
            let (l, r) = bin(*l, *r, funcs);
            ExprKind::Add(l, r)
        }
        ExprKind::Sub(l, r) => {
            let (l, r) = bin(*l, *r, funcs);
            ExprKind::Sub(l, r)
        }
        ExprKind::Mul(l, r) => {
            let (l, r) = bin(*l, *r, funcs);
            ExprKind::Mul(l, r)
        }
        ExprKind::Div(l, r) => {
            let (l, r) = bin(*l, *r, funcs);
            ExprKind::Div(l, r)
        }
        ExprKind::ElwiseMul(l, r) => {
            let (l, r) = bin(*l, *r, funcs);
            ExprKind::ElwiseMul(l, r)
        }
        ExprKind::ElwiseDiv(l, r) => {
            let (l, r) = bin(*l, *r, funcs);
            ExprKind::ElwiseDiv(l, r)
        }
        ExprKind::Neg(e) => ExprKind::Neg(Box::new(rewrite_expr(*e, funcs))),
        ExprKind::Transpose(e) => ExprKind::Transpose(Box::new(rewrite_expr(*e, funcs))),
        ExprKind::Call(call) => ExprKind::Call(CallExpr {
            func: call.func,
            args: call
                .args
                .into_iter()
                .map(|e| rewrite_expr(e, funcs))
                .collect(),
        }),
        leaf @ (ExprKind::Var(_)
        | ExprKind::IntLit(_)
        | ExprKind::FloatLit(_)
        | ExprKind::BoolLit(_)
        | ExprKind::IntVectorLit { .. }
        | ExprKind::FloatVectorLit { .. }
        | ExprKind::NDTensorLit { .. }) => leaf,
    };
    Expr { kind, span }
}

// ── Tests ──
