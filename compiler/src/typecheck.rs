// typecheck.rs — Semantic analysis
//
// Walks the HIR top-down, lowering type syntax to IR types, inferring
// expression types, enforcing operator shape rules, validating
// statements and declarations, and populating the program context.
//
// Inference returns `Option`: `None` marks "a fault was already
// reported below this node". Parents gate their own checks on children
// being defined and keep going, so one run collects every independent
// fault. No user error ever crosses this boundary as a panic.
//
// Preconditions: `program` is a parsed HIR tree with calls rewritten
//   (see rewrite.rs).
// Postconditions: the returned context holds every element kind and
//   function that checked; `expr_types` maps each successfully inferred
//   expression span to its type list; the symbol stack is back at the
//   global scope.
// Failure modes: user errors produce `Diagnostic` entries; impossible
//   states produce internal-error diagnostics naming the invariant.
// Side effects: none.

use std::collections::HashMap;

use crate::context::ProgramContext;
use crate::diag::Diagnostic;
use crate::hir::{self, Span};
use crate::ir::{
    ComponentType, ElementType, Field, Func, FuncKind, IndexDomain, IndexSet, SetType, TensorType,
    TupleType, Type, Var,
};
use crate::shape::{self, DenseKind};
use crate::symtab::Access;

// ── Public types ─────────────────────────────────────────────────────────

/// Result of semantic analysis.
#[derive(Debug)]
pub struct CheckResult {
    /// Element kinds, functions, and the global symbol scope.
    pub context: ProgramContext,
    /// Inferred type list per expression span. Expressions that failed
    /// to check are absent.
    pub expr_types: HashMap<Span, Vec<Type>>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Type-check a program, accumulating diagnostics instead of failing
/// fast.
pub fn check(program: &hir::Program) -> CheckResult {
    let mut checker = Checker::new();
    checker.check_program(program);
    CheckResult {
        context: checker.ctx,
        expr_types: checker.expr_types,
        diagnostics: checker.diagnostics,
    }
}

// ── Reference mode ───────────────────────────────────────────────────────

/// Whether an expression position reads or writes its variable. Write
/// mode propagates through tensor-read and field-read bases so that
/// `A(i,j) = x` demands a writable `A`.
#[derive(Clone, Copy, PartialEq, Eq)]
enum RefMode {
    Read,
    Write,
}

// ── Checker ──────────────────────────────────────────────────────────────

struct Checker {
    ctx: ProgramContext,
    expr_types: HashMap<Span, Vec<Type>>,
    diagnostics: Vec<Diagnostic>,
}

impl Checker {
    fn new() -> Self {
        Self {
            ctx: ProgramContext::with_intrinsics(),
            expr_types: HashMap::new(),
            diagnostics: Vec::new(),
        }
    }

    fn error(&mut self, span: Span, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::error(span, message));
    }

    fn report_undeclared(&mut self, kind: &str, name: &str, span: Span) {
        self.error(span, format!("undeclared {} '{}'", kind, name));
    }

    fn report_multiple_defs(&mut self, kind: &str, name: &str, span: Span) {
        self.error(span, format!("multiple definitions of {} '{}'", kind, name));
    }

    // ── Program and declarations ─────────────────────────────────────────

    fn check_program(&mut self, program: &hir::Program) {
        for decl in &program.decls {
            match &decl.kind {
                hir::DeclKind::Element(elem) => self.check_element_decl(elem, decl.span),
                hir::DeclKind::Extern(ext) => self.check_extern_decl(ext, decl.span),
                hir::DeclKind::Func(func) => self.check_func_decl(func, decl.span),
                hir::DeclKind::Const(decl_stmt) => {
                    self.check_var_or_const_decl(decl_stmt, decl.span, true)
                }
            }
        }
    }

    fn check_element_decl(&mut self, decl: &hir::ElementTypeDecl, span: Span) {
        let mut fields = Vec::new();
        for field in &decl.fields {
            // fields whose types failed to lower are dropped, not fatal
            if let Some(ty) = self.lower_type(&field.ty) {
                fields.push(Field {
                    name: field.name.name.clone(),
                    ty,
                });
            }
        }

        if self.ctx.contains_element_type(&decl.name.name) {
            self.report_multiple_defs("element type", &decl.name.name, span);
            return;
        }

        self.ctx
            .add_element_type(ElementType::new(decl.name.name.clone(), fields));
    }

    fn check_extern_decl(&mut self, decl: &hir::ExternDecl, span: Span) {
        let var = self.lower_var(&decl.var);

        if self.ctx.has_symbol(&var.name, false) {
            self.report_multiple_defs("variable or constant", &var.name, span);
            return;
        }

        self.ctx.add_symbol(var, Access::ReadWrite);
    }

    fn check_func_decl(&mut self, decl: &hir::FuncDecl, span: Span) {
        let mut type_checked = true;

        self.ctx.scope();

        let mut args = Vec::new();
        for arg in &decl.args {
            let var = self.lower_var(&arg.decl);
            if var.ty.is_none() {
                type_checked = false;
                continue;
            }
            let access = if arg.inout {
                Access::ReadWrite
            } else {
                Access::Read
            };
            self.ctx.add_symbol(var.clone(), access);
            args.push(var);
        }

        let mut results = Vec::new();
        for res in &decl.results {
            let var = self.lower_var(res);
            if var.ty.is_none() {
                type_checked = false;
                continue;
            }
            self.ctx.add_symbol(var.clone(), Access::ReadWrite);
            results.push(var);
        }

        for stmt in &decl.body {
            self.check_stmt(stmt);
        }
        self.ctx.unscope();

        if !type_checked {
            return;
        }

        if self.ctx.contains_function(&decl.name.name) {
            self.report_multiple_defs("function or procedure", &decl.name.name, span);
            return;
        }

        self.ctx
            .add_function(Func::new(decl.name.name.clone(), args, results));
    }

    // ── Statements ───────────────────────────────────────────────────────

    fn check_stmt(&mut self, stmt: &hir::Stmt) {
        match &stmt.kind {
            hir::StmtKind::VarDecl(decl) => self.check_var_or_const_decl(decl, stmt.span, false),
            hir::StmtKind::ConstDecl(decl) => self.check_var_or_const_decl(decl, stmt.span, true),
            hir::StmtKind::Assign(assign) => self.check_assign(assign, stmt.span),
            hir::StmtKind::While(w) => self.check_while(w),
            hir::StmtKind::If(i) => self.check_if(i),
            hir::StmtKind::For(f) => self.check_for(f),
            hir::StmtKind::Print(p) => self.check_print(p),
            hir::StmtKind::Expr(e) => {
                self.infer(e, RefMode::Read);
            }
        }
    }

    fn check_var_or_const_decl(&mut self, decl: &hir::VarDeclStmt, span: Span, is_const: bool) {
        let var = self.lower_var(&decl.var);
        let var_type = var.ty.clone();

        // Re-declaration in the same scope; shadowing an outer binding
        // stays legal.
        if self.ctx.has_symbol(&var.name, true)
            && self
                .ctx
                .get_symbol(&var.name)
                .is_some_and(|s| s.var.ty.is_some())
        {
            self.report_multiple_defs("variable or constant", &var.name, span);
            return;
        }

        // Register before looking at the initializer: a self-reference
        // resolves to this binding instead of dangling.
        let access = if is_const {
            Access::Read
        } else {
            Access::ReadWrite
        };
        self.ctx.add_symbol(var, access);

        let init_type = match &decl.init {
            Some(init) => self.infer(init, RefMode::Read),
            None => None,
        };

        let var_type = match var_type {
            Some(ty) => ty,
            None => return,
        };

        // No initializer, or one that already failed to check.
        let init_type = match init_type {
            Some(ts) => ts,
            None => return,
        };

        if init_type.len() == 1 && init_type[0] == var_type {
            return;
        }

        let err_msg = format!(
            "cannot initialize a variable or constant of type '{}' with an expression of type {}",
            var_type,
            quoted_list(&init_type)
        );

        let var_tensor = match var_type.as_tensor() {
            Some(t) => t,
            None => {
                self.error(span, err_msg);
                return;
            }
        };
        if init_type.len() != 1 || !init_type[0].is_tensor() {
            self.error(span, err_msg);
            return;
        }
        let init_tensor = init_type[0].as_tensor().expect("checked above");

        // A tensor may be initialized with a scalar of its component
        // type.
        if init_tensor.is_scalar() && var_tensor.component == init_tensor.component {
            return;
        }

        // Constants additionally tolerate leading/trailing unit outer
        // dimensions, so literal shapes like 1×3 satisfy a 3×1 target.
        if is_const && var_tensor.block_type() == init_tensor.block_type() {
            let var_outer = var_tensor.outer_dims();
            let init_outer = init_tensor.outer_dims();
            if strip_unit_dims(&var_outer) == strip_unit_dims(&init_outer) {
                return;
            }
        }

        self.error(span, err_msg);
    }

    fn check_assign(&mut self, assign: &hir::AssignStmt, span: Span) {
        let expr_type = self.infer(&assign.rhs, RefMode::Read);
        let mut type_checked = expr_type.is_some();

        // Infer each target in write mode. A bare variable target need
        // not be declared beforehand; it becomes a new local below.
        let mut lhs_types: Vec<Option<Type>> = Vec::new();
        for lhs in &assign.lhs {
            if let hir::ExprKind::Var(ident) = &lhs.kind {
                if !self.ctx.has_symbol(&ident.name, false) {
                    lhs_types.push(None);
                    continue;
                }
            }
            match self.infer(lhs, RefMode::Write) {
                Some(ts) if ts.len() == 1 => lhs_types.push(Some(ts.into_iter().next().unwrap())),
                _ => lhs_types.push(None),
            }
        }

        // The right-hand side may produce several values (a call or a
        // map); the target count must match.
        if type_checked {
            let count = expr_type.as_ref().expect("checked above").len();
            if assign.lhs.len() != count {
                self.error(
                    span,
                    format!(
                        "cannot assign an expression returning {} values to {} targets",
                        count,
                        assign.lhs.len()
                    ),
                );
                type_checked = false;
            }
        }

        if type_checked {
            let expr_type = expr_type.as_ref().expect("checked above");
            for (i, lhs) in assign.lhs.iter().enumerate() {
                let Some(lhs_type) = &lhs_types[i] else {
                    continue;
                };
                if *lhs_type == expr_type[i] {
                    continue;
                }
                // A declared tensor target may take a scalar of its
                // component type.
                let scalar_init = lhs_type.as_tensor().zip(expr_type[i].as_tensor()).is_some_and(
                    |(lt, rt)| expr_type[i].is_scalar() && lt.component == rt.component,
                );
                if !scalar_init {
                    self.error(
                        lhs.span,
                        format!(
                            "cannot assign a value of type '{}' to a target of type '{}'",
                            expr_type[i], lhs_type
                        ),
                    );
                    type_checked = false;
                }
            }
        }

        // Bind new locals for undeclared bare-variable targets. When
        // anything above failed the binding is registered untyped so
        // later references do not cascade.
        for (i, lhs) in assign.lhs.iter().enumerate() {
            if let hir::ExprKind::Var(ident) = &lhs.kind {
                if !self.ctx.has_symbol(&ident.name, false) {
                    let var_type = if type_checked {
                        expr_type.as_ref().and_then(|ts| ts.get(i).cloned())
                    } else {
                        None
                    };
                    self.ctx
                        .add_symbol(Var::new(ident.name.clone(), var_type), Access::ReadWrite);
                }
            }
        }
    }

    fn check_while(&mut self, stmt: &hir::WhileStmt) {
        let cond_type = self.infer(&stmt.cond, RefMode::Read);

        self.ctx.scope();
        for s in &stmt.body {
            self.check_stmt(s);
        }
        self.ctx.unscope();

        self.check_boolean_cond(cond_type, stmt.cond.span);
    }

    fn check_if(&mut self, stmt: &hir::IfStmt) {
        let cond_type = self.infer(&stmt.cond, RefMode::Read);

        self.ctx.scope();
        for s in &stmt.then_body {
            self.check_stmt(s);
        }
        self.ctx.unscope();

        if let Some(else_body) = &stmt.else_body {
            self.ctx.scope();
            for s in else_body {
                self.check_stmt(s);
            }
            self.ctx.unscope();
        }

        self.check_boolean_cond(cond_type, stmt.cond.span);
    }

    fn check_boolean_cond(&mut self, cond_type: Option<Vec<Type>>, span: Span) {
        if let Some(ts) = cond_type {
            if ts.len() != 1 || !ts[0].is_boolean() {
                self.error(
                    span,
                    format!(
                        "expected a boolean conditional expression but got an expression of type {}",
                        quoted_list(&ts)
                    ),
                );
            }
        }
    }

    fn check_for(&mut self, stmt: &hir::ForStmt) {
        self.ctx.scope();
        self.check_range_domain(&stmt.domain);

        self.ctx.add_symbol(
            Var::new(stmt.var.name.clone(), Some(Type::int())),
            Access::Read,
        );

        for s in &stmt.body {
            self.check_stmt(s);
        }
        self.ctx.unscope();
    }

    fn check_range_domain(&mut self, domain: &hir::RangeDomain) {
        let lower_type = self.infer(&domain.lower, RefMode::Read);
        let upper_type = self.infer(&domain.upper, RefMode::Read);

        if let Some(ts) = lower_type {
            if ts.len() != 1 || !ts[0].is_int() {
                self.error(
                    domain.lower.span,
                    format!(
                        "expected lower bound of for-loop range to be integral but got an expression of type {}",
                        quoted_list(&ts)
                    ),
                );
            }
        }
        if let Some(ts) = upper_type {
            if ts.len() != 1 || !ts[0].is_int() {
                self.error(
                    domain.upper.span,
                    format!(
                        "expected upper bound of for-loop range to be integral but got an expression of type {}",
                        quoted_list(&ts)
                    ),
                );
            }
        }
    }

    fn check_print(&mut self, stmt: &hir::PrintStmt) {
        let expr_type = self.infer(&stmt.expr, RefMode::Read);

        if let Some(ts) = expr_type {
            if ts.len() != 1 || !ts[0].is_tensor() {
                self.error(
                    stmt.expr.span,
                    format!("cannot print an expression of type {}", quoted_list(&ts)),
                );
            }
        }
    }

    // ── Type syntax lowering ─────────────────────────────────────────────

    fn lower_var(&mut self, decl: &hir::IdentDecl) -> Var {
        Var::new(decl.name.name.clone(), self.lower_type(&decl.ty))
    }

    fn lower_type(&mut self, ty: &hir::TypeExpr) -> Option<Type> {
        match &ty.kind {
            hir::TypeExprKind::Scalar(kind) => Some(Type::scalar(match kind {
                hir::ScalarKind::Int => ComponentType::Int,
                hir::ScalarKind::Float => ComponentType::Float,
                hir::ScalarKind::Bool => ComponentType::Bool,
            })),
            hir::TypeExprKind::Element(name) => self
                .lower_element_ref(name)
                .map(Type::Element),
            hir::TypeExprKind::Set { element, endpoints } => {
                self.lower_set_type(element, endpoints)
            }
            hir::TypeExprKind::Tuple { element, length } => {
                if length.val < 1 {
                    self.error(
                        length.span,
                        "tuple must have length greater than or equal to one",
                    );
                    return None;
                }
                let elem = self.lower_element_ref(element)?;
                Some(Type::Tuple(TupleType::new(elem, length.val)))
            }
            hir::TypeExprKind::Tensor {
                block,
                index_sets,
                column_vector,
            } => self.lower_tensor_type(block, index_sets, *column_vector, ty.span),
        }
    }

    fn lower_element_ref(&mut self, name: &hir::Ident) -> Option<ElementType> {
        match self.ctx.get_element_type(&name.name) {
            Some(elem) => Some(elem.clone()),
            None => {
                self.report_undeclared("element type", &name.name, name.span);
                None
            }
        }
    }

    fn lower_set_type(
        &mut self,
        element: &hir::Ident,
        endpoints: &[hir::Ident],
    ) -> Option<Type> {
        let elem = self.lower_element_ref(element);
        let mut type_checked = elem.is_some();

        // Check every endpoint before giving up so each bad one gets
        // its own diagnostic.
        let mut endpoint_names = Vec::new();
        for end in endpoints {
            let Some(endpoint_type) = self.ctx.get_symbol(&end.name).map(|s| s.var.ty.clone())
            else {
                self.report_undeclared("set", &end.name, end.span);
                type_checked = false;
                continue;
            };
            match endpoint_type {
                Some(ty) if ty.is_set() => endpoint_names.push(end.name.clone()),
                Some(ty) => {
                    let msg = format!(
                        "expected endpoint to be of set type but got an endpoint of type '{}'",
                        ty
                    );
                    self.error(end.span, msg);
                    type_checked = false;
                }
                None => {
                    type_checked = false;
                }
            }
        }

        if !type_checked {
            return None;
        }

        Some(Type::Set(SetType::new(
            elem.expect("checked via type_checked"),
            endpoint_names,
        )))
    }

    fn lower_index_set(&mut self, index_set: &hir::IndexSetExpr) -> Option<IndexSet> {
        match index_set {
            hir::IndexSetExpr::Range(lit) => Some(IndexSet::Range(lit.val)),
            hir::IndexSetExpr::Set(name) => {
                let Some(symbol_type) = self.ctx.get_symbol(&name.name).map(|s| s.var.ty.clone())
                else {
                    self.report_undeclared("set", &name.name, name.span);
                    return None;
                };
                match symbol_type {
                    Some(ty) if ty.is_set() => Some(IndexSet::Set(name.name.clone())),
                    _ => {
                        self.error(
                            name.span,
                            "index set must be a set, a range, or dynamic (*)",
                        );
                        None
                    }
                }
            }
            hir::IndexSetExpr::Dynamic(_) => Some(IndexSet::Dynamic),
        }
    }

    fn lower_tensor_type(
        &mut self,
        block: &hir::TypeExpr,
        index_sets: &[hir::IndexSetExpr],
        column_vector: bool,
        span: Span,
    ) -> Option<Type> {
        let block_type = self.lower_type(block);
        let mut type_checked = block_type.is_some();

        let mut sets = Vec::new();
        for index_set in index_sets {
            match self.lower_index_set(index_set) {
                Some(s) => sets.push(s),
                None => type_checked = false,
            }
        }

        if !type_checked {
            return None;
        }
        let block_type = block_type.expect("checked via type_checked");

        let nd_type = if sets.is_empty() {
            block_type
        } else {
            let Some(block_tensor) = block_type.as_tensor() else {
                self.error(block.span, "tensor components must be scalars or tensors");
                return None;
            };

            // A blocked tensor repeats the block's structure under each
            // outer axis, so the counts must line up.
            let dims = if block_tensor.order() == 0 {
                sets.into_iter().map(IndexDomain::new).collect::<Vec<_>>()
            } else if block_tensor.order() == sets.len() {
                sets.into_iter()
                    .zip(&block_tensor.dims)
                    .map(|(outer, block_dim)| {
                        let mut index_sets = vec![outer];
                        index_sets.extend(block_dim.index_sets.iter().cloned());
                        IndexDomain::from_sets(index_sets)
                    })
                    .collect::<Vec<_>>()
            } else {
                self.error(
                    span,
                    "blocked tensor type must contain same number of dimensions as its blocks",
                );
                return None;
            };

            Type::Tensor(TensorType::new(block_tensor.component, dims, false))
        };

        if column_vector {
            let Some(tensor) = nd_type.as_tensor() else {
                self.error(block.span, "tensor components must be scalars or tensors");
                return None;
            };
            if tensor.order() != 1 {
                self.error(
                    span,
                    format!(
                        "tensor type declared with {} dimensions but column vector type must strictly contain one",
                        tensor.order()
                    ),
                );
                return None;
            }
            return Some(Type::Tensor(TensorType::new(
                tensor.component,
                tensor.dims.clone(),
                true,
            )));
        }

        Some(nd_type)
    }

    // ── Expression inference ─────────────────────────────────────────────

    /// Infer an expression's type list, recording it in the side map on
    /// success.
    fn infer(&mut self, expr: &hir::Expr, mode: RefMode) -> Option<Vec<Type>> {
        let result = self.infer_kind(expr, mode);
        if let Some(types) = &result {
            self.expr_types.insert(expr.span, types.clone());
        }
        result
    }

    fn infer_kind(&mut self, expr: &hir::Expr, mode: RefMode) -> Option<Vec<Type>> {
        match &expr.kind {
            hir::ExprKind::Map(map) => self.infer_map(map, expr.span),
            hir::ExprKind::Or(l, r) | hir::ExprKind::Xor(l, r) | hir::ExprKind::And(l, r) => {
                self.infer_binary_boolean(l, r)
            }
            hir::ExprKind::Not(operand) => self.infer_not(operand),
            hir::ExprKind::Cmp(cmp) => self.infer_cmp(cmp),
            hir::ExprKind::Add(l, r)
            | hir::ExprKind::Sub(l, r)
            | hir::ExprKind::ElwiseMul(l, r)
            | hir::ExprKind::ElwiseDiv(l, r) => self.infer_binary_elwise(l, r, expr.span),
            hir::ExprKind::Mul(l, r) => self.infer_mul(l, r, expr.span),
            hir::ExprKind::Div(l, r) => self.infer_div(l, r, expr.span),
            hir::ExprKind::Neg(operand) => self.infer_neg(operand),
            hir::ExprKind::Transpose(operand) => self.infer_transpose(operand),
            hir::ExprKind::Call(call) => self.infer_call(call, expr.span),
            hir::ExprKind::TensorRead(read) => self.infer_tensor_read(read, expr.span, mode),
            hir::ExprKind::FieldRead(read) => self.infer_field_read(read, expr.span, mode),
            hir::ExprKind::Var(ident) => self.infer_var(ident, mode),
            hir::ExprKind::IntLit(_) => Some(vec![Type::int()]),
            hir::ExprKind::FloatLit(_) => Some(vec![Type::float()]),
            hir::ExprKind::BoolLit(_) => Some(vec![Type::boolean()]),
            hir::ExprKind::IntVectorLit { .. }
            | hir::ExprKind::FloatVectorLit { .. }
            | hir::ExprKind::NDTensorLit { .. } => self.infer_dense_literal(expr),
        }
    }

    fn infer_var(&mut self, ident: &hir::Ident, mode: RefMode) -> Option<Vec<Type>> {
        let Some(sym) = self.ctx.get_symbol(&ident.name) else {
            self.report_undeclared("variable or constant", &ident.name, ident.span);
            return None;
        };
        let sym = sym.clone();

        // Permission faults are reported but do not poison the type.
        match mode {
            RefMode::Write => {
                if !sym.is_writable() {
                    self.error(ident.span, format!("'{}' is not writable", ident.name));
                }
            }
            RefMode::Read => {
                if !sym.is_readable() {
                    self.error(ident.span, format!("'{}' is not readable", ident.name));
                }
            }
        }

        sym.var.ty.map(|ty| vec![ty])
    }

    fn infer_binary_boolean(&mut self, lhs: &hir::Expr, rhs: &hir::Expr) -> Option<Vec<Type>> {
        let lhs_type = self.infer(lhs, RefMode::Read);
        let rhs_type = self.infer(rhs, RefMode::Read);

        if let Some(ts) = lhs_type {
            if ts.len() != 1 || !ts[0].is_boolean() {
                self.error(
                    lhs.span,
                    format!(
                        "expected left operand of boolean operation to be a boolean but got an operand of type {}",
                        quoted_list(&ts)
                    ),
                );
            }
        }
        if let Some(ts) = rhs_type {
            if ts.len() != 1 || !ts[0].is_boolean() {
                self.error(
                    rhs.span,
                    format!(
                        "expected right operand of boolean operation to be a boolean but got an operand of type {}",
                        quoted_list(&ts)
                    ),
                );
            }
        }

        Some(vec![Type::boolean()])
    }

    fn infer_not(&mut self, operand: &hir::Expr) -> Option<Vec<Type>> {
        let operand_type = self.infer(operand, RefMode::Read);

        if let Some(ts) = operand_type {
            if ts.len() != 1 || !ts[0].is_boolean() {
                self.error(
                    operand.span,
                    format!(
                        "expected a boolean operand but got an operand of type {}",
                        quoted_list(&ts)
                    ),
                );
            }
        }

        Some(vec![Type::boolean()])
    }

    fn infer_cmp(&mut self, cmp: &hir::CmpExpr) -> Option<Vec<Type>> {
        let mut rep_type: Option<Type> = None;
        for operand in &cmp.operands {
            let Some(ts) = self.infer(operand, RefMode::Read) else {
                continue;
            };

            if ts.len() != 1 || !ts[0].is_scalar() {
                self.error(
                    operand.span,
                    format!(
                        "comparison operations can only be performed on scalar values, not values of type {}",
                        quoted_list(&ts)
                    ),
                );
                continue;
            }

            // All operands of a comparison chain share one scalar type.
            match &rep_type {
                None => rep_type = Some(ts[0].clone()),
                Some(rep) => {
                    if ts[0] != *rep {
                        self.error(
                            operand.span,
                            format!(
                                "value of type '{}' cannot be compared to value of type '{}'",
                                ts[0], rep
                            ),
                        );
                    }
                }
            }
        }

        Some(vec![Type::boolean()])
    }

    /// Report unless `side` is a single numeric tensor. Returns the
    /// tensor type when it is.
    fn numeric_tensor_operand(
        &mut self,
        operand_type: &Option<Vec<Type>>,
        span: Span,
        what: &str,
    ) -> Option<TensorType> {
        let ts = operand_type.as_ref()?;
        if ts.len() != 1 || !ts[0].is_numeric_tensor() {
            self.error(
                span,
                format!(
                    "expected {} to be a numeric tensor but got an operand of type {}",
                    what,
                    quoted_list(ts)
                ),
            );
            return None;
        }
        Some(ts[0].as_tensor().expect("numeric tensor").clone())
    }

    fn infer_binary_elwise(
        &mut self,
        lhs: &hir::Expr,
        rhs: &hir::Expr,
        span: Span,
    ) -> Option<Vec<Type>> {
        let lhs_type = self.infer(lhs, RefMode::Read);
        let rhs_type = self.infer(rhs, RefMode::Read);

        let ltype = self.numeric_tensor_operand(
            &lhs_type,
            lhs.span,
            "left operand of element-wise operation",
        );
        let rtype = self.numeric_tensor_operand(
            &rhs_type,
            rhs.span,
            "right operand of element-wise operation",
        );
        let (ltype, rtype) = match (ltype, rtype) {
            (Some(l), Some(r)) => (l, r),
            _ => return None,
        };

        // With a scalar operand only the component types must agree;
        // otherwise the full shapes (column flag included) must match.
        let has_scalar_operand = ltype.order() == 0 || rtype.order() == 0;
        let compatible = if has_scalar_operand {
            ltype.component == rtype.component
        } else {
            ltype == rtype
        };
        if !compatible {
            self.error(
                span,
                format!(
                    "cannot perform element-wise operation on tensors of type '{}' and type '{}'",
                    Type::Tensor(ltype),
                    Type::Tensor(rtype)
                ),
            );
            return None;
        }

        if ltype.order() > 0 {
            Some(vec![Type::Tensor(ltype)])
        } else {
            Some(vec![Type::Tensor(rtype)])
        }
    }

    fn infer_mul(&mut self, lhs: &hir::Expr, rhs: &hir::Expr, span: Span) -> Option<Vec<Type>> {
        let lhs_type = self.infer(lhs, RefMode::Read);
        let rhs_type = self.infer(rhs, RefMode::Read);

        let ltype = self.numeric_tensor_operand(
            &lhs_type,
            lhs.span,
            "left operand of multiplication operation",
        );
        let rtype = self.numeric_tensor_operand(
            &rhs_type,
            rhs.span,
            "right operand of multiplication operation",
        );
        let (ltype, rtype) = match (ltype, rtype) {
            (Some(l), Some(r)) => (l, r),
            _ => return None,
        };

        if ltype.component != rtype.component {
            self.error(
                span,
                format!(
                    "cannot multiply tensors containing elements of type '{}' and type '{}'",
                    ltype.component, rtype.component
                ),
            );
            return None;
        }

        let lhs_order = ltype.order();
        let rhs_order = rtype.order();

        if lhs_order == 0 || rhs_order == 0 {
            let result = if lhs_order > 0 { ltype } else { rtype };
            Some(vec![Type::Tensor(result)])
        } else if lhs_order == 1 && rhs_order == 1 {
            if ltype.column_vector && rtype.column_vector {
                self.error(span, "cannot multiply two column vectors");
                return None;
            }
            if !ltype.column_vector && !rtype.column_vector {
                self.error(span, "cannot multiply two row vectors");
                return None;
            }
            if ltype.dims[0] != rtype.dims[0] {
                self.error(
                    span,
                    format!(
                        "cannot multiply vectors of type '{}' and type '{}'",
                        Type::Tensor(ltype),
                        Type::Tensor(rtype)
                    ),
                );
                return None;
            }

            // column × row is an outer product; row × column contracts
            // to a scalar.
            let dims = if ltype.column_vector {
                vec![ltype.dims[0].clone(), rtype.dims[0].clone()]
            } else {
                Vec::new()
            };
            Some(vec![Type::Tensor(TensorType::new(
                ltype.component,
                dims,
                false,
            ))])
        } else if lhs_order == 2 && rhs_order == 1 {
            if ltype.dims[1] != rtype.dims[0] {
                self.error(
                    span,
                    format!(
                        "cannot multiply a matrix of type '{}' by a vector of type '{}'",
                        Type::Tensor(ltype),
                        Type::Tensor(rtype)
                    ),
                );
                return None;
            }
            if !rtype.column_vector {
                self.error(span, "cannot multiply a matrix by a row vector");
            }
            Some(vec![Type::Tensor(TensorType::new(
                ltype.component,
                vec![ltype.dims[0].clone()],
                true,
            ))])
        } else if lhs_order == 1 && rhs_order == 2 {
            if ltype.dims[0] != rtype.dims[0] {
                self.error(
                    span,
                    format!(
                        "cannot multiply a vector of type '{}' by a matrix of type '{}'",
                        Type::Tensor(ltype),
                        Type::Tensor(rtype)
                    ),
                );
                return None;
            }
            if ltype.column_vector {
                self.error(span, "cannot multiply a column vector by a matrix");
            }
            Some(vec![Type::Tensor(TensorType::new(
                ltype.component,
                vec![rtype.dims[1].clone()],
                false,
            ))])
        } else if lhs_order == 2 && rhs_order == 2 {
            if ltype.dims[1] != rtype.dims[0] {
                self.error(
                    span,
                    format!(
                        "cannot multiply matrices of type '{}' and type '{}'",
                        Type::Tensor(ltype),
                        Type::Tensor(rtype)
                    ),
                );
                return None;
            }
            Some(vec![Type::Tensor(TensorType::new(
                ltype.component,
                vec![ltype.dims[0].clone(), rtype.dims[1].clone()],
                false,
            ))])
        } else {
            self.error(span, "cannot multiply tensors of order 3 or greater using *");
            None
        }
    }

    fn infer_div(&mut self, lhs: &hir::Expr, rhs: &hir::Expr, span: Span) -> Option<Vec<Type>> {
        let lhs_type = self.infer(lhs, RefMode::Read);
        let rhs_type = self.infer(rhs, RefMode::Read);

        let ltype =
            self.numeric_tensor_operand(&lhs_type, lhs.span, "left operand of division operation");
        let rtype = self.numeric_tensor_operand(
            &rhs_type,
            rhs.span,
            "right operand of division operation",
        );
        let (ltype, rtype) = match (ltype, rtype) {
            (Some(l), Some(r)) => (l, r),
            _ => return None,
        };

        if ltype.component != rtype.component {
            self.error(
                span,
                format!(
                    "cannot divide tensors containing elements of type '{}' and type '{}'",
                    ltype.component, rtype.component
                ),
            );
            return None;
        }

        if ltype.order() > 0 && rtype.order() > 0 {
            self.error(
                span,
                format!(
                    "division of a non-scalar tensor of type '{}' by a non-scalar tensor of type '{}' is not supported",
                    Type::Tensor(ltype),
                    Type::Tensor(rtype)
                ),
            );
            return None;
        }

        if ltype.order() > 0 {
            Some(vec![Type::Tensor(ltype)])
        } else {
            Some(vec![Type::Tensor(rtype)])
        }
    }

    fn infer_neg(&mut self, operand: &hir::Expr) -> Option<Vec<Type>> {
        let operand_type = self.infer(operand, RefMode::Read)?;

        if operand_type.len() != 1 || !operand_type[0].is_numeric_tensor() {
            self.error(
                operand.span,
                format!(
                    "expected operand of tensor negation to be a numeric tensor but got an operand of type {}",
                    quoted_list(&operand_type)
                ),
            );
            return None;
        }

        Some(operand_type)
    }

    fn infer_transpose(&mut self, operand: &hir::Expr) -> Option<Vec<Type>> {
        let operand_type = self.infer(operand, RefMode::Read)?;

        let tensor = operand_type
            .first()
            .filter(|_| operand_type.len() == 1)
            .and_then(|t| t.as_tensor())
            .filter(|t| t.order() <= 2);
        let Some(tensor) = tensor else {
            self.error(
                operand.span,
                format!(
                    "operand of tensor transpose must be a tensor of order 2 or less, but got an operand of type {}",
                    quoted_list(&operand_type)
                ),
            );
            return None;
        };

        let result = match tensor.order() {
            0 => tensor.clone(),
            1 => TensorType::new(
                tensor.component,
                tensor.dims.clone(),
                !tensor.column_vector,
            ),
            2 => TensorType::new(
                tensor.component,
                vec![tensor.dims[1].clone(), tensor.dims[0].clone()],
                false,
            ),
            _ => unreachable!("transpose operand order checked above"),
        };
        Some(vec![Type::Tensor(result)])
    }

    fn infer_call(&mut self, call: &hir::CallExpr, span: Span) -> Option<Vec<Type>> {
        let Some(func) = self.ctx.get_function(&call.func.name).cloned() else {
            // A use before the function's declaration point.
            self.report_undeclared("function", &call.func.name, call.func.span);
            return None;
        };

        let mut arg_types = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            arg_types.push(self.infer(arg, RefMode::Read));
        }

        if call.args.len() != func.args.len() {
            // Zero-argument intrinsics are shape generic and skip the
            // arity check.
            if !(func.kind == FuncKind::Intrinsic && func.args.is_empty()) {
                self.error(
                    span,
                    format!(
                        "passed in {} arguments but function '{}' expects {}",
                        call.args.len(),
                        func.name,
                        func.args.len()
                    ),
                );
            }
        } else {
            for (i, arg) in call.args.iter().enumerate() {
                let Some(arg_type) = &arg_types[i] else {
                    continue;
                };

                if arg_type.is_empty() {
                    self.error(arg.span, "must pass a non-void value as argument");
                    continue;
                }
                if arg_type.len() != 1 {
                    self.error(
                        arg.span,
                        format!(
                            "cannot pass multiple values of types {} as a single argument",
                            quoted_list(arg_type)
                        ),
                    );
                    continue;
                }

                let Some(expected) = &func.args[i].ty else {
                    continue;
                };
                if arg_type[0] != *expected {
                    self.error(
                        arg.span,
                        format!(
                            "expected argument of type '{}' but got an argument of type {}",
                            expected,
                            quoted_list(arg_type)
                        ),
                    );
                }
            }
        }

        Some(func.result_types())
    }

    fn infer_map(&mut self, map: &hir::MapExpr, span: Span) -> Option<Vec<Type>> {
        // Partial actuals are evaluated first; each must be a single
        // non-void value.
        let mut actuals_types: Vec<Option<Type>> = Vec::with_capacity(map.partial_actuals.len());
        for param in &map.partial_actuals {
            let mut slot = None;
            if let Some(ts) = self.infer(param, RefMode::Read) {
                if ts.is_empty() {
                    self.error(param.span, "must pass a non-void value as argument");
                } else if ts.len() != 1 {
                    self.error(
                        param.span,
                        format!(
                            "cannot pass multiple values of types {} as a single argument",
                            quoted_list(&ts)
                        ),
                    );
                } else {
                    slot = Some(ts[0].clone());
                }
            }
            actuals_types.push(slot);
        }

        let func = match self.ctx.get_function(&map.func.name).cloned() {
            Some(f) => Some(f),
            None => {
                self.report_undeclared("function", &map.func.name, map.func.span);
                None
            }
        };

        // The map's type is the assembly function's result list, even
        // when later argument checks fail.
        let ret = func.as_ref().map(|f| f.result_types());

        let target_set = if !self.ctx.has_symbol(&map.target.name, false) {
            self.report_undeclared("set", &map.target.name, map.target.span);
            None
        } else {
            let target_type = self
                .ctx
                .get_symbol(&map.target.name)
                .expect("checked above")
                .var
                .ty
                .clone();
            match target_type {
                Some(Type::Set(set_type)) => Some(set_type),
                _ => {
                    self.error(map.target.span, "map operation can only be applied to sets");
                    None
                }
            }
        };

        let (func, target_set) = match (func, target_set) {
            (Some(f), Some(t)) => (f, t),
            _ => return ret,
        };

        // Synthesize the implicit arguments: the element, and for edge
        // sets whose assembly function wants them, the neighbor tuple.
        actuals_types.push(Some(Type::Element(target_set.element.clone())));

        if !target_set.endpoints.is_empty() && actuals_types.len() != func.args.len() {
            // Homogeneous endpoints only: the tuple takes its element
            // kind from the first endpoint.
            match self.endpoint_element(&target_set.endpoints[0]) {
                Some(neighbor_elem) => {
                    actuals_types.push(Some(Type::Tuple(TupleType::new(
                        neighbor_elem,
                        target_set.endpoints.len() as i64,
                    ))));
                }
                None => {
                    self.error(
                        map.target.span,
                        "internal: endpoint of a checked edge set is not a set symbol",
                    );
                    return ret;
                }
            }
        }

        if actuals_types.len() != func.args.len() {
            self.error(
                span,
                format!(
                    "map operation passes {} arguments to assembly function but function '{}' expects {} arguments",
                    actuals_types.len(),
                    func.name,
                    func.args.len()
                ),
            );
            return ret;
        }

        for i in 0..actuals_types.len() {
            let (Some(actual), Some(expected)) = (&actuals_types[i], &func.args[i].ty) else {
                continue;
            };
            if actual != expected {
                let at = if i < map.partial_actuals.len() {
                    map.partial_actuals[i].span
                } else {
                    map.target.span
                };
                self.error(
                    at,
                    format!(
                        "map operation passes argument of type '{}' to assembly function but function '{}' expects argument of type '{}'",
                        actual, func.name, expected
                    ),
                );
            }
        }

        ret
    }

    fn infer_tensor_read(
        &mut self,
        read: &hir::TensorReadExpr,
        span: Span,
        mode: RefMode,
    ) -> Option<Vec<Type>> {
        let base_type = self.infer(&read.tensor, mode)?;

        // Reading elements out of a multi-value (e.g. a two-result
        // call) is not meaningful.
        if base_type.len() != 1 {
            self.error(
                read.tensor.span,
                "can only access elements of a single tensor or tuple",
            );
            return None;
        }

        match &base_type[0] {
            Type::Tensor(tensor) => {
                let tensor = tensor.clone();
                if tensor.order() != read.indices.len() {
                    self.error(
                        span,
                        format!(
                            "tensor access expected {} indices but got {}",
                            tensor.order(),
                            read.indices.len()
                        ),
                    );
                    return None;
                }

                let mut dims = Vec::new();
                for (i, index) in read.indices.iter().enumerate() {
                    let index_expr = match index {
                        hir::ReadIndex::Slice(_) => {
                            // A slice keeps the whole dimension, block
                            // nesting included.
                            dims.push(tensor.dims[i].clone());
                            continue;
                        }
                        hir::ReadIndex::Expr(e) => e,
                    };

                    let Some(index_type) = self.infer(index_expr, RefMode::Read) else {
                        continue;
                    };

                    if index_type.is_empty() {
                        self.error(index_expr.span, "must pass a non-void value as index");
                        continue;
                    }
                    if index_type.len() != 1 {
                        self.error(
                            index_expr.span,
                            format!(
                                "cannot pass multiple values of types {} as a single index",
                                quoted_list(&index_type)
                            ),
                        );
                        continue;
                    }

                    match tensor.dims[i].outer() {
                        IndexSet::Range(_) => {
                            if !index_type[0].is_int() {
                                self.error(
                                    index_expr.span,
                                    format!(
                                        "expected an integral index but got an index of type {}",
                                        quoted_list(&index_type)
                                    ),
                                );
                            }
                        }
                        IndexSet::Set(set_name) => {
                            // A set axis also accepts an element of
                            // that set.
                            if !index_type[0].is_int() {
                                if let Some(elem) = self.endpoint_element(set_name) {
                                    if Type::Element(elem.clone()) != index_type[0] {
                                        self.error(
                                            index_expr.span,
                                            format!(
                                                "expected an integral index or an index of type '{}' but got an index of type {}",
                                                Type::Element(elem),
                                                quoted_list(&index_type)
                                            ),
                                        );
                                    }
                                }
                            }
                        }
                        IndexSet::Dynamic => {}
                    }
                }

                let result = if dims.is_empty() {
                    tensor.block_type()
                } else {
                    let is_column = dims.len() == 1
                        && !read.indices.last().expect("arity checked above").is_slice();
                    Type::Tensor(TensorType::new(tensor.component, dims, is_column))
                };
                Some(vec![result])
            }
            Type::Tuple(tuple) => {
                let element = tuple.element.clone();
                if read.indices.len() != 1 {
                    self.error(
                        span,
                        format!(
                            "tuple access expects exactly one index but got {}",
                            read.indices.len()
                        ),
                    );
                } else {
                    match &read.indices[0] {
                        hir::ReadIndex::Slice(slice_span) => {
                            self.error(*slice_span, "tuple access expects an integral index");
                        }
                        hir::ReadIndex::Expr(index_expr) => {
                            if let Some(index_type) = self.infer(index_expr, RefMode::Read) {
                                if index_type.len() != 1 || !index_type[0].is_int() {
                                    self.error(
                                        index_expr.span,
                                        format!(
                                            "tuple access expects an integral index but got an index of type {}",
                                            quoted_list(&index_type)
                                        ),
                                    );
                                }
                            }
                        }
                    }
                }
                Some(vec![Type::Element(element)])
            }
            _ => {
                self.error(
                    read.tensor.span,
                    format!(
                        "cannot access elements from objects of type {}",
                        quoted_list(&base_type)
                    ),
                );
                None
            }
        }
    }

    fn infer_field_read(
        &mut self,
        read: &hir::FieldReadExpr,
        span: Span,
        mode: RefMode,
    ) -> Option<Vec<Type>> {
        let base_type = self.infer(&read.base, mode)?;

        if base_type.len() != 1 {
            self.error(
                read.base.span,
                "can only access fields of a single set or element",
            );
            return None;
        }

        let element = match &base_type[0] {
            Type::Element(elem) => elem,
            Type::Set(set_type) => &set_type.element,
            _ => {
                self.error(
                    read.base.span,
                    "field accesses are only valid for sets and elements",
                );
                return None;
            }
        };

        let Some(field) = element.field(&read.field.name) else {
            self.error(
                read.field.span,
                format!("undefined field '{}'", read.field.name),
            );
            return None;
        };
        let field_type = field.ty.clone();

        if base_type[0].is_element() {
            return Some(vec![field_type]);
        }

        // Reading a field off a whole set gathers it into a tensor with
        // the set as its outer dimension and the field as the block.
        let set_name = match &read.base.kind {
            hir::ExprKind::Var(ident) => ident.name.clone(),
            _ => {
                self.error(
                    read.base.span,
                    "internal: set field access requires a named set",
                );
                return None;
            }
        };

        let Some(field_tensor) = field_type.as_tensor() else {
            self.error(span, "cannot read from non-scalar and non-vector set fields");
            return None;
        };
        let gathered = gather_field_type(&set_name, field_tensor);
        if gathered
            .as_tensor()
            .expect("gathered field types are tensors")
            .order()
            > 1
        {
            self.error(span, "cannot read from non-scalar and non-vector set fields");
            return None;
        }

        Some(vec![gathered])
    }

    fn infer_dense_literal(&mut self, expr: &hir::Expr) -> Option<Vec<Type>> {
        let transposed = match &expr.kind {
            hir::ExprKind::IntVectorLit { transposed, .. }
            | hir::ExprKind::FloatVectorLit { transposed, .. }
            | hir::ExprKind::NDTensorLit { transposed, .. } => *transposed,
            _ => unreachable!("caller dispatches on literal kinds"),
        };

        match shape::infer(expr) {
            Ok(dense) => {
                let component = match dense.kind {
                    DenseKind::Int => ComponentType::Int,
                    DenseKind::Float => ComponentType::Float,
                };
                // axis lengths are innermost-first; dimensions are
                // outermost-first
                let dims: Vec<IndexDomain> = dense
                    .dim_sizes
                    .iter()
                    .rev()
                    .map(|n| IndexDomain::new(IndexSet::Range(*n as i64)))
                    .collect();
                debug_assert!(
                    dims.len() == 1 || !transposed,
                    "only rank-1 literals carry a transpose mark"
                );
                Some(vec![Type::Tensor(TensorType::new(
                    component, dims, transposed,
                ))])
            }
            Err(err) => {
                self.error(expr.span, err.to_string());
                None
            }
        }
    }

    /// Element kind of a named set symbol, if it is one.
    fn endpoint_element(&self, name: &str) -> Option<ElementType> {
        match &self.ctx.get_symbol(name)?.var.ty {
            Some(Type::Set(set_type)) => Some(set_type.element.clone()),
            _ => None,
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

/// Quote a type list for diagnostics: `void`, `'int'`, or
/// `('int', 'float')`.
fn quoted_list(types: &[Type]) -> String {
    match types.len() {
        0 => "void".to_string(),
        1 => format!("'{}'", types[0]),
        _ => {
            let parts: Vec<String> = types.iter().map(|t| format!("'{}'", t)).collect();
            format!("({})", parts.join(", "))
        }
    }
}

/// Gather a per-element field into a set-wide tensor: the set becomes
/// the outer axis and the field's own dimensions become the block.
fn gather_field_type(set_name: &str, field: &TensorType) -> Type {
    let outer = IndexSet::Set(set_name.to_string());
    let dims = if field.is_scalar() {
        vec![IndexDomain::new(outer)]
    } else {
        field
            .dims
            .iter()
            .enumerate()
            .map(|(i, dom)| {
                if i == 0 {
                    let mut sets = vec![outer.clone()];
                    sets.extend(dom.index_sets.iter().cloned());
                    IndexDomain::from_sets(sets)
                } else {
                    dom.clone()
                }
            })
            .collect()
    };
    let column = dims.len() == 1;
    Type::Tensor(TensorType::new(field.component, dims, column))
}

/// Strip leading and trailing unit ranges; the residue is what constant
/// initializer shapes are compared on.
fn strip_unit_dims<'a>(dims: &'a [&'a IndexSet]) -> &'a [&'a IndexSet] {
    let mut start = 0;
    let mut end = dims.len();
    while start < end && dims[start].is_unit_range() {
        start += 1;
    }
    while end > start && dims[end - 1].is_unit_range() {
        end -= 1;
    }
    &dims[start..end]
}

// ── Tests ────────────────────────────────────────────────────────────────
