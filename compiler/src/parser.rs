// Parser for Mesh .mesh source files.
//
// Parses a token stream (from the lexer) into an HIR tree. Uses chumsky
// combinators.
//
// Calls and tensor/tuple reads share the `name(args)` surface form; the
// parser always emits `TensorRead` and leaves the disambiguation to the
// call-rewrite phase.
//
// Preconditions: input is a valid token stream from `lexer::lex()`.
// Postconditions: returns an HIR tree plus any parse errors (non-fatal).
// Failure modes: syntax errors produce `Rich` diagnostics; parsing
//   continues where recovery is possible.
// Side effects: none.

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;
use chumsky::span::SimpleSpan;

use crate::hir::*;
use crate::lexer::Token;

/// Result of parsing: HIR plus any errors.
#[derive(Debug)]
pub struct ParseResult {
    pub program: Option<Program>,
    pub errors: Vec<Rich<'static, Token, SimpleSpan>>,
}

/// Parse a Mesh source string. Lexes then parses.
///
/// Returns an HIR tree (if parsing succeeded) plus any errors.
pub fn parse(source: &str) -> ParseResult {
    let lex_result = crate::lexer::lex(source);
    let len = source.len();

    // Convert lexer output to chumsky stream.
    let token_iter = lex_result.tokens.into_iter().map(|(tok, span)| {
        let cspan: SimpleSpan = (span.start..span.end).into();
        (tok, cspan)
    });
    let eoi: SimpleSpan = (len..len).into();
    let stream = Stream::from_iter(token_iter).map(eoi, |(t, s): (_, _)| (t, s));

    let parser = program_parser(source);
    let (program, parse_errors) = parser.parse(stream).into_output_errors();

    // Merge lex errors + parse errors.
    let mut all_errors: Vec<Rich<'static, Token, SimpleSpan>> = lex_result
        .errors
        .into_iter()
        .map(|e| {
            let span: SimpleSpan = (e.span.start..e.span.end).into();
            Rich::custom(span, e.message)
        })
        .collect();
    all_errors.extend(parse_errors.into_iter().map(|e| e.into_owned()));

    ParseResult {
        program,
        errors: all_errors,
    }
}

// ── Operator tags ──
//
// Local carriers for the fold steps; the HIR has one variant per
// operator, so the folds map these tags to the right constructor.

#[derive(Clone, Copy)]
enum MulOp {
    Mul,
    Div,
    ElwiseMul,
    ElwiseDiv,
}

#[derive(Clone, Copy)]
enum AddOp {
    Add,
    Sub,
}

#[derive(Clone)]
enum PostfixOp {
    Read(Vec<ReadIndex>),
    Field(Ident),
    Transpose,
}

// ── Main parser builder ──
//
// All grammar rules are built inside `program_parser` so that the
// `source` reference is captured once and shared by all combinators.

fn program_parser<'tokens, 'src: 'tokens, I>(
    source: &'src str,
) -> impl Parser<'tokens, I, Program, extra::Err<Rich<'tokens, Token, SimpleSpan>>> + 'src
where
    'tokens: 'src,
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    // ── Identifier ──

    let ident = just(Token::Ident).map_with(move |_, e| {
        let span: SimpleSpan = e.span();
        Ident {
            name: source[span.start()..span.end()].to_string(),
            span,
        }
    });

    let int_literal = select! {
        Token::IntLit(n) = e => IntLiteral { val: n, span: e.span() },
    };

    // ── Type expressions ──

    let type_expr = recursive(|type_expr| {
        let scalar = select! {
            Token::Int => TypeExprKind::Scalar(ScalarKind::Int),
            Token::Float => TypeExprKind::Scalar(ScalarKind::Float),
            Token::Bool => TypeExprKind::Scalar(ScalarKind::Bool),
        };

        let index_set = choice((
            int_literal.clone().map(IndexSetExpr::Range),
            ident.clone().map(IndexSetExpr::Set),
            just(Token::Star).map_with(|_, e| IndexSetExpr::Dynamic(e.span())),
        ));

        // tensor ('[' index_sets ']')? '(' block ')' '\''?
        let tensor = just(Token::Tensor)
            .ignore_then(
                index_set
                    .separated_by(just(Token::Comma))
                    .at_least(1)
                    .collect::<Vec<_>>()
                    .delimited_by(just(Token::LBracket), just(Token::RBracket))
                    .or_not(),
            )
            .then(
                type_expr
                    .clone()
                    .delimited_by(just(Token::LParen), just(Token::RParen)),
            )
            .then(just(Token::Apostrophe).or_not())
            .map(|((index_sets, block), apostrophe)| TypeExprKind::Tensor {
                block: Box::new(block),
                index_sets: index_sets.unwrap_or_default(),
                column_vector: apostrophe.is_some(),
            });

        // set '{' IDENT '}' ('(' endpoints ')')?
        let set_type = just(Token::Set)
            .ignore_then(
                ident
                    .clone()
                    .delimited_by(just(Token::LBrace), just(Token::RBrace)),
            )
            .then(
                ident
                    .clone()
                    .separated_by(just(Token::Comma))
                    .at_least(1)
                    .collect::<Vec<_>>()
                    .delimited_by(just(Token::LParen), just(Token::RParen))
                    .or_not(),
            )
            .map(|(element, endpoints)| TypeExprKind::Set {
                element,
                endpoints: endpoints.unwrap_or_default(),
            });

        // '(' IDENT '*' INT ')'
        let tuple = ident
            .clone()
            .then_ignore(just(Token::Star))
            .then(int_literal.clone())
            .delimited_by(just(Token::LParen), just(Token::RParen))
            .map(|(element, length)| TypeExprKind::Tuple { element, length });

        let element = ident.clone().map(TypeExprKind::Element);

        choice((scalar, tensor, set_type, tuple, element))
            .map_with(|kind, e| TypeExpr {
                kind,
                span: e.span(),
            })
    });

    // ── Typed name: IDENT ':' type ──

    let ident_decl = ident
        .clone()
        .then_ignore(just(Token::Colon))
        .then(type_expr.clone())
        .map_with(|(name, ty), e| IdentDecl {
            name,
            ty,
            span: e.span(),
        });

    // ── Expressions ──

    let expr = recursive(|expr| {
        // ── Dense tensor literals ──
        //
        // Rows are grammar-level homogeneous: all-int or all-float.
        // Mixing kinds across nested rows is legal syntax and rejected
        // by shape inference during checking.

        let dense_literal = recursive(|dense| {
            let signed_int = just(Token::Minus)
                .or_not()
                .then(select! { Token::IntLit(n) => n })
                .map(|(neg, n): (Option<Token>, i64)| if neg.is_some() { -n } else { n });

            let signed_float = just(Token::Minus)
                .or_not()
                .then(select! { Token::FloatLit(v) => v })
                .map(|(neg, v): (Option<Token>, f64)| if neg.is_some() { -v } else { v });

            let int_row = signed_int
                .separated_by(just(Token::Comma))
                .at_least(1)
                .collect::<Vec<_>>()
                .delimited_by(just(Token::LBracket), just(Token::RBracket))
                .map_with(|vals, e| Expr {
                    kind: ExprKind::IntVectorLit {
                        vals,
                        transposed: false,
                    },
                    span: e.span(),
                });

            let float_row = signed_float
                .separated_by(just(Token::Comma))
                .at_least(1)
                .collect::<Vec<_>>()
                .delimited_by(just(Token::LBracket), just(Token::RBracket))
                .map_with(|vals, e| Expr {
                    kind: ExprKind::FloatVectorLit {
                        vals,
                        transposed: false,
                    },
                    span: e.span(),
                });

            let nested = dense
                .separated_by(just(Token::Comma))
                .at_least(1)
                .collect::<Vec<_>>()
                .delimited_by(just(Token::LBracket), just(Token::RBracket))
                .map_with(|elems, e| Expr {
                    kind: ExprKind::NDTensorLit {
                        elems,
                        transposed: false,
                    },
                    span: e.span(),
                });

            int_row.or(float_row).or(nested)
        });

        // ── Atoms ──

        let scalar_atom = select! {
            Token::IntLit(n) => ExprKind::IntLit(n),
            Token::FloatLit(v) => ExprKind::FloatLit(v),
            Token::True => ExprKind::BoolLit(true),
            Token::False => ExprKind::BoolLit(false),
        }
        .or(ident.clone().map(ExprKind::Var))
        .map_with(|kind, e| Expr {
            kind,
            span: e.span(),
        });

        let paren = expr
            .clone()
            .delimited_by(just(Token::LParen), just(Token::RParen));

        let atom = scalar_atom.or(dense_literal).or(paren);

        // ── Postfix: reads, field accesses, transpose ──
        //
        // A `'` on an untransposed rank-1 literal folds into the literal
        // itself; everywhere else it becomes a transpose node.

        let read_index = just(Token::Colon)
            .map_with(|_, e| ReadIndex::Slice(e.span()))
            .or(expr.clone().map(ReadIndex::Expr));

        let read = read_index
            .separated_by(just(Token::Comma))
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LParen), just(Token::RParen))
            .map(PostfixOp::Read);

        let field = just(Token::Dot)
            .ignore_then(ident.clone())
            .map(PostfixOp::Field);

        let transpose = just(Token::Apostrophe).to(PostfixOp::Transpose);

        let postfix = atom.foldl_with(
            choice((read, field, transpose)).repeated(),
            |base, op, e| {
                let span: SimpleSpan = e.span();
                let kind = match op {
                    PostfixOp::Read(indices) => ExprKind::TensorRead(TensorReadExpr {
                        tensor: Box::new(base),
                        indices,
                    }),
                    PostfixOp::Field(field) => ExprKind::FieldRead(FieldReadExpr {
                        base: Box::new(base),
                        field,
                    }),
                    PostfixOp::Transpose => match base {
                        Expr {
                            kind:
                                ExprKind::IntVectorLit {
                                    vals,
                                    transposed: false,
                                },
                            ..
                        } => ExprKind::IntVectorLit {
                            vals,
                            transposed: true,
                        },
                        Expr {
                            kind:
                                ExprKind::FloatVectorLit {
                                    vals,
                                    transposed: false,
                                },
                            ..
                        } => ExprKind::FloatVectorLit {
                            vals,
                            transposed: true,
                        },
                        other => ExprKind::Transpose(Box::new(other)),
                    },
                };
                Expr { kind, span }
            },
        );

        // ── Unary minus ──

        let unary = just(Token::Minus)
            .repeated()
            .foldr_with(postfix, |_, operand, e| Expr {
                kind: ExprKind::Neg(Box::new(operand)),
                span: e.span(),
            });

        // ── Multiplicative ──

        let mul_op = choice((
            just(Token::Star).to(MulOp::Mul),
            just(Token::Slash).to(MulOp::Div),
            just(Token::DotStar).to(MulOp::ElwiseMul),
            just(Token::DotSlash).to(MulOp::ElwiseDiv),
        ));

        let product = unary
            .clone()
            .foldl_with(mul_op.then(unary).repeated(), |lhs, (op, rhs), e| {
                let kind = match op {
                    MulOp::Mul => ExprKind::Mul(Box::new(lhs), Box::new(rhs)),
                    MulOp::Div => ExprKind::Div(Box::new(lhs), Box::new(rhs)),
                    MulOp::ElwiseMul => ExprKind::ElwiseMul(Box::new(lhs), Box::new(rhs)),
                    MulOp::ElwiseDiv => ExprKind::ElwiseDiv(Box::new(lhs), Box::new(rhs)),
                };
                Expr {
                    kind,
                    span: e.span(),
                }
            });

        // ── Additive ──

        let add_op = choice((
            just(Token::Plus).to(AddOp::Add),
            just(Token::Minus).to(AddOp::Sub),
        ));

        let sum = product
            .clone()
            .foldl_with(add_op.then(product).repeated(), |lhs, (op, rhs), e| {
                let kind = match op {
                    AddOp::Add => ExprKind::Add(Box::new(lhs), Box::new(rhs)),
                    AddOp::Sub => ExprKind::Sub(Box::new(lhs), Box::new(rhs)),
                };
                Expr {
                    kind,
                    span: e.span(),
                }
            });

        // ── Chained comparisons ──

        let cmp_op = choice((
            just(Token::Eq).to(CmpOp::Eq),
            just(Token::Ne).to(CmpOp::Ne),
            just(Token::Le).to(CmpOp::Le),
            just(Token::Ge).to(CmpOp::Ge),
            just(Token::Lt).to(CmpOp::Lt),
            just(Token::Gt).to(CmpOp::Gt),
        ));

        let comparison = sum
            .clone()
            .then(cmp_op.then(sum).repeated().collect::<Vec<_>>())
            .map_with(|(first, rest), e| {
                if rest.is_empty() {
                    first
                } else {
                    let mut operands = vec![first];
                    let mut ops = Vec::new();
                    for (op, operand) in rest {
                        ops.push(op);
                        operands.push(operand);
                    }
                    Expr {
                        kind: ExprKind::Cmp(CmpExpr { operands, ops }),
                        span: e.span(),
                    }
                }
            });

        // ── Boolean operators ──

        let not_level = just(Token::Not)
            .repeated()
            .foldr_with(comparison, |_, operand, e| Expr {
                kind: ExprKind::Not(Box::new(operand)),
                span: e.span(),
            });

        let and_level = not_level.clone().foldl_with(
            just(Token::And).ignore_then(not_level).repeated(),
            |lhs, rhs, e| Expr {
                kind: ExprKind::And(Box::new(lhs), Box::new(rhs)),
                span: e.span(),
            },
        );

        let xor_level = and_level.clone().foldl_with(
            just(Token::Xor).ignore_then(and_level).repeated(),
            |lhs, rhs, e| Expr {
                kind: ExprKind::Xor(Box::new(lhs), Box::new(rhs)),
                span: e.span(),
            },
        );

        let or_level = xor_level.clone().foldl_with(
            just(Token::Or).ignore_then(xor_level).repeated(),
            |lhs, rhs, e| Expr {
                kind: ExprKind::Or(Box::new(lhs), Box::new(rhs)),
                span: e.span(),
            },
        );

        // ── Map ──

        let map_expr = just(Token::Map)
            .ignore_then(ident.clone())
            .then(
                expr.clone()
                    .separated_by(just(Token::Comma))
                    .at_least(1)
                    .collect::<Vec<_>>()
                    .delimited_by(just(Token::LParen), just(Token::RParen))
                    .or_not(),
            )
            .then_ignore(just(Token::To))
            .then(ident.clone())
            .then(just(Token::Reduce).ignore_then(just(Token::Plus)).or_not())
            .map_with(|(((func, partials), target), reduce), e| Expr {
                kind: ExprKind::Map(MapExpr {
                    func,
                    partial_actuals: partials.unwrap_or_default(),
                    target,
                    reduce: reduce.map(|_| ReduceOp::Sum),
                }),
                span: e.span(),
            });

        map_expr.or(or_level)
    });

    // ── Statements ──

    let stmt = recursive(|stmt| {
        let body = stmt.clone().repeated().collect::<Vec<Stmt>>();

        let var_decl = just(Token::Var)
            .ignore_then(ident_decl.clone())
            .then(just(Token::Assign).ignore_then(expr.clone()).or_not())
            .then_ignore(just(Token::Semicolon))
            .map(|(var, init)| StmtKind::VarDecl(VarDeclStmt { var, init }));

        let const_decl = just(Token::Const)
            .ignore_then(ident_decl.clone())
            .then(just(Token::Assign).ignore_then(expr.clone()).or_not())
            .then_ignore(just(Token::Semicolon))
            .map(|(var, init)| StmtKind::ConstDecl(VarDeclStmt { var, init }));

        let while_stmt = just(Token::While)
            .ignore_then(expr.clone())
            .then(body.clone())
            .then_ignore(just(Token::End))
            .map(|(cond, body)| StmtKind::While(WhileStmt { cond, body }));

        let if_stmt = just(Token::If)
            .ignore_then(expr.clone())
            .then(body.clone())
            .then(just(Token::Else).ignore_then(body.clone()).or_not())
            .then_ignore(just(Token::End))
            .map(|((cond, then_body), else_body)| {
                StmtKind::If(IfStmt {
                    cond,
                    then_body,
                    else_body,
                })
            });

        let range_domain = expr
            .clone()
            .then_ignore(just(Token::Colon))
            .then(expr.clone())
            .map_with(|(lower, upper), e| RangeDomain {
                lower,
                upper,
                span: e.span(),
            });

        let for_stmt = just(Token::For)
            .ignore_then(ident.clone())
            .then_ignore(just(Token::In))
            .then(range_domain)
            .then(body.clone())
            .then_ignore(just(Token::End))
            .map(|((var, domain), body)| StmtKind::For(ForStmt { var, domain, body }));

        let print_stmt = just(Token::Print)
            .ignore_then(expr.clone())
            .then_ignore(just(Token::Semicolon))
            .map(|expr| StmtKind::Print(PrintStmt { expr }));

        let assign = expr
            .clone()
            .separated_by(just(Token::Comma))
            .at_least(1)
            .collect::<Vec<_>>()
            .then_ignore(just(Token::Assign))
            .then(expr.clone())
            .then_ignore(just(Token::Semicolon))
            .map(|(lhs, rhs)| StmtKind::Assign(AssignStmt { lhs, rhs }));

        let expr_stmt = expr
            .clone()
            .then_ignore(just(Token::Semicolon))
            .map(StmtKind::Expr);

        choice((
            var_decl, const_decl, while_stmt, if_stmt, for_stmt, print_stmt, assign, expr_stmt,
        ))
        .map_with(|kind, e| Stmt {
            kind,
            span: e.span(),
        })
    });

    // ── Top-level declarations ──

    let field = ident_decl.clone().then_ignore(just(Token::Semicolon));

    let element_decl = just(Token::Element)
        .ignore_then(ident.clone())
        .then(field.repeated().collect::<Vec<_>>())
        .then_ignore(just(Token::End))
        .map(|(name, fields)| DeclKind::Element(ElementTypeDecl { name, fields }));

    let extern_decl = just(Token::Extern)
        .ignore_then(ident_decl.clone())
        .then_ignore(just(Token::Semicolon))
        .map(|var| DeclKind::Extern(ExternDecl { var }));

    let func_arg = just(Token::Inout)
        .or_not()
        .then(ident_decl.clone())
        .map(|(inout, decl)| FuncArg {
            decl,
            inout: inout.is_some(),
        });

    let func_decl = just(Token::Func)
        .ignore_then(ident.clone())
        .then(
            func_arg
                .separated_by(just(Token::Comma))
                .collect::<Vec<_>>()
                .delimited_by(just(Token::LParen), just(Token::RParen)),
        )
        .then(
            just(Token::Arrow)
                .ignore_then(
                    ident_decl
                        .clone()
                        .separated_by(just(Token::Comma))
                        .at_least(1)
                        .collect::<Vec<_>>()
                        .delimited_by(just(Token::LParen), just(Token::RParen)),
                )
                .or_not(),
        )
        .then(stmt.clone().repeated().collect::<Vec<_>>())
        .then_ignore(just(Token::End))
        .map(|(((name, args), results), body)| {
            DeclKind::Func(FuncDecl {
                name,
                args,
                results: results.unwrap_or_default(),
                body,
            })
        });

    // `proc` is the argument- and result-less entry point form.
    let proc_decl = just(Token::Proc)
        .ignore_then(ident.clone())
        .then(stmt.clone().repeated().collect::<Vec<_>>())
        .then_ignore(just(Token::End))
        .map(|(name, body)| {
            DeclKind::Func(FuncDecl {
                name,
                args: Vec::new(),
                results: Vec::new(),
                body,
            })
        });

    let global_const = just(Token::Const)
        .ignore_then(ident_decl.clone())
        .then(just(Token::Assign).ignore_then(expr.clone()).or_not())
        .then_ignore(just(Token::Semicolon))
        .map(|(var, init)| DeclKind::Const(VarDeclStmt { var, init }));

    let decl = choice((element_decl, extern_decl, func_decl, proc_decl, global_const)).map_with(
        |kind, e| Decl {
            kind,
            span: e.span(),
        },
    );

    decl.repeated()
        .collect::<Vec<_>>()
        .map_with(|decls, e| Program {
            decls,
            span: e.span(),
        })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Program {
        let result = parse(source);
        assert!(
            result.errors.is_empty(),
            "unexpected errors: {:#?}",
            result.errors
        );
        result.program.expect("expected program")
    }

    fn only_func(program: &Program) -> &FuncDecl {
        let func = program.decls.iter().find_map(|d| match &d.kind {
            DeclKind::Func(f) => Some(f),
            _ => None,
        });
        func.expect("expected a func declaration")
    }

    #[test]
    fn element_decl() {
        let program = parse_ok("element Point b : float; c : float; end");
        assert_eq!(program.decls.len(), 1);
        match &program.decls[0].kind {
            DeclKind::Element(elem) => {
                assert_eq!(elem.name.name, "Point");
                assert_eq!(elem.fields.len(), 2);
                assert_eq!(elem.fields[0].name.name, "b");
            }
            other => panic!("expected element, got {:?}", other),
        }
    }

    #[test]
    fn extern_set_decl() {
        let program = parse_ok("extern springs : set{Spring}(points,points);");
        match &program.decls[0].kind {
            DeclKind::Extern(ext) => match &ext.var.ty.kind {
                TypeExprKind::Set { element, endpoints } => {
                    assert_eq!(element.name, "Spring");
                    assert_eq!(endpoints.len(), 2);
                }
                other => panic!("expected set type, got {:?}", other),
            },
            other => panic!("expected extern, got {:?}", other),
        }
    }

    #[test]
    fn func_with_tuple_arg_and_result() {
        let program = parse_ok(
            "func f(s : Spring, p : (Point*2)) -> (A : tensor[points,points](float)) end",
        );
        let func = only_func(&program);
        assert_eq!(func.args.len(), 2);
        assert!(matches!(
            func.args[1].decl.ty.kind,
            TypeExprKind::Tuple { .. }
        ));
        assert_eq!(func.results.len(), 1);
    }

    #[test]
    fn inout_argument() {
        let program = parse_ok("func f(inout x : float) end");
        let func = only_func(&program);
        assert!(func.args[0].inout);
    }

    #[test]
    fn column_vector_type() {
        let program = parse_ok("extern b : tensor[points](float)';");
        match &program.decls[0].kind {
            DeclKind::Extern(ext) => match &ext.var.ty.kind {
                TypeExprKind::Tensor { column_vector, .. } => assert!(*column_vector),
                other => panic!("expected tensor type, got {:?}", other),
            },
            _ => unreachable!(),
        }
    }

    #[test]
    fn blocked_tensor_type() {
        let program = parse_ok("extern K : tensor[points,points](tensor[3,3](float));");
        match &program.decls[0].kind {
            DeclKind::Extern(ext) => match &ext.var.ty.kind {
                TypeExprKind::Tensor {
                    block, index_sets, ..
                } => {
                    assert_eq!(index_sets.len(), 2);
                    assert!(matches!(block.kind, TypeExprKind::Tensor { .. }));
                }
                other => panic!("expected tensor type, got {:?}", other),
            },
            _ => unreachable!(),
        }
    }

    #[test]
    fn map_statement() {
        let program = parse_ok("proc main A = map f to springs reduce +; end");
        let func = only_func(&program);
        match &func.body[0].kind {
            StmtKind::Assign(assign) => match &assign.rhs.kind {
                ExprKind::Map(map) => {
                    assert_eq!(map.func.name, "f");
                    assert_eq!(map.target.name, "springs");
                    assert_eq!(map.reduce, Some(ReduceOp::Sum));
                    assert!(map.partial_actuals.is_empty());
                }
                other => panic!("expected map, got {:?}", other),
            },
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn map_with_partial_actuals() {
        let program = parse_ok("proc main A = map f(h, 2.0) to springs reduce +; end");
        let func = only_func(&program);
        match &func.body[0].kind {
            StmtKind::Assign(assign) => match &assign.rhs.kind {
                ExprKind::Map(map) => assert_eq!(map.partial_actuals.len(), 2),
                other => panic!("expected map, got {:?}", other),
            },
            _ => unreachable!(),
        }
    }

    #[test]
    fn precedence_mul_binds_tighter_than_add() {
        let program = parse_ok("proc main x = a + b * c; end");
        let func = only_func(&program);
        match &func.body[0].kind {
            StmtKind::Assign(assign) => match &assign.rhs.kind {
                ExprKind::Add(_, rhs) => {
                    assert!(matches!(rhs.kind, ExprKind::Mul(_, _)));
                }
                other => panic!("expected add at the top, got {:?}", other),
            },
            _ => unreachable!(),
        }
    }

    #[test]
    fn chained_comparison() {
        let program = parse_ok("proc main x = a < b <= c; end");
        let func = only_func(&program);
        match &func.body[0].kind {
            StmtKind::Assign(assign) => match &assign.rhs.kind {
                ExprKind::Cmp(cmp) => {
                    assert_eq!(cmp.operands.len(), 3);
                    assert_eq!(cmp.ops, vec![CmpOp::Lt, CmpOp::Le]);
                }
                other => panic!("expected comparison, got {:?}", other),
            },
            _ => unreachable!(),
        }
    }

    #[test]
    fn tensor_read_with_slice() {
        let program = parse_ok("proc main x = A(i, :); end");
        let func = only_func(&program);
        match &func.body[0].kind {
            StmtKind::Assign(assign) => match &assign.rhs.kind {
                ExprKind::TensorRead(read) => {
                    assert_eq!(read.indices.len(), 2);
                    assert!(!read.indices[0].is_slice());
                    assert!(read.indices[1].is_slice());
                }
                other => panic!("expected tensor read, got {:?}", other),
            },
            _ => unreachable!(),
        }
    }

    #[test]
    fn field_read_chain() {
        let program = parse_ok("proc main points.c = x; end");
        let func = only_func(&program);
        match &func.body[0].kind {
            StmtKind::Assign(assign) => {
                assert!(matches!(assign.lhs[0].kind, ExprKind::FieldRead(_)));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn multi_target_assignment() {
        let program = parse_ok("proc main a, b = f(x); end");
        let func = only_func(&program);
        match &func.body[0].kind {
            StmtKind::Assign(assign) => assert_eq!(assign.lhs.len(), 2),
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn transposed_vector_literal_folds_into_literal() {
        let program = parse_ok("proc main x = [1.0, 2.0]'; end");
        let func = only_func(&program);
        match &func.body[0].kind {
            StmtKind::Assign(assign) => match &assign.rhs.kind {
                ExprKind::FloatVectorLit { vals, transposed } => {
                    assert_eq!(vals.len(), 2);
                    assert!(transposed);
                }
                other => panic!("expected vector literal, got {:?}", other),
            },
            _ => unreachable!(),
        }
    }

    #[test]
    fn matrix_literal_parses_nested() {
        let program = parse_ok("proc main x = [[1.0, 2.0], [3.0, 4.0]]; end");
        let func = only_func(&program);
        match &func.body[0].kind {
            StmtKind::Assign(assign) => match &assign.rhs.kind {
                ExprKind::NDTensorLit { elems, .. } => assert_eq!(elems.len(), 2),
                other => panic!("expected nested literal, got {:?}", other),
            },
            _ => unreachable!(),
        }
    }

    #[test]
    fn negative_literal_elements() {
        let program = parse_ok("proc main x = [-1, 2, -3]; end");
        let func = only_func(&program);
        match &func.body[0].kind {
            StmtKind::Assign(assign) => match &assign.rhs.kind {
                ExprKind::IntVectorLit { vals, .. } => assert_eq!(vals, &vec![-1, 2, -3]),
                other => panic!("expected int vector, got {:?}", other),
            },
            _ => unreachable!(),
        }
    }

    #[test]
    fn control_flow_statements() {
        let program = parse_ok(
            "proc main \
               while x < 10 x = x + 1; end \
               if done y = 1; else y = 2; end \
               for i in 0:10 print i; end \
             end",
        );
        let func = only_func(&program);
        assert_eq!(func.body.len(), 3);
        assert!(matches!(func.body[0].kind, StmtKind::While(_)));
        assert!(matches!(func.body[1].kind, StmtKind::If(_)));
        assert!(matches!(func.body[2].kind, StmtKind::For(_)));
    }

    #[test]
    fn global_const() {
        let program = parse_ok("const stiffness : float = 1.0e4;");
        assert!(matches!(program.decls[0].kind, DeclKind::Const(_)));
    }

    #[test]
    fn comments_are_ignored() {
        let program = parse_ok("% header\nproc main % trailing\n x = 1; end");
        assert_eq!(program.decls.len(), 1);
    }

    #[test]
    fn syntax_error_is_reported() {
        let result = parse("proc main x = ; end");
        assert!(!result.errors.is_empty());
    }
}
