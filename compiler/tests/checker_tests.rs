// Checker conformance tests for meshc.
//
// Each test drives the library front end over a complete Mesh program
// and asserts on the collected diagnostics, the populated context, and
// the inferred expression types.

use meshc::hir::Span;
use meshc::ir::{ComponentType, IndexDomain, IndexSet, TensorType, Type};
use meshc::pipeline;
use meshc::typecheck::CheckResult;
use meshc::{parser, rewrite, typecheck};

// ── Helpers ──────────────────────────────────────────────────────────────

fn check(source: &str) -> CheckResult {
    let parsed = parser::parse(source);
    assert!(
        parsed.errors.is_empty(),
        "parse errors: {:#?}",
        parsed.errors
    );
    let program = rewrite::rewrite_calls(parsed.program.expect("expected program"));
    typecheck::check(&program)
}

fn assert_clean(source: &str) -> CheckResult {
    let result = check(source);
    assert!(
        result.diagnostics.is_empty(),
        "unexpected diagnostics: {:#?}",
        result.diagnostics
    );
    result
}

fn messages(result: &CheckResult) -> Vec<&str> {
    result
        .diagnostics
        .iter()
        .map(|d| d.message.as_str())
        .collect()
}

/// Span of the first occurrence of `needle` in `source`.
fn span_of(source: &str, needle: &str) -> Span {
    let start = source
        .find(needle)
        .unwrap_or_else(|| panic!("{:?} not found in source", needle));
    (start..start + needle.len()).into()
}

fn points_column_vector() -> Type {
    Type::Tensor(TensorType::new(
        ComponentType::Float,
        vec![IndexDomain::new(IndexSet::Set("points".to_string()))],
        true,
    ))
}

// ── Assemble-and-multiply ────────────────────────────────────────────────

const SPRINGS: &str = "\
element Point
  b : float;
  c : float;
end

element Spring
  a : float;
end

extern points  : set{Point};
extern springs : set{Spring}(points,points);

func f(s : Spring, p : (Point*2)) -> (A : tensor[points,points](float))
  A(p(0),p(0)) = s.a;
  A(p(0),p(1)) = -s.a;
  A(p(1),p(0)) = -s.a;
  A(p(1),p(1)) = s.a;
end

proc main
  A = map f to springs reduce +;
  b = points.b;
  x = A * b;
  points.c = x;
end
";

#[test]
fn assemble_and_multiply_is_clean() {
    let result = assert_clean(SPRINGS);
    assert!(result.context.contains_element_type("Point"));
    assert!(result.context.contains_element_type("Spring"));
    assert!(result.context.contains_function("f"));
    assert!(result.context.contains_function("main"));
}

#[test]
fn assembled_product_is_a_column_vector_over_points() {
    let result = assert_clean(SPRINGS);
    let mul_span = span_of(SPRINGS, "A * b");
    let types = result
        .expr_types
        .get(&mul_span)
        .unwrap_or_else(|| panic!("no inferred type recorded for 'A * b'"));
    assert_eq!(types, &vec![points_column_vector()]);
}

#[test]
fn gathered_field_is_a_column_vector_over_points() {
    let result = assert_clean(SPRINGS);
    let read_span = span_of(SPRINGS, "points.b");
    assert_eq!(
        result.expr_types.get(&read_span),
        Some(&vec![points_column_vector()])
    );
}

#[test]
fn map_type_is_the_assembly_result() {
    let result = assert_clean(SPRINGS);
    let map_span = span_of(SPRINGS, "map f to springs reduce +");
    let expected = Type::Tensor(TensorType::new(
        ComponentType::Float,
        vec![
            IndexDomain::new(IndexSet::Set("points".to_string())),
            IndexDomain::new(IndexSet::Set("points".to_string())),
        ],
        false,
    ));
    assert_eq!(result.expr_types.get(&map_span), Some(&vec![expected]));
}

// ── Shape errors ─────────────────────────────────────────────────────────

#[test]
fn row_times_row_produces_exactly_one_diagnostic() {
    let result = check(
        "proc main \
           var row_vec : tensor[3](float); \
           x = row_vec * row_vec; \
         end",
    );
    assert_eq!(messages(&result), vec!["cannot multiply two row vectors"]);
}

// ── Map arity and endpoint synthesis ─────────────────────────────────────

#[test]
fn map_to_unary_edge_set_mismatches_tuple_length() {
    let result = check(
        "element Point b : float; end \
         element Spring a : float; end \
         extern points : set{Point}; \
         extern springs : set{Spring}(points); \
         func f(s : Spring, p : (Point*2)) -> (A : tensor[points,points](float)) end \
         proc main A = map f to springs reduce +; end",
    );
    assert_eq!(
        messages(&result),
        vec![
            "map operation passes argument of type '(Point*1)' to assembly function but function 'f' expects argument of type '(Point*2)'"
        ]
    );
}

#[test]
fn map_to_vertex_set_synthesizes_only_the_element() {
    assert_clean(
        "element Point b : float; end \
         extern points : set{Point}; \
         func g(p : Point) -> (v : tensor[points](float)) end \
         proc main v = map g to points reduce +; end",
    );
}

#[test]
fn map_function_may_ignore_neighbors() {
    // An assembly function over an edge set that only takes the element:
    // the neighbor tuple is synthesized only when the arity needs it.
    assert_clean(
        "element Point b : float; end \
         element Spring a : float; end \
         extern points : set{Point}; \
         extern springs : set{Spring}(points,points); \
         func g(s : Spring) -> (v : tensor[points](float)) end \
         proc main v = map g to springs reduce +; end",
    );
}

#[test]
fn map_target_must_be_a_set() {
    let result = check(
        "func g(x : float) -> (y : float) end \
         proc main var t : float; v = map g to t reduce +; end",
    );
    assert_eq!(
        messages(&result),
        vec!["map operation can only be applied to sets"]
    );
}

#[test]
fn map_of_undeclared_function() {
    let result = check(
        "element Point b : float; end \
         extern points : set{Point}; \
         proc main v = map nope to points reduce +; end",
    );
    assert_eq!(messages(&result), vec!["undeclared function 'nope'"]);
}

// ── Field reads ──────────────────────────────────────────────────────────

#[test]
fn undeclared_element_field() {
    let result = check(
        "element Node a : float; end \
         extern nodes : set{Node}; \
         proc main x = nodes.zzz; end",
    );
    assert_eq!(messages(&result), vec!["undefined field 'zzz'"]);
}

#[test]
fn element_field_read_yields_the_field_type() {
    assert_clean(
        "element Spring a : float; end \
         func f(s : Spring) -> (y : float) y = s.a; end",
    );
}

// ── Constant shape slack ─────────────────────────────────────────────────

#[test]
fn identity_constant_and_variable_accepted() {
    assert_clean(
        "proc main \
           const I : tensor[3,3](float) = [[1.0,0.0,0.0],[0.0,1.0,0.0],[0.0,0.0,1.0]]; \
           var J : tensor[3,3](float) = [[1.0,0.0,0.0],[0.0,1.0,0.0],[0.0,0.0,1.0]]; \
         end",
    );
}

#[test]
fn const_tolerates_unit_dimensions() {
    assert_clean("proc main const v : tensor[3,1](float) = [[1.0,2.0,3.0]]; end");
}

#[test]
fn var_does_not_tolerate_unit_dimensions() {
    let result = check("proc main var v : tensor[3,1](float) = [[1.0,2.0,3.0]]; end");
    assert_eq!(result.diagnostics.len(), 1);
    assert!(messages(&result)[0].starts_with("cannot initialize a variable or constant"));
}

// ── Multiple diagnostics in one pass ─────────────────────────────────────

#[test]
fn three_undeclared_references_in_source_order() {
    let result = check(
        "proc main
           x = aaa;
           y = bbb;
           z = ccc;
         end",
    );
    assert_eq!(
        messages(&result),
        vec![
            "undeclared variable or constant 'aaa'",
            "undeclared variable or constant 'bbb'",
            "undeclared variable or constant 'ccc'",
        ]
    );
}

#[test]
fn independent_faults_do_not_mask_each_other() {
    let result = check(
        "proc main \
           var a : tensor[3](float); \
           x = a * a; \
           y = zzz; \
           while 1 end \
         end",
    );
    assert_eq!(
        messages(&result),
        vec![
            "cannot multiply two row vectors",
            "undeclared variable or constant 'zzz'",
            "expected a boolean conditional expression but got an expression of type 'int'",
        ]
    );
}

// ── Determinism and resource discipline ──────────────────────────────────

#[test]
fn checking_is_idempotent_and_deterministic() {
    let parsed = parser::parse(SPRINGS);
    assert!(parsed.errors.is_empty());
    let program = rewrite::rewrite_calls(parsed.program.unwrap());

    let first = typecheck::check(&program);
    let second = typecheck::check(&program);

    assert!(first.diagnostics.is_empty());
    assert!(second.diagnostics.is_empty());
    assert_eq!(first.expr_types, second.expr_types);
    assert_eq!(
        first.context.element_types().len(),
        second.context.element_types().len()
    );
    assert_eq!(
        first.context.functions().len(),
        second.context.functions().len()
    );
}

#[test]
fn symbol_stack_is_global_only_after_checking() {
    for source in [
        SPRINGS,
        "proc main for i in 0:3 if true var z : int; end end end",
        "func f(x : float) -> (y : tensor[3](nope)) while true end end",
    ] {
        let result = check(source);
        assert_eq!(result.context.scope_depth(), 1, "source: {}", source);
    }
}

// ── Inferred types satisfy the IR invariants ─────────────────────────────

#[test]
fn inferred_types_are_well_formed() {
    let result = assert_clean(SPRINGS);
    for types in result.expr_types.values() {
        for ty in types {
            assert_type_well_formed(ty);
        }
    }
}

fn assert_type_well_formed(ty: &Type) {
    match ty {
        Type::Tensor(t) => {
            if t.column_vector {
                assert_eq!(t.order(), 1, "column vector must be order 1: {}", ty);
            }
            for dim in &t.dims {
                assert!(!dim.index_sets.is_empty(), "empty dimension in {}", ty);
            }
        }
        Type::Tuple(t) => assert!(t.length >= 1, "tuple length must be positive: {}", ty),
        Type::Set(_) | Type::Element(_) => {}
    }
}

// ── Frontend boundary ────────────────────────────────────────────────────

#[test]
fn frontend_surfaces_parse_faults_as_diagnostics() {
    let result = pipeline::run_frontend("proc broken x = ; end");
    assert!(result.has_error());
    assert!(!result.diagnostics.is_empty());
    // nothing parsed, so nothing was checked
    assert!(result.program.is_none());
}

#[test]
fn valid_program_round_trips_through_frontend() {
    let result = pipeline::run_frontend(SPRINGS);
    assert!(
        !result.has_error(),
        "diagnostics: {:#?}",
        result.diagnostics
    );
    let json = pipeline::report_json(&result, SPRINGS);
    assert!(json.contains("\"Spring\""));
    assert!(json.contains("\"main\""));
}
