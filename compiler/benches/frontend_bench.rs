use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use meshc::{parser, pipeline, rewrite, typecheck};

// ── Sample Mesh programs ────────────────────────────────────────────────

const SIMPLE: &str = r#"
proc main
  var x : float = 1.0;
  var y : float = 2.0;
  z = x + y;
end
"#;

const SPRINGS: &str = r#"
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
"#;

const DENSE: &str = r#"
proc main
  const I : tensor[3,3](float) = [[1.0,0.0,0.0],[0.0,1.0,0.0],[0.0,0.0,1.0]];
  var v : tensor[3](float)' = [1.0, 2.0, 3.0]';
  w = I * v;
  s = v' * w;
  for i in 0:10
    s = s + 1.0;
  end
end
"#;

/// Generate a procedure with a long chain of checked statements.
fn generate_wide_procedure(n_vars: usize) -> String {
    let mut source = String::from("proc main\n");
    for i in 0..n_vars {
        source.push_str(&format!("  var v{} : float = {}.0;\n", i, i));
    }
    source.push_str("  s = v0");
    for i in 1..n_vars {
        source.push_str(&format!(" + v{}", i));
    }
    source.push_str(";\nend\n");
    source
}

// ── Benchmarks ──────────────────────────────────────────────────────────

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for (name, source) in [("simple", SIMPLE), ("springs", SPRINGS), ("dense", DENSE)] {
        group.bench_with_input(BenchmarkId::from_parameter(name), source, |b, source| {
            b.iter(|| {
                let result = parser::parse(black_box(source));
                black_box(&result.program);
            });
        });
    }

    group.finish();
}

fn bench_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("check");

    for (name, source) in [("simple", SIMPLE), ("springs", SPRINGS), ("dense", DENSE)] {
        group.bench_with_input(BenchmarkId::from_parameter(name), source, |b, source| {
            b.iter_batched(
                || {
                    let parsed = parser::parse(source);
                    rewrite::rewrite_calls(parsed.program.expect("benchmark sources parse"))
                },
                |program| {
                    let result = typecheck::check(black_box(&program));
                    black_box(&result.diagnostics);
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_frontend(c: &mut Criterion) {
    let mut group = c.benchmark_group("frontend");

    for (name, source) in [("simple", SIMPLE), ("springs", SPRINGS), ("dense", DENSE)] {
        group.bench_with_input(BenchmarkId::from_parameter(name), source, |b, source| {
            b.iter(|| {
                let result = pipeline::run_frontend(black_box(source));
                black_box(result.has_error());
            });
        });
    }

    group.finish();
}

fn bench_check_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("check_scaling");

    for n_vars in [10, 50, 200] {
        let source = generate_wide_procedure(n_vars);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}vars", n_vars)),
            &source,
            |b, source| {
                b.iter(|| {
                    let result = pipeline::run_frontend(black_box(source.as_str()));
                    black_box(result.has_error());
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_parse,
    bench_check,
    bench_frontend,
    bench_check_scaling,
);
criterion_main!(benches);
