// pipeline.rs — Front-end orchestration
//
// Chains lex → parse → call-rewrite → check, folding every phase's
// errors into one diagnostic list, and computes source provenance for
// reproducible-build tooling.
//
// Preconditions: `source` is the UTF-8 text of one .mesh module.
// Postconditions: `check` is populated whenever a tree was parsed, even
//   a faulty one; diagnostics from all phases appear in phase order.
// Failure modes: none beyond the diagnostics themselves.
// Side effects: none.

use chumsky::span::Span as _;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::diag::{self, DiagLevel, Diagnostic};
use crate::hir;
use crate::parser;
use crate::rewrite;
use crate::typecheck::{self, CheckResult};

// ── Provenance ───────────────────────────────────────────────────────────

/// Provenance metadata for hermetic builds and cache-key use.
///
/// `source_hash` is the SHA-256 of the raw source text.
#[derive(Debug, Clone)]
pub struct Provenance {
    pub source_hash: [u8; 32],
    pub compiler_version: &'static str,
}

impl Provenance {
    /// Hex string of the source hash (64 characters).
    pub fn source_hash_hex(&self) -> String {
        let mut s = String::with_capacity(64);
        for b in &self.source_hash {
            use std::fmt::Write;
            let _ = write!(s, "{:02x}", b);
        }
        s
    }
}

/// Compute provenance from source text.
pub fn compute_provenance(source: &str) -> Provenance {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);

    Provenance {
        source_hash: hash,
        compiler_version: env!("CARGO_PKG_VERSION"),
    }
}

// ── Frontend result ──────────────────────────────────────────────────────

/// All artifacts of a front-end run.
#[derive(Debug)]
pub struct FrontendResult {
    /// The rewritten HIR tree, absent when parsing produced nothing.
    pub program: Option<hir::Program>,
    /// Semantic analysis output, populated whenever a tree exists.
    pub check: Option<CheckResult>,
    /// Lex, parse, and semantic diagnostics, in phase order.
    pub diagnostics: Vec<Diagnostic>,
    pub provenance: Provenance,
}

impl FrontendResult {
    pub fn has_error(&self) -> bool {
        self.diagnostics.iter().any(|d| d.level == DiagLevel::Error)
    }
}

/// Run the complete front end over one source text.
pub fn run_frontend(source: &str) -> FrontendResult {
    let provenance = compute_provenance(source);

    let parse_result = parser::parse(source);
    let mut diagnostics: Vec<Diagnostic> = parse_result
        .errors
        .iter()
        .map(|e| Diagnostic::error(*e.span(), e.to_string()))
        .collect();

    let (program, check) = match parse_result.program {
        Some(program) => {
            let program = rewrite::rewrite_calls(program);
            let check = typecheck::check(&program);
            diagnostics.extend(check.diagnostics.iter().cloned());
            (Some(program), Some(check))
        }
        None => (None, None),
    };

    FrontendResult {
        program,
        check,
        diagnostics,
        provenance,
    }
}

// ── Machine-readable report ──────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ReportDiagnostic {
    level: &'static str,
    message: String,
    line: usize,
    col: usize,
}

#[derive(Debug, Serialize)]
struct ReportFunction {
    name: String,
    args: Vec<String>,
    results: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Report {
    source_hash: String,
    compiler_version: &'static str,
    diagnostics: Vec<ReportDiagnostic>,
    element_types: Vec<String>,
    functions: Vec<ReportFunction>,
}

/// Serialize a front-end run as pretty JSON for `--emit json`.
pub fn report_json(result: &FrontendResult, source: &str) -> String {
    let diagnostics = result
        .diagnostics
        .iter()
        .map(|d| {
            let at = diag::line_col(source, d.span.start());
            ReportDiagnostic {
                level: match d.level {
                    DiagLevel::Error => "error",
                    DiagLevel::Warning => "warning",
                },
                message: d.message.clone(),
                line: at.line,
                col: at.col,
            }
        })
        .collect();

    let (mut element_types, mut functions) = (Vec::new(), Vec::new());
    if let Some(check) = &result.check {
        element_types = check.context.element_types().keys().cloned().collect();
        element_types.sort();

        // intrinsics are ambient; the report lists what the program
        // itself declared
        let mut names: Vec<&String> = check
            .context
            .functions()
            .iter()
            .filter(|(_, f)| f.kind == crate::ir::FuncKind::Internal)
            .map(|(name, _)| name)
            .collect();
        names.sort();
        for name in names {
            let func = &check.context.functions()[name];
            let var_strings = |vars: &[crate::ir::Var]| {
                vars.iter()
                    .map(|v| match &v.ty {
                        Some(ty) => format!("{} : {}", v.name, ty),
                        None => v.name.clone(),
                    })
                    .collect::<Vec<_>>()
            };
            functions.push(ReportFunction {
                name: func.name.clone(),
                args: var_strings(&func.args),
                results: var_strings(&func.results),
            });
        }
    }

    let report = Report {
        source_hash: result.provenance.source_hash_hex(),
        compiler_version: result.provenance.compiler_version,
        diagnostics,
        element_types,
        functions,
    };
    serde_json::to_string_pretty(&report).expect("report serialization should not fail")
}

// ── Tests ────────────────────────────────────────────────────────────────
