// diag.rs — Unified diagnostics model
//
// Provides the shared diagnostic types used by every front-end phase.
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::fmt;

use crate::hir::Span;

// ── Severity level ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagLevel {
    Error,
    Warning,
}

// ── Diagnostic ───────────────────────────────────────────────────────────

/// A compiler diagnostic emitted by any phase.
///
/// Diagnostics are accumulated, never thrown: a phase that hits a user
/// error records a `Diagnostic` and keeps going, so one run surfaces as
/// many independent faults as possible.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub level: DiagLevel,
    pub span: Span,
    pub message: String,
    pub hint: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with no hint.
    pub fn new(level: DiagLevel, span: Span, message: impl Into<String>) -> Self {
        Self {
            level,
            span,
            message: message.into(),
            hint: None,
        }
    }

    /// Create an error-level diagnostic.
    pub fn error(span: Span, message: impl Into<String>) -> Self {
        Self::new(DiagLevel::Error, span, message)
    }

    /// Create a warning-level diagnostic.
    pub fn warning(span: Span, message: impl Into<String>) -> Self {
        Self::new(DiagLevel::Warning, span, message)
    }

    /// Attach a remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            DiagLevel::Error => "error",
            DiagLevel::Warning => "warning",
        };
        write!(f, "{}: {}", level, self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, "\n  hint: {}", hint)?;
        }
        Ok(())
    }
}

// ── Source locations ─────────────────────────────────────────────────────

/// A 1-based line/column pair derived from a byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCol {
    pub line: usize,
    pub col: usize,
}

/// Convert a byte offset into a 1-based line/column pair.
///
/// Columns count characters, not bytes. Offsets past the end of `source`
/// are clamped to the final position.
pub fn line_col(source: &str, offset: usize) -> LineCol {
    let offset = offset.min(source.len());
    let mut line = 1;
    let mut col = 1;
    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    LineCol { line, col }
}

/// Render a diagnostic against its source text, with begin/end line:col.
pub fn render(diag: &Diagnostic, source: &str) -> String {
    use chumsky::span::Span as _;
    let begin = line_col(source, diag.span.start());
    let end = line_col(source, diag.span.end());
    format!(
        "{}\n  --> {}:{} to {}:{}",
        diag, begin.line, begin.col, end.line, end.col
    )
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_span() -> Span {
        use chumsky::span::Span as _;
        Span::new((), 4..9)
    }

    #[test]
    fn display_error() {
        let d = Diagnostic::error(dummy_span(), "something failed");
        assert_eq!(format!("{d}"), "error: something failed");
    }

    #[test]
    fn display_with_hint() {
        let d = Diagnostic::warning(dummy_span(), "unused variable")
            .with_hint("remove the declaration");
        assert_eq!(
            format!("{d}"),
            "warning: unused variable\n  hint: remove the declaration"
        );
    }

    #[test]
    fn line_col_basics() {
        let src = "abc\ndef\nghi";
        assert_eq!(line_col(src, 0), LineCol { line: 1, col: 1 });
        assert_eq!(line_col(src, 2), LineCol { line: 1, col: 3 });
        assert_eq!(line_col(src, 4), LineCol { line: 2, col: 1 });
        assert_eq!(line_col(src, 9), LineCol { line: 3, col: 2 });
    }

    #[test]
    fn line_col_clamps_past_end() {
        let src = "ab";
        assert_eq!(line_col(src, 100), LineCol { line: 1, col: 3 });
    }

    #[test]
    fn render_includes_location() {
        let src = "abc\ndef ghi\n";
        let d = Diagnostic::error(dummy_span(), "bad");
        let rendered = render(&d, src);
        assert!(rendered.contains("error: bad"));
        assert!(rendered.contains("2:1 to 2:6"));
    }
}
