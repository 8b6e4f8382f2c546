// shape.rs — Dense tensor literal shape inference
//
// Infers the rank, per-axis length, and scalar kind of nested bracketed
// literals. Inconsistencies are returned as structured errors, which the
// checker converts into diagnostics at the literal's span; no error
// escapes this module as a panic.
//
// Preconditions: the expression is a dense literal (vector or nested).
// Postconditions: on success, `dim_sizes` holds the axis lengths
//   innermost-first.
// Failure modes: mixed int/float elements, ragged rows, or a non-literal
//   child (a front-end bug) produce `LiteralError`.
// Side effects: none.

use std::fmt;

use crate::hir::{Expr, ExprKind};

// ── Shape and errors ─────────────────────────────────────────────────────

/// The scalar kind of a dense literal. Int and float may not mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenseKind {
    Int,
    Float,
}

/// Inferred shape of a dense literal. Axis lengths are stored
/// innermost-first, matching the order the recursion discovers them;
/// callers reverse to obtain outermost-first dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseShape {
    pub kind: DenseKind,
    pub dim_sizes: Vec<usize>,
}

impl DenseShape {
    /// Rank of the literal.
    pub fn rank(&self) -> usize {
        self.dim_sizes.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteralError {
    /// Integer and floating-point elements in one literal.
    MixedComponents,
    /// Sibling rows disagree on rank or axis length.
    RaggedDimensions,
    /// A child of a nested literal is not itself a dense literal. The
    /// parser never produces this; it marks a front-end bug.
    NotDense,
}

impl fmt::Display for LiteralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralError::MixedComponents => {
                write!(f, "cannot mix integer and floating-point elements in a tensor literal")
            }
            LiteralError::RaggedDimensions => {
                write!(f, "inconsistent dimensions in tensor literal")
            }
            LiteralError::NotDense => {
                write!(f, "nested tensor literal contains a non-literal element")
            }
        }
    }
}

// ── Inference ────────────────────────────────────────────────────────────

/// Infer the shape of a dense literal expression.
pub fn infer(lit: &Expr) -> Result<DenseShape, LiteralError> {
    match &lit.kind {
        ExprKind::IntVectorLit { vals, .. } => Ok(DenseShape {
            kind: DenseKind::Int,
            dim_sizes: vec![vals.len()],
        }),
        ExprKind::FloatVectorLit { vals, .. } => Ok(DenseShape {
            kind: DenseKind::Float,
            dim_sizes: vec![vals.len()],
        }),
        ExprKind::NDTensorLit { elems, .. } => {
            let mut shape = infer(&elems[0])?;
            shape.dim_sizes.push(1);
            for elem in &elems[1..] {
                merge(&mut shape, infer(elem)?)?;
            }
            Ok(shape)
        }
        _ => Err(LiteralError::NotDense),
    }
}

/// Fold a sibling row into the accumulated shape: kinds must agree, the
/// sibling must be exactly one rank shallower than the accumulator, and
/// all shared axis lengths must match. On success the outermost axis
/// grows by one.
fn merge(shape: &mut DenseShape, other: DenseShape) -> Result<(), LiteralError> {
    if shape.kind != other.kind {
        return Err(LiteralError::MixedComponents);
    }
    let outer = shape.dim_sizes.len() - 1;
    if outer != other.dim_sizes.len() {
        return Err(LiteralError::RaggedDimensions);
    }
    if shape.dim_sizes[..outer] != other.dim_sizes[..] {
        return Err(LiteralError::RaggedDimensions);
    }
    shape.dim_sizes[outer] += 1;
    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────────────
