//! Sparse linear system solvers.

pub mod bicgstab;
pub mod vector;

pub use bicgstab::{bicgstab, solve_sparse, BicgstabConfig, Convergence, Workspace};

use crate::sparse::CooMatrix;

/// A linear operator mapping vectors to vectors: `y = A * x`.
///
/// Iterative Krylov solvers only ever apply the operator, so they take this
/// trait instead of a concrete matrix. That lets the same solver run against
/// operators that are never materialized (composed transformations,
/// finite-difference stencils) as well as the sparse matrix below.
pub trait LinearOperator {
    /// Dimension of the (square) operator.
    fn dim(&self) -> usize;

    /// Apply the operator: `y = A * x`.
    ///
    /// `x` and `y` are vectors of length `dim()`; `y` is fully overwritten.
    fn apply(&self, x: &[f64], y: &mut [f64]);
}

/// The canonical operator instance: a square COO matrix applied untransposed.
impl LinearOperator for CooMatrix {
    fn dim(&self) -> usize {
        self.nrows
    }

    fn apply(&self, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.ncols, "apply dimension mismatch");
        assert_eq!(y.len(), self.nrows, "apply dimension mismatch");
        self.matvec_unchecked(x, y);
    }
}
