//! Generic BiCGSTAB iterative solver.
//!
//! Solves `A * x = b` for non-symmetric systems, written against the
//! [`LinearOperator`] trait so the same algorithm runs on an explicit sparse
//! matrix or on operators that are never materialized.

use crate::error::{Result, VoltaicError};
use crate::sparse::CooMatrix;

use super::vector::{axpy, axpy2, copy, dot, scale};
use super::LinearOperator;

/// Recurrence denominators below this magnitude are treated as breakdown.
const BREAKDOWN_THRESHOLD: f64 = 1e-30;

/// BiCGSTAB solver configuration.
#[derive(Debug, Clone)]
pub struct BicgstabConfig {
    /// Maximum number of iterations before the solve is abandoned.
    pub max_iterations: usize,
    /// Convergence tolerance. A solve of an n-dimensional system is accepted
    /// once the residual 2-norm drops below `n * tolerance`; the threshold
    /// scales with system size. Must be positive.
    pub tolerance: f64,
    /// Restarts permitted when the rho recurrence stagnates. Each restart
    /// re-derives the shadow residual from the current iterate. Zero
    /// disables restarting; stagnation is then reported as breakdown.
    pub max_restarts: usize,
}

impl Default for BicgstabConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            tolerance: 1e-10,
            max_restarts: 0,
        }
    }
}

/// Summary of a successful solve.
#[derive(Debug, Clone, Copy)]
pub struct Convergence {
    /// Iterations consumed, counting the one that converged.
    pub iterations: usize,
    /// Final residual 2-norm.
    pub residual: f64,
}

/// Caller-owned scratch space for [`bicgstab`]: six n-length vectors in a
/// single allocation, reusable across solves. The solver makes no claim on
/// the contents between calls.
pub struct Workspace {
    n: usize,
    buf: Vec<f64>,
}

impl Workspace {
    /// Allocate scratch space for an n-dimensional system.
    pub fn new(n: usize) -> Self {
        Self {
            n,
            buf: vec![0.0; 6 * n],
        }
    }

    /// System size this workspace was allocated for.
    pub fn size(&self) -> usize {
        self.n
    }

    fn vectors(&mut self) -> Vectors<'_> {
        let (r, rest) = self.buf.split_at_mut(self.n);
        let (p, rest) = rest.split_at_mut(self.n);
        let (v, rest) = rest.split_at_mut(self.n);
        let (s, rest) = rest.split_at_mut(self.n);
        let (t, r0) = rest.split_at_mut(self.n);
        Vectors { r, p, v, s, t, r0 }
    }
}

/// Named views into the workspace buffer.
struct Vectors<'a> {
    /// Current residual.
    r: &'a mut [f64],
    /// Search direction.
    p: &'a mut [f64],
    /// Operator applied to `p`.
    v: &'a mut [f64],
    /// Intermediate residual after the alpha step.
    s: &'a mut [f64],
    /// Operator applied to `s`.
    t: &'a mut [f64],
    /// Shadow residual, fixed at (re)initialization.
    r0: &'a mut [f64],
}

/// Solve `op(x) = b` using BiCGSTAB.
///
/// On entry `x` holds the caller's initial guess (all zeros is fine); on
/// success it holds the solution. `work` must be sized for `op.dim()`
/// unknowns.
///
/// Failure outcomes are distinguishable: dimension problems are
/// [`VoltaicError::InvalidArgument`], a degenerate recurrence is
/// [`VoltaicError::Breakdown`], and running out of iterations is
/// [`VoltaicError::NoConvergence`]. Callers can retry the latter with a
/// looser tolerance or a higher cap.
pub fn bicgstab<Op: LinearOperator + ?Sized>(
    op: &Op,
    b: &[f64],
    x: &mut [f64],
    work: &mut Workspace,
    config: &BicgstabConfig,
) -> Result<Convergence> {
    let n = op.dim();
    if b.len() != n || x.len() != n {
        return Err(VoltaicError::InvalidArgument(format!(
            "operator dimension is {}, rhs length is {}, solution length is {}",
            n,
            b.len(),
            x.len()
        )));
    }
    if work.size() != n {
        return Err(VoltaicError::InvalidArgument(format!(
            "workspace sized for {} unknowns, system has {}",
            work.size(),
            n
        )));
    }
    if !(config.tolerance > 0.0) {
        return Err(VoltaicError::InvalidArgument(format!(
            "tolerance must be positive, got {}",
            config.tolerance
        )));
    }
    if n == 0 {
        return Ok(Convergence {
            iterations: 0,
            residual: 0.0,
        });
    }

    let _span = tracing::debug_span!("bicgstab", n).entered();
    let threshold = n as f64 * config.tolerance;
    let w = work.vectors();

    // r = r0 = b - A*x, p = r0.
    op.apply(x, w.v);
    copy(b, w.r0);
    axpy(-1.0, w.v, w.r0);
    copy(w.r0, w.r);
    copy(w.r0, w.p);
    let mut rho = dot(w.r, w.r0);
    let mut restarts_left = config.max_restarts;

    let mut res_norm = dot(w.r, w.r).sqrt();
    if res_norm < threshold {
        // The initial guess already satisfies the stopping test.
        return Ok(Convergence {
            iterations: 0,
            residual: res_norm,
        });
    }

    for iter in 0..config.max_iterations {
        // v = A*p
        op.apply(w.p, w.v);
        let denom = dot(w.v, w.r0);
        if denom.abs() < BREAKDOWN_THRESHOLD {
            return Err(VoltaicError::Breakdown(format!(
                "<v, r0> ~ 0 at iteration {}",
                iter
            )));
        }
        let alpha = rho / denom;

        // s = r - alpha*v
        copy(w.r, w.s);
        axpy(-alpha, w.v, w.s);

        // An exact half-step leaves s = 0 and the omega update 0/0, so
        // accept here once s is below the stopping threshold.
        let s_norm = dot(w.s, w.s).sqrt();
        if s_norm < threshold {
            axpy(alpha, w.p, x);
            tracing::debug!(iterations = iter + 1, residual = s_norm, "converged");
            return Ok(Convergence {
                iterations: iter + 1,
                residual: s_norm,
            });
        }

        // t = A*s
        op.apply(w.s, w.t);
        let tt = dot(w.t, w.t);
        if tt.abs() < BREAKDOWN_THRESHOLD {
            return Err(VoltaicError::Breakdown(format!(
                "<t, t> ~ 0 at iteration {}",
                iter
            )));
        }
        let omega = dot(w.t, w.s) / tt;

        // x += alpha*p + omega*s
        axpy2(alpha, w.p, omega, w.s, x);

        // r = s - omega*t
        copy(w.s, w.r);
        axpy(-omega, w.t, w.r);

        res_norm = dot(w.r, w.r).sqrt();
        if !res_norm.is_finite() {
            return Err(VoltaicError::Breakdown(format!(
                "non-finite residual at iteration {}",
                iter
            )));
        }
        tracing::trace!(iter, residual = res_norm, "iteration");
        if res_norm < threshold {
            tracing::debug!(iterations = iter + 1, residual = res_norm, "converged");
            return Ok(Convergence {
                iterations: iter + 1,
                residual: res_norm,
            });
        }

        let rho_new = dot(w.r, w.r0);
        if rho_new.abs() < BREAKDOWN_THRESHOLD {
            if restarts_left == 0 {
                return Err(VoltaicError::Breakdown(format!(
                    "rho ~ 0 at iteration {}",
                    iter
                )));
            }
            restarts_left -= 1;
            // Restart the recurrence from the current iterate.
            op.apply(x, w.v);
            copy(b, w.r0);
            axpy(-1.0, w.v, w.r0);
            copy(w.r0, w.r);
            copy(w.r0, w.p);
            rho = dot(w.r, w.r0);
            tracing::debug!(iter, "restarted");
            continue;
        }
        let beta = (alpha / omega) * (rho_new / rho);
        rho = rho_new;

        // p = r + beta*(p - omega*v)
        axpy(-omega, w.v, w.p);
        scale(beta, w.p);
        axpy(1.0, w.r, w.p);
    }

    Err(VoltaicError::NoConvergence {
        iterations: config.max_iterations,
        residual: res_norm,
    })
}

/// Solve `A * x = b` for a sparse COO matrix using BiCGSTAB.
///
/// Convenience wrapper binding the matrix through its [`LinearOperator`]
/// impl; the system size is the matrix row count. The matrix must be square.
pub fn solve_sparse(
    a: &CooMatrix,
    b: &[f64],
    x: &mut [f64],
    work: &mut Workspace,
    config: &BicgstabConfig,
) -> Result<Convergence> {
    if a.nrows != a.ncols {
        return Err(VoltaicError::InvalidArgument(format!(
            "system matrix must be square, got {}x{}",
            a.nrows, a.ncols
        )));
    }
    bicgstab(a, b, x, work, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn identity(n: usize) -> CooMatrix {
        let mut m = CooMatrix::with_capacity(n, n, n);
        for i in 0..n {
            m.push(i, i, 1.0);
        }
        m
    }

    #[test]
    fn test_identity_converges_in_one_iteration() {
        let a = identity(3);
        let b = [1.0, -2.0, 3.0];
        let mut x = vec![0.0; 3];
        let mut work = Workspace::new(3);

        let conv = solve_sparse(&a, &b, &mut x, &mut work, &BicgstabConfig::default()).unwrap();
        assert_eq!(conv.iterations, 1);
        for (xi, bi) in x.iter().zip(&b) {
            assert_abs_diff_eq!(xi, bi, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_known_diagonal_system() {
        // diag(2, 4) * x = [4, 8]  =>  x = [2, 2]
        let a = CooMatrix::from_triplets(2, 2, &[(0, 0, 2.0), (1, 1, 4.0)]);
        let b = [4.0, 8.0];
        let mut x = vec![0.0; 2];
        let mut work = Workspace::new(2);

        let conv = solve_sparse(&a, &b, &mut x, &mut work, &BicgstabConfig::default()).unwrap();
        assert!(conv.iterations <= 2);
        assert_abs_diff_eq!(x[0], 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(x[1], 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_nonsymmetric_system() {
        // [[4, 1], [2, 5]] * [1, -1] = [3, -3]
        let a = CooMatrix::from_triplets(2, 2, &[(0, 0, 4.0), (0, 1, 1.0), (1, 0, 2.0), (1, 1, 5.0)]);
        let b = [3.0, -3.0];
        let mut x = vec![0.0; 2];
        let mut work = Workspace::new(2);

        solve_sparse(&a, &b, &mut x, &mut work, &BicgstabConfig::default()).unwrap();
        assert_abs_diff_eq!(x[0], 1.0, epsilon = 1e-8);
        assert_abs_diff_eq!(x[1], -1.0, epsilon = 1e-8);
    }

    #[test]
    fn test_exact_initial_guess_takes_zero_iterations() {
        let a = CooMatrix::from_triplets(2, 2, &[(0, 0, 2.0), (1, 1, 4.0)]);
        let b = [4.0, 8.0];
        let mut x = vec![2.0, 2.0];
        let mut work = Workspace::new(2);

        let conv = solve_sparse(&a, &b, &mut x, &mut work, &BicgstabConfig::default()).unwrap();
        assert_eq!(conv.iterations, 0);
        assert_eq!(x, vec![2.0, 2.0]);
    }

    #[test]
    fn test_singular_system_reports_breakdown() {
        // Second row is identically zero: no solution with b[1] != 0, and the
        // recurrence degenerates instead of looping or emitting NaN.
        let a = CooMatrix::from_triplets(2, 2, &[(0, 0, 1.0)]);
        let b = [1.0, 1.0];
        let mut x = vec![0.0; 2];
        let mut work = Workspace::new(2);

        let err = solve_sparse(&a, &b, &mut x, &mut work, &BicgstabConfig::default()).unwrap_err();
        assert!(matches!(err, VoltaicError::Breakdown(_)), "got {:?}", err);
    }

    #[test]
    fn test_iteration_cap_reports_no_convergence() {
        // 1-D Laplacian stencil; far from converged after two iterations.
        let n = 32;
        let mut a = CooMatrix::with_capacity(n, n, 3 * n);
        for i in 0..n {
            a.push(i, i, 2.0);
            if i > 0 {
                a.push(i, i - 1, -1.0);
            }
            if i + 1 < n {
                a.push(i, i + 1, -1.0);
            }
        }
        let mut b = vec![0.0; n];
        b[0] = 1.0;
        let mut x = vec![0.0; n];
        let mut work = Workspace::new(n);

        let config = BicgstabConfig {
            max_iterations: 2,
            tolerance: 1e-14,
            ..BicgstabConfig::default()
        };
        let err = solve_sparse(&a, &b, &mut x, &mut work, &config).unwrap_err();
        match err {
            VoltaicError::NoConvergence { iterations, residual } => {
                assert_eq!(iterations, 2);
                assert!(residual.is_finite());
            }
            other => panic!("expected NoConvergence, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_rhs_with_zero_guess() {
        let a = identity(4);
        let b = vec![0.0; 4];
        let mut x = vec![0.0; 4];
        let mut work = Workspace::new(4);

        let conv = solve_sparse(&a, &b, &mut x, &mut work, &BicgstabConfig::default()).unwrap();
        assert_eq!(conv.iterations, 0);
        assert_eq!(x, vec![0.0; 4]);
    }

    #[test]
    fn test_workspace_reused_across_solves() {
        let a = CooMatrix::from_triplets(2, 2, &[(0, 0, 2.0), (1, 1, 4.0)]);
        let mut work = Workspace::new(2);

        let mut x1 = vec![0.0; 2];
        solve_sparse(&a, &[4.0, 8.0], &mut x1, &mut work, &BicgstabConfig::default()).unwrap();

        let mut x2 = vec![0.0; 2];
        solve_sparse(&a, &[2.0, 4.0], &mut x2, &mut work, &BicgstabConfig::default()).unwrap();
        assert_abs_diff_eq!(x2[0], 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(x2[1], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rectangular_matrix_rejected() {
        let a = CooMatrix::new(2, 3);
        let mut x = vec![0.0; 2];
        let mut work = Workspace::new(2);
        let err = solve_sparse(&a, &[1.0, 1.0], &mut x, &mut work, &BicgstabConfig::default())
            .unwrap_err();
        assert!(matches!(err, VoltaicError::InvalidArgument(_)));
    }

    #[test]
    fn test_wrong_workspace_size_rejected() {
        let a = identity(3);
        let mut x = vec![0.0; 3];
        let mut work = Workspace::new(2);
        let err = solve_sparse(&a, &[1.0, 1.0, 1.0], &mut x, &mut work, &BicgstabConfig::default())
            .unwrap_err();
        assert!(matches!(err, VoltaicError::InvalidArgument(_)));
    }

    #[test]
    fn test_nonpositive_tolerance_rejected() {
        let a = identity(2);
        let mut x = vec![0.0; 2];
        let mut work = Workspace::new(2);
        let config = BicgstabConfig {
            tolerance: 0.0,
            ..BicgstabConfig::default()
        };
        let err = solve_sparse(&a, &[1.0, 1.0], &mut x, &mut work, &config).unwrap_err();
        assert!(matches!(err, VoltaicError::InvalidArgument(_)));
    }
}
