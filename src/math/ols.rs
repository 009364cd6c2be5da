//! Regularised least squares solver.
//!
//! Every model fit in this crate reduces to a small linear problem of the form:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2 + Σ λ_j β_j^2
//! ```
//!
//! Implementation choices:
//! - The ridge penalty is applied by appending `sqrt(λ_j) e_j` rows to the
//!   design matrix (with zero targets), which turns the problem back into
//!   plain least squares.
//! - We solve with SVD so tall and rank-deficient systems (e.g. aliased Fourier
//!   terms or holiday columns that never fire) still give a finite solution.
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Solve a ridge-regularised least squares problem.
///
/// `penalties[j]` is the L2 weight on coefficient `j` (0 leaves it free).
/// Returns `None` on dimension mismatch or numerical failure.
pub fn solve_ridge(x: &DMatrix<f64>, y: &DVector<f64>, penalties: &[f64]) -> Option<DVector<f64>> {
    let (n, p) = x.shape();
    if penalties.len() != p || y.len() != n {
        return None;
    }

    let penalised: Vec<(usize, f64)> = penalties
        .iter()
        .enumerate()
        .filter(|(_, l)| **l > 0.0)
        .map(|(j, l)| (j, l.sqrt()))
        .collect();

    if penalised.is_empty() {
        return solve_least_squares(x, y);
    }

    let rows = n + penalised.len();
    let mut xa = DMatrix::<f64>::zeros(rows, p);
    let mut ya = DVector::<f64>::zeros(rows);
    xa.view_mut((0, 0), (n, p)).copy_from(x);
    ya.rows_mut(0, n).copy_from(y);
    for (k, (j, sl)) in penalised.iter().enumerate() {
        xa[(n + k, *j)] = *sl;
    }

    solve_least_squares(&xa, &ya)
}
