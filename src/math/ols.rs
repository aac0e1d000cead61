//! Least squares solver.
//!
//! Solves `minimize Σ (y_i - x_i^T β)^2` through an SVD of the design matrix,
//! which also handles tall matrices (many days, two columns). Nalgebra's
//! `QR::solve` is meant for square systems and panics otherwise.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.nrows() != y.len() || x.nrows() == 0 {
        return None;
    }
    let svd = x.clone().svd(true, true);

    // Progressively looser tolerances for nearly collinear columns.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}
