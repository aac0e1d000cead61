//! Straight-line fit and Pearson correlation between two aligned series.

use nalgebra::{DMatrix, DVector};
use serde::Serialize;

use super::ols::solve_least_squares;
use crate::error::AppError;
use crate::series::{Value, ensure_aligned};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson r; `None` when `y` is constant.
    pub r: Option<f64>,
    /// Number of day pairs used.
    pub n: usize,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Fit `y = intercept + slope * x`.
///
/// The leading run where either series is missing is stripped; after that, days
/// with a missing side are skipped. Returns `Ok(None)` for degenerate input:
/// fewer than two pairs or a constant `x`.
pub fn fit_line(x: &[Value], y: &[Value]) -> Result<Option<LinearFit>, AppError> {
    ensure_aligned("correlation", x.len(), &[y])?;

    let skip = x
        .iter()
        .zip(y)
        .position(|(a, b)| a.is_some() && b.is_some())
        .unwrap_or(x.len());
    let pairs: Vec<(f64, f64)> = x[skip..]
        .iter()
        .zip(&y[skip..])
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();

    let n = pairs.len();
    if n < 2 {
        return Ok(None);
    }

    let nf = n as f64;
    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / nf;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / nf;
    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        let (dx, dy) = (a - mean_x, b - mean_y);
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    if sxx <= 0.0 {
        return Ok(None);
    }

    let design = DMatrix::from_fn(n, 2, |row, col| if col == 0 { 1.0 } else { pairs[row].0 });
    let target = DVector::from_iterator(n, pairs.iter().map(|(_, b)| *b));
    let Some(beta) = solve_least_squares(&design, &target) else {
        return Ok(None);
    };

    let r = (syy > 0.0).then(|| sxy / (sxx * syy).sqrt());
    Ok(Some(LinearFit {
        slope: beta[1],
        intercept: beta[0],
        r,
        n,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::from_f64s;

    #[test]
    fn exact_line_has_unit_correlation() {
        let x = from_f64s(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let y = from_f64s(&[3.0, 5.0, 7.0, 9.0, 11.0]);
        let fit = fit_line(&x, &y).unwrap().unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-9);
        assert!((fit.intercept - 1.0).abs() < 1e-9);
        assert!((fit.r.unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(fit.n, 5);
        assert!((fit.predict(10.0) - 21.0).abs() < 1e-9);
    }

    #[test]
    fn shared_leading_gap_is_stripped() {
        let x = vec![None, None, Some(1.0), Some(2.0), None, Some(3.0)];
        let y = vec![None, Some(7.0), Some(-1.0), Some(-2.0), Some(9.0), Some(-3.0)];
        let fit = fit_line(&x, &y).unwrap().unwrap();
        assert_eq!(fit.n, 3);
        assert!((fit.slope + 1.0).abs() < 1e-9);
        assert!((fit.r.unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_inputs_give_no_fit() {
        let flat_x = from_f64s(&[2.0, 2.0, 2.0]);
        let y = from_f64s(&[1.0, 2.0, 3.0]);
        assert_eq!(fit_line(&flat_x, &y).unwrap(), None);

        let one = vec![Some(1.0), None];
        assert_eq!(fit_line(&one, &from_f64s(&[1.0, 2.0])).unwrap(), None);
    }

    #[test]
    fn constant_y_has_slope_but_no_r() {
        let fit = fit_line(&from_f64s(&[1.0, 2.0, 3.0]), &from_f64s(&[4.0, 4.0, 4.0]))
            .unwrap()
            .unwrap();
        assert!(fit.slope.abs() < 1e-9);
        assert!((fit.intercept - 4.0).abs() < 1e-9);
        assert_eq!(fit.r, None);
    }

    #[test]
    fn misaligned_series_fail() {
        assert_eq!(
            fit_line(&from_f64s(&[1.0]), &from_f64s(&[1.0, 2.0])).unwrap_err().exit_code(),
            4
        );
    }
}
