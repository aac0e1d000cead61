//! Lag-adjusted test positivity (percent).

use super::SMOOTHING_WINDOW;
use crate::error::AppError;
use crate::series::{Value, ensure_aligned, finite, rolling_mean, truthy};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositivityParams {
    /// Days between a test and the case it confirms.
    pub period: usize,
    pub ignore: usize,
    pub smoothing: usize,
}

impl Default for PositivityParams {
    fn default() -> Self {
        Self {
            period: 2,
            ignore: 15,
            smoothing: SMOOTHING_WINDOW,
        }
    }
}

impl PositivityParams {
    pub fn warmup(&self) -> usize {
        self.period + self.ignore + self.smoothing.saturating_sub(1)
    }
}

/// `100 * new_cases[i] / tests[i - period]`, smoothed.
///
/// A day is missing unless both operands are present and non-zero.
pub fn positivity(
    tests: &[Value],
    new_cases: &[Value],
    params: &PositivityParams,
) -> Result<Vec<Value>, AppError> {
    ensure_aligned("positivity", new_cases.len(), &[tests])?;

    let start = params.period + params.ignore;
    let raw: Vec<Value> = (0..new_cases.len())
        .map(|i| {
            if i < start {
                return None;
            }
            let cases = truthy(new_cases[i])?;
            let tested = truthy(tests[i - params.period])?;
            finite(100.0 * cases / tested)
        })
        .collect();

    Ok(rolling_mean(&raw, params.smoothing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::from_f64s;

    #[test]
    fn stabilizes_at_ratio_after_warmup() {
        let tests = from_f64s(&[100.0; 30]);
        let new = from_f64s(&[10.0; 30]);
        let params = PositivityParams { period: 2, ignore: 0, smoothing: 7 };

        let out = positivity(&tests, &new, &params).unwrap();
        assert_eq!(params.warmup(), 8);
        assert!(out[..8].iter().all(Option::is_none));
        for v in &out[8..] {
            assert!((v.unwrap() - 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn denominator_is_shifted_by_period() {
        let tests = from_f64s(&[50.0, 200.0, 100.0, 100.0]);
        let new = from_f64s(&[1.0, 1.0, 5.0, 20.0]);
        let params = PositivityParams { period: 2, ignore: 0, smoothing: 1 };

        let out = positivity(&tests, &new, &params).unwrap();
        assert_eq!(out, vec![None, None, Some(10.0), Some(10.0)]);
    }

    #[test]
    fn zero_or_missing_operands_are_missing() {
        let tests = vec![Some(0.0), None, Some(10.0), Some(10.0), Some(10.0)];
        let new = vec![Some(1.0), Some(1.0), Some(1.0), Some(1.0), Some(0.0)];
        let params = PositivityParams { period: 2, ignore: 0, smoothing: 1 };

        let out = positivity(&tests, &new, &params).unwrap();
        assert_eq!(out, vec![None, None, None, None, None]);
    }

    #[test]
    fn misaligned_inputs_fail() {
        let params = PositivityParams::default();
        let err = positivity(&from_f64s(&[1.0; 3]), &from_f64s(&[1.0; 4]), &params).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}
