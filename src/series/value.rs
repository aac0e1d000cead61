//! The missing-value rule, in one place.
//!
//! A daily value is `Option<f64>`; `None` is the only missing sentinel and `NaN`
//! never enters a series. Arithmetic on two values yields `None` if either side is
//! missing or if the result is not finite. Sums used for summary statistics use
//! [`nansum`], which counts missing days as zero.

use crate::error::AppError;

/// One day of a series.
pub type Value = Option<f64>;

/// Wrap a computed number, mapping non-finite results to missing.
pub fn finite(v: f64) -> Value {
    v.is_finite().then_some(v)
}

/// Apply `f` to two values, propagating missing-ness.
pub fn combine(a: Value, b: Value, f: impl FnOnce(f64, f64) -> f64) -> Value {
    finite(f(a?, b?))
}

/// Fail unless every series has exactly `expected` days.
pub fn ensure_aligned(what: &str, expected: usize, series: &[&[Value]]) -> Result<(), AppError> {
    for s in series {
        if s.len() != expected {
            return Err(AppError::misaligned(what, expected, s.len()));
        }
    }
    Ok(())
}

/// Elementwise combination of two aligned series.
pub fn zip_with(
    what: &str,
    a: &[Value],
    b: &[Value],
    f: impl Fn(f64, f64) -> f64,
) -> Result<Vec<Value>, AppError> {
    ensure_aligned(what, a.len(), &[b])?;
    Ok(a.iter().zip(b).map(|(x, y)| combine(*x, *y, &f)).collect())
}

/// Sum treating missing days as zero.
pub fn nansum(values: &[Value]) -> f64 {
    values.iter().flatten().sum()
}

/// Arithmetic mean; missing if the slice is empty or any day is missing.
pub fn mean(values: &[Value]) -> Value {
    if values.is_empty() {
        return None;
    }
    let mut sum = 0.0;
    for v in values {
        sum += (*v)?;
    }
    finite(sum / values.len() as f64)
}

/// A value usable as a ratio operand: present and non-zero.
pub fn truthy(v: Value) -> Value {
    v.filter(|x| *x != 0.0)
}

/// Index of the last non-missing day.
pub fn last_defined(values: &[Value]) -> Option<usize> {
    values.iter().rposition(Option::is_some)
}

/// Lift plain numbers into a series (non-finite inputs become missing).
pub fn from_f64s(values: &[f64]) -> Vec<Value> {
    values.iter().map(|v| finite(*v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_propagates_missing() {
        assert_eq!(combine(Some(2.0), Some(3.0), |a, b| a * b), Some(6.0));
        assert_eq!(combine(None, Some(3.0), |a, b| a * b), None);
        assert_eq!(combine(Some(1.0), Some(0.0), |a, b| a / b), None);
    }

    #[test]
    fn zip_with_rejects_different_lengths() {
        let a = from_f64s(&[1.0, 2.0, 3.0]);
        let b = from_f64s(&[1.0, 2.0]);
        let err = zip_with("test", &a, &b, |x, y| x + y).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn nansum_skips_missing_but_mean_does_not() {
        let v = vec![Some(1.0), None, Some(2.0)];
        assert!((nansum(&v) - 3.0).abs() < 1e-12);
        assert_eq!(mean(&v), None);
        assert_eq!(mean(&[Some(1.0), Some(3.0)]), Some(2.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn from_f64s_drops_nan() {
        assert_eq!(from_f64s(&[1.0, f64::NAN]), vec![Some(1.0), None]);
    }

    #[test]
    fn truthy_and_last_defined() {
        assert_eq!(truthy(Some(0.0)), None);
        assert_eq!(truthy(Some(4.0)), Some(4.0));
        assert_eq!(last_defined(&[Some(1.0), Some(2.0), None]), Some(1));
        assert_eq!(last_defined(&[None, None]), None);
    }
}
