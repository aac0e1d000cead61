//! Trailing moving windows.

use super::value::{Value, finite, mean};

/// Trailing arithmetic mean over `window` days.
///
/// The first `window - 1` days are missing, as is any day whose window contains
/// a missing value. A zero window yields an all-missing series.
pub fn rolling_mean(series: &[Value], window: usize) -> Vec<Value> {
    trailing(series, window, mean)
}

/// Trailing sum over `window` days (current day included), with the same
/// warm-up and missing-value rules as [`rolling_mean`].
pub fn rolling_sum(series: &[Value], window: usize) -> Vec<Value> {
    trailing(series, window, |w| {
        let mut sum = 0.0;
        for v in w {
            sum += (*v)?;
        }
        finite(sum)
    })
}

fn trailing(series: &[Value], window: usize, f: impl Fn(&[Value]) -> Value) -> Vec<Value> {
    if window == 0 {
        return vec![None; series.len()];
    }
    (0..series.len())
        .map(|i| {
            if i + 1 < window {
                None
            } else {
                f(&series[i + 1 - window..=i])
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::value::from_f64s;

    #[test]
    fn constant_series_smooths_to_itself_after_warmup() {
        let s = from_f64s(&[4.0; 20]);
        let out = rolling_mean(&s, 7);
        assert_eq!(out.len(), 20);
        assert!(out[..6].iter().all(Option::is_none));
        for v in &out[6..] {
            assert!((v.unwrap() - 4.0).abs() < 1e-12);
        }
    }

    #[test]
    fn missing_day_poisons_every_window_that_contains_it() {
        let mut s = from_f64s(&[1.0; 10]);
        s[4] = None;
        let out = rolling_mean(&s, 3);
        assert_eq!(out[3], Some(1.0));
        assert!(out[4..7].iter().all(Option::is_none));
        assert_eq!(out[7], Some(1.0));
    }

    #[test]
    fn rolling_sum_counts_the_current_day() {
        let s = from_f64s(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(rolling_sum(&s, 2), vec![None, Some(3.0), Some(5.0), Some(7.0)]);
    }

    #[test]
    fn window_longer_than_series_is_all_missing() {
        let s = from_f64s(&[1.0, 2.0]);
        assert_eq!(rolling_mean(&s, 5), vec![None, None]);
        assert_eq!(rolling_mean(&s, 0), vec![None, None]);
    }
}
