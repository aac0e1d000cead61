//! Hole patching for raw report series.
//!
//! Daily reports occasionally skip a day or two. [`patch_gaps`] is a tolerance
//! mechanism for those isolated holes, not a general imputation: a hole wider than
//! `delta` days stays (at least partly) missing, and so do trailing holes.

use super::value::{Value, combine};

/// Replace each interior missing day `j` with the mean of days `j - delta` and
/// `j + delta`.
///
/// - Present values are never modified.
/// - Missing days before the first present value are set to `0` when
///   `fill_initial` is true and left missing otherwise.
/// - Days whose neighbours are out of bounds or missing stay missing.
pub fn patch_gaps(series: &[Value], delta: usize, fill_initial: bool) -> Vec<Value> {
    let mut out = series.to_vec();
    let first_present = series.iter().position(Option::is_some);

    for j in 0..out.len() {
        if out[j].is_some() {
            continue;
        }

        let leading = first_present.is_none_or(|first| j < first);
        if leading {
            if fill_initial {
                out[j] = Some(0.0);
            }
            continue;
        }

        if delta == 0 || j < delta || j + delta >= out.len() {
            continue;
        }
        out[j] = combine(out[j - delta], out[j + delta], |a, b| (a + b) / 2.0);
    }

    out
}

/// Linearly interpolate interior runs of missing days.
///
/// Used for coverage counters that are published irregularly (e.g. weekly):
/// every run bounded by two present values is filled on the straight line
/// between them. Leading and trailing runs are left missing.
pub fn interpolate_linear(series: &[Value]) -> Vec<Value> {
    let mut out = series.to_vec();
    let mut last: Option<(usize, f64)> = None;

    for (i, v) in series.iter().enumerate() {
        let Some(v) = *v else { continue };
        if let Some((start, s)) = last {
            let n = (i - start) as f64;
            for (k, slot) in out.iter_mut().enumerate().take(i).skip(start + 1) {
                *slot = Some(s + (v - s) * (k - start) as f64 / n);
            }
        }
        last = Some((i, v));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_day_hole_is_averaged() {
        let s = vec![Some(1.0), None, Some(3.0)];
        assert_eq!(patch_gaps(&s, 1, false), vec![Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn wide_hole_is_not_patched_with_delta_one() {
        let s = vec![Some(1.0), None, None, Some(4.0)];
        assert_eq!(patch_gaps(&s, 1, false), s);
    }

    #[test]
    fn delta_two_reaches_over_a_two_day_hole() {
        let s = vec![Some(1.0), Some(2.0), None, None, Some(5.0), Some(6.0)];
        let out = patch_gaps(&s, 2, false);
        assert_eq!(out[2], Some(3.0)); // (s[0] + s[4]) / 2
        assert_eq!(out[3], Some(4.0)); // (s[1] + s[5]) / 2
    }

    #[test]
    fn leading_and_trailing_holes() {
        let s = vec![None, None, Some(5.0), Some(7.0), None];
        assert_eq!(patch_gaps(&s, 1, false), s);
        assert_eq!(
            patch_gaps(&s, 1, true),
            vec![Some(0.0), Some(0.0), Some(5.0), Some(7.0), None]
        );
    }

    #[test]
    fn present_values_are_untouched() {
        let s = vec![Some(10.0), Some(-3.0), Some(2.5)];
        assert_eq!(patch_gaps(&s, 1, true), s);
    }

    #[test]
    fn interpolation_fills_interior_runs_only() {
        let s = vec![None, Some(0.0), None, None, Some(30.0), None];
        assert_eq!(
            interpolate_linear(&s),
            vec![None, Some(0.0), Some(10.0), Some(20.0), Some(30.0), None]
        );
    }
}
